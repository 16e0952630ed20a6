// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use console::style;
use tracing::{info, instrument};
use warden_flags::{
	EvaluationResult, Evaluator, EvaluatorOptions, FlagCatalog, FlagConfig, FlagRegistry,
	RolloutStrategy,
};
use warden_flags_config::EvaluationConfig;

use crate::cli::{EvalAllArgs, EvalArgs};

/// Reads the catalog at `path`, or the built-in catalog when there is none.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<FlagCatalog> {
	match path {
		Some(path) => {
			let catalog = FlagCatalog::load(path)
				.with_context(|| format!("failed to load catalog {}", path.display()))?;
			info!(path = %path.display(), flag_count = catalog.len(), "catalog loaded");
			Ok(catalog)
		}
		None => Ok(FlagCatalog::builtin()),
	}
}

pub fn evaluator_options(config: &EvaluationConfig) -> EvaluatorOptions {
	EvaluatorOptions {
		custom_evaluator_timeout: config.custom_evaluator_timeout(),
		max_dependency_depth: config.max_dependency_depth,
		bucket_salt: config.bucket_salt,
	}
}

pub fn build_evaluator(config: &EvaluationConfig, catalog: FlagCatalog) -> anyhow::Result<Evaluator> {
	let registry = FlagRegistry::new(catalog).context("invalid flag catalog")?;
	Ok(Evaluator::new(Arc::new(registry), evaluator_options(config)))
}

pub fn handle_list(registry: &FlagRegistry, json: bool) -> anyhow::Result<()> {
	let flags = registry.get_all_flags();
	if json {
		println!("{}", serde_json::to_string_pretty(&flags)?);
		return Ok(());
	}

	let width = flags.iter().map(|f| f.key.len()).max().unwrap_or(0);
	for flag in &flags {
		let mut line = format!(
			"{:<width$}  {:<13}  {}",
			flag.key,
			flag.strategy_kind().as_str(),
			flag.metadata.name.as_deref().unwrap_or("")
		);
		if flag.metadata.beta {
			line.push_str(&format!(" {}", style("(beta)").yellow()));
		}
		println!("{line}");
	}
	Ok(())
}

pub fn handle_show(registry: &FlagRegistry, key: &str, json: bool) -> anyhow::Result<()> {
	let flag = registry
		.get_flag(key)
		.with_context(|| format!("feature flag '{key}' not found"))?;

	if json {
		println!("{}", serde_json::to_string_pretty(&flag)?);
	} else {
		print!("{}", describe_flag(&flag));
	}
	Ok(())
}

#[instrument(skip(evaluator, args), fields(flag_key = %args.key))]
pub async fn handle_eval(evaluator: &Evaluator, args: EvalArgs) -> anyhow::Result<()> {
	let ctx = args.context.to_context();
	let result = evaluator.evaluate(&args.key, &ctx).await;

	if args.json {
		println!("{}", serde_json::to_string_pretty(&result)?);
	} else {
		println!("{}", format_result(&result));
	}
	Ok(())
}

pub async fn handle_eval_all(evaluator: &Evaluator, args: EvalAllArgs) -> anyhow::Result<()> {
	let ctx = args.context.to_context();
	let bulk = evaluator.evaluate_all(&ctx).await;

	if args.json {
		println!("{}", serde_json::to_string_pretty(&bulk)?);
	} else {
		for result in &bulk.results {
			println!("{}", format_result(result));
		}
		println!(
			"\n{} of {} flags enabled",
			style(bulk.enabled_keys().len()).bold(),
			bulk.len()
		);
	}
	Ok(())
}

pub fn handle_check(catalog: FlagCatalog) -> anyhow::Result<()> {
	catalog.validate().context("catalog failed validation")?;
	println!(
		"{} Catalog is valid ({} flags)",
		style("✓").green().bold(),
		catalog.len()
	);
	Ok(())
}

fn format_result(result: &EvaluationResult) -> String {
	let mark = if result.enabled {
		style("✓").green().bold()
	} else {
		style("✗").red().bold()
	};
	format!("{mark} {}: {}", style(&result.key).cyan(), result.reason_message())
}

fn describe_flag(flag: &FlagConfig) -> String {
	let mut out = format!("{}\n", style(&flag.key).cyan().bold());
	if let Some(name) = &flag.metadata.name {
		out.push_str(&format!("  Name:         {name}\n"));
	}
	if let Some(description) = &flag.metadata.description {
		out.push_str(&format!("  Description:  {description}\n"));
	}
	out.push_str(&format!("  Strategy:     {}\n", describe_strategy(&flag.strategy)));
	out.push_str(&format!("  Default:      {}\n", flag.enabled_default));
	if !flag.dependencies.is_empty() {
		out.push_str(&format!("  Depends on:   {}\n", flag.dependencies.join(", ")));
	}
	if let Some(category) = &flag.metadata.category {
		out.push_str(&format!("  Category:     {category}\n"));
	}
	if let Some(tier) = &flag.metadata.tier {
		out.push_str(&format!("  Tier:         {tier}\n"));
	}
	if flag.metadata.beta {
		out.push_str("  Beta:         yes\n");
	}
	out
}

fn describe_strategy(strategy: &RolloutStrategy) -> String {
	match strategy {
		RolloutStrategy::Disabled => "disabled".to_string(),
		RolloutStrategy::Enabled => "enabled".to_string(),
		RolloutStrategy::Percentage { percentage } => format!("percentage ({percentage})"),
		RolloutStrategy::Users { allowlist } => format!("users ({} allowed)", allowlist.len()),
		RolloutStrategy::Organizations { allowlist } => {
			format!("organizations ({} allowed)", allowlist.len())
		}
		RolloutStrategy::Attributes { rules } => {
			let rules: Vec<String> = rules
				.iter()
				.map(|r| format!("{} {} {}", r.attribute, r.operator, r.value))
				.collect();
			format!("attributes [{}]", rules.join(" AND "))
		}
		RolloutStrategy::Custom { evaluator } => match evaluator {
			Some(evaluator) => format!("custom ({})", evaluator.name()),
			None => "custom (no evaluator attached)".to_string(),
		},
	}
}
