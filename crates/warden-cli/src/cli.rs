// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use warden_flags::{EvaluationContext, RequestContext};

/// Inspect and evaluate Warden feature rollout flags
#[derive(Debug, Parser)]
#[command(name = "warden-flags", version)]
pub struct Cli {
	/// Engine config file (TOML)
	#[arg(long, global = true, env = "WARDEN_FLAGS_CONFIG")]
	pub config: Option<PathBuf>,

	/// Flag catalog (TOML or JSON); overrides the configured catalog
	#[arg(long, global = true)]
	pub catalog: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// List every flag in the catalog
	List {
		#[arg(long)]
		json: bool,
	},
	/// Show one flag's configuration
	Show {
		key: String,
		#[arg(long)]
		json: bool,
	},
	/// Evaluate one flag for a context
	Eval(EvalArgs),
	/// Evaluate every flag for a context
	EvalAll(EvalAllArgs),
	/// Validate the catalog and exit
	Check,
}

#[derive(Debug, Clone, Args)]
pub struct EvalArgs {
	pub key: String,

	#[command(flatten)]
	pub context: ContextArgs,

	#[arg(long)]
	pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EvalAllArgs {
	#[command(flatten)]
	pub context: ContextArgs,

	#[arg(long)]
	pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ContextArgs {
	#[arg(long)]
	pub user_id: Option<String>,

	#[arg(long)]
	pub org_id: Option<String>,

	#[arg(long)]
	pub email: Option<String>,

	/// May be repeated
	#[arg(long = "role")]
	pub roles: Vec<String>,

	#[arg(long)]
	pub plan: Option<String>,

	/// Custom attribute as key=value; the value is read as JSON when it parses
	#[arg(long = "attr", value_parser = parse_attribute)]
	pub attributes: Vec<(String, Value)>,

	#[arg(long)]
	pub ip: Option<String>,

	#[arg(long)]
	pub user_agent: Option<String>,

	#[arg(long)]
	pub country: Option<String>,
}

impl ContextArgs {
	pub fn to_context(&self) -> EvaluationContext {
		let mut ctx = EvaluationContext::new().with_roles(self.roles.iter().cloned());
		ctx.user_id = self.user_id.clone();
		ctx.organization_id = self.org_id.clone();
		ctx.email = self.email.clone();
		ctx.plan = self.plan.clone();
		for (key, value) in &self.attributes {
			ctx = ctx.with_attribute(key.clone(), value.clone());
		}

		if self.ip.is_some() || self.user_agent.is_some() || self.country.is_some() {
			ctx = ctx.with_request(RequestContext {
				ip: self.ip.clone(),
				user_agent: self.user_agent.clone(),
				country: self.country.clone(),
			});
		}
		ctx
	}
}

fn parse_attribute(raw: &str) -> Result<(String, Value), String> {
	let (key, value) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
	let key = key.trim();
	if key.is_empty() {
		return Err(format!("attribute name is empty in '{raw}'"));
	}

	let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
	Ok((key.to_string(), value))
}


#[cfg(test)]
mod proptest_tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn json_scalars_keep_their_type(key in "[a-z][a-z_]{0,11}", n: i64, flag: bool) {
			for value in [Value::from(n), Value::Bool(flag), Value::Null] {
				let raw = format!("{key}={value}");
				prop_assert_eq!(parse_attribute(&raw), Ok((key.clone(), value)));
			}
		}

		#[test]
		fn bare_words_become_strings(key in "[a-z][a-z_]{0,11}", word in "[a-z]{1,12}") {
			prop_assume!(!matches!(word.as_str(), "true" | "false" | "null"));
			let (parsed_key, value) = parse_attribute(&format!("{key}={word}")).unwrap();
			prop_assert_eq!(parsed_key, key);
			prop_assert_eq!(value, Value::String(word));
		}
	}
}
