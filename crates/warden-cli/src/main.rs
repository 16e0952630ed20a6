// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod cli;
mod commands;
mod logging;

use clap::Parser;
use tracing::debug;
use warden_flags_config::{load_config, load_config_with_file};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let config = match &cli.config {
		Some(path) => load_config_with_file(path)?,
		None => load_config()?,
	};
	logging::init(&config.logging);
	debug!(?config, "configuration resolved");

	let catalog_path = cli.catalog.as_deref().or(config.catalog.path.as_deref());
	let catalog = commands::load_catalog(catalog_path)?;

	if let Command::Check = cli.command {
		return commands::handle_check(catalog);
	}

	let evaluator = commands::build_evaluator(&config.evaluation, catalog)?;

	match cli.command {
		Command::List { json } => commands::handle_list(evaluator.registry(), json),
		Command::Show { key, json } => commands::handle_show(evaluator.registry(), &key, json),
		Command::Eval(args) => commands::handle_eval(&evaluator, args).await,
		Command::EvalAll(args) => commands::handle_eval_all(&evaluator, args).await,
		Command::Check => Ok(()),
	}
}
