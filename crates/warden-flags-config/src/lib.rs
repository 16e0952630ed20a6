// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Warden feature rollout engine.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_FLAGS_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_flags_config::load_config;
//!
//! let config = load_config()?;
//! println!("custom evaluator budget: {}ms", config.evaluation.custom_evaluator_timeout_ms);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::EngineConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved engine configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
	pub evaluation: EvaluationConfig,
	pub catalog: CatalogConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_FLAGS_*`)
/// 2. Config file (`/etc/warden/flags.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<EngineConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	];
	load_from_sources(sources)
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<EngineConfig, ConfigError> {
	let mut merged = EngineConfigLayer::default();
	merged.merge(EnvSource::new().load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<EngineConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	];
	load_from_sources(sources)
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<EngineConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = EngineConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: EngineConfigLayer) -> Result<EngineConfig, ConfigError> {
	let evaluation = layer.evaluation.unwrap_or_default().finalize();
	let catalog = layer.catalog.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&evaluation)?;

	info!(
		custom_evaluator_timeout_ms = evaluation.custom_evaluator_timeout_ms,
		max_dependency_depth = evaluation.max_dependency_depth,
		bucket_salt = ?evaluation.bucket_salt,
		catalog = %catalog
			.path
			.as_ref()
			.map(|p| p.display().to_string())
			.unwrap_or_else(|| "builtin".to_string()),
		"Engine configuration loaded"
	);

	Ok(EngineConfig {
		evaluation,
		catalog,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(evaluation: &EvaluationConfig) -> Result<(), ConfigError> {
	if evaluation.custom_evaluator_timeout_ms == 0 {
		return Err(ConfigError::validation(
			"custom_evaluator_timeout_ms must be greater than zero",
		));
	}
	if evaluation.max_dependency_depth == 0 {
		return Err(ConfigError::validation(
			"max_dependency_depth must be at least 1",
		));
	}

	Ok(())
}
