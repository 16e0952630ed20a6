// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};
use warden_flags_core::BucketSalt;

use crate::error::ConfigError;
use crate::layer::EngineConfigLayer;
use crate::sections::{CatalogConfigLayer, EvaluationConfigLayer, LogFormat, LoggingConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<EngineConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<EngineConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(EngineConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/warden/flags.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<EngineConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(EngineConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: EngineConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARDEN_FLAGS_<SECTION>_<FIELD>
#[derive(Debug, Default)]
pub struct EnvSource {
	/// Fixed variables used instead of the process environment.
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads only the given variables.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn parsed<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		match self.var(name) {
			Some(v) => v.trim().parse().map(Some).map_err(|e: T::Err| {
				ConfigError::invalid_value(name, format!("invalid value '{v}': {e}"))
			}),
			None => Ok(None),
		}
	}

	fn load_evaluation(&self) -> Result<EvaluationConfigLayer, ConfigError> {
		Ok(EvaluationConfigLayer {
			custom_evaluator_timeout_ms: self
				.parsed("WARDEN_FLAGS_EVALUATION_CUSTOM_EVALUATOR_TIMEOUT_MS")?,
			max_dependency_depth: self.parsed("WARDEN_FLAGS_EVALUATION_MAX_DEPENDENCY_DEPTH")?,
			bucket_salt: self.parsed::<BucketSalt>("WARDEN_FLAGS_EVALUATION_BUCKET_SALT")?,
		})
	}

	fn load_catalog(&self) -> CatalogConfigLayer {
		CatalogConfigLayer {
			path: self.var("WARDEN_FLAGS_CATALOG_PATH").map(PathBuf::from),
		}
	}

	fn load_logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		Ok(LoggingConfigLayer {
			level: self.var("WARDEN_FLAGS_LOGGING_LEVEL"),
			format: self.parsed::<LogFormat>("WARDEN_FLAGS_LOGGING_FORMAT")?,
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<EngineConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(EngineConfigLayer {
			evaluation: Some(self.load_evaluation()?),
			catalog: Some(self.load_catalog()),
			logging: Some(self.load_logging()?),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.evaluation.is_none());
		assert!(layer.catalog.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/flags.toml").load().unwrap();
		assert_eq!(layer, EngineConfigLayer::default());
	}

	#[test]
	fn test_toml_source_reads_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[evaluation]\nmax_dependency_depth = 4").unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.evaluation.unwrap().max_dependency_depth, Some(4));
	}

	#[test]
	fn test_toml_source_parse_error() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[evaluation\nmax_dependency_depth = ").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_source_reads_variables() {
		let source = EnvSource::from_vars([
			("WARDEN_FLAGS_EVALUATION_CUSTOM_EVALUATOR_TIMEOUT_MS", "75"),
			("WARDEN_FLAGS_EVALUATION_BUCKET_SALT", "flag_key"),
			("WARDEN_FLAGS_CATALOG_PATH", "/srv/flags.json"),
			("WARDEN_FLAGS_LOGGING_FORMAT", "json"),
		]);
		let layer = source.load().unwrap();

		let evaluation = layer.evaluation.unwrap();
		assert_eq!(evaluation.custom_evaluator_timeout_ms, Some(75));
		assert_eq!(evaluation.bucket_salt, Some(BucketSalt::FlagKey));
		assert!(evaluation.max_dependency_depth.is_none());
		assert_eq!(
			layer.catalog.unwrap().path,
			Some(PathBuf::from("/srv/flags.json"))
		);
		assert_eq!(layer.logging.unwrap().format, Some(LogFormat::Json));
	}

	#[test]
	fn test_env_source_ignores_empty_values() {
		let source = EnvSource::from_vars([("WARDEN_FLAGS_LOGGING_LEVEL", "")]);
		assert!(source.load().unwrap().logging.unwrap().level.is_none());
	}

	#[test]
	fn test_env_source_rejects_bad_number() {
		let source =
			EnvSource::from_vars([("WARDEN_FLAGS_EVALUATION_MAX_DEPENDENCY_DEPTH", "deep")]);
		let err = source.load().unwrap_err();
		assert!(
			matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "WARDEN_FLAGS_EVALUATION_MAX_DEPENDENCY_DEPTH")
		);
	}
}
