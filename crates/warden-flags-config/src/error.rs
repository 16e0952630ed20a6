// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// Config file exists but could not be read
	#[error("failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// A single setting could not be parsed
	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	/// Settings parsed but are unusable together
	#[error("validation error: {0}")]
	Validation(String),
}

impl ConfigError {
	pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			key: key.into(),
			message: message.into(),
		}
	}

	pub fn validation(message: impl Into<String>) -> Self {
		Self::Validation(message.into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_messages() {
		let err = ConfigError::invalid_value("WARDEN_FLAGS_EVALUATION_MAX_DEPENDENCY_DEPTH", "not a number");
		assert_eq!(
			err.to_string(),
			"invalid value for WARDEN_FLAGS_EVALUATION_MAX_DEPENDENCY_DEPTH: not a number"
		);

		let err = ConfigError::validation("max_dependency_depth must be at least 1");
		assert_eq!(
			err.to_string(),
			"validation error: max_dependency_depth must be at least 1"
		);
	}
}
