// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation configuration section.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_flags_core::BucketSalt;

pub const DEFAULT_CUSTOM_EVALUATOR_TIMEOUT_MS: u64 = 250;
pub const DEFAULT_MAX_DEPENDENCY_DEPTH: usize = 16;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationConfigLayer {
	pub custom_evaluator_timeout_ms: Option<u64>,
	pub max_dependency_depth: Option<usize>,
	pub bucket_salt: Option<BucketSalt>,
}

impl EvaluationConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.custom_evaluator_timeout_ms.is_some() {
			self.custom_evaluator_timeout_ms = other.custom_evaluator_timeout_ms;
		}
		if other.max_dependency_depth.is_some() {
			self.max_dependency_depth = other.max_dependency_depth;
		}
		if other.bucket_salt.is_some() {
			self.bucket_salt = other.bucket_salt;
		}
	}

	pub fn finalize(self) -> EvaluationConfig {
		EvaluationConfig {
			custom_evaluator_timeout_ms: self
				.custom_evaluator_timeout_ms
				.unwrap_or(DEFAULT_CUSTOM_EVALUATOR_TIMEOUT_MS),
			max_dependency_depth: self
				.max_dependency_depth
				.unwrap_or(DEFAULT_MAX_DEPENDENCY_DEPTH),
			bucket_salt: self.bucket_salt.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationConfig {
	pub custom_evaluator_timeout_ms: u64,
	pub max_dependency_depth: usize,
	pub bucket_salt: BucketSalt,
}

impl EvaluationConfig {
	pub fn custom_evaluator_timeout(&self) -> Duration {
		Duration::from_millis(self.custom_evaluator_timeout_ms)
	}
}

impl Default for EvaluationConfig {
	fn default() -> Self {
		Self {
			custom_evaluator_timeout_ms: DEFAULT_CUSTOM_EVALUATOR_TIMEOUT_MS,
			max_dependency_depth: DEFAULT_MAX_DEPENDENCY_DEPTH,
			bucket_salt: BucketSalt::None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = EvaluationConfig::default();
		assert_eq!(config.custom_evaluator_timeout(), Duration::from_millis(250));
		assert_eq!(config.max_dependency_depth, 16);
		assert_eq!(config.bucket_salt, BucketSalt::None);
	}

	#[test]
	fn test_layer_finalize_defaults() {
		let config = EvaluationConfigLayer::default().finalize();
		assert_eq!(config, EvaluationConfig::default());
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = EvaluationConfigLayer {
			custom_evaluator_timeout_ms: Some(100),
			max_dependency_depth: Some(8),
			..Default::default()
		};
		let overlay = EvaluationConfigLayer {
			max_dependency_depth: Some(4),
			bucket_salt: Some(BucketSalt::FlagKey),
			..Default::default()
		};
		base.merge(overlay);
		assert_eq!(base.custom_evaluator_timeout_ms, Some(100));
		assert_eq!(base.max_dependency_depth, Some(4));
		assert_eq!(base.bucket_salt, Some(BucketSalt::FlagKey));
	}

	#[test]
	fn test_deserialize_layer_partial() {
		let toml_str = r#"
bucket_salt = "flag_key"
"#;
		let layer: EvaluationConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(layer.bucket_salt, Some(BucketSalt::FlagKey));
		assert!(layer.custom_evaluator_timeout_ms.is_none());
		assert!(layer.max_dependency_depth.is_none());
	}
}
