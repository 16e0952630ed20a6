// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use serde::{Deserialize, Serialize};

use crate::sections::{CatalogConfigLayer, EvaluationConfigLayer, LoggingConfigLayer};

/// One source's view of the configuration. Absent sections and fields fall
/// through to lower-precedence sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfigLayer {
	pub evaluation: Option<EvaluationConfigLayer>,
	pub catalog: Option<CatalogConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

impl EngineConfigLayer {
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.evaluation, other.evaluation, EvaluationConfigLayer::merge);
		merge_section(&mut self.catalog, other.catalog, CatalogConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(base), Some(other)) => merge(base, other),
		(None, Some(other)) => *base = Some(other),
		(_, None) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use warden_flags_core::BucketSalt;

	#[test]
	fn test_merge_fills_missing_sections() {
		let mut base = EngineConfigLayer::default();
		base.merge(EngineConfigLayer {
			logging: Some(LoggingConfigLayer {
				level: Some("debug".to_string()),
				format: None,
			}),
			..Default::default()
		});
		assert_eq!(
			base.logging.as_ref().and_then(|l| l.level.as_deref()),
			Some("debug")
		);
		assert!(base.evaluation.is_none());
	}

	#[test]
	fn test_merge_combines_fields_within_section() {
		let mut base = EngineConfigLayer {
			evaluation: Some(EvaluationConfigLayer {
				custom_evaluator_timeout_ms: Some(500),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(EngineConfigLayer {
			evaluation: Some(EvaluationConfigLayer {
				bucket_salt: Some(BucketSalt::FlagKey),
				..Default::default()
			}),
			..Default::default()
		});

		let evaluation = base.evaluation.unwrap();
		assert_eq!(evaluation.custom_evaluator_timeout_ms, Some(500));
		assert_eq!(evaluation.bucket_salt, Some(BucketSalt::FlagKey));
	}

	#[test]
	fn test_deserialize_full_file() {
		let toml_str = r#"
[evaluation]
custom_evaluator_timeout_ms = 100
max_dependency_depth = 8

[catalog]
path = "/etc/warden/flags.toml"

[logging]
level = "warn"
format = "json"
"#;
		let layer: EngineConfigLayer = toml::from_str(toml_str).unwrap();
		assert_eq!(
			layer.evaluation.as_ref().and_then(|e| e.max_dependency_depth),
			Some(8)
		);
		assert!(layer.catalog.and_then(|c| c.path).is_some());
		assert!(layer.logging.is_some());
	}
}
