// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Warden feature rollout engine.
//!
//! This crate holds the data contracts shared by the evaluation engine
//! (`warden-flags`) and its callers: flag configuration, rollout strategies,
//! attribute rules, the evaluation context, and evaluation results.
//!
//! # Overview
//!
//! - Rollout strategies: disabled, enabled, percentage, user and organization
//!   allowlists, attribute rules, and injected custom predicates
//! - Flag dependencies evaluated before a flag's own strategy
//! - Static catalogs (built-in, TOML or JSON) used to seed a registry
//! - Typed evaluation reasons with human-readable messages
//!
//! # Example
//!
//! ```
//! use warden_flags_core::{
//!     EvaluationContext, EvaluationReason, EvaluationResult, StrategyKind,
//! };
//!
//! let ctx = EvaluationContext::new()
//!     .with_user_id("user123")
//!     .with_plan("enterprise")
//!     .with_attribute("seats", serde_json::json!(40));
//!
//! let result = EvaluationResult::new(
//!     "sso_saml",
//!     true,
//!     EvaluationReason::AttributeRulesMatched,
//!     Some(StrategyKind::Attributes),
//! );
//! assert_eq!(result.reason_message(), "All attribute rules matched");
//! ```

pub mod catalog;
pub mod context;
pub mod custom;
pub mod error;
pub mod evaluation;
pub mod flag;
pub mod strategy;

pub use catalog::FlagCatalog;
pub use context::{EvaluationContext, RequestContext};
pub use custom::{CustomEvaluator, CustomEvaluatorError, CustomEvaluatorRef};
pub use error::{FlagsError, Result};
pub use evaluation::{BulkEvaluationResult, EvaluationReason, EvaluationResult};
pub use flag::{FlagConfig, FlagMetadata, FlagUpdate};
pub use strategy::{
	AttributeOperator, AttributeRule, BucketSalt, Percentage, RolloutStrategy, StrategyKind,
};

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn flag_key_starts_with_lowercase(s in "[a-z][a-z0-9_]{2,99}") {
			prop_assert!(FlagConfig::validate_key(&s));
		}

		#[test]
		fn flag_key_rejects_uppercase(s in "[A-Z][a-z0-9_]{2,99}") {
			prop_assert!(!FlagConfig::validate_key(&s));
		}

		#[test]
		fn flag_key_rejects_too_short(s in "[a-z][a-z0-9_]{0,1}") {
			prop_assert!(!FlagConfig::validate_key(&s));
		}

		#[test]
		fn flag_key_with_dots_valid(domain in "[a-z][a-z0-9_]{1,10}", feature in "[a-z][a-z0-9_]{1,10}") {
			let key = format!("{}.{}", domain, feature);
			prop_assert!(FlagConfig::validate_key(&key));
		}

		#[test]
		fn percentage_accepts_only_0_to_100(value in 0u32..1000) {
			prop_assert_eq!(Percentage::new(value).is_ok(), value <= 100);
		}

		#[test]
		fn update_never_changes_key(key in "[a-z][a-z0-9_]{2,30}", enabled in proptest::bool::ANY) {
			let mut flag = FlagConfig::disabled(key.clone());
			FlagUpdate::new()
				.enabled_default(enabled)
				.strategy(RolloutStrategy::Enabled)
				.apply_to(&mut flag);
			prop_assert_eq!(flag.key, key);
			prop_assert_eq!(flag.enabled_default, enabled);
		}

		#[test]
		fn result_roundtrips_through_json(key in "[a-z][a-z0-9_]{2,30}", enabled in proptest::bool::ANY) {
			let result = EvaluationResult::new(
				key,
				enabled,
				EvaluationReason::CustomEvaluator { enabled },
				Some(StrategyKind::Custom),
			);
			let json = serde_json::to_string(&result).unwrap();
			let parsed: EvaluationResult = serde_json::from_str(&json).unwrap();
			prop_assert_eq!(parsed, result);
		}
	}
}
