// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Feature rollout evaluation engine for Warden.
//!
//! Decides whether a named feature is active for a caller. Flags live in a
//! [`FlagRegistry`] seeded from a catalog; an [`Evaluator`] resolves a flag's
//! dependencies and then applies its rollout strategy. Evaluation never
//! fails: every outcome is a result carrying a human-readable reason.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_flags::{EvaluationContext, Evaluator, FlagRegistry};
//!
//! # tokio_test::block_on(async {
//! let registry = Arc::new(FlagRegistry::builtin().unwrap());
//! let evaluator = Evaluator::with_defaults(registry);
//!
//! let pro = EvaluationContext::new().with_user_id("user-1").with_plan("pro");
//! assert!(evaluator.is_enabled("premium_features", &pro).await);
//!
//! let result = evaluator.evaluate("scim_provisioning", &pro).await;
//! assert_eq!(result.reason_message(), "Dependency 'sso_saml' is not enabled");
//! # });
//! ```

pub mod bucket;
pub mod custom;
pub mod evaluator;
pub mod matcher;
pub mod registry;

pub use custom::{evaluator_fn, run_guarded, FnEvaluator};
pub use evaluator::{Evaluator, EvaluatorOptions};
pub use matcher::{evaluate_rules, match_all, RuleMatch};
pub use registry::{FlagRegistry, FlagSnapshot};

pub use warden_flags_core::{
	AttributeOperator, AttributeRule, BucketSalt, BulkEvaluationResult, CustomEvaluator,
	CustomEvaluatorError, CustomEvaluatorRef, EvaluationContext, EvaluationReason,
	EvaluationResult, FlagCatalog, FlagConfig, FlagMetadata, FlagUpdate, FlagsError, Percentage,
	RequestContext, Result, RolloutStrategy, StrategyKind,
};
