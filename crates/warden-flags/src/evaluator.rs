// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, instrument};
use warden_flags_core::{
	BucketSalt, BulkEvaluationResult, EvaluationContext, EvaluationReason, EvaluationResult,
	FlagConfig, RolloutStrategy, StrategyKind,
};

use crate::bucket;
use crate::custom::run_guarded;
use crate::matcher::{evaluate_rules, RuleMatch};
use crate::registry::{FlagRegistry, FlagSnapshot};

/// Tunables for the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorOptions {
	/// Upper bound on a single custom evaluator call.
	pub custom_evaluator_timeout: Duration,
	/// Longest dependency chain followed before failing closed.
	pub max_dependency_depth: usize,
	pub bucket_salt: BucketSalt,
}

impl Default for EvaluatorOptions {
	fn default() -> Self {
		Self {
			custom_evaluator_timeout: Duration::from_millis(250),
			max_dependency_depth: 16,
			bucket_salt: BucketSalt::None,
		}
	}
}

/// Decides whether flags are active for a context.
///
/// Evaluation never fails: every problem resolves to a disabled result
/// carrying a reason.
#[derive(Debug, Clone)]
pub struct Evaluator {
	registry: Arc<FlagRegistry>,
	options: EvaluatorOptions,
}

impl Evaluator {
	pub fn new(registry: Arc<FlagRegistry>, options: EvaluatorOptions) -> Self {
		Self { registry, options }
	}

	pub fn with_defaults(registry: Arc<FlagRegistry>) -> Self {
		Self::new(registry, EvaluatorOptions::default())
	}

	pub fn registry(&self) -> &Arc<FlagRegistry> {
		&self.registry
	}

	pub fn options(&self) -> &EvaluatorOptions {
		&self.options
	}

	/// Evaluates `key` for `context`.
	///
	/// The evaluation order is:
	/// 1. Look up the flag in one registry snapshot
	/// 2. Evaluate dependencies in listed order, stopping at the first disabled one
	/// 3. Dispatch on the flag's strategy
	///
	/// Custom evaluators run under `tokio::time::timeout`, so this must be
	/// polled inside a Tokio runtime with the time driver enabled.
	#[instrument(skip(self, key, context), fields(flag_key = %key))]
	pub async fn evaluate(&self, key: &str, context: &EvaluationContext) -> EvaluationResult {
		let snapshot = self.registry.snapshot();
		let mut path = Vec::new();
		let result = self.evaluate_in(&snapshot, key, context, &mut path).await;

		debug!(
			enabled = result.enabled,
			strategy = ?result.strategy,
			reason = %result.reason,
			"feature flag evaluated"
		);
		result
	}

	/// `evaluate(key, context).enabled`.
	pub async fn is_enabled(&self, key: &str, context: &EvaluationContext) -> bool {
		self.evaluate(key, context).await.enabled
	}

	/// Evaluates every registered flag against one snapshot, sorted by key.
	#[instrument(skip(self, context))]
	pub async fn evaluate_all(&self, context: &EvaluationContext) -> BulkEvaluationResult {
		let snapshot = self.registry.snapshot();
		let mut results = Vec::with_capacity(snapshot.len());

		for key in snapshot.keys() {
			let mut path = Vec::new();
			results.push(self.evaluate_in(&snapshot, key, context, &mut path).await);
		}

		debug!(
			flag_count = results.len(),
			enabled_count = results.iter().filter(|r| r.enabled).count(),
			"feature flags evaluated"
		);
		BulkEvaluationResult::new(results)
	}

	/// Evaluates `key` with `path` holding the dependency chain that led here.
	fn evaluate_in<'a>(
		&'a self,
		snapshot: &'a FlagSnapshot,
		key: &'a str,
		context: &'a EvaluationContext,
		path: &'a mut Vec<String>,
	) -> BoxFuture<'a, EvaluationResult> {
		async move {
			let Some(flag) = snapshot.get(key) else {
				return EvaluationResult::not_found(key);
			};
			let kind = flag.strategy_kind();

			if path.iter().any(|k| k == key) {
				return EvaluationResult::disabled(
					key,
					kind,
					EvaluationReason::DependencyCycle {
						flag_key: key.to_string(),
					},
				);
			}
			if path.len() >= self.options.max_dependency_depth {
				return EvaluationResult::disabled(
					key,
					kind,
					EvaluationReason::DependencyDepthExceeded {
						max_depth: self.options.max_dependency_depth,
					},
				);
			}

			if !flag.dependencies.is_empty() {
				path.push(key.to_string());
				let blocked = self.check_dependencies(snapshot, flag, context, path).await;
				path.pop();

				if let Some(reason) = blocked {
					return EvaluationResult::disabled(key, kind, reason);
				}
			}

			self.apply_strategy(flag, context).await
		}
		.boxed()
	}

	/// Returns the reason the first disabled dependency blocks `flag`, if any.
	///
	/// Cycle and depth failures found further down the chain are passed up
	/// unchanged so the caller sees the structural problem.
	async fn check_dependencies(
		&self,
		snapshot: &FlagSnapshot,
		flag: &FlagConfig,
		context: &EvaluationContext,
		path: &mut Vec<String>,
	) -> Option<EvaluationReason> {
		for dependency in &flag.dependencies {
			let result = self.evaluate_in(snapshot, dependency, context, path).await;
			if result.enabled {
				continue;
			}

			return Some(match result.reason {
				reason @ (EvaluationReason::DependencyCycle { .. }
				| EvaluationReason::DependencyDepthExceeded { .. }) => reason,
				_ => EvaluationReason::DependencyNotEnabled {
					dependency: dependency.clone(),
				},
			});
		}
		None
	}

	async fn apply_strategy(&self, flag: &FlagConfig, context: &EvaluationContext) -> EvaluationResult {
		let kind = flag.strategy_kind();
		let (enabled, reason) = match &flag.strategy {
			RolloutStrategy::Disabled => (false, EvaluationReason::Disabled),
			RolloutStrategy::Enabled => {
				if flag.enabled_default {
					(true, EvaluationReason::EnabledForAll)
				} else {
					(false, EvaluationReason::DisabledByDefault)
				}
			}
			RolloutStrategy::Percentage { percentage } => match context.user_id.as_deref() {
				None => (
					false,
					EvaluationReason::MissingUserId {
						strategy: StrategyKind::Percentage,
					},
				),
				Some(user_id) => {
					let seed = self.options.bucket_salt.seed(&flag.key, user_id);
					let bucket = bucket::bucket(&seed);
					let included = bucket::bucket_in_rollout(bucket, *percentage);
					(
						included,
						EvaluationReason::PercentageRollout {
							percentage: percentage.value(),
							bucket,
							included,
						},
					)
				}
			},
			RolloutStrategy::Users { allowlist } => match context.user_id.as_deref() {
				None => (
					false,
					EvaluationReason::MissingUserId {
						strategy: StrategyKind::Users,
					},
				),
				Some(user_id) => {
					let included = allowlist.contains(user_id);
					(included, EvaluationReason::UserAllowlist { included })
				}
			},
			RolloutStrategy::Organizations { allowlist } => {
				match context.organization_id.as_deref() {
					None => (false, EvaluationReason::MissingOrganizationId),
					Some(org_id) => {
						let included = allowlist.contains(org_id);
						(included, EvaluationReason::OrganizationAllowlist { included })
					}
				}
			}
			RolloutStrategy::Attributes { rules } => match evaluate_rules(rules, context) {
				RuleMatch::NoRules => (false, EvaluationReason::NoAttributeRules),
				RuleMatch::Matched => (true, EvaluationReason::AttributeRulesMatched),
				RuleMatch::NotMatched(rule) => (
					false,
					EvaluationReason::AttributeRuleNotMatched {
						attribute: rule.attribute.clone(),
					},
				),
			},
			RolloutStrategy::Custom { evaluator } => match evaluator {
				None => (
					false,
					EvaluationReason::CustomEvaluatorError {
						message: "no evaluator configured".to_string(),
					},
				),
				Some(evaluator) => {
					match run_guarded(evaluator, context, self.options.custom_evaluator_timeout).await {
						Ok(enabled) => (enabled, EvaluationReason::CustomEvaluator { enabled }),
						Err(message) => (false, EvaluationReason::CustomEvaluatorError { message }),
					}
				}
			},
		};

		EvaluationResult::new(&flag.key, enabled, reason, Some(kind))
	}
}
