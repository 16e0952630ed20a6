// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::strategy::StrategyKind;

/// Why an evaluation resolved the way it did.
///
/// `Display` renders the human-readable justification carried by every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationReason {
	FlagNotFound,
	DependencyNotEnabled { dependency: String },
	DependencyCycle { flag_key: String },
	DependencyDepthExceeded { max_depth: usize },
	Disabled,
	EnabledForAll,
	DisabledByDefault,
	/// The strategy needs a user ID and the context has none.
	MissingUserId { strategy: StrategyKind },
	MissingOrganizationId,
	PercentageRollout {
		percentage: u32,
		bucket: u32,
		included: bool,
	},
	UserAllowlist { included: bool },
	OrganizationAllowlist { included: bool },
	NoAttributeRules,
	AttributeRulesMatched,
	/// First rule in the list that failed to match.
	AttributeRuleNotMatched { attribute: String },
	CustomEvaluator { enabled: bool },
	CustomEvaluatorError { message: String },
}

impl std::fmt::Display for EvaluationReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			EvaluationReason::FlagNotFound => write!(f, "Feature flag not found"),
			EvaluationReason::DependencyNotEnabled { dependency } => {
				write!(f, "Dependency '{dependency}' is not enabled")
			}
			EvaluationReason::DependencyCycle { flag_key } => {
				write!(f, "Dependency cycle detected at '{flag_key}'")
			}
			EvaluationReason::DependencyDepthExceeded { max_depth } => {
				write!(f, "Dependency chain exceeds maximum depth of {max_depth}")
			}
			EvaluationReason::Disabled => write!(f, "Feature is disabled"),
			EvaluationReason::EnabledForAll => write!(f, "Feature is enabled for all users"),
			EvaluationReason::DisabledByDefault => write!(f, "Feature is disabled by default"),
			EvaluationReason::MissingUserId { strategy } => match strategy {
				StrategyKind::Percentage => write!(f, "User ID required for percentage rollout"),
				StrategyKind::Users => write!(f, "User ID required for user targeting"),
				other => write!(f, "User ID required for {other} strategy"),
			},
			EvaluationReason::MissingOrganizationId => {
				write!(f, "Organization ID required for organization targeting")
			}
			EvaluationReason::PercentageRollout {
				percentage,
				bucket,
				included,
			} => {
				let position = if *included { "within" } else { "outside" };
				write!(f, "User is {position} {percentage}% rollout (bucket {bucket})")
			}
			EvaluationReason::UserAllowlist { included: true } => write!(f, "User is in allowlist"),
			EvaluationReason::UserAllowlist { included: false } => {
				write!(f, "User is not in allowlist")
			}
			EvaluationReason::OrganizationAllowlist { included: true } => {
				write!(f, "Organization is in allowlist")
			}
			EvaluationReason::OrganizationAllowlist { included: false } => {
				write!(f, "Organization is not in allowlist")
			}
			EvaluationReason::NoAttributeRules => write!(f, "No attribute rules defined"),
			EvaluationReason::AttributeRulesMatched => write!(f, "All attribute rules matched"),
			EvaluationReason::AttributeRuleNotMatched { attribute } => {
				write!(f, "Attribute rule on '{attribute}' did not match")
			}
			EvaluationReason::CustomEvaluator { enabled: true } => {
				write!(f, "Custom evaluator enabled the feature")
			}
			EvaluationReason::CustomEvaluator { enabled: false } => {
				write!(f, "Custom evaluator disabled the feature")
			}
			EvaluationReason::CustomEvaluatorError { message } => {
				write!(f, "Custom evaluator error: {message}")
			}
		}
	}
}

/// Outcome of evaluating one flag for one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
	pub key: String,
	pub enabled: bool,
	pub reason: EvaluationReason,
	/// Strategy of the evaluated flag; `None` only when the flag was not found.
	pub strategy: Option<StrategyKind>,
	/// Reserved for multi-variant experiments.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub variant: Option<String>,
}

impl EvaluationResult {
	pub fn new(
		key: impl Into<String>,
		enabled: bool,
		reason: EvaluationReason,
		strategy: Option<StrategyKind>,
	) -> Self {
		Self {
			key: key.into(),
			enabled,
			reason,
			strategy,
			variant: None,
		}
	}

	pub fn not_found(key: impl Into<String>) -> Self {
		Self::new(key, false, EvaluationReason::FlagNotFound, None)
	}

	pub fn disabled(key: impl Into<String>, strategy: StrategyKind, reason: EvaluationReason) -> Self {
		Self::new(key, false, reason, Some(strategy))
	}

	/// The human-readable justification, e.g. `Dependency 'sso_saml' is not enabled`.
	pub fn reason_message(&self) -> String {
		self.reason.to_string()
	}
}

/// Results for every flag in one registry snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEvaluationResult {
	pub results: Vec<EvaluationResult>,
	pub evaluated_at: DateTime<Utc>,
}

impl BulkEvaluationResult {
	pub fn new(results: Vec<EvaluationResult>) -> Self {
		Self {
			results,
			evaluated_at: Utc::now(),
		}
	}

	pub fn get(&self, key: &str) -> Option<&EvaluationResult> {
		self.results.iter().find(|r| r.key == key)
	}

	pub fn is_enabled(&self, key: &str) -> bool {
		self.get(key).is_some_and(|r| r.enabled)
	}

	pub fn enabled_keys(&self) -> Vec<&str> {
		self
			.results
			.iter()
			.filter(|r| r.enabled)
			.map(|r| r.key.as_str())
			.collect()
	}

	pub fn len(&self) -> usize {
		self.results.len()
	}

	pub fn is_empty(&self) -> bool {
		self.results.is_empty()
	}
}
