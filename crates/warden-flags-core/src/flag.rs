// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::custom::CustomEvaluatorRef;
use crate::strategy::{RolloutStrategy, StrategyKind};

/// Descriptive fields. They never influence evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagMetadata {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// e.g., "authentication", "enterprise"
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	/// e.g., "free", "pro", "enterprise"
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tier: Option<String>,
	#[serde(default)]
	pub beta: bool,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
}

impl FlagMetadata {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());
		self
	}

	pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
		self.tier = Some(tier.into());
		self
	}

	pub fn beta(mut self) -> Self {
		self.beta = true;
		self
	}
}

/// Configuration of a single feature flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagConfig {
	/// Unique across a registry and never changed after creation.
	pub key: String,
	pub strategy: RolloutStrategy,
	#[serde(default)]
	pub enabled_default: bool,
	/// Keys that must all evaluate enabled before this flag's strategy runs.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub dependencies: Vec<String>,
	#[serde(default)]
	pub metadata: FlagMetadata,
}

impl FlagConfig {
	pub fn new(key: impl Into<String>, strategy: RolloutStrategy) -> Self {
		Self {
			key: key.into(),
			strategy,
			enabled_default: false,
			dependencies: Vec::new(),
			metadata: FlagMetadata::default(),
		}
	}

	/// Shorthand for an `enabled` flag whose default is on.
	pub fn enabled(key: impl Into<String>) -> Self {
		Self::new(key, RolloutStrategy::Enabled).with_enabled_default(true)
	}

	pub fn disabled(key: impl Into<String>) -> Self {
		Self::new(key, RolloutStrategy::Disabled)
	}

	pub fn with_enabled_default(mut self, enabled_default: bool) -> Self {
		self.enabled_default = enabled_default;
		self
	}

	pub fn with_dependency(mut self, key: impl Into<String>) -> Self {
		self.dependencies.push(key.into());
		self
	}

	pub fn with_dependencies<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.dependencies.extend(keys.into_iter().map(Into::into));
		self
	}

	pub fn with_metadata(mut self, metadata: FlagMetadata) -> Self {
		self.metadata = metadata;
		self
	}

	/// Switches the flag to the `custom` strategy backed by `evaluator`.
	pub fn with_custom_evaluator(mut self, evaluator: CustomEvaluatorRef) -> Self {
		self.strategy = RolloutStrategy::custom(evaluator);
		self
	}

	pub fn strategy_kind(&self) -> StrategyKind {
		self.strategy.kind()
	}

	/// Validates the flag key format.
	///
	/// Rules:
	/// - 3-100 characters
	/// - First character is a lowercase letter
	/// - Remaining characters are lowercase letters, digits, `_` or `.`
	pub fn validate_key(key: &str) -> bool {
		if key.len() < 3 || key.len() > 100 {
			return false;
		}

		let mut chars = key.chars();

		match chars.next() {
			Some(c) if c.is_ascii_lowercase() => {}
			_ => return false,
		}

		chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
	}
}

/// Partial update merged into an existing [`FlagConfig`].
///
/// The key is not part of the update and is always preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagUpdate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub strategy: Option<RolloutStrategy>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled_default: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dependencies: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<FlagMetadata>,
}

impl FlagUpdate {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn strategy(mut self, strategy: RolloutStrategy) -> Self {
		self.strategy = Some(strategy);
		self
	}

	pub fn enabled_default(mut self, enabled_default: bool) -> Self {
		self.enabled_default = Some(enabled_default);
		self
	}

	pub fn dependencies<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.dependencies = Some(keys.into_iter().map(Into::into).collect());
		self
	}

	pub fn metadata(mut self, metadata: FlagMetadata) -> Self {
		self.metadata = Some(metadata);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.strategy.is_none()
			&& self.enabled_default.is_none()
			&& self.dependencies.is_none()
			&& self.metadata.is_none()
	}

	/// Merges the set fields into `flag`.
	pub fn apply_to(self, flag: &mut FlagConfig) {
		if let Some(strategy) = self.strategy {
			flag.strategy = strategy;
		}
		if let Some(enabled_default) = self.enabled_default {
			flag.enabled_default = enabled_default;
		}
		if let Some(dependencies) = self.dependencies {
			flag.dependencies = dependencies;
		}
		if let Some(metadata) = self.metadata {
			flag.metadata = metadata;
		}
	}
}
