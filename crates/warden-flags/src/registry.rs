// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory flag registry with copy-on-write snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, instrument};
use warden_flags_core::{FlagCatalog, FlagConfig, FlagUpdate, FlagsError, Result};

/// An immutable view of every flag at one point in time.
///
/// Evaluations read from a single snapshot so a concurrent update can never
/// change a dependency halfway through a decision.
#[derive(Debug, Clone)]
pub struct FlagSnapshot(Arc<HashMap<String, FlagConfig>>);

impl FlagSnapshot {
	pub fn get(&self, key: &str) -> Option<&FlagConfig> {
		self.0.get(key)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Keys in sorted order.
	pub fn keys(&self) -> Vec<&str> {
		let mut keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
		keys.sort_unstable();
		keys
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Keyed store of flag configurations.
///
/// Reads clone an `Arc` to the current map; updates build a new map and swap
/// it in under the write lock, so readers only ever see whole updates.
#[derive(Debug)]
pub struct FlagRegistry {
	flags: RwLock<Arc<HashMap<String, FlagConfig>>>,
}

impl FlagRegistry {
	/// Builds a registry from a catalog after validating it.
	///
	/// Seeding is strict: malformed keys, duplicates, unknown dependencies and
	/// cycles are rejected here. [`FlagRegistry::update_flag`] does not repeat
	/// these checks, so an update may leave a dangling or cyclic dependency,
	/// which the evaluator then treats as not enabled.
	pub fn new(catalog: FlagCatalog) -> Result<Self> {
		catalog.validate()?;

		let flags: HashMap<String, FlagConfig> = catalog
			.flags
			.into_iter()
			.map(|flag| (flag.key.clone(), flag))
			.collect();

		debug!(flag_count = flags.len(), "flag registry created");

		Ok(Self {
			flags: RwLock::new(Arc::new(flags)),
		})
	}

	/// Registry seeded with [`FlagCatalog::builtin`].
	pub fn builtin() -> Result<Self> {
		Self::new(FlagCatalog::builtin())
	}

	pub fn snapshot(&self) -> FlagSnapshot {
		FlagSnapshot(Arc::clone(&self.flags.read()))
	}

	pub fn get_flag(&self, key: &str) -> Option<FlagConfig> {
		self.flags.read().get(key).cloned()
	}

	/// Every flag, sorted by key.
	pub fn get_all_flags(&self) -> Vec<FlagConfig> {
		let snapshot = self.snapshot();
		let mut flags: Vec<FlagConfig> = snapshot.0.values().cloned().collect();
		flags.sort_by(|a, b| a.key.cmp(&b.key));
		flags
	}

	pub fn contains(&self, key: &str) -> bool {
		self.flags.read().contains_key(key)
	}

	pub fn len(&self) -> usize {
		self.flags.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.flags.read().is_empty()
	}

	/// Merges `update` into the flag `key`. The key itself never changes.
	///
	/// Fails with [`FlagsError::NotFound`] when `key` is not registered.
	#[instrument(skip(self, update), fields(flag_key = %key))]
	pub fn update_flag(&self, key: &str, update: FlagUpdate) -> Result<()> {
		let mut guard = self.flags.write();
		if !guard.contains_key(key) {
			return Err(FlagsError::not_found(key));
		}

		let mut next: HashMap<String, FlagConfig> = (**guard).clone();
		let strategy_changed = update.strategy.is_some();
		if let Some(flag) = next.get_mut(key) {
			update.apply_to(flag);
			info!(
				strategy = %flag.strategy_kind(),
				enabled_default = flag.enabled_default,
				strategy_changed,
				dependencies = flag.dependencies.len(),
				"feature flag updated"
			);
		}
		*guard = Arc::new(next);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use warden_flags_core::{FlagMetadata, Percentage, RolloutStrategy, StrategyKind};

	fn registry() -> FlagRegistry {
		FlagRegistry::new(FlagCatalog::new(vec![
			FlagConfig::enabled("passkeys")
				.with_metadata(FlagMetadata::new().with_category("authentication")),
			FlagConfig::disabled("sso_saml"),
			FlagConfig::enabled("scim_provisioning").with_dependency("sso_saml"),
		]))
		.unwrap()
	}

	#[test]
	fn test_get_flag() {
		let registry = registry();
		let flag = registry.get_flag("passkeys").unwrap();
		assert_eq!(flag.key, "passkeys");
		assert_eq!(flag.metadata.category.as_deref(), Some("authentication"));
		assert!(registry.get_flag("ghost").is_none());
	}

	#[test]
	fn test_get_all_flags_sorted() {
		let registry = registry();
		let keys: Vec<String> = registry.get_all_flags().into_iter().map(|f| f.key).collect();
		assert_eq!(keys, vec!["passkeys", "scim_provisioning", "sso_saml"]);
		assert_eq!(registry.len(), 3);
		assert!(!registry.is_empty());
	}

	#[test]
	fn test_update_visible_immediately() {
		let registry = registry();
		registry
			.update_flag("passkeys", FlagUpdate::new().enabled_default(false))
			.unwrap();

		let flag = registry.get_flag("passkeys").unwrap();
		assert_eq!(flag.key, "passkeys");
		assert!(!flag.enabled_default);
		assert_eq!(flag.metadata.category.as_deref(), Some("authentication"));
	}

	#[test]
	fn test_update_unknown_key_fails() {
		let registry = registry();
		let err = registry
			.update_flag("ghost", FlagUpdate::new().enabled_default(true))
			.unwrap_err();
		assert!(matches!(err, FlagsError::NotFound { ref key } if key == "ghost"));
		assert_eq!(registry.len(), 3);
	}

	#[test]
	fn test_snapshot_is_isolated_from_updates() {
		let registry = registry();
		let before = registry.snapshot();

		registry
			.update_flag(
				"sso_saml",
				FlagUpdate::new().strategy(RolloutStrategy::percentage(Percentage::ALL)),
			)
			.unwrap();

		assert_eq!(
			before.get("sso_saml").unwrap().strategy_kind(),
			StrategyKind::Disabled
		);
		assert_eq!(
			registry.snapshot().get("sso_saml").unwrap().strategy_kind(),
			StrategyKind::Percentage
		);
	}

	#[test]
	fn test_invalid_catalog_rejected() {
		let err = FlagRegistry::new(FlagCatalog::new(vec![
			FlagConfig::enabled("scim_provisioning").with_dependency("sso_saml"),
		]))
		.unwrap_err();
		assert!(matches!(err, FlagsError::UnknownDependency { .. }));
	}

	#[test]
	fn test_update_may_leave_dangling_dependency() {
		let registry = registry();
		registry
			.update_flag("passkeys", FlagUpdate::new().dependencies(["webauthn_v2"]))
			.unwrap();

		assert_eq!(
			registry.get_flag("passkeys").unwrap().dependencies,
			vec!["webauthn_v2".to_string()]
		);
		assert!(FlagCatalog::new(registry.get_all_flags()).validate().is_err());
	}

	#[test]
	fn test_builtin_registry() {
		let registry = FlagRegistry::builtin().unwrap();
		assert_eq!(registry.len(), FlagCatalog::builtin().len());
		assert!(registry.contains("scim_provisioning"));
		assert_eq!(registry.snapshot().keys().len(), registry.len());
	}
}
