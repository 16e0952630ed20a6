// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Static flag catalogs used to seed a registry.
//!
//! A catalog is either the built-in capability list or a TOML/JSON document
//! supplied by the embedding application:
//!
//! ```toml
//! [[flags]]
//! key = "biometric_auth"
//! dependencies = ["passkeys"]
//!
//! [flags.strategy]
//! type = "percentage"
//! percentage = 50
//!
//! [flags.metadata]
//! category = "authentication"
//! beta = true
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::custom::CustomEvaluatorRef;
use crate::error::{FlagsError, Result};
use crate::flag::{FlagConfig, FlagMetadata};
use crate::strategy::{AttributeOperator, AttributeRule, Percentage, RolloutStrategy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagCatalog {
	#[serde(default)]
	pub flags: Vec<FlagConfig>,
}

impl FlagCatalog {
	pub fn new(flags: Vec<FlagConfig>) -> Self {
		Self { flags }
	}

	pub fn from_toml_str(content: &str) -> Result<Self> {
		toml::from_str(content).map_err(|e| FlagsError::Catalog(e.to_string()))
	}

	pub fn from_json_str(content: &str) -> Result<Self> {
		serde_json::from_str(content).map_err(|e| FlagsError::Catalog(e.to_string()))
	}

	/// Reads a catalog file. `.json` files are parsed as JSON, everything else as TOML.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| FlagsError::Io {
			path: path.to_path_buf(),
			source,
		})?;

		match path.extension().and_then(|e| e.to_str()) {
			Some("json") => Self::from_json_str(&content),
			_ => Self::from_toml_str(&content),
		}
	}

	pub fn len(&self) -> usize {
		self.flags.len()
	}

	pub fn is_empty(&self) -> bool {
		self.flags.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&FlagConfig> {
		self.flags.iter().find(|f| f.key == key)
	}

	pub fn with_flag(mut self, flag: FlagConfig) -> Self {
		self.flags.push(flag);
		self
	}

	/// Attaches a custom evaluator to the flag `key`, switching it to the
	/// `custom` strategy.
	pub fn attach_evaluator(&mut self, key: &str, evaluator: CustomEvaluatorRef) -> Result<()> {
		let flag = self
			.flags
			.iter_mut()
			.find(|f| f.key == key)
			.ok_or_else(|| FlagsError::not_found(key))?;
		flag.strategy = RolloutStrategy::custom(evaluator);
		Ok(())
	}

	/// Checks keys, uniqueness, dependency targets and dependency cycles.
	pub fn validate(&self) -> Result<()> {
		let mut seen = HashSet::with_capacity(self.flags.len());
		for flag in &self.flags {
			if !FlagConfig::validate_key(&flag.key) {
				return Err(FlagsError::InvalidKey(flag.key.clone()));
			}
			if !seen.insert(flag.key.as_str()) {
				return Err(FlagsError::DuplicateKey(flag.key.clone()));
			}
		}

		for flag in &self.flags {
			for dependency in &flag.dependencies {
				if !seen.contains(dependency.as_str()) {
					return Err(FlagsError::UnknownDependency {
						flag: flag.key.clone(),
						dependency: dependency.clone(),
					});
				}
			}
		}

		self.check_cycles()
	}

	fn check_cycles(&self) -> Result<()> {
		let graph: HashMap<&str, &[String]> = self
			.flags
			.iter()
			.map(|f| (f.key.as_str(), f.dependencies.as_slice()))
			.collect();

		let mut done: HashSet<&str> = HashSet::new();
		let mut stack: Vec<&str> = Vec::new();

		for flag in &self.flags {
			visit(flag.key.as_str(), &graph, &mut done, &mut stack)?;
		}
		Ok(())
	}

	/// The default capability catalog of the identity platform.
	pub fn builtin() -> Self {
		let plan_in = |plans: &[&str]| {
			RolloutStrategy::attributes(vec![AttributeRule::new(
				"plan",
				AttributeOperator::In,
				json!(plans),
			)])
		};

		Self::new(vec![
			FlagConfig::enabled("passkeys").with_metadata(
				FlagMetadata::new()
					.with_name("Passkeys")
					.with_description("WebAuthn passkey sign-in")
					.with_category("authentication")
					.with_tier("free"),
			),
			FlagConfig::enabled("mfa_totp").with_metadata(
				FlagMetadata::new()
					.with_name("TOTP MFA")
					.with_category("mfa")
					.with_tier("free"),
			),
			FlagConfig::new("mfa_sms", plan_in(&["pro", "enterprise"])).with_metadata(
				FlagMetadata::new()
					.with_name("SMS MFA")
					.with_category("mfa")
					.with_tier("pro"),
			),
			FlagConfig::enabled("magic_link").with_metadata(
				FlagMetadata::new()
					.with_name("Magic links")
					.with_category("authentication")
					.with_tier("free"),
			),
			FlagConfig::new(
				"biometric_auth",
				RolloutStrategy::percentage(Percentage::new(50).unwrap_or(Percentage::NONE)),
			)
			.with_dependency("passkeys")
			.with_metadata(
				FlagMetadata::new()
					.with_name("Biometric authentication")
					.with_category("authentication")
					.with_tier("free")
					.beta(),
			),
			FlagConfig::new("sso_saml", plan_in(&["enterprise"])).with_metadata(
				FlagMetadata::new()
					.with_name("SAML SSO")
					.with_category("sso")
					.with_tier("enterprise"),
			),
			FlagConfig::new("sso_oidc", plan_in(&["pro", "enterprise"])).with_metadata(
				FlagMetadata::new()
					.with_name("OIDC SSO")
					.with_category("sso")
					.with_tier("pro"),
			),
			FlagConfig::enabled("scim_provisioning")
				.with_dependencies(["sso_saml", "sso_oidc"])
				.with_metadata(
					FlagMetadata::new()
						.with_name("SCIM provisioning")
						.with_category("enterprise")
						.with_tier("enterprise"),
				),
			FlagConfig::new("audit_logging", plan_in(&["pro", "enterprise"])).with_metadata(
				FlagMetadata::new()
					.with_name("Audit logging")
					.with_category("compliance")
					.with_tier("pro"),
			),
			FlagConfig::new(
				"custom_roles",
				RolloutStrategy::attributes(vec![
					AttributeRule::new("plan", AttributeOperator::Equals, json!("enterprise")),
					AttributeRule::new("role", AttributeOperator::In, json!(["owner", "admin"])),
				]),
			)
			.with_metadata(
				FlagMetadata::new()
					.with_name("Custom RBAC roles")
					.with_category("rbac")
					.with_tier("enterprise"),
			),
			FlagConfig::new("premium_features", plan_in(&["pro", "enterprise"])).with_metadata(
				FlagMetadata::new()
					.with_name("Premium features")
					.with_category("billing")
					.with_tier("pro"),
			),
			FlagConfig::new(
				"session_insights",
				RolloutStrategy::percentage(Percentage::new(10).unwrap_or(Percentage::NONE)),
			)
			.with_metadata(
				FlagMetadata::new()
					.with_name("Session insights")
					.with_category("security")
					.beta(),
			),
			FlagConfig::disabled("risk_based_auth").with_metadata(
				FlagMetadata::new()
					.with_name("Risk-based authentication")
					.with_category("security")
					.with_tier("enterprise")
					.beta(),
			),
		])
	}
}

/// Depth-first walk; a key met again while still on `stack` closes a cycle.
fn visit<'a>(
	key: &'a str,
	graph: &HashMap<&'a str, &'a [String]>,
	done: &mut HashSet<&'a str>,
	stack: &mut Vec<&'a str>,
) -> Result<()> {
	if done.contains(key) {
		return Ok(());
	}
	if let Some(start) = stack.iter().position(|k| *k == key) {
		let mut path: Vec<String> = stack[start..].iter().map(|k| k.to_string()).collect();
		path.push(key.to_string());
		return Err(FlagsError::DependencyCycle { path });
	}

	stack.push(key);
	if let Some(&dependencies) = graph.get(key) {
		for dependency in dependencies {
			visit(dependency.as_str(), graph, done, stack)?;
		}
	}
	stack.pop();
	done.insert(key);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::strategy::StrategyKind;
	use std::io::Write;

	#[test]
	fn test_builtin_catalog_is_valid() {
		let catalog = FlagCatalog::builtin();
		catalog.validate().unwrap();
		assert!(catalog.len() >= 10);

		let scim = catalog.get("scim_provisioning").unwrap();
		assert_eq!(scim.dependencies, vec!["sso_saml", "sso_oidc"]);
		assert_eq!(
			catalog.get("biometric_auth").unwrap().strategy_kind(),
			StrategyKind::Percentage
		);
	}

	#[test]
	fn test_parse_toml_catalog() {
		let catalog = FlagCatalog::from_toml_str(
			r#"
			[[flags]]
			key = "premium_features"

			[flags.strategy]
			type = "attributes"
			rules = [{ attribute = "plan", operator = "in", value = ["pro", "enterprise"] }]

			[flags.metadata]
			category = "billing"
			tier = "pro"

			[[flags]]
			key = "beta_dashboard"
			enabled_default = true
			dependencies = ["premium_features"]
			strategy = { type = "enabled" }
			"#,
		)
		.unwrap();

		catalog.validate().unwrap();
		assert_eq!(catalog.len(), 2);

		let premium = catalog.get("premium_features").unwrap();
		match &premium.strategy {
			RolloutStrategy::Attributes { rules } => {
				assert_eq!(rules.len(), 1);
				assert_eq!(rules[0].operator, AttributeOperator::In);
				assert_eq!(rules[0].value, json!(["pro", "enterprise"]));
			}
			other => panic!("unexpected strategy: {other:?}"),
		}
		assert_eq!(premium.metadata.tier.as_deref(), Some("pro"));

		let beta = catalog.get("beta_dashboard").unwrap();
		assert!(beta.enabled_default);
	}

	#[test]
	fn test_parse_rejects_bad_percentage() {
		let err = FlagCatalog::from_toml_str(
			r#"
			[[flags]]
			key = "biometric_auth"
			strategy = { type = "percentage", percentage = 120 }
			"#,
		)
		.unwrap_err();
		assert!(matches!(err, FlagsError::Catalog(_)));
	}

	#[test]
	fn test_load_json_file() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(
			file,
			r#"{{"flags":[{{"key":"passkeys","enabled_default":true,"strategy":{{"type":"enabled"}}}}]}}"#
		)
		.unwrap();

		let catalog = FlagCatalog::load(file.path()).unwrap();
		assert_eq!(catalog.len(), 1);
		assert!(catalog.get("passkeys").unwrap().enabled_default);
	}

	#[test]
	fn test_load_missing_file() {
		let err = FlagCatalog::load("/nonexistent/warden/flags.toml").unwrap_err();
		assert!(matches!(err, FlagsError::Io { .. }));
	}

	#[test]
	fn test_validate_rejects_duplicates() {
		let catalog = FlagCatalog::new(vec![
			FlagConfig::enabled("passkeys"),
			FlagConfig::disabled("passkeys"),
		]);
		assert!(matches!(
			catalog.validate(),
			Err(FlagsError::DuplicateKey(k)) if k == "passkeys"
		));
	}

	#[test]
	fn test_validate_rejects_invalid_key() {
		let catalog = FlagCatalog::new(vec![FlagConfig::enabled("Pass-Keys")]);
		assert!(matches!(catalog.validate(), Err(FlagsError::InvalidKey(_))));
	}

	#[test]
	fn test_validate_rejects_unknown_dependency() {
		let catalog =
			FlagCatalog::new(vec![FlagConfig::enabled("scim_provisioning").with_dependency("sso_saml")]);
		assert!(matches!(
			catalog.validate(),
			Err(FlagsError::UnknownDependency { dependency, .. }) if dependency == "sso_saml"
		));
	}

	#[test]
	fn test_validate_rejects_cycles() {
		let catalog = FlagCatalog::new(vec![
			FlagConfig::enabled("flag_a").with_dependency("flag_b"),
			FlagConfig::enabled("flag_b").with_dependency("flag_c"),
			FlagConfig::enabled("flag_c").with_dependency("flag_a"),
		]);
		match catalog.validate() {
			Err(FlagsError::DependencyCycle { path }) => {
				assert_eq!(path, vec!["flag_a", "flag_b", "flag_c", "flag_a"]);
			}
			other => panic!("expected cycle, got {other:?}"),
		}

		let self_loop = FlagCatalog::new(vec![FlagConfig::enabled("flag_a").with_dependency("flag_a")]);
		assert!(matches!(
			self_loop.validate(),
			Err(FlagsError::DependencyCycle { .. })
		));
	}

	#[test]
	fn test_validate_accepts_diamond() {
		let catalog = FlagCatalog::new(vec![
			FlagConfig::enabled("base"),
			FlagConfig::enabled("left").with_dependency("base"),
			FlagConfig::enabled("right").with_dependency("base"),
			FlagConfig::enabled("top").with_dependencies(["left", "right"]),
		]);
		catalog.validate().unwrap();
	}

	#[test]
	fn test_attach_evaluator_unknown_key() {
		use crate::custom::{CustomEvaluator, CustomEvaluatorError};
		use crate::EvaluationContext;

		struct Always;

		#[async_trait::async_trait]
		impl CustomEvaluator for Always {
			async fn evaluate(&self, _: &EvaluationContext) -> std::result::Result<bool, CustomEvaluatorError> {
				Ok(true)
			}
		}

		let mut catalog = FlagCatalog::builtin();
		let err = catalog
			.attach_evaluator("ghost", CustomEvaluatorRef::new(Always))
			.unwrap_err();
		assert!(err.is_not_found());

		catalog
			.attach_evaluator("risk_based_auth", CustomEvaluatorRef::new(Always))
			.unwrap();
		assert_eq!(
			catalog.get("risk_based_auth").unwrap().strategy_kind(),
			StrategyKind::Custom
		);
	}
}
