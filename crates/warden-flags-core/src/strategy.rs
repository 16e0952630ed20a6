// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::custom::CustomEvaluatorRef;
use crate::error::FlagsError;

/// Rollout percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percentage(u8);

impl Percentage {
	pub const NONE: Percentage = Percentage(0);
	pub const ALL: Percentage = Percentage(100);

	pub fn new(value: u32) -> Result<Self, FlagsError> {
		if value > 100 {
			return Err(FlagsError::InvalidPercentage(value));
		}
		Ok(Self(value as u8))
	}

	pub fn value(self) -> u32 {
		u32::from(self.0)
	}
}

impl TryFrom<u32> for Percentage {
	type Error = FlagsError;

	fn try_from(value: u32) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<Percentage> for u32 {
	fn from(p: Percentage) -> Self {
		p.value()
	}
}

impl std::fmt::Display for Percentage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}%", self.0)
	}
}

/// How the bucketing seed for a percentage rollout is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketSalt {
	/// Seed is the raw user ID. A user lands in the same bucket for every
	/// percentage flag, so cohorts are correlated across flags.
	#[default]
	None,
	/// Seed is `<flag_key>.<user_id>`, giving each flag its own distribution.
	FlagKey,
}

impl BucketSalt {
	pub fn seed(self, flag_key: &str, user_id: &str) -> String {
		match self {
			BucketSalt::None => user_id.to_string(),
			BucketSalt::FlagKey => format!("{flag_key}.{user_id}"),
		}
	}
}

impl std::str::FromStr for BucketSalt {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"none" => Ok(BucketSalt::None),
			"flag_key" | "flag-key" => Ok(BucketSalt::FlagKey),
			other => Err(format!("unknown bucket salt '{other}'")),
		}
	}
}

/// Operators for attribute rules.
///
/// Evaluation is type-strict: an operand combination the operator does not
/// define evaluates to false, including for the negated operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeOperator {
	Equals,
	NotEquals,
	Contains,
	NotContains,
	In,
	NotIn,
	GreaterThan,
	LessThan,
}

impl AttributeOperator {
	/// Evaluates `actual` (from the context) against `expected` (from the rule).
	pub fn evaluate(&self, actual: &Value, expected: &Value) -> bool {
		match self {
			AttributeOperator::Equals => values_equal(actual, expected),
			AttributeOperator::NotEquals => {
				comparable(actual, expected) && !values_equal(actual, expected)
			}
			AttributeOperator::Contains => contains(actual, expected).unwrap_or(false),
			AttributeOperator::NotContains => contains(actual, expected).is_some_and(|c| !c),
			AttributeOperator::In => member_of(actual, expected).unwrap_or(false),
			AttributeOperator::NotIn => member_of(actual, expected).is_some_and(|m| !m),
			AttributeOperator::GreaterThan => {
				compare_numbers(actual, expected) == Some(Ordering::Greater)
			}
			AttributeOperator::LessThan => compare_numbers(actual, expected) == Some(Ordering::Less),
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			AttributeOperator::Equals => "equals",
			AttributeOperator::NotEquals => "not_equals",
			AttributeOperator::Contains => "contains",
			AttributeOperator::NotContains => "not_contains",
			AttributeOperator::In => "in",
			AttributeOperator::NotIn => "not_in",
			AttributeOperator::GreaterThan => "greater_than",
			AttributeOperator::LessThan => "less_than",
		}
	}
}

impl std::fmt::Display for AttributeOperator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Numbers compare by value regardless of integer/float representation.
fn values_equal(a: &Value, b: &Value) -> bool {
	match (a, b) {
		(Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
			(Some(x), Some(y)) => x == y,
			_ => x == y,
		},
		_ => a == b,
	}
}

/// Scalars of the same JSON type. Anything else cannot be told apart by
/// `not_equals`, so the rule fails.
fn comparable(a: &Value, b: &Value) -> bool {
	matches!(
		(a, b),
		(Value::Number(_), Value::Number(_))
			| (Value::String(_), Value::String(_))
			| (Value::Bool(_), Value::Bool(_))
	)
}

/// Substring test for two strings, membership test for array vs string.
/// `None` means the operand types are not comparable.
fn contains(actual: &Value, expected: &Value) -> Option<bool> {
	match (actual, expected) {
		(Value::String(haystack), Value::String(needle)) => Some(haystack.contains(needle.as_str())),
		(Value::Array(items), Value::String(_)) => {
			Some(items.iter().any(|item| values_equal(item, expected)))
		}
		_ => None,
	}
}

/// Membership of a context value in the rule's array. An array context value
/// (e.g. roles) is a member when any of its elements is.
fn member_of(actual: &Value, expected: &Value) -> Option<bool> {
	let Value::Array(list) = expected else {
		return None;
	};

	match actual {
		Value::Array(items) => Some(
			items
				.iter()
				.any(|item| list.iter().any(|candidate| values_equal(item, candidate))),
		),
		Value::Object(_) => None,
		scalar => Some(list.iter().any(|candidate| values_equal(scalar, candidate))),
	}
}

fn compare_numbers(actual: &Value, expected: &Value) -> Option<Ordering> {
	let a = actual.as_f64()?;
	let b = expected.as_f64()?;
	a.partial_cmp(&b)
}

/// A single attribute predicate. Rules in a list are AND-combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRule {
	pub attribute: String,
	pub operator: AttributeOperator,
	pub value: Value,
}

impl AttributeRule {
	pub fn new(attribute: impl Into<String>, operator: AttributeOperator, value: Value) -> Self {
		Self {
			attribute: attribute.into(),
			operator,
			value,
		}
	}
}

/// Field-less tag of a [`RolloutStrategy`], echoed in evaluation results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
	Disabled,
	Enabled,
	Percentage,
	Users,
	Organizations,
	Attributes,
	Custom,
}

impl StrategyKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			StrategyKind::Disabled => "disabled",
			StrategyKind::Enabled => "enabled",
			StrategyKind::Percentage => "percentage",
			StrategyKind::Users => "users",
			StrategyKind::Organizations => "organizations",
			StrategyKind::Attributes => "attributes",
			StrategyKind::Custom => "custom",
		}
	}
}

impl std::fmt::Display for StrategyKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The algorithm that decides a flag's outcome, carrying the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RolloutStrategy {
	Disabled,
	/// Mirrors the flag's `enabled_default` for every context.
	Enabled,
	Percentage {
		percentage: Percentage,
	},
	Users {
		#[serde(default)]
		allowlist: BTreeSet<String>,
	},
	Organizations {
		#[serde(default)]
		allowlist: BTreeSet<String>,
	},
	Attributes {
		#[serde(default)]
		rules: Vec<AttributeRule>,
	},
	/// Caller-supplied predicate. Catalog files can declare the strategy, but
	/// the evaluator itself is attached in code.
	Custom {
		#[serde(skip)]
		evaluator: Option<CustomEvaluatorRef>,
	},
}

impl RolloutStrategy {
	pub fn kind(&self) -> StrategyKind {
		match self {
			RolloutStrategy::Disabled => StrategyKind::Disabled,
			RolloutStrategy::Enabled => StrategyKind::Enabled,
			RolloutStrategy::Percentage { .. } => StrategyKind::Percentage,
			RolloutStrategy::Users { .. } => StrategyKind::Users,
			RolloutStrategy::Organizations { .. } => StrategyKind::Organizations,
			RolloutStrategy::Attributes { .. } => StrategyKind::Attributes,
			RolloutStrategy::Custom { .. } => StrategyKind::Custom,
		}
	}

	pub fn percentage(percentage: Percentage) -> Self {
		RolloutStrategy::Percentage { percentage }
	}

	pub fn users<I, S>(ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		RolloutStrategy::Users {
			allowlist: ids.into_iter().map(Into::into).collect(),
		}
	}

	pub fn organizations<I, S>(ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		RolloutStrategy::Organizations {
			allowlist: ids.into_iter().map(Into::into).collect(),
		}
	}

	pub fn attributes(rules: Vec<AttributeRule>) -> Self {
		RolloutStrategy::Attributes { rules }
	}

	pub fn custom(evaluator: CustomEvaluatorRef) -> Self {
		RolloutStrategy::Custom {
			evaluator: Some(evaluator),
		}
	}
}


#[cfg(test)]
mod proptest_tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn equals_matches_integer_equality(a: i64, b: i64) {
			let result = AttributeOperator::Equals.evaluate(&serde_json::json!(a), &serde_json::json!(b));
			prop_assert_eq!(result, a == b);
		}

		#[test]
		fn not_equals_is_negation_of_equals(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
			let val_a = serde_json::json!(a);
			let val_b = serde_json::json!(b);
			let eq = AttributeOperator::Equals.evaluate(&val_a, &val_b);
			let neq = AttributeOperator::NotEquals.evaluate(&val_a, &val_b);
			prop_assert_eq!(eq, !neq);
		}

		#[test]
		fn mismatched_types_fail_both_polarities(n: i64, s in "[a-z0-9]{0,8}") {
			let number = serde_json::json!(n);
			let string = serde_json::json!(s);
			for (actual, expected) in [(&number, &string), (&string, &number)] {
				prop_assert!(!AttributeOperator::Equals.evaluate(actual, expected));
				prop_assert!(!AttributeOperator::NotEquals.evaluate(actual, expected));
			}
		}

		#[test]
		fn in_contains_element(values in prop::collection::vec("[a-z]{1,8}", 1..10), idx in 0usize..10) {
			let idx = idx % values.len();
			let needle = serde_json::json!(values[idx]);
			let haystack = serde_json::json!(values);
			prop_assert!(AttributeOperator::In.evaluate(&needle, &haystack));
		}

		#[test]
		fn not_in_is_negation_of_in(needle: i64, haystack in prop::collection::vec(any::<i64>(), 0..5)) {
			let needle_val = serde_json::json!(needle);
			let haystack_val = serde_json::json!(haystack);
			let is_in = AttributeOperator::In.evaluate(&needle_val, &haystack_val);
			let not_in = AttributeOperator::NotIn.evaluate(&needle_val, &haystack_val);
			prop_assert_eq!(is_in, !not_in);
		}

		#[test]
		fn greater_and_less_are_exclusive(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
			let val_a = serde_json::json!(a);
			let val_b = serde_json::json!(b);
			let gt = AttributeOperator::GreaterThan.evaluate(&val_a, &val_b);
			let lt = AttributeOperator::LessThan.evaluate(&val_a, &val_b);
			prop_assert!(!(gt && lt));
			prop_assert_eq!(gt || lt, a != b);
		}
	}
}
