// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribute rule matching.

use warden_flags_core::{AttributeRule, EvaluationContext};

/// Outcome of matching a rule list against a context.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleMatch<'a> {
	/// The list is empty. Treated as a failure, never as a vacuous match.
	NoRules,
	Matched,
	/// The first rule that did not pass.
	NotMatched(&'a AttributeRule),
}

impl RuleMatch<'_> {
	pub fn is_match(&self) -> bool {
		matches!(self, RuleMatch::Matched)
	}
}

/// Evaluates a single rule. An attribute missing from the context fails the rule.
pub fn matches_rule(rule: &AttributeRule, context: &EvaluationContext) -> bool {
	match context.resolve_attribute(&rule.attribute) {
		Some(actual) => rule.operator.evaluate(&actual, &rule.value),
		None => false,
	}
}

/// Evaluates all rules (AND logic), stopping at the first failure.
pub fn evaluate_rules<'a>(rules: &'a [AttributeRule], context: &EvaluationContext) -> RuleMatch<'a> {
	if rules.is_empty() {
		return RuleMatch::NoRules;
	}

	match rules.iter().find(|rule| !matches_rule(rule, context)) {
		Some(failed) => RuleMatch::NotMatched(failed),
		None => RuleMatch::Matched,
	}
}

/// True when the list is non-empty and every rule matches.
pub fn match_all(rules: &[AttributeRule], context: &EvaluationContext) -> bool {
	evaluate_rules(rules, context).is_match()
}
