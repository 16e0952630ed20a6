// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Injected predicates for the `custom` rollout strategy.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::EvaluationContext;

/// Error reported by a custom evaluator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CustomEvaluatorError {
	message: String,
}

impl CustomEvaluatorError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

impl From<String> for CustomEvaluatorError {
	fn from(message: String) -> Self {
		Self::new(message)
	}
}

impl From<&str> for CustomEvaluatorError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}

/// A caller-supplied predicate deciding whether a flag is enabled.
///
/// Implementations run under the evaluator's execution budget; an error,
/// a panic or a timeout disables the flag.
#[async_trait]
pub trait CustomEvaluator: Send + Sync {
	/// Name used in logs.
	fn name(&self) -> &str {
		"custom"
	}

	async fn evaluate(&self, context: &EvaluationContext) -> Result<bool, CustomEvaluatorError>;
}

/// Shared handle to a [`CustomEvaluator`].
///
/// Two handles are equal when they point at the same evaluator instance.
#[derive(Clone)]
pub struct CustomEvaluatorRef(Arc<dyn CustomEvaluator>);

impl CustomEvaluatorRef {
	pub fn new<E>(evaluator: E) -> Self
	where
		E: CustomEvaluator + 'static,
	{
		Self(Arc::new(evaluator))
	}

	pub fn from_arc(evaluator: Arc<dyn CustomEvaluator>) -> Self {
		Self(evaluator)
	}

	pub fn name(&self) -> &str {
		self.0.name()
	}

	pub async fn evaluate(&self, context: &EvaluationContext) -> Result<bool, CustomEvaluatorError> {
		self.0.evaluate(context).await
	}
}

impl PartialEq for CustomEvaluatorRef {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::eq(
			Arc::as_ptr(&self.0) as *const (),
			Arc::as_ptr(&other.0) as *const (),
		)
	}
}

impl std::fmt::Debug for CustomEvaluatorRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("CustomEvaluatorRef")
			.field(&self.0.name())
			.finish()
	}
}
