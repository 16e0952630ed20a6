// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Execution budget for custom evaluators.
//!
//! Custom predicates are caller code of unknown cost. Every call is bounded by
//! a timeout and isolated from panics so one misbehaving predicate cannot
//! stall or crash evaluations sharing the registry.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::warn;
use warden_flags_core::{
	CustomEvaluator, CustomEvaluatorError, CustomEvaluatorRef, EvaluationContext,
};

/// Runs `evaluator` within `budget`.
///
/// Returns the predicate's answer, or a message describing why it produced
/// none (error, panic or timeout). Must be polled inside a Tokio runtime with
/// the time driver enabled.
pub async fn run_guarded(
	evaluator: &CustomEvaluatorRef,
	context: &EvaluationContext,
	budget: Duration,
) -> Result<bool, String> {
	let call = AssertUnwindSafe(evaluator.evaluate(context)).catch_unwind();

	let outcome = match tokio::time::timeout(budget, call).await {
		Ok(Ok(Ok(enabled))) => return Ok(enabled),
		Ok(Ok(Err(e))) => e.to_string(),
		Ok(Err(panic)) => format!("panicked: {}", panic_message(panic.as_ref())),
		Err(_) => format!("timed out after {}ms", budget.as_millis()),
	};

	warn!(evaluator = evaluator.name(), error = %outcome, "custom evaluator failed");
	Err(outcome)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic".to_string()
	}
}

/// Adapts a synchronous predicate into a [`CustomEvaluator`].
///
/// The closure runs on the blocking thread pool, so the timeout also bounds
/// predicates that block instead of yielding. A timed-out call keeps its
/// thread until the closure returns, so each evaluator holds at most
/// `max_in_flight` blocking threads and rejects calls beyond that.
pub struct FnEvaluator<F> {
	name: String,
	func: Arc<F>,
	permits: Arc<Semaphore>,
}

impl<F> FnEvaluator<F>
where
	F: Fn(&EvaluationContext) -> Result<bool, CustomEvaluatorError> + Send + Sync + 'static,
{
	/// Blocking calls one evaluator may have running at once.
	pub const DEFAULT_MAX_IN_FLIGHT: usize = 2;

	pub fn new(name: impl Into<String>, func: F) -> Self {
		Self {
			name: name.into(),
			func: Arc::new(func),
			permits: Arc::new(Semaphore::new(Self::DEFAULT_MAX_IN_FLIGHT)),
		}
	}

	pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
		self.permits = Arc::new(Semaphore::new(max_in_flight.max(1)));
		self
	}
}

#[async_trait]
impl<F> CustomEvaluator for FnEvaluator<F>
where
	F: Fn(&EvaluationContext) -> Result<bool, CustomEvaluatorError> + Send + Sync + 'static,
{
	fn name(&self) -> &str {
		&self.name
	}

	async fn evaluate(&self, context: &EvaluationContext) -> Result<bool, CustomEvaluatorError> {
		let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
			return Err(CustomEvaluatorError::new("evaluator saturated"));
		};
		let func = Arc::clone(&self.func);
		let context = context.clone();

		let call = tokio::task::spawn_blocking(move || {
			let _permit = permit;
			func(&context)
		});
		match call.await {
			Ok(result) => result,
			Err(e) if e.is_panic() => {
				let payload = e.into_panic();
				Err(CustomEvaluatorError::new(format!(
					"panicked: {}",
					panic_message(payload.as_ref())
				)))
			}
			Err(e) => Err(CustomEvaluatorError::new(e.to_string())),
		}
	}
}

/// Wraps a synchronous predicate as a shareable custom evaluator.
pub fn evaluator_fn<F>(name: impl Into<String>, func: F) -> CustomEvaluatorRef
where
	F: Fn(&EvaluationContext) -> Result<bool, CustomEvaluatorError> + Send + Sync + 'static,
{
	CustomEvaluatorRef::new(FnEvaluator::new(name, func))
}
