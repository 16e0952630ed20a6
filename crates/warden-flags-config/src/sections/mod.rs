// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod catalog;
mod evaluation;
mod logging;

pub use catalog::{CatalogConfig, CatalogConfigLayer};
pub use evaluation::{
	EvaluationConfig, EvaluationConfigLayer, DEFAULT_CUSTOM_EVALUATOR_TIMEOUT_MS,
	DEFAULT_MAX_DEPENDENCY_DEPTH,
};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
