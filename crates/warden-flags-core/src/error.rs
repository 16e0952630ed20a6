// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for flag configuration and catalog handling.
//!
//! Evaluation itself never fails: every evaluation problem is represented as a
//! disabled [`EvaluationResult`](crate::EvaluationResult) with a reason. The
//! errors here come from building a catalog or mutating the registry.

use std::path::PathBuf;

/// Errors raised by catalog construction and registry mutation.
#[derive(Debug, thiserror::Error)]
pub enum FlagsError {
	/// The flag key does not exist in the registry.
	#[error("Feature flag '{key}' not found")]
	NotFound { key: String },

	#[error("Invalid flag key: '{0}'")]
	InvalidKey(String),

	#[error("Duplicate flag key: '{0}'")]
	DuplicateKey(String),

	#[error("Flag '{flag}' depends on unknown flag '{dependency}'")]
	UnknownDependency { flag: String, dependency: String },

	#[error("Dependency cycle: {}", path.join(" -> "))]
	DependencyCycle { path: Vec<String> },

	#[error("Percentage must be between 0 and 100, got {0}")]
	InvalidPercentage(u32),

	/// The catalog document could not be parsed.
	#[error("Catalog parse error: {0}")]
	Catalog(String),

	#[error("Failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl FlagsError {
	pub fn not_found(key: impl Into<String>) -> Self {
		Self::NotFound { key: key.into() }
	}

	/// Returns true if this is the unknown-key error raised by flag updates.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}

pub type Result<T> = std::result::Result<T, FlagsError>;
