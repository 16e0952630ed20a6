// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Catalog configuration section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfigLayer {
	pub path: Option<PathBuf>,
}

impl CatalogConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.path.is_some() {
			self.path = other.path;
		}
	}

	pub fn finalize(self) -> CatalogConfig {
		CatalogConfig { path: self.path }
	}
}

/// Where flag definitions come from. No path means the built-in catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
	pub path: Option<PathBuf>,
}

impl CatalogConfig {
	pub fn is_builtin(&self) -> bool {
		self.path.is_none()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_is_builtin() {
		assert!(CatalogConfig::default().is_builtin());
		assert!(CatalogConfigLayer::default().finalize().is_builtin());
	}

	#[test]
	fn test_merge_keeps_existing_path() {
		let mut base = CatalogConfigLayer {
			path: Some(PathBuf::from("/etc/warden/flags.toml")),
		};
		base.merge(CatalogConfigLayer::default());
		assert_eq!(base.path, Some(PathBuf::from("/etc/warden/flags.toml")));

		base.merge(CatalogConfigLayer {
			path: Some(PathBuf::from("flags.json")),
		});
		assert_eq!(base.finalize().path, Some(PathBuf::from("flags.json")));
	}
}
