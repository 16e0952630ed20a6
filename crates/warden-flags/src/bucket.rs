// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deterministic hash-to-percentage bucketing for percentage rollouts.

use std::io::Cursor;

use murmur3::murmur3_32;
use warden_flags_core::Percentage;

/// Number of buckets a seed can land in.
pub const BUCKETS: u32 = 100;

/// Maps a seed to a bucket in `[0, 100)`.
///
/// MurmurHash3 with a fixed seed, so a seed keeps its bucket across
/// processes and restarts.
pub fn bucket(seed: &str) -> u32 {
	let hash = murmur3_32(&mut Cursor::new(seed.as_bytes()), 0).unwrap_or(0);
	hash % BUCKETS
}

/// Whether a bucket falls inside a rollout. 0% admits nobody and 100%
/// admits everybody, independent of the bucket.
pub fn bucket_in_rollout(bucket: u32, percentage: Percentage) -> bool {
	match percentage.value() {
		0 => false,
		100 => true,
		p => bucket < p,
	}
}

/// Whether `seed` is inside a `percentage` rollout.
pub fn in_rollout(seed: &str, percentage: Percentage) -> bool {
	bucket_in_rollout(bucket(seed), percentage)
}
