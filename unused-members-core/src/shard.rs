//! Hash-based file partitioning for parallel CI jobs.
//!
//! Every job running "shard k of N" must see exactly the same file set on
//! every run, so the hash is a fixed 32-bit polynomial over UTF-16 code units
//! (the `String#hashCode` recurrence) rather than anything seeded.

use serde::{Deserialize, Serialize};

use crate::error::{ScanError, ScanResult};

/// `hash = c + ((hash << 5) - hash)` with 32-bit wraparound.
pub fn java_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

/// Zero-based shard index of `path` among `count` shards.
///
/// `count` of zero is treated as one.
pub fn shard_of(path: &str, count: u32) -> u32 {
    let count = i64::from(count.max(1));
    (i64::from(java_hash(path)) % count).unsigned_abs() as u32
}

/// Whether `path` belongs to the 1-indexed shard `current` of `count`.
pub fn is_in_shard(path: &str, count: u32, current: u32) -> bool {
    current >= 1 && shard_of(path, count) == current - 1
}

/// A validated "shard `current` of `count`" selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    count: u32,
    current: u32,
}

impl Shard {
    /// Create a shard selection; `current` is 1-indexed.
    pub fn new(count: u32, current: u32) -> ScanResult<Self> {
        if count == 0 {
            return Err(ScanError::invalid_argument("shard count must be at least 1"));
        }
        if current == 0 || current > count {
            return Err(ScanError::invalid_argument(format!(
                "current shard must be between 1 and {}, got {}",
                count, current
            )));
        }
        Ok(Self { count, current })
    }

    /// The whole file set in one shard.
    pub fn single() -> Self {
        Self {
            count: 1,
            current: 1,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn is_partitioned(&self) -> bool {
        self.count > 1
    }

    /// Whether the (project-relative) path falls into this shard.
    pub fn contains(&self, path: &str) -> bool {
        is_in_shard(path, self.count, self.current)
    }
}

impl Default for Shard {
    fn default() -> Self {
        Self::single()
    }
}

impl std::fmt::Display for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.count)
    }
}
