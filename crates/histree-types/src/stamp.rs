use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Commit timestamp: wall-clock milliseconds plus a logical tiebreaker.
///
/// Scopes are single-writer, so no node identifier is needed; the logical
/// counter only disambiguates commits that land within the same millisecond
/// (and absorbs wall clocks that step backward).
///
/// Ordering: `wall_ms` → `logical` (total order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// Wall-clock milliseconds since UNIX epoch.
    pub wall_ms: u64,
    /// Logical counter for commits at the same physical time.
    pub logical: u32,
}

impl Stamp {
    /// Create a stamp with explicit values.
    pub const fn new(wall_ms: u64, logical: u32) -> Self {
        Self { wall_ms, logical }
    }

    /// The zero stamp (before any commit).
    pub const fn zero() -> Self {
        Self {
            wall_ms: 0,
            logical: 0,
        }
    }

    /// The next stamp, strictly after `self`.
    ///
    /// Takes the current wall clock if it has advanced; otherwise keeps the
    /// previous millisecond and bumps the logical counter.
    pub fn next(&self) -> Self {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        if now_ms > self.wall_ms {
            Self {
                wall_ms: now_ms,
                logical: 0,
            }
        } else {
            Self {
                wall_ms: self.wall_ms,
                logical: self.logical + 1,
            }
        }
    }

    /// Returns `true` if this stamp is strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl PartialOrd for Stamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Stamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.wall_ms
            .cmp(&other.wall_ms)
            .then(self.logical.cmp(&other.logical))
    }
}

impl fmt::Debug for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stamp({}ms.{})", self.wall_ms, self.logical)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.wall_ms, self.logical)
    }
}
