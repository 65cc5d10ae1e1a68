//! Atomic in-flight query accounting.

use std::sync::atomic::{AtomicU32, Ordering};

/// Wrapping 32-bit tally of running queries.
///
/// Embedded into every accountable entity (host, proxy user, cluster user).
/// Every `inc` must be paired with exactly one `dec`; admission rollback
/// relies on that pairing.
#[derive(Debug, Default)]
pub struct QueryCounter {
    value: AtomicU32,
}

impl QueryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the post-increment value.
    pub fn inc(&self) -> u32 {
        self.value.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Decrement. Calling this without a matching `inc` is a contract
    /// violation; the counter wraps rather than panicking.
    pub fn dec(&self) {
        let prev = self.value.fetch_sub(1, Ordering::AcqRel);
        debug_assert_ne!(prev, 0, "query counter decremented below zero");
    }

    pub fn read(&self) -> u32 {
        self.value.load(Ordering::Acquire)
    }
}
