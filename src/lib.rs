//! Shared fixtures for the workspace integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use aspheap_pool::{HeapPool, PoolConfig};

/// Build a pool with explicit eviction policy.
///
/// # Panics
///
/// Panics if the configuration is rejected.
#[must_use]
pub fn pool(size: usize, usages_before_free: Option<u32>, idle: Option<Duration>) -> HeapPool {
    let config = PoolConfig::new(size)
        .with_usages_before_free(usages_before_free)
        .with_idle_time_until_free(idle)
        .with_sweep_interval(Duration::from_millis(10));
    HeapPool::new(config).expect("valid pool config")
}

/// Records which slots are held so overlapping checkouts can be detected.
pub struct OwnershipProbe {
    held: Vec<AtomicBool>,
    violations: AtomicUsize,
    max_concurrent: AtomicUsize,
    concurrent: AtomicUsize,
}

impl OwnershipProbe {
    /// Create a probe for a pool of `size` slots.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            held: (0..size).map(|_| AtomicBool::new(false)).collect(),
            violations: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
        }
    }

    /// Mark `slot` as held by the caller.
    pub fn enter(&self, slot: usize) {
        if self.held[slot].swap(true, Ordering::AcqRel) {
            self.violations.fetch_add(1, Ordering::Relaxed);
        }
        let now = self.concurrent.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_concurrent.fetch_max(now, Ordering::Relaxed);
    }

    /// Mark `slot` as no longer held.
    pub fn exit(&self, slot: usize) {
        self.concurrent.fetch_sub(1, Ordering::AcqRel);
        if !self.held[slot].swap(false, Ordering::AcqRel) {
            self.violations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of overlapping or unbalanced checkouts seen.
    #[must_use]
    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::Relaxed)
    }

    /// Highest number of simultaneous holders seen.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::Relaxed)
    }
}
