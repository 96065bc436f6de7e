//! Atomic arena counters for lock-free diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    /// Arenas lazily created on checkout.
    pub created: u64,
    /// Arenas freed for any reason.
    pub freed: u64,
    /// Arenas freed on release because the usage limit was exceeded.
    pub usage_evictions: u64,
    /// Arenas freed by the idle sweep.
    pub idle_evictions: u64,
    /// Successful checkouts.
    pub acquisitions: u64,
}

/// Atomic counters shared between workers and the sweep thread.
pub struct AtomicHeapStats {
    created: AtomicU64,
    usage_evictions: AtomicU64,
    idle_evictions: AtomicU64,
    acquisitions: AtomicU64,
}

impl AtomicHeapStats {
    /// Create new zeroed counters.
    pub fn new() -> Self {
        Self {
            created: AtomicU64::new(0),
            usage_evictions: AtomicU64::new(0),
            idle_evictions: AtomicU64::new(0),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of the current counters.
    pub fn snapshot(&self) -> HeapStats {
        let usage_evictions = self.usage_evictions.load(Ordering::Relaxed);
        let idle_evictions = self.idle_evictions.load(Ordering::Relaxed);
        HeapStats {
            created: self.created.load(Ordering::Relaxed),
            freed: usage_evictions + idle_evictions,
            usage_evictions,
            idle_evictions,
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.created.store(0, Ordering::Relaxed);
        self.usage_evictions.store(0, Ordering::Relaxed);
        self.idle_evictions.store(0, Ordering::Relaxed);
        self.acquisitions.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_usage_eviction(&self) {
        self.usage_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_idle_eviction(&self) {
        self.idle_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicHeapStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stats_are_zeroed() {
        let stats = AtomicHeapStats::new();
        assert_eq!(stats.snapshot(), HeapStats::default());
    }

    #[test]
    fn freed_sums_both_eviction_kinds() {
        let stats = AtomicHeapStats::new();
        stats.record_created();
        stats.record_created();
        stats.record_usage_eviction();
        stats.record_idle_eviction();
        stats.record_idle_eviction();
        stats.record_acquisition();
        let snap = stats.snapshot();
        assert_eq!(snap.created, 2);
        assert_eq!(snap.usage_evictions, 1);
        assert_eq!(snap.idle_evictions, 2);
        assert_eq!(snap.freed, 3);
        assert_eq!(snap.acquisitions, 1);
    }

    #[test]
    fn reset_clears_counters() {
        let stats = AtomicHeapStats::new();
        stats.record_created();
        stats.record_usage_eviction();
        stats.record_idle_eviction();
        stats.record_acquisition();
        stats.reset();
        assert_eq!(stats.snapshot(), HeapStats::default());
    }

    #[test]
    fn snapshot_serializes_every_counter() {
        let stats = AtomicHeapStats::new();
        stats.record_created();
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["created"], 1);
        assert_eq!(json["freed"], 0);
        assert!(json.get("idle_evictions").is_some());
    }
}
