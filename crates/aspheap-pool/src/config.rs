//! Pool sizing and eviction policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HeapError;

/// Checkout cycles an arena survives before release frees it.
pub const DEFAULT_USAGES_BEFORE_FREE: u32 = 10;

/// Idle period after which the sweep frees an arena.
pub const DEFAULT_IDLE_TIME_UNTIL_FREE: Duration = Duration::from_secs(5);

/// Period of the idle sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for a [`HeapPool`](crate::pool::HeapPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of recyclable arenas, normally the worker thread count.
    pub size: usize,
    /// Release frees the arena once its usage count exceeds this.
    /// `None` disables usage eviction.
    pub usages_before_free: Option<u32>,
    /// The sweep frees arenas idle for at least this long.
    /// `None` disables the sweep entirely.
    pub idle_time_until_free: Option<Duration>,
    /// Tick of the idle sweep.
    pub sweep_interval: Duration,
    /// Bytes pre-allocated for each lazily created arena. Zero allocates on demand.
    pub arena_capacity: usize,
}

impl PoolConfig {
    /// Create a configuration with the default policy for `size` arenas.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Build a configuration from signed host parameters.
    ///
    /// A usage limit of zero or below disables usage eviction, and a zero
    /// idle time disables the sweep.
    #[must_use]
    pub fn from_signed(
        size: usize,
        usages_before_free: i64,
        idle_time_until_free: Duration,
    ) -> Self {
        Self {
            size,
            usages_before_free: (usages_before_free > 0)
                .then(|| u32::try_from(usages_before_free).unwrap_or(u32::MAX)),
            idle_time_until_free: Some(idle_time_until_free).filter(|d| !d.is_zero()),
            ..Self::default()
        }
    }

    /// Set the usage limit.
    #[must_use]
    pub fn with_usages_before_free(mut self, usages: Option<u32>) -> Self {
        self.usages_before_free = usages;
        self
    }

    /// Set the idle eviction threshold.
    #[must_use]
    pub fn with_idle_time_until_free(mut self, idle: Option<Duration>) -> Self {
        self.idle_time_until_free = idle;
        self
    }

    /// Set the sweep tick.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the initial chunk size of each arena.
    #[must_use]
    pub fn with_arena_capacity(mut self, bytes: usize) -> Self {
        self.arena_capacity = bytes;
        self
    }

    /// Check that the pool can be built from this configuration.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.size == 0 {
            return Err(HeapError::InvalidConfig(
                "pool size must be at least 1".into(),
            ));
        }
        if self.idle_time_until_free.is_some() && self.sweep_interval.is_zero() {
            return Err(HeapError::InvalidConfig(
                "sweep interval must be non-zero when idle eviction is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Whether an arena used `usages` times must be freed on release.
    #[must_use]
    pub fn usage_limit_exceeded(&self, usages: u64) -> bool {
        self.usages_before_free
            .is_some_and(|limit| usages > u64::from(limit))
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get),
            usages_before_free: Some(DEFAULT_USAGES_BEFORE_FREE),
            idle_time_until_free: Some(DEFAULT_IDLE_TIME_UNTIL_FREE),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            arena_capacity: 0,
        }
    }
}
