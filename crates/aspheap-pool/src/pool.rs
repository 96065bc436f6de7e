//! Fixed-size pool of recyclable arenas.
//!
//! Workers check a slot out with [`HeapPool::acquire`], allocate through the
//! returned [`HeapGuard`], and hand the slot back by releasing or dropping
//! the guard. Every allocation made through the guard borrows it, so the
//! borrow checker rejects any use of arena memory after release.
//!
//! Two heuristics free arenas: release frees once a slot's usage count
//! exceeds the configured limit, and the background sweep frees slots left
//! idle for longer than the idle threshold.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::MutexGuard;
use tracing::{debug, info, trace};

use crate::alloc::Allocator;
use crate::arena::Arena;
use crate::config::PoolConfig;
use crate::error::HeapError;
use crate::slot::{Slot, SlotState};
use crate::stats::{AtomicHeapStats, HeapStats};
use crate::sweep::{self, Sweeper};

/// State shared with the sweep thread.
pub(crate) struct Shared {
    pub(crate) slots: Box<[Slot]>,
    pub(crate) config: PoolConfig,
    pub(crate) stats: AtomicHeapStats,
    origin: Instant,
}

impl Shared {
    /// Nanoseconds since the pool was created. Never returns the
    /// never-used stamp, so a just-released slot is always distinguishable.
    pub(crate) fn now(&self) -> u64 {
        nanos(self.origin.elapsed()).max(1)
    }
}

pub(crate) fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Pool of arenas recycled across parse and interpret runs.
pub struct HeapPool {
    shared: Arc<Shared>,
    available_tx: Sender<usize>,
    available_rx: Receiver<usize>,
    sweeper: Option<Sweeper>,
}

impl HeapPool {
    /// Create a pool with `config.size` empty slots and start the idle sweep.
    ///
    /// No arena is created until a slot is first checked out.
    pub fn new(config: PoolConfig) -> Result<Self, HeapError> {
        config.validate()?;

        let (available_tx, available_rx) = bounded(config.size);
        for index in 0..config.size {
            // Capacity equals the slot count, so seeding never blocks.
            let _ = available_tx.send(index);
        }

        let slots = (0..config.size).map(|_| Slot::default()).collect();
        let shared = Arc::new(Shared {
            slots,
            config,
            stats: AtomicHeapStats::new(),
            origin: Instant::now(),
        });

        let sweeper = match shared.config.idle_time_until_free {
            Some(idle) => Some(Sweeper::spawn(
                Arc::clone(&shared),
                idle,
                shared.config.sweep_interval,
            )?),
            None => None,
        };

        info!(
            size = shared.config.size,
            usages_before_free = ?shared.config.usages_before_free,
            idle_time_until_free = ?shared.config.idle_time_until_free,
            "arena pool created"
        );

        Ok(Self {
            shared,
            available_tx,
            available_rx,
            sweeper,
        })
    }

    /// Check out a slot, blocking until one is returned if all are in use.
    ///
    /// The slot's arena is created if it was freed or never used.
    pub fn acquire(&self) -> HeapGuard<'_> {
        let index = self
            .available_rx
            .recv()
            .expect("pool holds both ends of the availability queue");
        self.check_out(index)
    }

    /// Check out a slot without blocking. Returns `None` when every slot is
    /// checked out.
    pub fn try_acquire(&self) -> Option<HeapGuard<'_>> {
        let index = self.available_rx.try_recv().ok()?;
        Some(self.check_out(index))
    }

    /// Release a guard. Equivalent to dropping it.
    pub fn release(&self, guard: HeapGuard<'_>) {
        debug_assert!(std::ptr::eq(guard.pool, self), "guard belongs to another pool");
        drop(guard);
    }

    /// Run `f` with the allocator of a checked-out slot, then release it.
    pub fn with_heap<R>(&self, f: impl FnOnce(Allocator<'_>) -> R) -> R {
        let guard = self.acquire();
        f(guard.allocator())
    }

    /// Run one idle sweep pass now. Returns the number of arenas freed.
    ///
    /// Does nothing when idle eviction is disabled.
    pub fn sweep_now(&self) -> usize {
        match self.shared.config.idle_time_until_free {
            Some(idle) => sweep::sweep_idle(&self.shared, idle),
            None => 0,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn size(&self) -> usize {
        self.shared.slots.len()
    }

    /// Number of slots waiting in the availability queue.
    #[must_use]
    pub fn available(&self) -> usize {
        self.available_rx.len()
    }

    /// Number of slots currently holding an arena. Checked-out slots always
    /// hold one and are counted without taking their lock.
    #[must_use]
    pub fn resident_arenas(&self) -> usize {
        self.shared
            .slots
            .iter()
            .filter(|slot| {
                slot.state
                    .try_lock()
                    .map_or(true, |state| state.arena.is_some())
            })
            .count()
    }

    /// The configuration this pool was built with.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Get a snapshot of the arena counters.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        self.shared.stats.snapshot()
    }

    /// Reset the arena counters.
    pub fn reset_stats(&self) {
        self.shared.stats.reset();
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    fn check_out(&self, index: usize) -> HeapGuard<'_> {
        let slot = &self.shared.slots[index];
        // Blocks only while the sweep is freeing this slot.
        let mut state = slot.state.lock();
        if state.arena.is_none() {
            state.arena = Some(Arena::with_capacity(self.shared.config.arena_capacity));
            self.shared.stats.record_created();
            debug!(slot = index, "created arena");
        }
        self.shared.stats.record_acquisition();
        trace!(slot = index, usages = state.usages, "slot checked out");
        HeapGuard {
            pool: self,
            index,
            state: Some(state),
        }
    }

    fn check_in(&self, index: usize, mut state: MutexGuard<'_, SlotState>) {
        let slot = &self.shared.slots[index];
        state.usages += 1;
        if self.shared.config.usage_limit_exceeded(state.usages) {
            let usages = state.usages;
            if slot.free(&mut state) {
                self.shared.stats.record_usage_eviction();
                debug!(slot = index, usages, "freed arena after usage limit");
            }
        } else {
            slot.mark_idle(&mut state, self.shared.now());
        }
        trace!(slot = index, "slot checked in");
        drop(state);
        // Unlocked before requeueing so the next taker does not wait on us.
        let _ = self.available_tx.send(index);
    }
}

impl Drop for HeapPool {
    fn drop(&mut self) {
        // Joins the sweep thread before the slots go away.
        drop(self.sweeper.take());
        let stats = self.stats();
        info!(
            created = stats.created,
            freed = stats.freed,
            acquisitions = stats.acquisitions,
            "arena pool shut down"
        );
    }
}

impl std::fmt::Debug for HeapPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapPool")
            .field("config", &self.shared.config)
            .field("available", &self.available())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Exclusive checkout of one pool slot.
///
/// The only way to reach the slot's arena. Dropping the guard releases the
/// slot: its usage count is bumped, the arena is freed if over the usage
/// limit, and the slot rejoins the availability queue.
pub struct HeapGuard<'p> {
    pool: &'p HeapPool,
    index: usize,
    state: Option<MutexGuard<'p, SlotState>>,
}

impl HeapGuard<'_> {
    /// Slot identity within the pool.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Allocator backed by this slot's arena.
    #[must_use]
    pub fn allocator(&self) -> Allocator<'_> {
        match self.state.as_ref().and_then(|state| state.arena.as_ref()) {
            Some(arena) => Allocator::Arena(arena.bump()),
            None => Allocator::Heap,
        }
    }

    /// Checkout cycles completed since the arena was created.
    #[must_use]
    pub fn usages(&self) -> u64 {
        self.state.as_ref().map_or(0, |state| state.usages)
    }

    /// Bytes held by this slot's arena.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.state
            .as_ref()
            .and_then(|state| state.arena.as_ref())
            .map_or(0, Arena::allocated_bytes)
    }

    /// Return the slot to the pool.
    pub fn release(self) {}
}

impl Drop for HeapGuard<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            self.pool.check_in(self.index, state);
        }
    }
}

impl std::fmt::Debug for HeapGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapGuard")
            .field("index", &self.index)
            .field("usages", &self.usages())
            .finish_non_exhaustive()
    }
}
