//! One recyclable arena with its bookkeeping.
//!
//! The arena and usage count live behind the slot's mutex; holding the lock
//! is what "checked out" means. The idle stamp sits outside the lock so the
//! sweep can read it before deciding whether to try the lock at all.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::arena::Arena;

/// Idle stamp of a slot that has no arena.
pub(crate) const NEVER_USED: u64 = 0;

/// State reachable only while holding the slot lock.
#[derive(Debug, Default)]
pub(crate) struct SlotState {
    pub(crate) arena: Option<Arena>,
    pub(crate) usages: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Slot {
    pub(crate) state: Mutex<SlotState>,
    /// Nanoseconds since the pool clock origin at which the idle period began.
    last_used: AtomicU64,
}

impl Slot {
    pub(crate) fn last_used(&self) -> u64 {
        self.last_used.load(Ordering::Acquire)
    }

    /// Begin the idle period. Requires the lock, proven by `_state`.
    pub(crate) fn mark_idle(&self, _state: &mut SlotState, now: u64) {
        self.last_used.store(now, Ordering::Release);
    }

    /// Drop the arena and reset the bookkeeping. Requires the lock.
    ///
    /// Returns whether an arena was actually freed.
    pub(crate) fn free(&self, state: &mut SlotState) -> bool {
        let Some(arena) = state.arena.take() else {
            return false;
        };
        drop(arena);
        state.usages = 0;
        self.last_used.store(NEVER_USED, Ordering::Release);
        true
    }
}
