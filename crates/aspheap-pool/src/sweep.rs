//! Background eviction of idle arenas.
//!
//! The sweep thread ticks at a fixed interval for as long as the pool lives.
//! Each pass frees the arena of every slot idle for at least the threshold,
//! whether or not the slot sits in the availability queue. It only ever
//! `try_lock`s, so a checked-out slot is skipped rather than waited on.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use tracing::{debug, trace};

use crate::error::HeapError;
use crate::pool::{nanos, Shared};
use crate::slot::Slot;

/// Handle to the running sweep thread. Dropping it stops and joins the thread.
pub(crate) struct Sweeper {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        idle: Duration,
        interval: Duration,
    ) -> Result<Self, HeapError> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("aspheap-sweep".into())
            .spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let freed = sweep_idle(&shared, idle);
                            if freed > 0 {
                                debug!(freed, "idle sweep freed arenas");
                            }
                        }
                        // Disconnected once the pool drops the sender.
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                trace!("idle sweep stopped");
            })
            .map_err(HeapError::SweepSpawn)?;

        debug!(?idle, ?interval, "idle sweep started");
        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// One sweep pass over every slot. Returns the number of arenas freed.
pub(crate) fn sweep_idle(shared: &Shared, idle: Duration) -> usize {
    sweep_idle_at(shared, nanos(idle), shared.now())
}

fn sweep_idle_at(shared: &Shared, threshold: u64, now: u64) -> usize {
    let idle_long_enough = |slot: &Slot| now.saturating_sub(slot.last_used()) >= threshold;
    let mut freed = 0;
    for (index, slot) in shared.slots.iter().enumerate() {
        if !idle_long_enough(slot) {
            continue;
        }
        let Some(mut state) = slot.state.try_lock() else {
            continue;
        };
        // The slot may have been checked out and back in since the first look.
        if !idle_long_enough(slot) {
            continue;
        }
        if slot.free(&mut state) {
            shared.stats.record_idle_eviction();
            freed += 1;
            trace!(slot = index, "freed idle arena");
        }
    }
    freed
}
