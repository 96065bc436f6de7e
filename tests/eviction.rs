//! Usage and idle eviction, observed through the pool counters.

use std::thread;
use std::time::{Duration, Instant};

use aspheap_tests::pool;

#[test]
fn usage_eviction_after_limit_plus_one_cycles() {
    for limit in [0u32, 1, 3] {
        let pool = pool(1, Some(limit), None);
        for _ in 0..limit {
            pool.acquire().release();
        }
        assert_eq!(pool.stats().freed, 0, "freed early with limit {limit}");

        pool.acquire().release();
        let stats = pool.stats();
        assert_eq!(stats.freed, 1, "limit {limit}");
        assert_eq!(stats.created, 1);

        let guard = pool.acquire();
        assert_eq!(pool.stats().created, 2);
        assert_eq!(guard.usages(), 0);
    }
}

#[test]
fn disabled_usage_limit_never_frees() {
    let pool = pool(1, None, None);
    for _ in 0..500 {
        pool.acquire().release();
    }
    let stats = pool.stats();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.freed, 0);
}

/// Size 2, free after every release, no sweep. A freed slot comes back with
/// a fresh, empty arena.
#[test]
fn freed_slot_comes_back_empty() {
    let pool = pool(2, Some(0), None);

    let guard = pool.acquire();
    assert_eq!(guard.index(), 0);
    {
        let seq = guard.allocator().make_slice::<u64>(3, 3);
        assert_eq!(&seq[..], &[0, 0, 0]);
    }
    assert!(guard.allocated_bytes() > 0);
    guard.release();
    assert_eq!(pool.stats().freed, 1);

    // FIFO: slot 1 is ahead of the returned slot 0.
    let other = pool.acquire();
    assert_eq!(other.index(), 1);
    other.release();

    let again = pool.acquire();
    assert_eq!(again.index(), 0);
    assert_eq!(again.allocated_bytes(), 0);
    let stats = pool.stats();
    assert_eq!(stats.created, 3);
    assert_eq!(stats.freed, 2);
}

#[test]
fn idle_slot_freed_by_background_sweep() {
    let idle = Duration::from_millis(60);
    let pool = pool(2, None, Some(idle));
    pool.acquire().release();
    let released = Instant::now();
    assert_eq!(pool.resident_arenas(), 1);

    let deadline = released + Duration::from_secs(5);
    while pool.stats().idle_evictions == 0 {
        assert!(Instant::now() < deadline, "sweep never freed the idle arena");
        thread::sleep(Duration::from_millis(5));
    }
    assert!(released.elapsed() >= idle, "freed before the idle threshold");
    assert_eq!(pool.resident_arenas(), 0);
}

#[test]
fn release_restarts_the_idle_clock() {
    let idle = Duration::from_millis(150);
    let pool = pool(1, None, Some(idle));

    // Keep touching the slot more often than the threshold.
    let started = Instant::now();
    while started.elapsed() < idle * 3 {
        pool.acquire().release();
        thread::sleep(idle / 10);
    }
    assert_eq!(pool.stats().idle_evictions, 0);
    assert_eq!(pool.stats().created, 1);
}

#[test]
fn sweep_skips_checked_out_slot() {
    let pool = pool(1, None, Some(Duration::from_millis(5)));
    let guard = pool.acquire();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(pool.stats().idle_evictions, 0);
    let seq = guard.allocator().make_slice::<u8>(16, 16);
    assert_eq!(seq.len(), 16);
}

#[test]
fn slots_are_independent() {
    let pool = pool(2, Some(0), None);
    let keeper = pool.acquire();
    let alloc = keeper.allocator();
    let kept = alloc.append(alloc.make_slice::<u32>(0, 4), [10, 20, 30]);

    // Churn the other slot through many free/recreate cycles.
    for _ in 0..50 {
        let other = pool.acquire();
        assert_ne!(other.index(), keeper.index());
        let tmp = other.allocator().make_slice::<u32>(8, 8);
        assert_eq!(tmp.len(), 8);
    }

    assert_eq!(&kept[..], &[10, 20, 30]);
    assert_eq!(pool.stats().usage_evictions, 50);
}
