//! Application entry point and dispatch.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use aspheap_pool::{Allocator, HeapPool, HeapStats};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::output::{format_duration, format_number};
use crate::workload::{run_unit, UnitSummary};

/// Result of one workload run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Whether the workload allocated from pooled arenas.
    pub pooled: bool,
    /// Worker threads used.
    pub workers: usize,
    /// Units parsed across all workers.
    pub units: usize,
    /// Tokens lexed across all workers.
    pub tokens: usize,
    /// Wall time of the workload.
    pub elapsed: Duration,
    /// Counters right after the workload. Absent for heap runs.
    pub stats: Option<HeapStats>,
    /// Counters after the linger period. Absent when not lingering.
    pub stats_after_linger: Option<HeapStats>,
    /// Arenas still resident at the end.
    pub resident_arenas: Option<usize>,
}

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        clap_complete::generate(shell, &mut cmd, "aspheap", &mut std::io::stdout());
        return Ok(());
    }

    let report = if config.no_arena {
        run_heap(config)
    } else {
        run_pooled(config)?
    };

    if config.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing report")?
        );
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Run the workload against a pool built from `config`.
pub fn run_pooled(config: &AppConfig) -> Result<RunReport> {
    let pool_config = config.pool_config();
    let pool = HeapPool::new(pool_config).context("building arena pool")?;
    let workers = config.worker_count(pool.size());

    let started = Instant::now();
    let tokens = drive(workers, config.units, || pool.with_heap(run_unit));
    let elapsed = started.elapsed();
    let stats = pool.stats();
    info!(workers, units = config.units, ?elapsed, "pooled workload finished");

    let stats_after_linger = if config.linger.is_zero() {
        None
    } else {
        debug!(linger = ?config.linger, "lingering for idle sweep");
        thread::sleep(config.linger);
        Some(pool.stats())
    };

    Ok(RunReport {
        pooled: true,
        workers,
        units: workers * config.units,
        tokens,
        elapsed,
        stats: Some(stats),
        stats_after_linger,
        resident_arenas: Some(pool.resident_arenas()),
    })
}

/// Run the same workload on the ordinary heap.
#[must_use]
pub fn run_heap(config: &AppConfig) -> RunReport {
    let workers = config.worker_count(config.pool_config().size);
    let started = Instant::now();
    let tokens = drive(workers, config.units, || run_unit(Allocator::Heap));
    let elapsed = started.elapsed();
    info!(workers, units = config.units, ?elapsed, "heap workload finished");

    RunReport {
        pooled: false,
        workers,
        units: workers * config.units,
        tokens,
        elapsed,
        stats: None,
        stats_after_linger: None,
        resident_arenas: None,
    }
}

/// Run `units` calls of `unit` on each of `workers` threads. Returns total tokens.
fn drive<F>(workers: usize, units: usize, unit: F) -> usize
where
    F: Fn() -> UnitSummary + Sync,
{
    let unit = &unit;
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| scope.spawn(move || (0..units).map(|_| unit().tokens).sum::<usize>()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .sum()
    })
}

fn print_report(report: &RunReport) {
    let mode = if report.pooled { "pooled arenas" } else { "heap" };
    println!("Workload:    {mode}");
    println!("Workers:     {}", report.workers);
    println!("Units:       {}", format_number(report.units as u64));
    println!("Tokens:      {}", format_number(report.tokens as u64));
    println!("Elapsed:     {}", format_duration(report.elapsed));
    if let Some(stats) = &report.stats {
        print_stats("After run", stats);
    }
    if let Some(stats) = &report.stats_after_linger {
        print_stats("After linger", stats);
    }
    if let Some(resident) = report.resident_arenas {
        println!("Resident:    {resident}");
    }
}

fn print_stats(label: &str, stats: &HeapStats) {
    println!("{label}:");
    println!("  created:         {}", format_number(stats.created));
    println!("  freed:           {}", format_number(stats.freed));
    println!("  usage evictions: {}", format_number(stats.usage_evictions));
    println!("  idle evictions:  {}", format_number(stats.idle_evictions));
    println!("  acquisitions:    {}", format_number(stats.acquisitions));
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn config(args: &[&str]) -> AppConfig {
        let mut argv = vec!["aspheap"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn pooled_run_recycles_arenas() {
        let config = config(&[
            "--size",
            "2",
            "--workers",
            "2",
            "--units",
            "25",
            "--usages-before-free",
            "-1",
            "--idle-time",
            "0",
        ]);
        let report = run_pooled(&config).unwrap();
        let stats = report.stats.unwrap();
        assert_eq!(report.units, 50);
        assert_eq!(stats.acquisitions, 50);
        assert!(stats.created <= 2);
        assert_eq!(stats.freed, 0);
    }

    #[test]
    fn usage_limit_forces_recreation() {
        let config = config(&[
            "--size",
            "1",
            "--workers",
            "1",
            "--units",
            "9",
            "--usages-before-free",
            "2",
            "--idle-time",
            "0",
        ]);
        let stats = run_pooled(&config).unwrap().stats.unwrap();
        assert_eq!(stats.usage_evictions, 3);
        assert_eq!(stats.created, 3);
    }

    #[test]
    fn heap_run_matches_pooled_tokens() {
        let config = config(&[
            "--size",
            "1",
            "--workers",
            "2",
            "--units",
            "3",
            "--idle-time",
            "0",
        ]);
        let heap = run_heap(&config);
        let pooled = run_pooled(&config).unwrap();
        assert_eq!(heap.tokens, pooled.tokens);
        assert!(heap.stats.is_none());
    }
}
