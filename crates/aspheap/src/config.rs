//! Application configuration from CLI flags and environment.

use std::time::Duration;

use aspheap_pool::PoolConfig;
use clap::Parser;

/// Exercise a pool of recycled parse arenas.
#[derive(Parser, Debug)]
#[command(name = "aspheap", version, about)]
pub struct AppConfig {
    /// Number of pooled arenas (0 = one per available CPU).
    #[arg(short, long, default_value = "0", env = "ASPHEAP_POOL_SIZE")]
    pub size: usize,

    /// Checkout cycles before release frees an arena (0 or negative disables).
    #[arg(
        long,
        default_value = "10",
        env = "ASPHEAP_USAGES_BEFORE_FREE",
        allow_negative_numbers = true
    )]
    pub usages_before_free: i64,

    /// Idle time before the sweep frees an arena (e.g. "500ms", "5s"; 0 disables).
    #[arg(long, default_value = "5s", env = "ASPHEAP_IDLE_TIME", value_parser = parse_duration)]
    pub idle_time: Duration,

    /// Tick of the idle sweep.
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub sweep_interval: Duration,

    /// Bytes pre-allocated for each new arena.
    #[arg(long, default_value = "0")]
    pub arena_capacity: usize,

    /// Worker threads (0 = pool size).
    #[arg(short, long, default_value = "0")]
    pub workers: usize,

    /// Parse units each worker runs.
    #[arg(short, long, default_value = "1000")]
    pub units: usize,

    /// Run the workload on the ordinary heap instead of the pool.
    #[arg(long)]
    pub no_arena: bool,

    /// Wait this long after the workload and report counters again.
    #[arg(long, default_value = "0s", value_parser = parse_duration)]
    pub linger: Duration,

    /// Print counters as JSON.
    #[arg(long)]
    pub json: bool,

    /// Verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Build the pool configuration from the flags.
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        let size = if self.size == 0 {
            PoolConfig::default().size
        } else {
            self.size
        };
        PoolConfig::from_signed(size, self.usages_before_free, self.idle_time)
            .with_sweep_interval(self.sweep_interval)
            .with_arena_capacity(self.arena_capacity)
    }

    /// Number of worker threads to run.
    #[must_use]
    pub fn worker_count(&self, pool_size: usize) -> usize {
        if self.workers == 0 {
            pool_size
        } else {
            self.workers
        }
    }
}

/// Parse a duration string like "500ms", "30s", "5m", "1h".
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("invalid duration: {s:?}");
    let parse = |n: &str| n.parse::<u64>().map_err(|_| invalid());
    if let Some(ms) = s.strip_suffix("ms") {
        Ok(Duration::from_millis(parse(ms)?))
    } else if let Some(mins) = s.strip_suffix('m') {
        let secs = parse(mins)?.checked_mul(60).ok_or_else(invalid)?;
        Ok(Duration::from_secs(secs))
    } else if let Some(hours) = s.strip_suffix('h') {
        let secs = parse(hours)?.checked_mul(3600).ok_or_else(invalid)?;
        Ok(Duration::from_secs(secs))
    } else if let Some(secs) = s.strip_suffix('s') {
        Ok(Duration::from_secs(parse(secs)?))
    } else {
        Ok(Duration::from_secs(parse(s)?))
    }
}
