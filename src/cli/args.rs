use crate::strategy::{ReplayConfig, StoreConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay point operations against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "point-ledger")]
#[command(about = "Replay point charge/use operations and print final balances", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file (op,user,amount)")]
    pub input_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "concurrent",
        help = "'sequential' for one operation at a time or 'concurrent' for per-user parallelism"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (concurrent mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Runtime worker threads (concurrent mode only)
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Simulated store latency in milliseconds
    #[arg(
        long = "latency-ms",
        value_name = "MILLIS",
        default_value_t = 0,
        help = "Delay applied to every balance and history store call"
    )]
    pub latency_ms: u64,

    /// Fail every nth history append
    #[arg(
        long = "fail-history-every",
        value_name = "N",
        help = "Inject a failure into every Nth history append to exercise rollback"
    )]
    pub fail_history_every: Option<u64>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sequential,
    Concurrent,
}

impl CliArgs {
    /// Build the batch configuration, falling back to defaults for unset values
    pub fn to_replay_config(&self) -> ReplayConfig {
        if self.batch_size.is_some() || self.workers.is_some() {
            let default = ReplayConfig::default();
            ReplayConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.workers.unwrap_or(default.worker_threads),
            )
        } else {
            ReplayConfig::default()
        }
    }

    /// Build the store configuration
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig::new(
            Duration::from_millis(self.latency_ms),
            self.fail_history_every,
        )
    }
}
