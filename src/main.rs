//! Point ledger replay CLI
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --strategy sequential operations.csv > balances.csv
//! cargo run -- --batch-size 2000 --workers 8 operations.csv > balances.csv
//! RUST_LOG=debug cargo run -- --latency-ms 5 --fail-history-every 10 operations.csv
//! ```
//!
//! Final balances go to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use point_ledger::cli;
use point_ledger::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let strategy = strategy::create_strategy(
        args.strategy,
        args.to_replay_config(),
        args.to_store_config(),
    );

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "replay failed");
        process::exit(1);
    }
}
