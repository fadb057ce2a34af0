//! Concurrent batch processing strategy
//!
//! # Architecture
//!
//! ```text
//! ConcurrentProcessingStrategy
//!     ├── ReplayConfig   (batch_size, worker_threads)
//!     ├── AsyncReader    (batch CSV reading)
//!     └── BatchProcessor (user partitioning + tasks)
//!         └── LedgerService (per-user locks over the stores)
//! ```
//!
//! Batches are processed one after another so a user's operations keep file
//! order even when they span batches. Within a batch every user runs in its
//! own task on a multi-threaded runtime.

use crate::core::BatchProcessor;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_balances_csv;
use crate::strategy::{collect_balances, ProcessingStrategy, StoreConfig};
use crate::types::ReplayError;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Runtime worker threads
    pub worker_threads: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            worker_threads: num_cpus::get(),
        }
    }
}

impl ReplayConfig {
    /// Create a config, replacing zero values with the defaults
    pub fn new(batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            warn!(
                worker_threads,
                default = default.worker_threads,
                "invalid worker thread count, using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
        }
    }
}

/// Concurrent batch processing strategy
#[derive(Debug, Clone, Default)]
pub struct ConcurrentProcessingStrategy {
    config: ReplayConfig,
    stores: StoreConfig,
}

impl ConcurrentProcessingStrategy {
    pub fn new(config: ReplayConfig, stores: StoreConfig) -> Self {
        Self { config, stores }
    }
}

impl ProcessingStrategy for ConcurrentProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), ReplayError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .enable_time()
            .build()
            .map_err(|e| ReplayError::Runtime {
                message: e.to_string(),
            })?;

        let rows = runtime.block_on(async {
            let ledger = self.stores.build_ledger();
            let processor = BatchProcessor::new(ledger.clone());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| ReplayError::open(input_path, e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut applied = 0usize;
            let mut rejected = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                debug!(size = batch.len(), "processing batch");
                for result in processor.process_batch(batch).await? {
                    match result.result {
                        Ok(_) => applied += 1,
                        Err(e) => {
                            rejected += 1;
                            warn!(
                                user_id = result.record.user,
                                op = ?result.record.op,
                                error = %e,
                                "operation rejected"
                            );
                        }
                    }
                }
            }

            info!(applied, rejected, "replay finished");
            collect_balances(&ledger).await
        })?;

        write_balances_csv(&rows, output).map_err(|message| ReplayError::Io { message })
    }
}
