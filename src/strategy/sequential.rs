//! Sequential processing strategy
//!
//! Streams records with the synchronous [`SyncReader`] and awaits each
//! operation before reading the next, on a single-threaded runtime. Output is
//! the reference the concurrent strategy must agree with.

use crate::io::csv_format::write_balances_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{collect_balances, ProcessingStrategy, StoreConfig};
use crate::types::ReplayError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Sequential processing strategy
#[derive(Debug, Clone, Default)]
pub struct SequentialProcessingStrategy {
    stores: StoreConfig,
}

impl SequentialProcessingStrategy {
    pub fn new(stores: StoreConfig) -> Self {
        Self { stores }
    }
}

impl ProcessingStrategy for SequentialProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), ReplayError> {
        let reader = SyncReader::new(input_path)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| ReplayError::Runtime {
                message: e.to_string(),
            })?;

        let rows = runtime.block_on(async {
            let ledger = self.stores.build_ledger();
            let mut applied = 0usize;
            let mut rejected = 0usize;

            for result in reader {
                match result {
                    Ok(record) => match ledger.apply(&record).await {
                        Ok(_) => applied += 1,
                        Err(e) => {
                            rejected += 1;
                            warn!(
                                user_id = record.user,
                                op = ?record.op,
                                error = %e,
                                "operation rejected"
                            );
                        }
                    },
                    Err(e) => warn!(error = %e, "skipping invalid record"),
                }
            }

            info!(applied, rejected, "replay finished");
            collect_balances(&ledger).await
        })?;

        write_balances_csv(&rows, output).map_err(|message| ReplayError::Io { message })
    }
}
