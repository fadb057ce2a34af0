//! Processing strategies for replaying operation files
//!
//! A strategy is a complete pipeline: read operations from CSV, run them
//! through a [`LedgerService`], write the final state. Which one runs is
//! selected at runtime from the command line.

use crate::cli::StrategyType;
use crate::core::LedgerService;
use crate::io::BalanceRow;
use crate::store::{FaultPlan, FaultyHistoryStore, InMemoryBalanceStore, InMemoryHistoryStore};
use crate::types::ReplayError;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub mod concurrent;
pub mod sequential;

pub use concurrent::{ConcurrentProcessingStrategy, ReplayConfig};
pub use sequential::SequentialProcessingStrategy;

/// Service over the in-memory stores used by the replay pipeline
pub type ReplayLedger =
    LedgerService<InMemoryBalanceStore, FaultyHistoryStore<InMemoryHistoryStore>>;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay operations from `input_path` and write the final state to `output`
    ///
    /// Invalid rows and rejected operations are logged and skipped. Only fatal
    /// errors are returned: the input cannot be opened, the runtime cannot be
    /// built, or output cannot be written.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), ReplayError>;
}

/// How the replay stores behave
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Simulated delay on every store call
    pub latency: Duration,

    /// Fail every nth history append (None = never)
    pub fail_history_every: Option<u64>,
}

impl StoreConfig {
    pub fn new(latency: Duration, fail_history_every: Option<u64>) -> Self {
        Self {
            latency,
            fail_history_every,
        }
    }

    /// Build a service over fresh stores configured by `self`
    pub fn build_ledger(&self) -> ReplayLedger {
        let plan = match self.fail_history_every {
            Some(n) => FaultPlan::EveryNth(n),
            None => FaultPlan::Never,
        };

        LedgerService::new(
            Arc::new(InMemoryBalanceStore::with_latency(self.latency)),
            Arc::new(FaultyHistoryStore::new(
                InMemoryHistoryStore::with_latency(self.latency),
                plan,
            )),
        )
    }
}

/// Read back every user's balance and history size
pub(crate) async fn collect_balances(ledger: &ReplayLedger) -> Result<Vec<BalanceRow>, ReplayError> {
    let balances = ledger.balance_store().all();

    let mut rows = Vec::with_capacity(balances.len());
    for balance in balances {
        let entries = ledger.get_history(balance.user_id).await?.len();
        rows.push(BalanceRow::new(&balance, entries));
    }

    Ok(rows)
}

/// Create a processing strategy based on the specified strategy type
///
/// `replay` only affects the concurrent strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    replay: ReplayConfig,
    stores: StoreConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sequential => Box::new(SequentialProcessingStrategy::new(stores)),
        StrategyType::Concurrent => Box::new(ConcurrentProcessingStrategy::new(replay, stores)),
    }
}
