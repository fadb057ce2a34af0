//! Core ledger logic
//!
//! - `traits` - Store abstractions the engine is written against
//! - `lock_registry` - Per-key FIFO mutual exclusion
//! - `orchestrator` - Read, write, append and compensate for one mutation
//! - `service` - Public ledger operations
//! - `batch_processor` - Replay of operation batches partitioned by user

pub mod batch_processor;
pub mod lock_registry;
pub mod orchestrator;
pub mod service;
pub mod traits;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use lock_registry::{LockGuard, LockRegistry};
pub use orchestrator::TransactionOrchestrator;
pub use service::LedgerService;
pub use traits::{BalanceStore, HistoryStore};
