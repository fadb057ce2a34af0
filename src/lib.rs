//! Point Ledger Library
//! # Overview
//!
//! Per-user point balances with an append-only history. Mutations on the same
//! user are serialized in arrival order; different users proceed in parallel.
//!
//! # Architecture
//!
//! - [`types`] - Balances, history entries, operation records and errors
//! - [`core`] - Ledger logic:
//!   - [`core::lock_registry`] - Per-key FIFO mutual exclusion
//!   - [`core::orchestrator`] - Read, write, append and compensate for one mutation
//!   - [`core::service`] - `get_balance`, `get_history`, `charge`, `use_points`, `open_account`
//!   - [`core::batch_processor`] - Replay of operation batches partitioned by user
//! - [`store`] - In-memory stores and fault-injecting wrappers
//! - [`io`] - CSV input and output
//! - [`strategy`] - Sequential and concurrent replay pipelines
//! - [`cli`] - CLI argument parsing
//!
//! # Operations
//!
//! - **Charge**: add points to an existing balance (fails on overflow)
//! - **Use**: take points from an existing balance (fails if it does not cover the amount)
//! - **Open**: initialize a user with a zero balance
//!
//! Every successful charge or use writes the new balance, then appends a
//! history entry. If the append fails the old balance is written back.

pub mod cli;
pub mod core;
pub mod io;
pub mod store;
pub mod strategy;
pub mod types;

pub use core::{LedgerService, LockRegistry};
pub use io::write_balances_csv;
pub use types::{
    Balance, HistoryEntry, LedgerError, OperationRecord, OperationType, Points, TransactionType,
    UserId,
};
