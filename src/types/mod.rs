//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `balance`: Balance and the identifier/amount aliases
//! - `history`: History entries and transaction kinds
//! - `operation`: Operation records read by the replay pipeline
//! - `error`: Error types for the ledger and the replay pipeline

pub mod balance;
pub mod error;
pub mod history;
pub mod operation;

pub use balance::{Balance, Points, UserId};
pub use error::{LedgerError, ReplayError, StoreError, StoreKind};
pub use history::{HistoryEntry, NewHistoryEntry, TransactionType};
pub use operation::{OperationRecord, OperationType};
