//! Store implementations
//!
//! Concrete collaborators for the [`BalanceStore`](crate::core::BalanceStore)
//! and [`HistoryStore`](crate::core::HistoryStore) traits:
//!
//! - `balance_store` - In-memory balances keyed by user
//! - `history_store` - In-memory append-only history, ids per user
//! - `fault` - Wrappers that inject failures and count calls
//!
//! The in-memory stores can simulate per-call I/O latency so that the
//! suspension points of a real backend show up under test.

pub mod balance_store;
pub mod fault;
pub mod history_store;

pub use balance_store::InMemoryBalanceStore;
pub use fault::{FaultPlan, FaultSwitch, FaultyBalanceStore, FaultyHistoryStore};
pub use history_store::InMemoryHistoryStore;

use std::time::Duration;

/// Suspend for the configured store latency, if any
pub(crate) async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}
