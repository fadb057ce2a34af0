//! Collaborator traits for balance and history persistence
//!
//! The transaction engine never touches storage directly; it goes through
//! these two traits so that durable backends, in-memory stores and
//! fault-injecting wrappers can be used interchangeably.
//!
//! Every method is async because a real backend suspends on I/O, and the
//! per-user critical section is held across those suspension points.

use async_trait::async_trait;

use crate::types::{Balance, HistoryEntry, NewHistoryEntry, Points, StoreError, UserId};

/// Durable user → balance store
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Read the balance for a user
    ///
    /// Returns `Ok(None)` if the user was never initialized.
    async fn get(&self, user_id: UserId) -> Result<Option<Balance>, StoreError>;

    /// Upsert the balance for a user
    ///
    /// Idempotent: writing the same amount twice leaves the same state. The
    /// returned balance carries the timestamp of this write.
    async fn set(&self, user_id: UserId, amount: Points) -> Result<Balance, StoreError>;
}

/// Append-only store of history entries
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one entry and return it with its assigned id
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError>;

    /// All entries for a user in insertion order (empty if none)
    async fn select_all_by_user_id(&self, user_id: UserId)
        -> Result<Vec<HistoryEntry>, StoreError>;
}
