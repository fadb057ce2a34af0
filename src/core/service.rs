//! Public entry points of the point ledger
//!
//! `LedgerService` is the interface any transport (HTTP handler, CLI, batch
//! job) calls. Mutations take the user's lock and run the
//! [`TransactionOrchestrator`]; reads go straight to the stores.
//!
//! ```text
//! LedgerService
//!     ├── LockRegistry<UserId>             (per-user FIFO exclusion)
//!     ├── TransactionOrchestrator<B, H>    (read → write → append → compensate)
//!     ├── Arc<B: BalanceStore>
//!     └── Arc<H: HistoryStore>
//! ```
//!
//! Reads are not linearized with concurrent writes: `get_balance` may observe
//! a balance that a still-running operation is about to restore.

use std::sync::Arc;

use tracing::instrument;

use super::lock_registry::LockRegistry;
use super::orchestrator::TransactionOrchestrator;
use super::traits::{BalanceStore, HistoryStore};
use crate::types::{
    Balance, HistoryEntry, LedgerError, OperationRecord, OperationType, Points, TransactionType,
    UserId,
};

/// Point ledger service
///
/// Cloning is cheap; clones share stores and locks, so a clone can be moved
/// into each spawned task.
#[derive(Debug)]
pub struct LedgerService<B, H> {
    locks: LockRegistry<UserId>,
    orchestrator: TransactionOrchestrator<B, H>,
    balances: Arc<B>,
    history: Arc<H>,
}

impl<B, H> LedgerService<B, H>
where
    B: BalanceStore,
    H: HistoryStore,
{
    /// Create a service over the given stores with a fresh lock registry
    pub fn new(balances: Arc<B>, history: Arc<H>) -> Self {
        Self {
            locks: LockRegistry::new(),
            orchestrator: TransactionOrchestrator::new(
                Arc::clone(&balances),
                Arc::clone(&history),
            ),
            balances,
            history,
        }
    }

    /// Current balance of a user
    #[instrument(skip(self))]
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        self.balances
            .get(user_id)
            .await?
            .ok_or_else(|| LedgerError::not_found(user_id))
    }

    /// History of a user in insertion order
    ///
    /// Fails with `NotFound` for a user that was never initialized; an
    /// initialized user without mutations yields an empty list.
    #[instrument(skip(self))]
    pub async fn get_history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, LedgerError> {
        let entries = self.history.select_all_by_user_id(user_id).await?;
        if entries.is_empty() && self.balances.get(user_id).await?.is_none() {
            return Err(LedgerError::not_found(user_id));
        }
        Ok(entries)
    }

    /// Add points to a user's balance
    #[instrument(skip(self))]
    pub async fn charge(&self, user_id: UserId, amount: Points) -> Result<Balance, LedgerError> {
        self.locks
            .with_lock(user_id, || self.orchestrator.charge(user_id, amount))
            .await
    }

    /// Take points from a user's balance
    #[instrument(skip(self))]
    pub async fn use_points(&self, user_id: UserId, amount: Points) -> Result<Balance, LedgerError> {
        self.locks
            .with_lock(user_id, || self.orchestrator.use_points(user_id, amount))
            .await
    }

    /// Initialize a user with a zero balance (returns the balance if already open)
    #[instrument(skip(self))]
    pub async fn open_account(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        self.locks
            .with_lock(user_id, || self.orchestrator.open(user_id))
            .await
    }

    /// Run a replayed operation through the matching entry point
    ///
    /// Charge and use records without an amount are rejected with
    /// `MissingAmount` before the user lock is taken.
    pub async fn apply(&self, record: &OperationRecord) -> Result<Balance, LedgerError> {
        let amount_for = |kind: TransactionType| {
            record
                .amount
                .ok_or_else(|| LedgerError::missing_amount(record.user, kind))
        };
        match record.op {
            OperationType::Open => self.open_account(record.user).await,
            OperationType::Charge => {
                let amount = amount_for(TransactionType::Charge)?;
                self.charge(record.user, amount).await
            }
            OperationType::Use => {
                let amount = amount_for(TransactionType::Use)?;
                self.use_points(record.user, amount).await
            }
        }
    }

    /// The registry guarding mutations
    pub fn locks(&self) -> &LockRegistry<UserId> {
        &self.locks
    }

    /// The balance store behind this service
    pub fn balance_store(&self) -> &Arc<B> {
        &self.balances
    }

    /// The history store behind this service
    pub fn history_store(&self) -> &Arc<H> {
        &self.history
    }
}

impl<B, H> Clone for LedgerService<B, H> {
    fn clone(&self) -> Self {
        Self {
            locks: self.locks.clone(),
            orchestrator: self.orchestrator.clone(),
            balances: Arc::clone(&self.balances),
            history: Arc::clone(&self.history),
        }
    }
}
