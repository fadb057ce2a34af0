//! Read-modify-write-append sequence for point mutations
//!
//! This module provides the `TransactionOrchestrator` struct, which performs
//! charge and use operations against a [`BalanceStore`] and a [`HistoryStore`].
//!
//! # Sequence
//!
//! ```text
//! read balance ─► check ─► write balance ─► append history ─► Ok(balance)
//!                   │            │                 │
//!                   ▼            ▼                 ▼
//!             Err (no writes)  Err (as is)   write original balance back
//!                                                  │
//!                                     ┌────────────┴─────────────┐
//!                                     ▼                          ▼
//!                          Err(Persistence(append))   Err(CompensationFailed)
//! ```
//!
//! # Concurrency
//!
//! The orchestrator does no locking of its own. Every method must run inside
//! the user's [`LockRegistry`](super::LockRegistry) critical section, which is
//! what [`LedgerService`](super::LedgerService) does; otherwise two operations
//! on the same user can read the same balance and one update is lost.
//!
//! # Compensation
//!
//! The two stores cannot commit atomically. If the history append fails after
//! the balance write, the original balance is written back and the append error
//! is returned. If that compensating write fails too, balance and history have
//! diverged and the caller receives `CompensationFailed` with both errors.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::traits::{BalanceStore, HistoryStore};
use crate::types::{
    Balance, LedgerError, NewHistoryEntry, Points, StoreError, TransactionType, UserId,
};

/// Executes point mutations against the balance and history stores
#[derive(Debug)]
pub struct TransactionOrchestrator<B, H> {
    balances: Arc<B>,
    history: Arc<H>,
}

impl<B, H> TransactionOrchestrator<B, H>
where
    B: BalanceStore,
    H: HistoryStore,
{
    /// Create a new orchestrator over the given stores
    pub fn new(balances: Arc<B>, history: Arc<H>) -> Self {
        Self { balances, history }
    }

    /// Add `amount` points to an existing balance
    ///
    /// # Returns
    ///
    /// * `Ok(Balance)` - The balance as written, with its write timestamp
    /// * `Err(LedgerError::NotFound)` - The user was never initialized
    /// * `Err(LedgerError::ArithmeticOverflow)` - The sum does not fit in `Points`
    /// * `Err(LedgerError::Persistence)` - A store failed (balance restored if it had been written)
    /// * `Err(LedgerError::CompensationFailed)` - The history append and the restore both failed
    #[instrument(skip(self), level = "debug")]
    pub async fn charge(&self, user_id: UserId, amount: Points) -> Result<Balance, LedgerError> {
        let current = self.load(user_id).await?;

        let new_amount = current
            .amount
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow(user_id, current.amount, amount))?;

        self.commit(current, new_amount, amount, TransactionType::Charge)
            .await
    }

    /// Take `amount` points from an existing balance
    ///
    /// The sufficiency check happens before any write, so a rejected use leaves
    /// no trace in either store.
    ///
    /// # Returns
    ///
    /// * `Ok(Balance)` - The balance as written, with its write timestamp
    /// * `Err(LedgerError::NotFound)` - The user was never initialized
    /// * `Err(LedgerError::InsufficientFunds)` - `amount` exceeds the current balance
    /// * `Err(LedgerError::Persistence)` - A store failed (balance restored if it had been written)
    /// * `Err(LedgerError::CompensationFailed)` - The history append and the restore both failed
    #[instrument(skip(self), level = "debug")]
    pub async fn use_points(
        &self,
        user_id: UserId,
        amount: Points,
    ) -> Result<Balance, LedgerError> {
        let current = self.load(user_id).await?;

        if !current.covers(amount) {
            warn!(
                user_id,
                balance = current.amount,
                requested = amount,
                "use rejected: insufficient points"
            );
            return Err(LedgerError::insufficient_funds(
                user_id,
                current.amount,
                amount,
            ));
        }

        // Cannot underflow: covered above
        let new_amount = current.amount - amount;

        self.commit(current, new_amount, amount, TransactionType::Use)
            .await
    }

    /// Initialize a user with a zero balance, or return the existing balance
    ///
    /// Writes no history: opening is not a point movement.
    #[instrument(skip(self), level = "debug")]
    pub async fn open(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        if let Some(existing) = self.balances.get(user_id).await? {
            debug!(user_id, "account already open");
            return Ok(existing);
        }

        let balance = self.balances.set(user_id, 0).await?;
        info!(user_id, "account opened");
        Ok(balance)
    }

    async fn load(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        match self.balances.get(user_id).await? {
            Some(balance) => Ok(balance),
            None => {
                warn!(user_id, "operation rejected: user not found");
                Err(LedgerError::not_found(user_id))
            }
        }
    }

    /// Write the new balance and record it, compensating if the record fails
    async fn commit(
        &self,
        current: Balance,
        new_amount: Points,
        delta: Points,
        kind: TransactionType,
    ) -> Result<Balance, LedgerError> {
        let user_id = current.user_id;

        // Nothing written yet if this fails, so no compensation
        let written = self.balances.set(user_id, new_amount).await?;

        let entry = NewHistoryEntry {
            user_id,
            amount: delta,
            balance_after: written.amount,
            kind,
            timestamp: written.updated_at,
        };

        match self.history.append(entry).await {
            Ok(recorded) => {
                info!(
                    user_id,
                    %kind,
                    amount = delta,
                    balance = written.amount,
                    history_id = recorded.id,
                    "points committed"
                );
                Ok(written)
            }
            Err(append_error) => Err(self.compensate(&current, append_error).await),
        }
    }

    /// Restore `original` after a failed history append
    ///
    /// Best effort and never retried. Returns the error to surface.
    async fn compensate(&self, original: &Balance, append_error: StoreError) -> LedgerError {
        let user_id = original.user_id;
        error!(
            user_id,
            error = %append_error,
            restore_to = original.amount,
            "history append failed, restoring balance"
        );

        match self.balances.set(user_id, original.amount).await {
            Ok(_) => LedgerError::Persistence(append_error),
            Err(compensation_error) => {
                error!(
                    user_id,
                    error = %compensation_error,
                    "balance restore failed, balance and history have diverged"
                );
                LedgerError::compensation_failed(user_id, append_error, compensation_error)
            }
        }
    }
}

impl<B, H> Clone for TransactionOrchestrator<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            history: Arc::clone(&self.history),
        }
    }
}
