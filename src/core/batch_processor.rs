//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! ledger operations through a [`LedgerService`]. A batch is split by user;
//! each user's operations run in order inside one task, and different users'
//! tasks run concurrently.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── LedgerService<B, H>  (shared stores and lock registry)
//! ```
//!
//! The per-user lock in the service already serializes same-user mutations.
//! Partitioning keeps the *input* order for each user, which the lock alone
//! does not promise across independently spawned tasks.

use std::collections::HashMap;

use tracing::{debug, error};

use super::service::LedgerService;
use super::traits::{BalanceStore, HistoryStore};
use crate::types::{Balance, LedgerError, OperationRecord, ReplayError, UserId};

/// Outcome of replaying a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was replayed
    pub record: OperationRecord,

    /// The resulting balance, or why the operation was rejected
    pub result: Result<Balance, LedgerError>,
}

/// Batch processor with user-based partitioning
#[derive(Debug)]
pub struct BatchProcessor<B, H> {
    service: LedgerService<B, H>,
}

impl<B, H> BatchProcessor<B, H>
where
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
{
    pub fn new(service: LedgerService<B, H>) -> Self {
        Self { service }
    }

    /// The service operations are replayed through
    pub fn service(&self) -> &LedgerService<B, H> {
        &self.service
    }

    /// Split a batch into per-user sub-batches, keeping each user's order
    pub fn partition_by_user(
        &self,
        batch: Vec<OperationRecord>,
    ) -> HashMap<UserId, Vec<OperationRecord>> {
        let mut user_batches: HashMap<UserId, Vec<OperationRecord>> = HashMap::new();

        for record in batch {
            user_batches.entry(record.user).or_default().push(record);
        }

        user_batches
    }

    /// Replay one user's operations sequentially
    ///
    /// Failed operations are recorded and do not stop the ones after them.
    pub async fn process_user_operations(
        &self,
        operations: Vec<OperationRecord>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for record in operations {
            let result = self.service.apply(&record).await;
            if let Err(e) = &result {
                debug!(user_id = record.user, op = ?record.op, error = %e, "operation rejected");
            }
            results.push(ProcessingResult { record, result });
        }

        results
    }

    /// Replay a batch, one task per user
    ///
    /// Results are grouped by user; the order across users is unspecified.
    /// Every task is awaited before returning. If any task panicked, the
    /// first such failure is returned as `TaskFailed`, since the outcome of
    /// that user's operations is unknown.
    pub async fn process_batch(
        &self,
        batch: Vec<OperationRecord>,
    ) -> Result<Vec<ProcessingResult>, ReplayError> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (user_id, operations) in user_batches {
            let processor = self.clone();
            let task = tokio::spawn(async move {
                processor.process_user_operations(operations).await
            });
            tasks.push((user_id, task));
        }

        let mut results = Vec::new();
        let mut failure = None;
        for (user_id, task) in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => {
                    error!(user_id, error = %e, "user task failed");
                    failure.get_or_insert(ReplayError::TaskFailed {
                        user_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}

impl<B, H> Clone for BatchProcessor<B, H> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}
