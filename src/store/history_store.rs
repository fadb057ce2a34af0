//! In-memory history store
//!
//! This module provides the `InMemoryHistoryStore` struct, a `DashMap`-backed
//! implementation of [`HistoryStore`]. Each user has an append-only vector of
//! entries; ids are assigned inside the user's map entry, so they increase by
//! one per user without gaps even under concurrent appends.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::simulate_latency;
use crate::core::HistoryStore;
use crate::types::{HistoryEntry, NewHistoryEntry, StoreError, UserId};

/// Thread-safe in-memory append-only history
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    /// Entries per user in insertion order
    entries: DashMap<UserId, Vec<HistoryEntry>>,

    /// Delay applied before every call
    latency: Duration,
}

impl InMemoryHistoryStore {
    /// Create an empty store with no simulated latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that sleeps for `latency` on every call
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            latency,
        }
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        simulate_latency(self.latency).await;

        let mut entries = self.entries.entry(entry.user_id).or_default();
        let stored = entry.with_id(entries.len() as u64 + 1);
        entries.push(stored.clone());

        trace!(user_id = stored.user_id, id = stored.id, kind = %stored.kind, "history appended");
        Ok(stored)
    }

    async fn select_all_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        simulate_latency(self.latency).await;
        Ok(self
            .entries
            .get(&user_id)
            .map(|entries| entries.value().clone())
            .unwrap_or_default())
    }
}
