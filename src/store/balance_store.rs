//! In-memory balance store
//!
//! This module provides the `InMemoryBalanceStore` struct, a `DashMap`-backed
//! implementation of [`BalanceStore`].
//!
//! # Thread Safety
//!
//! DashMap shards its locks, so reads and writes for different users never
//! contend. The store never holds a map reference across an await point; the
//! simulated latency runs before the map is touched.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::simulate_latency;
use crate::core::BalanceStore;
use crate::types::{Balance, Points, StoreError, UserId};

/// Thread-safe in-memory balance store
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    /// Current balance per user
    balances: DashMap<UserId, Balance>,

    /// Delay applied before every call
    latency: Duration,
}

impl InMemoryBalanceStore {
    /// Create an empty store with no simulated latency
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that sleeps for `latency` on every call
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            balances: DashMap::new(),
            latency,
        }
    }

    /// Snapshot of every stored balance, sorted by user
    pub fn all(&self) -> Vec<Balance> {
        let mut balances: Vec<Balance> = self
            .balances
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        balances.sort_by_key(|balance| balance.user_id);
        balances
    }
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn get(&self, user_id: UserId) -> Result<Option<Balance>, StoreError> {
        simulate_latency(self.latency).await;
        Ok(self.balances.get(&user_id).map(|entry| entry.value().clone()))
    }

    async fn set(&self, user_id: UserId, amount: Points) -> Result<Balance, StoreError> {
        simulate_latency(self.latency).await;
        let balance = Balance::new(user_id, amount);
        self.balances.insert(user_id, balance.clone());
        trace!(user_id, amount, "balance written");
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_unknown_user_returns_none() {
        let store = InMemoryBalanceStore::new();

        assert_eq!(store.get(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = InMemoryBalanceStore::new();

        let written = store.set(1, 500).await.unwrap();
        let read = store.get(1).await.unwrap().unwrap();

        assert_eq!(written.amount, 500);
        assert_eq!(read, written);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = InMemoryBalanceStore::new();

        store.set(1, 500).await.unwrap();
        store.set(1, 200).await.unwrap();

        assert_eq!(store.get(1).await.unwrap().unwrap().amount, 200);
    }

    #[tokio::test]
    async fn test_set_is_idempotent() {
        let store = InMemoryBalanceStore::new();

        store.set(1, 300).await.unwrap();
        store.set(1, 300).await.unwrap();

        assert_eq!(store.all().len(), 1);
        assert_eq!(store.get(1).await.unwrap().unwrap().amount, 300);
    }

    #[tokio::test]
    async fn test_all_is_sorted_by_user() {
        let store = InMemoryBalanceStore::new();

        store.set(3, 30).await.unwrap();
        store.set(1, 10).await.unwrap();
        store.set(2, 20).await.unwrap();

        let users: Vec<UserId> = store.all().iter().map(|b| b.user_id).collect();
        assert_eq!(users, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied_per_call() {
        let store = InMemoryBalanceStore::with_latency(Duration::from_millis(100));
        let start = tokio::time::Instant::now();

        store.set(1, 10).await.unwrap();
        store.get(1).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
