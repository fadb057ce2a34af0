//! Shared fixtures for ledger integration tests

#![allow(dead_code)]

use point_ledger::core::LedgerService;
use point_ledger::store::{
    FaultPlan, FaultyBalanceStore, FaultyHistoryStore, InMemoryBalanceStore, InMemoryHistoryStore,
};
use point_ledger::types::{Points, UserId};
use std::sync::Arc;
use std::time::Duration;

pub type TestLedger = LedgerService<
    FaultyBalanceStore<InMemoryBalanceStore>,
    FaultyHistoryStore<InMemoryHistoryStore>,
>;

/// Ledger over latency-free stores with no faults armed
pub fn ledger() -> TestLedger {
    ledger_with_latency(Duration::ZERO)
}

/// Ledger whose stores sleep for `latency` on every call
pub fn ledger_with_latency(latency: Duration) -> TestLedger {
    LedgerService::new(
        Arc::new(FaultyBalanceStore::new(
            InMemoryBalanceStore::with_latency(latency),
            FaultPlan::Never,
        )),
        Arc::new(FaultyHistoryStore::new(
            InMemoryHistoryStore::with_latency(latency),
            FaultPlan::Never,
        )),
    )
}

/// Open `user_id` and charge it to `amount` through the service
pub async fn seed(ledger: &TestLedger, user_id: UserId, amount: Points) {
    ledger.open_account(user_id).await.unwrap();
    if amount > 0 {
        ledger.charge(user_id, amount).await.unwrap();
    }
}
