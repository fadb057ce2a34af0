//! Fault injection for store collaborators
//!
//! Wrappers around any [`BalanceStore`] or [`HistoryStore`] that fail on demand
//! and count calls. They exist to drive the compensation paths of the
//! transaction engine: a history append that fails after the balance write, and
//! a compensating balance write that fails too.
//!
//! ```text
//! FaultyHistoryStore<H>
//!     ├── H            (real store, used when the switch does not trip)
//!     └── FaultSwitch  (plan + call counters)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::core::{BalanceStore, HistoryStore};
use crate::types::{Balance, HistoryEntry, NewHistoryEntry, Points, StoreError, UserId};

/// When a guarded call should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPlan {
    /// Never fail
    Never,

    /// Fail every call
    Always,

    /// Fail every nth call, counted from the switch's creation (0 = never)
    EveryNth(u64),

    /// Fail the next call only, then revert to `Never`
    Once,
}

/// Armable failure switch with call accounting
#[derive(Debug)]
pub struct FaultSwitch {
    plan: Mutex<FaultPlan>,
    calls: AtomicU64,
    failures: AtomicU64,
}

impl FaultSwitch {
    pub fn new(plan: FaultPlan) -> Self {
        Self {
            plan: Mutex::new(plan),
            calls: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Replace the current plan
    pub fn arm(&self, plan: FaultPlan) {
        *self.plan.lock() = plan;
    }

    /// Record a call and decide whether it fails
    pub fn trip(&self) -> bool {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut plan = self.plan.lock();
        let fail = match *plan {
            FaultPlan::Never => false,
            FaultPlan::Always => true,
            FaultPlan::EveryNth(n) => n > 0 && call % n == 0,
            FaultPlan::Once => {
                *plan = FaultPlan::Never;
                true
            }
        };
        if fail {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        fail
    }

    /// Calls seen so far, failed or not
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that were failed
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }
}

impl Default for FaultSwitch {
    fn default() -> Self {
        Self::new(FaultPlan::Never)
    }
}

/// History store whose appends fail according to a [`FaultPlan`]
#[derive(Debug)]
pub struct FaultyHistoryStore<H> {
    inner: H,
    appends: FaultSwitch,
}

impl<H: HistoryStore> FaultyHistoryStore<H> {
    pub fn new(inner: H, plan: FaultPlan) -> Self {
        Self {
            inner,
            appends: FaultSwitch::new(plan),
        }
    }

    /// Switch guarding `append`
    pub fn appends(&self) -> &FaultSwitch {
        &self.appends
    }

    /// The wrapped store
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: HistoryStore> HistoryStore for FaultyHistoryStore<H> {
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        if self.appends.trip() {
            debug!(user_id = entry.user_id, "injecting history append failure");
            return Err(StoreError::history("injected append failure"));
        }
        self.inner.append(entry).await
    }

    async fn select_all_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        self.inner.select_all_by_user_id(user_id).await
    }
}

/// Balance store whose writes fail according to a [`FaultPlan`]
///
/// Reads always pass through but are counted.
#[derive(Debug)]
pub struct FaultyBalanceStore<B> {
    inner: B,
    writes: FaultSwitch,
    reads: AtomicU64,
}

impl<B: BalanceStore> FaultyBalanceStore<B> {
    pub fn new(inner: B, plan: FaultPlan) -> Self {
        Self {
            inner,
            writes: FaultSwitch::new(plan),
            reads: AtomicU64::new(0),
        }
    }

    /// Switch guarding `set`
    pub fn writes(&self) -> &FaultSwitch {
        &self.writes
    }

    /// Number of `get` calls seen
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// The wrapped store
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: BalanceStore> BalanceStore for FaultyBalanceStore<B> {
    async fn get(&self, user_id: UserId) -> Result<Option<Balance>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(user_id).await
    }

    async fn set(&self, user_id: UserId, amount: Points) -> Result<Balance, StoreError> {
        if self.writes.trip() {
            debug!(user_id, amount, "injecting balance write failure");
            return Err(StoreError::balance("injected write failure"));
        }
        self.inner.set(user_id, amount).await
    }
}
