//! Balance-related types for the point ledger
//!
//! This module defines the Balance structure and the identifier and amount
//! aliases shared by every other module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier
///
/// Opaque key under which a balance and its history are stored.
pub type UserId = u64;

/// Point amount
///
/// Unsigned so that a negative balance cannot be represented, let alone persisted.
pub type Points = u64;

/// Current point total for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// The user this balance belongs to
    pub user_id: UserId,

    /// Points currently held by the user
    pub amount: Points,

    /// When the balance was last written
    ///
    /// Set by the balance store on every write; the orchestrator copies it
    /// into the history entry recorded for the same mutation.
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Create a balance stamped with the current time
    pub fn new(user_id: UserId, amount: Points) -> Self {
        Balance {
            user_id,
            amount,
            updated_at: Utc::now(),
        }
    }

    /// Whether `requested` points can be taken without going negative
    pub fn covers(&self, requested: Points) -> bool {
        self.amount >= requested
    }
}
