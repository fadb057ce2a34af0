//! History-related types for the point ledger
//!
//! This module defines the audit record written once per successful balance
//! mutation, together with the kind of mutation it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::balance::{Points, UserId};

/// Kind of balance mutation recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Points added to the balance
    Charge,

    /// Points taken from the balance
    Use,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Charge => f.write_str("CHARGE"),
            TransactionType::Use => f.write_str("USE"),
        }
    }
}

/// Immutable audit record of one balance mutation
///
/// Entries are append-only and strictly insertion-ordered per user. Both the
/// delta and the resulting balance are kept so a reader never has to guess
/// which one `amount` means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Sequence number, auto-incremented per user starting at 1
    pub id: u64,

    /// The user whose balance changed
    pub user_id: UserId,

    /// Points moved by this mutation (always the delta, never the balance)
    pub amount: Points,

    /// Balance after the mutation was applied
    pub balance_after: Points,

    /// Whether points were charged or used
    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Timestamp of the balance write this entry records
    pub timestamp: DateTime<Utc>,
}

/// History entry awaiting insertion
///
/// Carries everything except the id, which the history store assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub user_id: UserId,
    pub amount: Points,
    pub balance_after: Points,
    pub kind: TransactionType,
    pub timestamp: DateTime<Utc>,
}

impl NewHistoryEntry {
    /// Attach the store-assigned id, producing the persisted entry
    pub fn with_id(self, id: u64) -> HistoryEntry {
        HistoryEntry {
            id,
            user_id: self.user_id,
            amount: self.amount,
            balance_after: self.balance_after,
            kind: self.kind,
            timestamp: self.timestamp,
        }
    }
}
