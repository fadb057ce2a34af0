//! Operation records replayed against the ledger
//!
//! The replay pipeline reads these from CSV and hands them to the service one
//! at a time. They are an input format only; the core never stores them.

use super::balance::{Points, UserId};

/// Operations the replay pipeline understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Initialize the user with a zero balance (no-op if already present)
    Open,

    /// Add points to an existing balance
    Charge,

    /// Take points from an existing balance
    Use,
}

/// One operation as read from the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    /// What to do
    pub op: OperationType,

    /// Which user to do it to
    pub user: UserId,

    /// Points involved
    ///
    /// Always present and positive for charge and use. Ignored for open.
    pub amount: Option<Points>,
}
