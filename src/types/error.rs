//! Error types for the point ledger
//!
//! Errors fall into three groups:
//!
//! - **Store errors** ([`StoreError`]): a collaborator's I/O failed
//! - **Ledger errors** ([`LedgerError`]): an operation was rejected or could not be persisted
//! - **Replay errors** ([`ReplayError`]): the CSV replay pipeline hit a fatal problem
//!
//! Ledger errors raised before any write (`NotFound`, `MissingAmount`, `InsufficientFunds`,
//! `ArithmeticOverflow`) guarantee that nothing was mutated.

use thiserror::Error;

use super::balance::{Points, UserId};
use super::history::TransactionType;

/// Which collaborator produced a store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Balance,
    History,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Balance => f.write_str("balance"),
            StoreKind::History => f.write_str("history"),
        }
    }
}

/// Persistence failure reported by a balance or history store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{store} store failure: {message}")]
pub struct StoreError {
    /// The store that failed
    pub store: StoreKind,

    /// Description of the failure
    pub message: String,
}

impl StoreError {
    /// Create a balance store failure
    pub fn balance(message: impl Into<String>) -> Self {
        StoreError {
            store: StoreKind::Balance,
            message: message.into(),
        }
    }

    /// Create a history store failure
    pub fn history(message: impl Into<String>) -> Self {
        StoreError {
            store: StoreKind::History,
            message: message.into(),
        }
    }
}

/// Main error type for ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The user was never initialized
    ///
    /// Raised before any write; nothing was mutated.
    #[error("User {user_id} not found")]
    NotFound {
        /// User that was looked up
        user_id: UserId,
    },

    /// A use request exceeded the current balance
    ///
    /// Raised before any write; the balance is unchanged.
    #[error("Insufficient points for user {user_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// User whose balance was checked
        user_id: UserId,
        /// Balance at the time of the check
        balance: Points,
        /// Points the caller asked to use
        requested: Points,
    },

    /// A charge would push the balance past the representable maximum
    ///
    /// Raised before any write; the balance is unchanged.
    #[error("Arithmetic overflow charging {amount} to user {user_id} with balance {balance}")]
    ArithmeticOverflow {
        /// User being charged
        user_id: UserId,
        /// Balance at the time of the check
        balance: Points,
        /// Points the caller asked to charge
        amount: Points,
    },

    /// A charge or use record arrived without the points to move
    ///
    /// Raised before any store call.
    #[error("{op} for user {user_id} requires an amount")]
    MissingAmount {
        /// User the record targets
        user_id: UserId,
        /// The operation that lacked an amount
        op: TransactionType,
    },

    /// A store failed and no compensation was needed or it succeeded
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    /// The history append failed and so did the compensating balance write
    ///
    /// Balance and history have diverged for this user: the balance holds the
    /// new value while no history entry records it.
    #[error("Compensation failed for user {user_id} after {append_error}: {compensation_error}")]
    CompensationFailed {
        /// User whose balance could not be restored
        user_id: UserId,
        /// The append failure that triggered compensation
        append_error: StoreError,
        /// The failure of the compensating write itself
        compensation_error: StoreError,
    },
}

impl LedgerError {
    /// Create a NotFound error
    pub fn not_found(user_id: UserId) -> Self {
        LedgerError::NotFound { user_id }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(user_id: UserId, balance: Points, requested: Points) -> Self {
        LedgerError::InsufficientFunds {
            user_id,
            balance,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(user_id: UserId, balance: Points, amount: Points) -> Self {
        LedgerError::ArithmeticOverflow {
            user_id,
            balance,
            amount,
        }
    }

    /// Create a MissingAmount error
    pub fn missing_amount(user_id: UserId, op: TransactionType) -> Self {
        LedgerError::MissingAmount { user_id, op }
    }

    /// Create a CompensationFailed error
    pub fn compensation_failed(
        user_id: UserId,
        append_error: StoreError,
        compensation_error: StoreError,
    ) -> Self {
        LedgerError::CompensationFailed {
            user_id,
            append_error,
            compensation_error,
        }
    }

    /// Whether re-invoking the whole operation may succeed
    ///
    /// Rejections are final for the state they observed; persistence failures
    /// may be transient. A retry must go through the service again so the
    /// balance is re-read under lock.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Persistence(_))
    }
}

/// Fatal error in the CSV replay pipeline
///
/// Individual rejected operations are not fatal and never surface here.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Input file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error while reading input or writing output
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV error while writing output
    #[error("CSV error: {message}")]
    Csv {
        /// Description of the CSV error
        message: String,
    },

    /// The async runtime could not be built
    #[error("Failed to create tokio runtime: {message}")]
    Runtime {
        /// Description of the runtime error
        message: String,
    },

    /// A per-user replay task panicked or was cancelled
    ///
    /// The outcome of that user's operations is unknown, so the replay stops.
    #[error("Replay task for user {user_id} failed: {message}")]
    TaskFailed {
        /// User whose operations the task was replaying
        user_id: UserId,
        /// Description of the join error
        message: String,
    },

    /// The final state could not be read back from the stores
    #[error("Failed to collect final state: {0}")]
    Collect(#[from] LedgerError),
}

impl ReplayError {
    /// Map an open failure to FileNotFound or Io depending on its kind
    pub fn open(path: &std::path::Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            ReplayError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            ReplayError::Io {
                message: format!("Failed to open file '{}': {}", path.display(), error),
            }
        }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(error: std::io::Error) -> Self {
        ReplayError::Io {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for ReplayError {
    fn from(error: csv::Error) -> Self {
        ReplayError::Csv {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case::not_found(LedgerError::not_found(42), "User 42 not found")]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(1, 100, 300),
        "Insufficient points for user 1: balance 100, requested 300"
    )]
    #[case::overflow(
        LedgerError::arithmetic_overflow(1, u64::MAX, 1),
        "Arithmetic overflow charging 1 to user 1 with balance 18446744073709551615"
    )]
    #[case::missing_amount(
        LedgerError::missing_amount(3, TransactionType::Use),
        "USE for user 3 requires an amount"
    )]
    #[case::persistence(
        LedgerError::Persistence(StoreError::history("disk full")),
        "Persistence failure: history store failure: disk full"
    )]
    #[case::compensation_failed(
        LedgerError::compensation_failed(
            9,
            StoreError::history("append rejected"),
            StoreError::balance("write rejected"),
        ),
        "Compensation failed for user 9 after history store failure: append rejected: balance store failure: write rejected"
    )]
    fn test_ledger_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::not_found(LedgerError::not_found(1), false)]
    #[case::insufficient_funds(LedgerError::insufficient_funds(1, 0, 1), false)]
    #[case::overflow(LedgerError::arithmetic_overflow(1, u64::MAX, 1), false)]
    #[case::missing_amount(LedgerError::missing_amount(1, TransactionType::Charge), false)]
    #[case::persistence(LedgerError::Persistence(StoreError::balance("timeout")), true)]
    #[case::compensation_failed(
        LedgerError::compensation_failed(1, StoreError::history("a"), StoreError::balance("b")),
        false
    )]
    fn test_is_retryable(#[case] error: LedgerError, #[case] expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[test]
    fn test_store_error_converts_to_persistence() {
        let error: LedgerError = StoreError::balance("unavailable").into();
        assert_eq!(
            error,
            LedgerError::Persistence(StoreError {
                store: StoreKind::Balance,
                message: "unavailable".to_string(),
            })
        );
    }

    #[test]
    fn test_open_maps_not_found() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = ReplayError::open(Path::new("ops.csv"), io_error);
        assert!(matches!(error, ReplayError::FileNotFound { .. }));
        assert_eq!(error.to_string(), "File not found: ops.csv");
    }

    #[test]
    fn test_open_maps_other_io_errors() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ReplayError::open(Path::new("ops.csv"), io_error);
        assert!(matches!(error, ReplayError::Io { .. }));
        assert!(error.to_string().contains("Failed to open file 'ops.csv'"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: ReplayError = io_error.into();
        assert!(matches!(error, ReplayError::Io { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
