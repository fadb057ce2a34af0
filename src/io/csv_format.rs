//! CSV format handling for operation records and balance output
//!
//! This module centralizes all CSV format concerns:
//! - `CsvRecord` structure for deserialization
//! - Conversion from CSV records to domain types
//! - Balance output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Balance, OperationRecord, OperationType, Points, UserId};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input columns `op, user, amount`. The amount is optional
/// because `open` rows carry none.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    pub user: UserId,
    pub amount: Option<String>,
}

/// One line of the final state report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    pub user: UserId,
    pub balance: Points,
    /// Number of history entries recorded for the user
    pub entries: usize,
}

impl BalanceRow {
    pub fn new(balance: &Balance, entries: usize) -> Self {
        Self {
            user: balance.user_id,
            balance: balance.amount,
            entries,
        }
    }
}

/// Convert a CsvRecord to an OperationRecord
///
/// The op name is case-insensitive. `charge` and `use` need a positive integer
/// amount; any amount on an `open` row is ignored.
///
/// # Returns
///
/// * `Ok(OperationRecord)` - Successfully converted record
/// * `Err(String)` - Message describing why the row was rejected
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<OperationRecord, String> {
    let op = match csv_record.op.trim().to_lowercase().as_str() {
        "open" => OperationType::Open,
        "charge" => OperationType::Charge,
        "use" => OperationType::Use,
        _ => {
            return Err(format!(
                "Invalid operation: '{}' for user {}",
                csv_record.op, csv_record.user
            ))
        }
    };

    let amount = match csv_record.amount {
        Some(amount_str) if !amount_str.trim().is_empty() => {
            match amount_str.trim().parse::<Points>() {
                Ok(points) => Some(points),
                Err(_) => {
                    return Err(format!(
                        "Invalid amount '{}' for user {}",
                        amount_str, csv_record.user
                    ))
                }
            }
        }
        _ => None,
    };

    match op {
        OperationType::Charge | OperationType::Use => match amount {
            None => {
                return Err(format!(
                    "{:?} for user {} requires an amount",
                    op, csv_record.user
                ))
            }
            Some(0) => {
                return Err(format!(
                    "{:?} for user {} requires a positive amount",
                    op, csv_record.user
                ))
            }
            Some(_) => {}
        },
        OperationType::Open => {
            return Ok(OperationRecord {
                op,
                user: csv_record.user,
                amount: None,
            })
        }
    }

    Ok(OperationRecord {
        op,
        user: csv_record.user,
        amount,
    })
}

/// Write the final state as CSV with columns `user, balance, entries`
///
/// Rows are sorted by user for deterministic output.
pub fn write_balances_csv(rows: &[BalanceRow], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["user", "balance", "entries"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_rows = rows.to_vec();
    sorted_rows.sort_by_key(|row| row.user);

    for row in sorted_rows {
        writer
            .write_record(&[
                row.user.to_string(),
                row.balance.to_string(),
                row.entries.to_string(),
            ])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(op: &str, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            op: op.to_string(),
            user: 1,
            amount: amount.map(|s| s.to_string()),
        }
    }

    #[rstest]
    #[case("charge", OperationType::Charge, "100", 100)]
    #[case("use", OperationType::Use, "50", 50)]
    #[case("CHARGE", OperationType::Charge, "7", 7)] // case insensitive
    #[case("use", OperationType::Use, "  25  ", 25)] // whitespace trimming
    fn test_convert_csv_record_with_amount(
        #[case] op: &str,
        #[case] expected_op: OperationType,
        #[case] amount: &str,
        #[case] expected_amount: Points,
    ) {
        let converted = convert_csv_record(record(op, Some(amount))).unwrap();

        assert_eq!(converted.op, expected_op);
        assert_eq!(converted.user, 1);
        assert_eq!(converted.amount, Some(expected_amount));
    }

    #[rstest]
    #[case::no_amount(None)]
    #[case::amount_ignored(Some("100"))]
    #[case::garbage_ignored(Some(""))]
    fn test_convert_csv_record_open(#[case] amount: Option<&str>) {
        let converted = convert_csv_record(record("Open", amount)).unwrap();

        assert_eq!(converted.op, OperationType::Open);
        assert_eq!(converted.amount, None);
    }

    #[rstest]
    #[case::invalid_op("refund", Some("100"), "Invalid operation")]
    #[case::charge_missing_amount("charge", None, "requires an amount")]
    #[case::use_missing_amount("use", None, "requires an amount")]
    #[case::empty_amount("charge", Some(""), "requires an amount")]
    #[case::whitespace_amount("charge", Some("  "), "requires an amount")]
    #[case::zero_amount("use", Some("0"), "requires a positive amount")]
    #[case::negative_amount("charge", Some("-5"), "Invalid amount")]
    #[case::fractional_amount("charge", Some("1.5"), "Invalid amount")]
    #[case::not_a_number("use", Some("lots"), "Invalid amount")]
    fn test_convert_csv_record_errors(
        #[case] op: &str,
        #[case] amount: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let result = convert_csv_record(record(op, amount));

        assert!(result.unwrap_err().contains(expected_error));
    }

    #[rstest]
    #[case::empty(vec![], "user,balance,entries\n")]
    #[case::single(
        vec![BalanceRow { user: 1, balance: 400, entries: 2 }],
        "user,balance,entries\n1,400,2\n"
    )]
    #[case::sorted_by_user(
        vec![
            BalanceRow { user: 3, balance: 0, entries: 0 },
            BalanceRow { user: 1, balance: 10, entries: 1 },
            BalanceRow { user: 2, balance: 20, entries: 3 },
        ],
        "user,balance,entries\n1,10,1\n2,20,3\n3,0,0\n"
    )]
    fn test_write_balances_csv(#[case] rows: Vec<BalanceRow>, #[case] expected_output: &str) {
        let mut output = Vec::new();

        write_balances_csv(&rows, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected_output);
    }

    #[test]
    fn test_balance_row_from_balance() {
        let row = BalanceRow::new(&Balance::new(4, 250), 3);

        assert_eq!(
            row,
            BalanceRow {
                user: 4,
                balance: 250,
                entries: 3
            }
        );
    }
}
