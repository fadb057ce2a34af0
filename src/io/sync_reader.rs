//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over operation records from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record parsing errors are yielded as Err variants in the iterator
//! - Line numbers are included in error messages for debugging
//!
//! ```no_run
//! use point_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! let records: Vec<_> = reader.filter_map(Result::ok).collect();
//! println!("Successfully parsed {} records", records.len());
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{OperationRecord, ReplayError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Reads one row at a time; memory use does not grow with the file.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a CSV file for streaming iteration
    ///
    /// The CSV reader trims whitespace from all fields, allows a missing
    /// trailing amount column and uses an 8KB buffer.
    pub fn new(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|e| ReplayError::open(path, e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<OperationRecord, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();

        match deserializer.next()? {
            Ok(csv_record) => {
                self.line_num += 1;
                // +1 for the header row
                Some(
                    convert_csv_record(csv_record)
                        .map_err(|e| format!("Line {}: {}", self.line_num + 1, e)),
                )
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(format!(
                    "Line {}: CSV parse error: {}",
                    self.line_num + 1,
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));

        assert!(matches!(
            result.unwrap_err(),
            ReplayError::FileNotFound { .. }
        ));
    }

    #[test]
    fn test_sync_reader_iterates_records() {
        let file = create_temp_csv("op,user,amount\nopen,1,\ncharge,1,100\nuse,1,40\n");

        let records: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].op, OperationType::Open);
        assert_eq!(records[1].op, OperationType::Charge);
        assert_eq!(records[1].amount, Some(100));
        assert_eq!(records[2].op, OperationType::Use);
        assert_eq!(records[2].user, 1);
    }

    #[test]
    fn test_sync_reader_open_without_amount_column() {
        let file = create_temp_csv("op,user,amount\nopen,7\n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().unwrap().user, 7);
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file =
            create_temp_csv("op,user,amount\ncharge,1,100\ncharge,2,invalid\ncharge,3,50\n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(records[2].is_ok());
        let error = records[1].as_ref().unwrap_err();
        assert!(error.contains("Line 3"));
        assert!(error.contains("Invalid amount"));
    }

    #[test]
    fn test_sync_reader_reports_unparseable_user() {
        let file = create_temp_csv("op,user,amount\ncharge,abc,10\n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert!(records[0].as_ref().unwrap_err().contains("CSV parse error"));
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_case() {
        let file = create_temp_csv("op,user,amount\n  CHARGE  ,  1  ,  100  \n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        let record = records[0].as_ref().unwrap();
        assert_eq!(record.op, OperationType::Charge);
        assert_eq!(record.amount, Some(100));
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("op,user,amount\n");

        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
