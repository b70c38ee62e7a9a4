//! The [`MacsXlsError`] enum and its messages.

use thiserror::Error;

/// Errors raised while reading MACS output or writing the report.
///
/// Every variant is fatal: the converter has no degraded mode.
#[derive(Debug, Error)]
pub enum MacsXlsError {
    #[error("File reading error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tab-delimited parsing error: {0}")]
    Tsv(#[from] csv::Error),

    #[error("No column header line found")]
    MissingColumnHeader,

    #[error("Line {line}: expected at least {expected} tab-separated fields, found {found}")]
    TooFewFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: column '{column}' has invalid numeric value '{value}'")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("couldn't detect MACS version")]
    MissingMacsVersion,

    #[error("Spreadsheet writing error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}
