//! MACS2 XLS Tools
//!
//! Turns the tab-delimited peak list written by the MACS2 peak caller into a
//! spreadsheet for human review.
//!
//! This library provides:
//! - `macs`: parsing of MACS2 peak files and run-header version detection
//! - `ranking`: report ordering and the leading `order` column
//! - `report`: the three-sheet workbook (data, notes, legends)
//! - `pipeline`: the end-to-end conversion used by the CLI
//!
//! Binaries:
//! - `make-macs2-xls`: convert one MACS2 peak file

pub mod error;
pub mod macs;
pub mod pipeline;
pub mod ranking;
pub mod report;

pub use error::MacsXlsError;
pub use macs::{Column, MacsOutput, Peak};
pub use pipeline::{convert, ConvertConfig, ConvertSummary};
pub use ranking::{PeakTable, RankedPeak};
