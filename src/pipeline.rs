//! End-to-end conversion for programmatic use and for the CLI.
//!
//! Parse → sort → rank → render, each stage handing a new value to the next.
//! Progress lines go to a caller-supplied reporter instead of stdout.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::macs::{parse_macs_file, MacsOutput};
use crate::ranking::{rank_peaks, sort_peaks};
use crate::report::{data_sheet_name, default_output_path, Report};

/// Configuration for one conversion.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// MACS2 peak file to read
    pub input: PathBuf,
    /// Spreadsheet to write
    pub output: PathBuf,
}

impl ConvertConfig {
    /// Use `output` if given, otherwise `XLS_<input stem>.xls`.
    pub fn new(input: PathBuf, output: Option<PathBuf>) -> Self {
        let output = output.unwrap_or_else(|| default_output_path(&input));
        Self { input, output }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSummary {
    /// MACS version found in the run header
    pub macs_version: String,
    /// Number of peaks written
    pub peaks: usize,
    /// Name of the data sheet
    pub sheet_name: String,
    /// Path of the written workbook
    pub output: PathBuf,
}

impl fmt::Display for ConvertSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} peaks (MACS {}) to sheet '{}' of {}",
            self.peaks,
            self.macs_version,
            self.sheet_name,
            self.output.display()
        )
    }
}

/// Convert a MACS2 peak file into the spreadsheet report.
///
/// Calls `on_progress` with each user-facing progress line. Nothing is
/// written unless the input parses and names its MACS version.
pub fn convert(
    config: &ConvertConfig,
    mut on_progress: impl FnMut(&str),
) -> Result<ConvertSummary> {
    on_progress(&format!("Input file: {}", config.input.display()));
    on_progress(&format!("Output XLS: {}", config.output.display()));

    let macs = parse_macs_file(&config.input)
        .with_context(|| format!("Failed to read MACS output: {}", config.input.display()))?;
    let macs_version = macs.macs_version()?.to_string();
    on_progress(&format!("Input file is from MACS {}", macs_version));

    let MacsOutput {
        header,
        column_names,
        peaks,
    } = macs;
    let table = rank_peaks(column_names, sort_peaks(peaks));

    let report = Report {
        sheet_name: data_sheet_name(&config.input),
        header: &header,
        table: &table,
    };
    report
        .save(&config.output)
        .with_context(|| format!("Failed to write workbook: {}", config.output.display()))?;

    Ok(ConvertSummary {
        macs_version,
        peaks: table.peak_count(),
        sheet_name: report.sheet_name,
        output: config.output.clone(),
    })
}
