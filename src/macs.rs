//! Reading MACS2 peak files.
//!
//! MACS writes its peak list as tab-delimited text (despite the `.xls`
//! extension): a block of `#` comment lines describing the run, then a
//! column-name row, then one row per peak.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use regex::Regex;

use crate::error::MacsXlsError;

/// Lines starting with this character belong to the run header.
pub const COMMENT_MARKER: char = '#';

// ============================================================================
// Column schema
// ============================================================================

/// The nine columns of a MACS2 peak row, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Chr,
    Start,
    End,
    Length,
    AbsSummit,
    Pileup,
    Log10Pvalue,
    FoldEnrichment,
    Log10Qvalue,
}

impl Column {
    /// All columns in file order.
    pub const ALL: [Column; 9] = [
        Column::Chr,
        Column::Start,
        Column::End,
        Column::Length,
        Column::AbsSummit,
        Column::Pileup,
        Column::Log10Pvalue,
        Column::FoldEnrichment,
        Column::Log10Qvalue,
    ];

    /// Canonical column name as MACS prints it.
    pub fn name(self) -> &'static str {
        match self {
            Column::Chr => "chr",
            Column::Start => "start",
            Column::End => "end",
            Column::Length => "length",
            Column::AbsSummit => "abs_summit",
            Column::Pileup => "pileup",
            Column::Log10Pvalue => "-log10(pvalue)",
            Column::FoldEnrichment => "fold_enrichment",
            Column::Log10Qvalue => "-log10(qvalue)",
        }
    }

    /// Zero-based field index within a data line.
    pub fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// Peak records
// ============================================================================

/// A single peak (one data row of the MACS output).
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    /// Chromosome name
    pub chr: String,
    /// Start coordinate of the region
    pub start: i64,
    /// End coordinate of the region
    pub end: i64,
    /// Region length in bp
    pub length: i64,
    /// Absolute summit coordinate
    pub abs_summit: i64,
    /// Pileup height at the summit
    pub pileup: f64,
    /// -log10(pvalue) at the summit
    pub log10_pvalue: f64,
    /// Fold enrichment against the local lambda
    pub fold_enrichment: f64,
    /// -log10(qvalue) at the summit
    pub log10_qvalue: f64,
}

impl Peak {
    /// Build a peak from one tab-separated record.
    ///
    /// `line` is the 1-based line number in the source file, used for error
    /// messages. Fields past the ninth are ignored.
    pub fn from_record(record: &StringRecord, line: usize) -> Result<Self, MacsXlsError> {
        if record.len() < Column::ALL.len() {
            return Err(MacsXlsError::TooFewFields {
                line,
                expected: Column::ALL.len(),
                found: record.len(),
            });
        }
        let field = |column: Column| record.get(column.index()).unwrap_or("").trim();
        let integer = |column: Column| parse_integer(field(column), column, line);
        let float = |column: Column| parse_float(field(column), column, line);

        Ok(Peak {
            chr: field(Column::Chr).to_string(),
            start: integer(Column::Start)?,
            end: integer(Column::End)?,
            length: integer(Column::Length)?,
            abs_summit: integer(Column::AbsSummit)?,
            pileup: float(Column::Pileup)?,
            log10_pvalue: float(Column::Log10Pvalue)?,
            fold_enrichment: float(Column::FoldEnrichment)?,
            log10_qvalue: float(Column::Log10Qvalue)?,
        })
    }
}

/// Coordinates are integral; `150.0` is rejected like any other non-integer.
fn parse_integer(raw: &str, column: Column, line: usize) -> Result<i64, MacsXlsError> {
    raw.parse::<i64>().map_err(|_| invalid_number(raw, column, line))
}

/// Scores must be finite so that the descending sorts are total.
fn parse_float(raw: &str, column: Column, line: usize) -> Result<f64, MacsXlsError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid_number(raw, column, line)),
    }
}

fn invalid_number(raw: &str, column: Column, line: usize) -> MacsXlsError {
    MacsXlsError::InvalidNumber {
        line,
        column: column.name(),
        value: raw.to_string(),
    }
}

// ============================================================================
// File parsing
// ============================================================================

/// Parsed contents of a MACS2 peak file.
#[derive(Debug, Clone, PartialEq)]
pub struct MacsOutput {
    /// Header (comment and blank) lines, trimmed, in file order
    pub header: Vec<String>,
    /// The literal column-name row, field by field
    pub column_names: Vec<String>,
    /// Peaks in file order
    pub peaks: Vec<Peak>,
}

impl MacsOutput {
    /// Version of MACS that produced the file, taken from the run header.
    pub fn macs_version(&self) -> Result<&str, MacsXlsError> {
        detect_macs_version(&self.header)
    }
}

/// True for lines that belong to the run header rather than the table.
pub fn is_header_line(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER) || line.trim().is_empty()
}

/// Find the MACS version in the run header.
///
/// The version is the token following
/// `# This file is generated by MACS version` on the first such line.
pub fn detect_macs_version(header: &[String]) -> Result<&str, MacsXlsError> {
    lazy_static::lazy_static! {
        static ref VERSION_LINE: Regex =
            Regex::new(r"^# This file is generated by MACS version \s*(\S+)").unwrap();
    }

    header
        .iter()
        .find_map(|line| VERSION_LINE.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(MacsXlsError::MissingMacsVersion)
}

/// Read and parse a MACS2 peak file from disk.
pub fn parse_macs_file(path: &Path) -> Result<MacsOutput, MacsXlsError> {
    let file = File::open(path)?;
    parse_macs(BufReader::new(file))
}

/// Parse MACS2 peak output from any buffered reader.
///
/// The first non-header line is taken as the column-name row; every later
/// non-header line must be a peak.
pub fn parse_macs<R: BufRead>(reader: R) -> Result<MacsOutput, MacsXlsError> {
    let mut header = Vec::new();
    let mut data = String::new();
    let mut line_numbers = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if is_header_line(&line) {
            header.push(line.trim().to_string());
        } else {
            data.push_str(line.trim());
            data.push('\n');
            line_numbers.push(idx + 1);
        }
    }

    let mut tsv = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(data.as_bytes());
    let mut records = tsv.records().zip(line_numbers);

    let column_names: Vec<String> = match records.next() {
        Some((record, _)) => record?.iter().map(str::to_string).collect(),
        None => return Err(MacsXlsError::MissingColumnHeader),
    };

    let mut peaks = Vec::new();
    let mut warned_extra_fields = false;
    for (record, line) in records {
        let record = record?;
        if record.len() > Column::ALL.len() && !warned_extra_fields {
            log::warn!(
                "Line {}: ignoring {} field(s) beyond the {} MACS columns",
                line,
                record.len() - Column::ALL.len(),
                Column::ALL.len()
            );
            warned_extra_fields = true;
        }
        peaks.push(Peak::from_record(&record, line)?);
    }

    log::debug!("Parsed {} header lines and {} peaks", header.len(), peaks.len());

    Ok(MacsOutput {
        header,
        column_names,
        peaks,
    })
}
