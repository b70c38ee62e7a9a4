//! Ranking peaks for the report.
//!
//! Peaks are ordered by -log10(pvalue), ties broken by fold enrichment, both
//! descending, and each one is numbered by its position in that order.

use std::cmp::Ordering;

use crate::macs::{Column, Peak};

/// Name of the leading rank column.
pub const ORDER_COLUMN: &str = "order";
/// Value of the rank column on the column-name row.
pub const ORDER_LABEL: &str = "#order";

/// Sort peaks into report order.
///
/// Two stable descending passes: fold enrichment first, then -log10(pvalue).
/// The second pass dominates and equal p-values keep the fold-enrichment
/// order left by the first pass.
pub fn sort_peaks(mut peaks: Vec<Peak>) -> Vec<Peak> {
    peaks.sort_by(|a, b| descending(a.fold_enrichment, b.fold_enrichment));
    peaks.sort_by(|a, b| descending(a.log10_pvalue, b.log10_pvalue));
    peaks
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// A column of the logical report table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableColumn {
    /// The rank column
    Order,
    /// A MACS column, in source order
    Field(Column),
}

impl TableColumn {
    pub fn name(self) -> &'static str {
        match self {
            TableColumn::Order => ORDER_COLUMN,
            TableColumn::Field(column) => column.name(),
        }
    }

    /// Position in [`PeakTable::header_row`].
    pub fn position(self) -> usize {
        match self {
            TableColumn::Order => 0,
            TableColumn::Field(column) => column.index() + 1,
        }
    }
}

/// A peak with its 1-based position in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPeak {
    pub order: usize,
    pub peak: Peak,
}

/// The logical report table: the column-name row followed by ranked peaks.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakTable {
    /// Column names from the source file, in source order
    pub column_names: Vec<String>,
    /// Peaks in report order
    pub rows: Vec<RankedPeak>,
}

impl PeakTable {
    /// Columns of the table, rank column first.
    pub fn columns() -> Vec<TableColumn> {
        std::iter::once(TableColumn::Order)
            .chain(Column::ALL.iter().map(|&c| TableColumn::Field(c)))
            .collect()
    }

    /// The column-name row as it appears in the table: the order label
    /// followed by the source file's own names.
    pub fn header_row(&self) -> Vec<String> {
        std::iter::once(ORDER_LABEL.to_string())
            .chain(self.column_names.iter().cloned())
            .collect()
    }

    /// Number of peaks.
    pub fn peak_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of table rows, counting the column-name row.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }
}

/// Number already-sorted peaks 1, 2, 3, ... in their current order.
pub fn rank_peaks(column_names: Vec<String>, sorted: Vec<Peak>) -> PeakTable {
    let rows = sorted
        .into_iter()
        .enumerate()
        .map(|(i, peak)| RankedPeak { order: i + 1, peak })
        .collect();
    PeakTable { column_names, rows }
}
