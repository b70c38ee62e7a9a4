//! The three-sheet spreadsheet report.
//!
//! Sheet order is fixed: the ranked peak data (named after the input file),
//! `notes` with the MACS run header, and `legends` describing each column.
//! The data sheet carries six extra columns derived from `chr` and
//! `abs_summit`, spliced in after `end`.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Formula, Workbook, Worksheet, XlsxError};

use crate::error::MacsXlsError;
use crate::macs::{Column, Peak};
use crate::ranking::{PeakTable, TableColumn};

/// Name of the sheet holding the MACS run header.
pub const NOTES_SHEET: &str = "notes";
/// Name of the sheet describing the data columns.
pub const LEGENDS_SHEET: &str = "legends";

/// Characters of the input base name used for the data sheet name.
pub const SHEET_NAME_SOURCE_LEN: usize = 30;
/// Characters Excel does not allow in sheet names.
const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

pub const NOTES_TITLE: &str = "MACS RUN NOTES:";
pub const ADDITIONAL_NOTES_TITLE: &str = "ADDITIONAL NOTES:";
pub const SORT_ORDER_NOTE: &str =
    "By default regions are sorted by Pvalue and fold enrichment (in descending order)";

/// Static column descriptions for the `legends` sheet.
pub const LEGENDS: [(&str, &str); 15] = [
    ("order", "Sorting order Pvalue and FE"),
    ("chr", "Chromosome location of binding region"),
    ("start", "Start coordinate of binding region"),
    ("end", "End coordinate of binding region"),
    ("summit-100", "Summit - 100bp"),
    ("summit+100", "Summit + 100bp"),
    ("summit-1", "Summit of binding region - 1"),
    ("summit", "Summit of binding region"),
    ("length", "Length of binding region"),
    ("abs_summit", "Coordinate of region summit"),
    (
        "pileup",
        "Number of non-degenerate and position corrected reads at summit",
    ),
    (
        "-LOG10(pvalue)",
        "Transformed Pvalue -log10(Pvalue) for the binding region (e.g. if Pvalue=1e-10, then this value should be 10)",
    ),
    (
        "fold_enrichment",
        "Fold enrichment for this region against random Poisson distribution with local lambda",
    ),
    (
        "-LOG10(qvalue)",
        "Transformed Qvalue -log10(Qvalue) for the binding region (e.g. if Qvalue=0.05, then this value should be 1.3)",
    ),
    ("#FDR(%)", "False discovery rate (FDR) as a percentage"),
];

// ============================================================================
// Naming
// ============================================================================

/// Default report path: `XLS_<input stem>.xls` in the working directory.
///
/// MACS output already carries an `.xls` extension, which is replaced.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    PathBuf::from(format!("XLS_{stem}.xls"))
}

/// Data sheet name: the first 30 characters of the input base name, made
/// acceptable to Excel.
pub fn data_sheet_name(input: &Path) -> String {
    let base = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let truncated: String = base.chars().take(SHEET_NAME_SOURCE_LEN).collect();
    sanitize_sheet_name(&truncated)
}

/// Replace characters Excel rejects and avoid clashing with the other sheets.
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if SHEET_NAME_ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    let mut sheet_name = replaced.trim().trim_matches('\'').trim().to_string();
    if sheet_name.is_empty() {
        sheet_name = "data".to_string();
    }
    // Sheet names compare case-insensitively in Excel.
    if [NOTES_SHEET, LEGENDS_SHEET]
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(&sheet_name))
    {
        sheet_name.push_str("_data");
    }
    sheet_name
}

/// Convert a 0-based column index to an Excel column letter (A, B, ..., Z, AA, AB, ...).
pub fn col_letter(idx: u32) -> String {
    let mut result = String::new();
    let mut n = idx;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

// ============================================================================
// Data sheet layout
// ============================================================================

/// A rendered cell of the data sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Live formula plus the value it evaluates to
    Formula { formula: String, result: Box<Cell> },
}

impl Cell {
    /// The value a reader sees, as text.
    pub fn display_value(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Formula { result, .. } => result.display_value(),
        }
    }
}

/// Columns computed per row from that row's own `chr` or `abs_summit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedColumn {
    Chr,
    SummitMinus100,
    SummitPlus100,
    SummitMinus1,
    Summit,
}

/// Derived columns in sheet order.
pub const DERIVED_COLUMNS: [DerivedColumn; 6] = [
    DerivedColumn::Chr,
    DerivedColumn::SummitMinus100,
    DerivedColumn::SummitPlus100,
    DerivedColumn::Chr,
    DerivedColumn::SummitMinus1,
    DerivedColumn::Summit,
];

/// Sheet column where the first derived column lands (just after `end`).
pub const DERIVED_INSERT_AT: u16 = 4;

impl DerivedColumn {
    /// Header cell text.
    pub fn title(self) -> &'static str {
        match self {
            DerivedColumn::Chr => "chr",
            DerivedColumn::SummitMinus100 => "abs_summit-100",
            DerivedColumn::SummitPlus100 => "abs_summit+100",
            DerivedColumn::SummitMinus1 => "summit-1",
            DerivedColumn::Summit => "summit",
        }
    }

    fn source(self) -> Column {
        match self {
            DerivedColumn::Chr => Column::Chr,
            _ => Column::AbsSummit,
        }
    }

    fn offset(self) -> i64 {
        match self {
            DerivedColumn::Chr | DerivedColumn::Summit => 0,
            DerivedColumn::SummitMinus100 => -100,
            DerivedColumn::SummitPlus100 => 100,
            DerivedColumn::SummitMinus1 => -1,
        }
    }

    /// Value of this column for `peak`.
    pub fn value(self, peak: &Peak) -> Cell {
        match self {
            DerivedColumn::Chr => Cell::Text(peak.chr.clone()),
            _ => Cell::Number((peak.abs_summit + self.offset()) as f64),
        }
    }

    /// Formula computing this column on 1-based sheet row `excel_row`.
    pub fn formula(self, excel_row: u32) -> String {
        let source = format!(
            "{}{}",
            col_letter(field_position(self.source()) as u32),
            excel_row
        );
        match self.offset() {
            0 => format!("={source}"),
            n if n > 0 => format!("={source}+{n}"),
            n => format!("={source}-{}", -n),
        }
    }
}

/// One column of the data sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetColumn {
    Order,
    Field(Column),
    Derived(DerivedColumn),
}

impl SheetColumn {
    /// The table column this sheet column shows, `None` for derived columns.
    pub fn table_column(self) -> Option<TableColumn> {
        match self {
            SheetColumn::Order => Some(TableColumn::Order),
            SheetColumn::Field(c) => Some(TableColumn::Field(c)),
            SheetColumn::Derived(_) => None,
        }
    }
}

impl From<TableColumn> for SheetColumn {
    fn from(column: TableColumn) -> Self {
        match column {
            TableColumn::Order => SheetColumn::Order,
            TableColumn::Field(c) => SheetColumn::Field(c),
        }
    }
}

/// Zero-based data sheet column holding MACS column `column`.
pub fn field_position(column: Column) -> u16 {
    // `order` comes first; fields after `end` shift right past the derived block.
    let position = column.index() as u16 + 1;
    if position < DERIVED_INSERT_AT {
        position
    } else {
        position + DERIVED_COLUMNS.len() as u16
    }
}

/// Data sheet columns, left to right: the table's columns with the derived
/// block spliced in after `end`.
pub fn data_sheet_layout() -> Vec<SheetColumn> {
    let mut layout: Vec<SheetColumn> = PeakTable::columns()
        .into_iter()
        .map(SheetColumn::from)
        .collect();
    let tail = layout.split_off(DERIVED_INSERT_AT as usize);
    layout.extend(DERIVED_COLUMNS.iter().map(|&d| SheetColumn::Derived(d)));
    layout.extend(tail);
    layout
}

fn field_cell(peak: &Peak, column: Column) -> Cell {
    match column {
        Column::Chr => Cell::Text(peak.chr.clone()),
        Column::Start => Cell::Number(peak.start as f64),
        Column::End => Cell::Number(peak.end as f64),
        Column::Length => Cell::Number(peak.length as f64),
        Column::AbsSummit => Cell::Number(peak.abs_summit as f64),
        Column::Pileup => Cell::Number(peak.pileup),
        Column::Log10Pvalue => Cell::Number(peak.log10_pvalue),
        Column::FoldEnrichment => Cell::Number(peak.fold_enrichment),
        Column::Log10Qvalue => Cell::Number(peak.log10_qvalue),
    }
}

/// Lay out the data sheet: the column-name row, then one row per ranked peak.
///
/// On the column-name row the derived columns carry their titles; on peak
/// rows they carry formulas with the computed value attached.
pub fn data_sheet_grid(table: &PeakTable) -> Vec<Vec<Cell>> {
    let layout = data_sheet_layout();
    let mut grid = Vec::with_capacity(table.row_count());

    let header = table.header_row();
    grid.push(
        layout
            .iter()
            .map(|column| {
                let text = match column {
                    SheetColumn::Derived(d) => d.title().to_string(),
                    _ => column
                        .table_column()
                        .and_then(|c| header.get(c.position()))
                        .cloned()
                        .unwrap_or_default(),
                };
                Cell::Text(text)
            })
            .collect(),
    );

    for (i, ranked) in table.rows.iter().enumerate() {
        let excel_row = i as u32 + 2;
        grid.push(
            layout
                .iter()
                .map(|column| match column {
                    SheetColumn::Order => Cell::Number(ranked.order as f64),
                    SheetColumn::Field(c) => field_cell(&ranked.peak, *c),
                    SheetColumn::Derived(d) => Cell::Formula {
                        formula: d.formula(excel_row),
                        result: Box::new(d.value(&ranked.peak)),
                    },
                })
                .collect(),
        );
    }

    grid
}

// ============================================================================
// Workbook
// ============================================================================

/// Everything needed to render the report.
pub struct Report<'a> {
    /// Name for the data sheet
    pub sheet_name: String,
    /// MACS run header lines for the notes sheet
    pub header: &'a [String],
    /// Ranked peaks for the data sheet
    pub table: &'a PeakTable,
}

impl Report<'_> {
    /// Build the workbook in memory.
    pub fn to_workbook(&self) -> Result<Workbook, MacsXlsError> {
        let mut workbook = Workbook::new();

        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(&self.sheet_name)?;
            write_data_sheet(sheet, self.table)?;
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(NOTES_SHEET)?;
            write_notes_sheet(sheet, self.header)?;
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(LEGENDS_SHEET)?;
            write_legends_sheet(sheet)?;
        }

        Ok(workbook)
    }

    /// Render and write the workbook to `path`.
    pub fn save(&self, path: &Path) -> Result<(), MacsXlsError> {
        let mut workbook = self.to_workbook()?;
        workbook.save(path)?;
        log::debug!(
            "Wrote {} peaks to sheet '{}' of {}",
            self.table.peak_count(),
            self.sheet_name,
            path.display()
        );
        Ok(())
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match (cell, format) {
        (Cell::Text(text), Some(format)) => {
            sheet.write_string_with_format(row, col, text, format)?;
        }
        (Cell::Text(text), None) => {
            sheet.write_string(row, col, text)?;
        }
        (Cell::Number(n), Some(format)) => {
            sheet.write_number_with_format(row, col, *n, format)?;
        }
        (Cell::Number(n), None) => {
            sheet.write_number(row, col, *n)?;
        }
        (Cell::Formula { formula, result }, Some(format)) => {
            let formula = Formula::new(formula).set_result(result.display_value());
            sheet.write_formula_with_format(row, col, formula, format)?;
        }
        (Cell::Formula { formula, result }, None) => {
            let formula = Formula::new(formula).set_result(result.display_value());
            sheet.write_formula(row, col, formula)?;
        }
    }
    Ok(())
}

fn write_data_sheet(sheet: &mut Worksheet, table: &PeakTable) -> Result<(), XlsxError> {
    let header_fmt = Format::new().set_bold();
    let grid = data_sheet_grid(table);

    for (r, cells) in grid.iter().enumerate() {
        let row = r as u32;
        let format = (row == 0).then_some(&header_fmt);
        for (c, cell) in cells.iter().enumerate() {
            write_cell(sheet, row, c as u16, cell, format)?;
        }
    }

    let layout = data_sheet_layout();
    let last_col = layout.len() as u16 - 1;
    sheet.set_freeze_panes(1, 0)?;
    sheet.autofilter(0, 0, table.peak_count() as u32, last_col)?;

    // Column widths
    sheet.set_column_width(0, 8)?; // order
    sheet.set_column_width(field_position(Column::Chr), 12)?;
    for (c, column) in layout.iter().enumerate() {
        if let SheetColumn::Derived(DerivedColumn::SummitMinus100 | DerivedColumn::SummitPlus100) =
            column
        {
            sheet.set_column_width(c as u16, 15)?;
        }
    }
    sheet.set_column_width(field_position(Column::Log10Pvalue), 15)?;
    sheet.set_column_width(field_position(Column::FoldEnrichment), 15)?;
    sheet.set_column_width(field_position(Column::Log10Qvalue), 15)?;

    Ok(())
}

fn write_notes_sheet(sheet: &mut Worksheet, header: &[String]) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    let mut row: u32 = 0;

    sheet.write_string_with_format(row, 0, NOTES_TITLE, &bold)?;
    row += 1;

    // Header lines with embedded tabs spread across columns.
    for line in header {
        for (c, field) in line.split('\t').enumerate() {
            if !field.is_empty() {
                sheet.write_string(row, c as u16, field)?;
            }
        }
        row += 1;
    }
    row += 1;

    sheet.write_string_with_format(row, 0, ADDITIONAL_NOTES_TITLE, &bold)?;
    row += 1;
    sheet.write_string(row, 0, SORT_ORDER_NOTE)?;

    Ok(())
}

fn write_legends_sheet(sheet: &mut Worksheet) -> Result<(), XlsxError> {
    for (r, (name, description)) in LEGENDS.iter().enumerate() {
        let row = r as u32;
        sheet.write_string(row, 0, *name)?;
        sheet.write_string(row, 1, *description)?;
    }
    sheet.set_column_width(0, 16)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::rank_peaks;

    fn peak(chr: &str, abs_summit: i64) -> Peak {
        Peak {
            chr: chr.to_string(),
            start: abs_summit - 50,
            end: abs_summit + 50,
            length: 100,
            abs_summit,
            pileup: 10.0,
            log10_pvalue: 2.0,
            fold_enrichment: 5.0,
            log10_qvalue: 1.0,
        }
    }

    fn table(peaks: Vec<Peak>) -> PeakTable {
        let names = Column::ALL.iter().map(|c| c.name().to_string()).collect();
        rank_peaks(names, peaks)
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("peaks.xls")),
            PathBuf::from("XLS_peaks.xls")
        );
        assert_eq!(
            default_output_path(Path::new("/data/run1/test_peaks.xls")),
            PathBuf::from("XLS_test_peaks.xls")
        );
        assert_eq!(
            default_output_path(Path::new("sample.peaks.txt")),
            PathBuf::from("XLS_sample.peaks.xls")
        );
        assert_eq!(
            default_output_path(Path::new("peaks")),
            PathBuf::from("XLS_peaks.xls")
        );
    }

    #[test]
    fn test_data_sheet_name() {
        assert_eq!(data_sheet_name(Path::new("/tmp/peaks.xls")), "peaks.xls");
        assert_eq!(
            data_sheet_name(Path::new("a_very_long_macs2_output_file_name_peaks.xls")),
            "a_very_long_macs2_output_file_"
        );
        assert_eq!(
            data_sheet_name(Path::new("run[1]:peaks?.xls")),
            "run_1__peaks_.xls"
        );
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name("  "), "data");
        assert_eq!(sanitize_sheet_name("Notes"), "Notes_data");
        assert_eq!(sanitize_sheet_name("legends"), "legends_data");
        assert_eq!(sanitize_sheet_name("a*b"), "a_b");
    }

    #[test]
    fn test_col_letter() {
        assert_eq!(col_letter(0), "A");
        assert_eq!(col_letter(1), "B");
        assert_eq!(col_letter(11), "L");
        assert_eq!(col_letter(25), "Z");
        assert_eq!(col_letter(26), "AA");
        assert_eq!(col_letter(52), "BA");
    }

    #[test]
    fn test_data_sheet_layout() {
        let titles: Vec<&str> = data_sheet_layout()
            .iter()
            .map(|column| match column {
                SheetColumn::Derived(d) => d.title(),
                _ => column.table_column().map_or("", |c| c.name()),
            })
            .collect();
        assert_eq!(
            titles,
            vec![
                "order",
                "chr",
                "start",
                "end",
                "chr",
                "abs_summit-100",
                "abs_summit+100",
                "chr",
                "summit-1",
                "summit",
                "length",
                "abs_summit",
                "pileup",
                "-log10(pvalue)",
                "fold_enrichment",
                "-log10(qvalue)",
            ]
        );
    }

    #[test]
    fn test_data_sheet_layout_follows_table_columns() {
        let table_columns: Vec<TableColumn> = data_sheet_layout()
            .into_iter()
            .filter_map(SheetColumn::table_column)
            .collect();
        assert_eq!(table_columns, PeakTable::columns());
    }

    #[test]
    fn test_field_position_matches_layout() {
        let layout = data_sheet_layout();
        for column in Column::ALL {
            let position = field_position(column) as usize;
            assert_eq!(layout[position], SheetColumn::Field(column));
        }
        assert_eq!(col_letter(field_position(Column::Chr) as u32), "B");
        assert_eq!(col_letter(field_position(Column::AbsSummit) as u32), "L");
    }

    #[test]
    fn test_derived_values() {
        let p = peak("chr3", 150);
        let values: Vec<Cell> = DERIVED_COLUMNS.iter().map(|d| d.value(&p)).collect();
        assert_eq!(
            values,
            vec![
                Cell::Text("chr3".to_string()),
                Cell::Number(50.0),
                Cell::Number(250.0),
                Cell::Text("chr3".to_string()),
                Cell::Number(149.0),
                Cell::Number(150.0),
            ]
        );
    }

    #[test]
    fn test_derived_formulas() {
        let formulas: Vec<String> = DERIVED_COLUMNS.iter().map(|d| d.formula(2)).collect();
        assert_eq!(
            formulas,
            vec!["=B2", "=L2-100", "=L2+100", "=B2", "=L2-1", "=L2"]
        );
    }

    #[test]
    fn test_data_sheet_grid() {
        let t = table(vec![peak("chr1", 150), peak("chr2", 40)]);
        let grid = data_sheet_grid(&t);

        assert_eq!(grid.len(), 3);
        assert!(grid.iter().all(|row| row.len() == 16));

        // Column-name row: labels only, no computed numbers.
        assert_eq!(grid[0][0], Cell::Text("#order".to_string()));
        assert_eq!(grid[0][5], Cell::Text("abs_summit-100".to_string()));
        assert_eq!(grid[0][11], Cell::Text("abs_summit".to_string()));
        assert!(grid[0].iter().all(|cell| matches!(cell, Cell::Text(_))));

        assert_eq!(grid[1][0], Cell::Number(1.0));
        assert_eq!(grid[2][0], Cell::Number(2.0));
        assert_eq!(grid[1][1], Cell::Text("chr1".to_string()));
        assert_eq!(grid[1][11], Cell::Number(150.0));
        assert_eq!(
            grid[1][5],
            Cell::Formula {
                formula: "=L2-100".to_string(),
                result: Box::new(Cell::Number(50.0)),
            }
        );
        assert_eq!(grid[2][7].display_value(), "chr2");
        assert_eq!(grid[2][5].display_value(), "-60");
        assert_eq!(grid[2][8].display_value(), "39");
        match &grid[2][9] {
            Cell::Formula { formula, .. } => assert_eq!(formula, "=L3"),
            other => panic!("unexpected cell: {other:?}"),
        }
    }

    #[test]
    fn test_data_sheet_grid_keeps_source_column_names() {
        let mut t = table(vec![peak("chr1", 150)]);
        t.column_names[0] = "#chr".to_string();
        let grid = data_sheet_grid(&t);
        assert_eq!(grid[0][1], Cell::Text("#chr".to_string()));

        let header: Vec<Cell> = grid[0]
            .iter()
            .zip(data_sheet_layout())
            .filter(|(_, column)| column.table_column().is_some())
            .map(|(cell, _)| cell.clone())
            .collect();
        let expected: Vec<Cell> = t.header_row().into_iter().map(Cell::Text).collect();
        assert_eq!(header, expected);
    }

    #[test]
    fn test_legend_qvalue_wording() {
        let (_, description) = LEGENDS
            .iter()
            .find(|(name, _)| *name == "-LOG10(qvalue)")
            .unwrap();
        assert!(description.contains("-log10(Qvalue)"));
        assert!(!description.contains("Pvalue"));
    }

    #[test]
    fn test_legends_cover_all_columns() {
        let names: Vec<&str> = LEGENDS.iter().map(|(name, _)| *name).collect();
        for expected in [
            "order",
            "chr",
            "start",
            "end",
            "summit-100",
            "summit+100",
            "summit-1",
            "summit",
            "length",
            "abs_summit",
            "pileup",
            "fold_enrichment",
            "#FDR(%)",
        ] {
            assert!(names.contains(&expected), "missing legend for {expected}");
        }
    }

    #[test]
    fn test_report_to_workbook() {
        let t = table(vec![peak("chr1", 150)]);
        let header = vec![
            "# This file is generated by MACS version 2.0.10".to_string(),
            String::new(),
        ];
        let report = Report {
            sheet_name: "peaks.xls".to_string(),
            header: &header,
            table: &t,
        };
        let mut workbook = report.to_workbook().unwrap();
        let bytes = workbook.save_to_buffer().unwrap();
        assert!(!bytes.is_empty());
    }
}
