//! Read-only, in-memory view of an uploaded export.
//!
//! Both supported encodings are decoded once into [`Workbook`]: a `.xlsx`
//! workbook through `calamine`, and delimited text through `csv` as a single
//! sheet. Extractors only ever borrow the result, so one decoded workbook can
//! be shared across them without any extractor observing another's reads.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;

use crate::error::ExtractError;

/// Name given to the only sheet of a delimited-text upload.
pub const CSV_SHEET_NAME: &str = "Sheet1";

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

static EMPTY_CELL: RawCellValue = RawCellValue::Empty;

/// A cell value exactly as the spreadsheet stored it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl RawCellValue {
    /// `true` for empty cells and text cells holding only whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            RawCellValue::Empty => true,
            RawCellValue::Text(s) => s.trim().is_empty(),
            RawCellValue::Number(_) | RawCellValue::Date(_) => false,
        }
    }

    /// `true` when the cell's trimmed text equals `header`, ignoring case.
    #[must_use]
    pub fn matches_header(&self, header: &str) -> bool {
        !self.is_blank() && self.display_text().trim().to_lowercase() == header.trim().to_lowercase()
    }

    /// Renders the value the way the export displays it.
    ///
    /// Whole numbers print without a fractional part and dates use the
    /// export's `MM/DD/YYYY` form.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            RawCellValue::Text(s) => s.clone(),
            RawCellValue::Number(n) => format_number(*n),
            RawCellValue::Date(d) => d.format("%m/%d/%Y").to_string(),
            RawCellValue::Empty => String::new(),
        }
    }
}

impl From<&str> for RawCellValue {
    fn from(value: &str) -> Self {
        RawCellValue::Text(value.to_owned())
    }
}

impl From<String> for RawCellValue {
    fn from(value: String) -> Self {
        RawCellValue::Text(value)
    }
}

impl From<f64> for RawCellValue {
    fn from(value: f64) -> Self {
        RawCellValue::Number(value)
    }
}

impl From<NaiveDate> for RawCellValue {
    fn from(value: NaiveDate) -> Self {
        RawCellValue::Date(value)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Which reader an upload's declared file name selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Workbook,
    DelimitedText,
}

impl FileKind {
    /// Classifies a file name by extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.xlsx` or `.csv`.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        if lower.ends_with(".xlsx") {
            Some(FileKind::Workbook)
        } else if lower.ends_with(".csv") {
            Some(FileKind::DelimitedText)
        } else {
            None
        }
    }
}

/// One named sheet, addressed 1-based by `(row, column)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<RawCellValue>>,
}

impl Sheet {
    /// Builds a sheet from rows starting at row 1, column 1.
    ///
    /// Trailing rows with no populated cell are dropped so that
    /// [`Sheet::max_row`] is the last populated row.
    #[must_use]
    pub fn new(name: impl Into<String>, mut rows: Vec<Vec<RawCellValue>>) -> Self {
        while rows
            .last()
            .is_some_and(|row| row.iter().all(|c| matches!(c, RawCellValue::Empty)))
        {
            rows.pop();
        }
        Self {
            name: name.into(),
            rows,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cell at `(row, col)`, or `Empty` outside the populated area.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> &RawCellValue {
        if row == 0 || col == 0 {
            return &EMPTY_CELL;
        }
        self.rows
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Last populated row, or 0 for an empty sheet.
    #[must_use]
    pub fn max_row(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length across the sheet.
    #[must_use]
    pub fn max_column(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cells of one row, left to right. Empty outside the populated area.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &RawCellValue> {
        row.checked_sub(1)
            .and_then(|index| self.rows.get(index))
            .into_iter()
            .flatten()
    }

    /// Finds a column in `header_row` whose trimmed text equals `header`,
    /// ignoring case. Searches left to right; the first match wins.
    #[must_use]
    pub fn find_column(&self, header_row: usize, header: &str) -> Option<usize> {
        self.row(header_row)
            .position(|cell| cell.matches_header(header))
            .map(|index| index + 1)
    }
}

/// All sheets of one export, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    #[must_use]
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Decodes raw upload bytes, sniffing the encoding from the content.
    ///
    /// A ZIP container is read as an `.xlsx` workbook; any other UTF-8 text is
    /// read as comma-delimited rows in a single sheet named [`CSV_SHEET_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UnreadableFile`] when the bytes are empty, are
    /// neither a readable workbook nor UTF-8 text, or fail to decode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::UnreadableFile("file is empty".to_owned()));
        }
        if bytes.starts_with(ZIP_SIGNATURE) {
            return read_xlsx(bytes);
        }
        let text = std::str::from_utf8(bytes).map_err(|_| {
            ExtractError::UnreadableFile("content is neither an xlsx workbook nor text".to_owned())
        })?;
        read_delimited(text.strip_prefix('\u{feff}').unwrap_or(text))
    }

    /// Looks up a sheet by exact, case-sensitive name.
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Like [`Workbook::sheet`], but absence is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::SheetNotFound`] if no sheet has that name.
    pub fn require_sheet(&self, name: &str) -> Result<&Sheet, ExtractError> {
        self.sheet(name)
            .ok_or_else(|| ExtractError::sheet_not_found(name))
    }

    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

fn read_xlsx(bytes: &[u8]) -> Result<Workbook, ExtractError> {
    let mut xlsx: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExtractError::UnreadableFile(format!("invalid xlsx workbook: {e}")))?;

    let mut sheets = Vec::new();
    for name in xlsx.sheet_names() {
        // A broken sheet only costs the extractor that reads it.
        let range = match xlsx.worksheet_range(&name) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!(sheet = %name, error = %e, "skipping unreadable sheet");
                continue;
            }
        };

        let mut rows: Vec<Vec<RawCellValue>> = Vec::new();
        if let Some((start_row, start_col)) = range.start() {
            let (start_row, start_col) = (start_row as usize, start_col as usize);
            rows.resize(start_row, Vec::new());
            for source_row in range.rows() {
                let mut row = vec![RawCellValue::Empty; start_col];
                row.extend(source_row.iter().map(convert_cell));
                rows.push(row);
            }
        }
        sheets.push(Sheet::new(name, rows));
    }

    Ok(Workbook::new(sheets))
}

#[allow(clippy::cast_precision_loss)]
fn convert_cell(data: &Data) -> RawCellValue {
    match data {
        Data::Int(i) => RawCellValue::Number(*i as f64),
        Data::Float(f) => RawCellValue::Number(*f),
        Data::String(s) => RawCellValue::Text(s.clone()),
        Data::Bool(b) => RawCellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_owned()),
        Data::DateTime(dt) if dt.is_datetime() => dt
            .as_datetime()
            .map_or(RawCellValue::Number(dt.as_f64()), |d| RawCellValue::Date(d.date())),
        Data::DateTime(dt) => RawCellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map_or_else(|| RawCellValue::Text(s.clone()), RawCellValue::Date),
        Data::DurationIso(s) => RawCellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => RawCellValue::Empty,
    }
}

fn read_delimited(text: &str) -> Result<Workbook, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| ExtractError::UnreadableFile(format!("invalid delimited text: {e}")))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        RawCellValue::Empty
                    } else {
                        RawCellValue::Text(field.to_owned())
                    }
                })
                .collect(),
        );
    }

    Ok(Workbook::new(vec![Sheet::new(CSV_SHEET_NAME, rows)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> Sheet {
        Sheet::new(
            "ENGAGEMENT",
            vec![
                vec!["Date".into(), " Impressions ".into(), "ENGAGEMENTS".into()],
                vec!["11/11/2024".into(), 120.0_f64.into(), 7.0_f64.into()],
                vec![RawCellValue::Empty, RawCellValue::Empty],
            ],
        )
    }

    #[test]
    fn cell_is_one_based_and_empty_outside_range() {
        let sheet = sample_sheet();
        assert_eq!(sheet.cell(1, 1), &RawCellValue::Text("Date".to_owned()));
        assert_eq!(sheet.cell(2, 3), &RawCellValue::Number(7.0));
        assert_eq!(sheet.cell(0, 1), &RawCellValue::Empty);
        assert_eq!(sheet.cell(9, 9), &RawCellValue::Empty);
    }

    #[test]
    fn trailing_empty_rows_do_not_count() {
        assert_eq!(sample_sheet().max_row(), 2);
        assert_eq!(sample_sheet().max_column(), 3);
    }

    #[test]
    fn find_column_trims_and_ignores_case() {
        let sheet = sample_sheet();
        assert_eq!(sheet.find_column(1, "impressions"), Some(2));
        assert_eq!(sheet.find_column(1, "Engagements"), Some(3));
        assert_eq!(sheet.find_column(1, "Clicks"), None);
        assert_eq!(sheet.find_column(2, "Engagements"), None);
    }

    #[test]
    fn row_iterates_header_cells() {
        let sheet = sample_sheet();
        assert_eq!(sheet.row(1).count(), 3);
        assert_eq!(sheet.row(0).count(), 0);
        assert_eq!(sheet.row(7).count(), 0);
    }

    #[test]
    fn find_column_first_match_wins() {
        let sheet = Sheet::new("TOP POSTS", vec![vec!["Post URL".into(), "x".into(), "post url".into()]]);
        assert_eq!(sheet.find_column(1, "Post URL"), Some(1));
    }

    #[test]
    fn sheet_lookup_is_case_sensitive() {
        let workbook = Workbook::new(vec![sample_sheet()]);
        assert!(workbook.sheet("ENGAGEMENT").is_some());
        assert!(workbook.sheet("Engagement").is_none());
        assert!(matches!(
            workbook.require_sheet("FOLLOWERS"),
            Err(ExtractError::SheetNotFound { sheet }) if sheet == "FOLLOWERS"
        ));
    }

    #[test]
    fn display_text_formats_whole_numbers_and_dates() {
        assert_eq!(RawCellValue::Number(857_000.0).display_text(), "857000");
        assert_eq!(RawCellValue::Number(0.25).display_text(), "0.25");
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(RawCellValue::Date(date).display_text(), "03/07/2025");
    }

    #[test]
    fn blank_detection() {
        assert!(RawCellValue::Empty.is_blank());
        assert!(RawCellValue::Text("   ".to_owned()).is_blank());
        assert!(!RawCellValue::Number(0.0).is_blank());
    }

    #[test]
    fn file_kind_from_extension() {
        assert_eq!(FileKind::from_file_name("export.xlsx"), Some(FileKind::Workbook));
        assert_eq!(FileKind::from_file_name("EXPORT.XLSX"), Some(FileKind::Workbook));
        assert_eq!(FileKind::from_file_name("posts.csv"), Some(FileKind::DelimitedText));
        assert_eq!(FileKind::from_file_name("notes.txt"), None);
        assert_eq!(FileKind::from_file_name("legacy.xls"), None);
    }

    #[test]
    fn header_match_folds_case_beyond_ascii() {
        let cell = RawCellValue::Text("  ÉCOLES ".to_owned());
        assert!(cell.matches_header("écoles"));
        assert!(!cell.matches_header("ecoles"));
        assert!(!RawCellValue::Empty.matches_header(""));
    }

    #[test]
    fn empty_bytes_are_unreadable() {
        assert!(matches!(
            Workbook::from_bytes(b""),
            Err(ExtractError::UnreadableFile(_))
        ));
    }

    #[test]
    fn binary_garbage_is_unreadable() {
        assert!(matches!(
            Workbook::from_bytes(&[0xD0, 0xCF, 0x11, 0xE0, 0xFF, 0xFE]),
            Err(ExtractError::UnreadableFile(_))
        ));
    }

    #[test]
    fn corrupt_zip_is_unreadable() {
        assert!(matches!(
            Workbook::from_bytes(b"PK\x03\x04not really a zip"),
            Err(ExtractError::UnreadableFile(_))
        ));
    }

    #[test]
    fn delimited_text_becomes_single_sheet() {
        let workbook =
            Workbook::from_bytes(b"\xEF\xBB\xBFPost URL,Engagements\nhttps://x/1,\"1,234\"\n,\n")
                .unwrap();
        assert_eq!(workbook.sheet_names(), vec![CSV_SHEET_NAME]);
        let sheet = workbook.sheet(CSV_SHEET_NAME).unwrap();
        assert_eq!(sheet.cell(1, 1), &RawCellValue::Text("Post URL".to_owned()));
        assert_eq!(sheet.cell(2, 2), &RawCellValue::Text("1,234".to_owned()));
        assert_eq!(sheet.max_row(), 2);
    }
}
