//! Spreadsheet Reader
//!
//! Turns an uploaded workbook into header→text rows for the parser. Only the
//! first sheet is read. Every header column is present in every row; blank
//! cells are empty strings.

use calamine::{open_workbook_from_rs, DataType, Range, Reader, Xls, Xlsx};
use chrono::Timelike;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::{MaritimeError, MaritimeResult};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SpreadsheetFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Detect format from content type header
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => Some(Self::Xlsx),
            "application/vnd.ms-excel" => Some(Self::Xls),
            "text/csv" | "application/csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// One data row: `(header, cell text)` pairs in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based row number in the source sheet.
    pub number: usize,
    cells: Vec<(String, String)>,
}

impl SheetRow {
    pub fn new(number: usize, cells: Vec<(String, String)>) -> Self {
        Self { number, cells }
    }

    pub fn from_pairs<'a>(number: usize, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let cells = pairs
            .into_iter()
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        Self { number, cells }
    }

    /// Raw cell text for an exact header match.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(header, _)| header == column)
            .map(|(_, value)| value.as_str())
    }

    /// Cell values joined by a space; headers are not included.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.trim().is_empty())
    }
}

/// First sheet of a workbook.
#[derive(Debug, Clone)]
pub struct SheetData {
    pub sheet_names: Vec<String>,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

/// Read an uploaded workbook from bytes.
pub fn read_workbook(
    filename: &str,
    data: &[u8],
    format: Option<SpreadsheetFormat>,
) -> MaritimeResult<SheetData> {
    let format = format
        .or_else(|| SpreadsheetFormat::from_extension(Path::new(filename)))
        .ok_or_else(|| MaritimeError::unsupported_format(filename))?;

    let sheet = match format {
        SpreadsheetFormat::Xlsx => {
            let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(data))
                .map_err(|e| MaritimeError::spreadsheet(format!("Failed to open workbook: {}", e)))?;
            read_first_sheet(&mut workbook)?
        }
        SpreadsheetFormat::Xls => {
            let mut workbook: Xls<_> = open_workbook_from_rs(Cursor::new(data))
                .map_err(|e| MaritimeError::spreadsheet(format!("Failed to open workbook: {}", e)))?;
            read_first_sheet(&mut workbook)?
        }
        SpreadsheetFormat::Csv => read_csv(data)?,
    };

    tracing::debug!(
        filename,
        sheet = %sheet.sheet_name,
        columns = sheet.headers.len(),
        rows = sheet.rows.len(),
        "Read spreadsheet"
    );

    Ok(sheet)
}

fn read_first_sheet<RS, R>(workbook: &mut R) -> MaritimeResult<SheetData>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| MaritimeError::spreadsheet("No sheets found in workbook"))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| MaritimeError::spreadsheet(format!("Sheet '{}' not found", sheet_name)))?
        .map_err(|e| MaritimeError::spreadsheet(format!("Failed to read worksheet: {}", e)))?;

    let (headers, rows) = rows_from_range(&range);

    Ok(SheetData {
        sheet_names,
        sheet_name,
        headers,
        rows,
    })
}

fn rows_from_range(range: &Range<DataType>) -> (Vec<String>, Vec<SheetRow>) {
    // calamine trims leading empty rows/columns; keep sheet numbering 1-based.
    let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows_iter = range.rows();

    let headers = match rows_iter.next() {
        Some(header_cells) => unique_headers(header_cells.iter().map(cell_text)),
        None => return (Vec::new(), Vec::new()),
    };

    let rows = rows_iter
        .enumerate()
        .map(|(idx, cells)| {
            let values = cells.iter().map(cell_text);
            build_row(first_row + idx + 1, &headers, values)
        })
        .filter(|row| !row.is_blank())
        .collect();

    (headers, rows)
}

fn read_csv(data: &[u8]) -> MaritimeResult<SheetData> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data);

    let headers = unique_headers(reader.headers()?.iter().map(str::to_string));

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let number = record
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(idx + 2);
        let row = build_row(number, &headers, record.iter().map(str::to_string));
        if !row.is_blank() {
            rows.push(row);
        }
    }

    Ok(SheetData {
        sheet_names: vec!["Sheet1".to_string()],
        sheet_name: "Sheet1".to_string(),
        headers,
        rows,
    })
}

/// Pair values with headers; missing trailing cells become empty strings.
fn build_row(number: usize, headers: &[String], values: impl Iterator<Item = String>) -> SheetRow {
    let mut values = values;
    let cells = headers
        .iter()
        .map(|header| (header.clone(), values.next().unwrap_or_default()))
        .collect();
    SheetRow::new(number, cells)
}

/// Blank headers become `__EMPTY`, `__EMPTY_1`, …; repeats get `_1`, `_2`, ….
fn unique_headers(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for header in raw {
        let base = if header.trim().is_empty() {
            "__EMPTY".to_string()
        } else {
            header
        };

        let mut candidate = base.clone();
        let mut suffix = 0;
        while headers.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}_{}", base, suffix);
        }
        headers.push(candidate);
    }
    headers
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => format_float(*f),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(serial) => date_cell_text(cell).unwrap_or_else(|| format_float(*serial)),
        DataType::Error(_) => String::new(),
        other => other.to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Native date cell as ISO text. Seconds are truncated, never rounded up.
fn date_cell_text(cell: &DataType) -> Option<String> {
    if let DataType::DateTime(serial) = cell {
        // Beyond 9999-12-31 is not a calendar date in Excel either.
        if !(0.0..2_958_466.0).contains(serial) {
            return None;
        }
    }

    let datetime = cell.as_datetime()?;
    if datetime.time().num_seconds_from_midnight() == 0 {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(SpreadsheetFormat::from_extension(Path::new("req.xlsx")), Some(SpreadsheetFormat::Xlsx));
        assert_eq!(SpreadsheetFormat::from_extension(Path::new("REQ.XLS")), Some(SpreadsheetFormat::Xls));
        assert_eq!(SpreadsheetFormat::from_extension(Path::new("req.csv")), Some(SpreadsheetFormat::Csv));
        assert_eq!(SpreadsheetFormat::from_extension(Path::new("req.pdf")), None);
        assert_eq!(
            SpreadsheetFormat::from_content_type("application/vnd.ms-excel"),
            Some(SpreadsheetFormat::Xls)
        );
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = read_workbook("requisition.txt", b"a,b", None).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_csv_rows_keep_literal_headers_and_empty_cells() {
        let csv_data = b"Vessel,Description,Qty,Unit\nMV Star,Engine Oil,10,DRUM\n,Filter,2\n,,,\n";
        let sheet = read_workbook("req.csv", csv_data, None).unwrap();

        assert_eq!(sheet.headers, vec!["Vessel", "Description", "Qty", "Unit"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].number, 2);
        assert_eq!(sheet.rows[0].get("Unit"), Some("DRUM"));
        assert_eq!(sheet.rows[1].get("Vessel"), Some(""));
        assert_eq!(sheet.rows[1].get("Unit"), Some(""));
        assert_eq!(sheet.rows[1].number, 3);
    }

    #[test]
    fn test_duplicate_and_blank_headers_are_renamed() {
        let headers = unique_headers(
            ["Qty", "", "Qty", "", "Qty"].iter().map(|s| s.to_string()),
        );
        assert_eq!(headers, vec!["Qty", "__EMPTY", "Qty_1", "__EMPTY_1", "Qty_2"]);
    }

    #[test]
    fn test_row_text_joins_values_only() {
        let row = SheetRow::from_pairs(2, [("Description", "Engine Oil"), ("Qty", ""), ("Unit", "DRUM")]);
        assert_eq!(row.text(), "Engine Oil DRUM");
        assert!(!row.is_blank());
    }

    #[test]
    fn test_cell_text_conversions() {
        assert_eq!(cell_text(&DataType::Float(10.0)), "10");
        assert_eq!(cell_text(&DataType::Float(2.5)), "2.5");
        assert_eq!(cell_text(&DataType::Int(7)), "7");
        assert_eq!(cell_text(&DataType::Empty), "");
        assert_eq!(cell_text(&DataType::String("PCS".into())), "PCS");
    }

    #[test]
    fn test_excel_serial_dates() {
        // 45413 is 2024-05-01 in the 1900 date system.
        assert_eq!(cell_text(&DataType::DateTime(45413.0)), "2024-05-01");
        assert_eq!(cell_text(&DataType::DateTime(45413.5)), "2024-05-01T12:00:00");
        assert_eq!(date_cell_text(&DataType::DateTime(-1.0)), None);
        assert_eq!(date_cell_text(&DataType::DateTime(f64::NAN)), None);
    }

    #[test]
    fn test_date_cell_just_before_midnight_stays_on_its_day() {
        // 23:59:59.5 on 1 May 2024.
        let serial = 45413.0 + 86_399.5 / 86_400.0;
        assert_eq!(date_cell_text(&DataType::DateTime(serial)).as_deref(), Some("2024-05-01T23:59:59"));
    }

    #[test]
    fn test_range_rows_are_numbered_from_sheet_origin() {
        let mut range: Range<DataType> = Range::new((2, 0), (4, 1));
        range.set_value((2, 0), DataType::String("Description".into()));
        range.set_value((2, 1), DataType::String("Qty".into()));
        range.set_value((3, 0), DataType::String("Bolts".into()));
        range.set_value((3, 1), DataType::Float(5.0));

        let (headers, rows) = rows_from_range(&range);
        assert_eq!(headers, vec!["Description", "Qty"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, 4);
        assert_eq!(rows[0].get("Qty"), Some("5"));
    }

    fn two_sheet_workbook() -> Vec<u8> {
        use rust_xlsxwriter::{Format, Workbook};

        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let mut workbook = Workbook::new();

        let first = workbook.add_worksheet();
        first.set_name("Req").unwrap();
        for (col, header) in ["Vessel", "Port", "Delivery Date", "Description", "Qty"].iter().enumerate() {
            first.write_string(0, col as u16, *header).unwrap();
        }
        first.write_string(1, 0, "MV Star").unwrap();
        first.write_string(1, 1, "Singapore").unwrap();
        first.write_number_with_format(1, 2, 45413.0, &date_format).unwrap();
        first.write_string(1, 3, "Engine Oil").unwrap();
        first.write_number(1, 4, 10.0).unwrap();

        let second = workbook.add_worksheet();
        second.set_name("Other").unwrap();
        second.write_string(0, 0, "Description").unwrap();
        second.write_string(1, 0, "Not on the first sheet").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_xlsx_reads_first_sheet_with_native_dates() {
        let data = two_sheet_workbook();
        let sheet = read_workbook("req.xlsx", &data, None).unwrap();

        assert_eq!(sheet.sheet_names, vec!["Req", "Other"]);
        assert_eq!(sheet.sheet_name, "Req");
        assert_eq!(sheet.headers, vec!["Vessel", "Port", "Delivery Date", "Description", "Qty"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].number, 2);
        assert_eq!(sheet.rows[0].get("Delivery Date"), Some("2024-05-01"));
        assert_eq!(sheet.rows[0].get("Qty"), Some("10"));
    }

    #[test]
    fn test_corrupt_xlsx_is_a_spreadsheet_error() {
        let err = read_workbook("req.xlsx", b"not a zip archive", None).unwrap_err();
        assert_eq!(err.error_code(), "SPREADSHEET_ERROR");
    }
}
