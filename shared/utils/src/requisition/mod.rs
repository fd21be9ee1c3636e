//! Requisition Intake Module
//!
//! Reads a purchase requisition spreadsheet exported from a ship's ERP system
//! and recovers the requisition header plus its ordered line items.
//! Supports Excel (XLSX/XLS) and CSV uploads.

pub mod reader;
pub mod columns;
pub mod classify;
pub mod coerce;
pub mod parser;

pub use reader::{read_workbook, SheetData, SheetRow, SpreadsheetFormat};
pub use columns::{ColumnMap, Field};
pub use classify::{classify, is_header_text, is_pricing_text, RowKind};
pub use coerce::{normalize_date, parse_date, parse_number, DateOrder};
pub use parser::{ParseMode, ParseWarning, ParsedRequisition, RequisitionParser};
