//! Requisition Parser
//!
//! Recovers a requisition header and its ordered line items from the rows of
//! an uploaded sheet. Metadata is read from a small header block at the top;
//! every row is then considered as a potential line item.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use maritime_models::{Requisition, RequisitionItem, DEFAULT_CURRENCY, UNKNOWN_PORT, UNKNOWN_VESSEL};

use super::classify::{classify, RowKind};
use super::coerce::{normalize_date, parse_date, parse_number, DateOrder};
use super::columns::{ColumnMap, Field};
use super::reader::{read_workbook, SheetRow};
use crate::config::ParserConfig;
use crate::error::{MaritimeError, MaritimeResult};
use crate::validation::validate_model;
use crate::{log_debug, log_info, log_warn};

/// How the parser reacts to incomplete or malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Substitute defaults for missing metadata and skip unusable item rows.
    #[default]
    Lenient,
    /// Fail on missing vessel/port/delivery date and on bad item quantities.
    Strict,
}

/// Soft anomaly absorbed during a lenient parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseWarning {
    pub row: Option<usize>,
    pub field: Option<String>,
    pub message: String,
}

impl ParseWarning {
    fn new(row: Option<usize>, field: Option<Field>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.map(|f| f.as_str().to_string()),
            message: message.into(),
        }
    }
}

/// Result of a successful parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedRequisition {
    pub requisition: Requisition,
    pub items: Vec<RequisitionItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
}

/// Values carried forward from the last accepted item row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Carried {
    item_number: String,
    unit: String,
    department: String,
}

impl Carried {
    /// Fill blanks in the current row from the carried values.
    fn merge(&self, item_number: &str, unit: &str, department: &str) -> Carried {
        Carried {
            item_number: inherit(item_number, &self.item_number),
            unit: inherit(unit, &self.unit),
            department: inherit(department, &self.department),
        }
    }
}

fn inherit(current: &str, previous: &str) -> String {
    if current.is_empty() {
        previous.to_string()
    } else {
        current.to_string()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SkipReason {
    NoDescription,
    HeaderRow,
    PricingRow,
    MissingQuantity,
    UnreadableQuantity(String),
    NonPositiveQuantity(f64),
}

impl SkipReason {
    /// Blank/padding rows are too common to report.
    fn warning(&self, row: usize) -> Option<ParseWarning> {
        let (field, message) = match self {
            Self::NoDescription => return None,
            Self::HeaderRow => (None, "Skipped repeated column header row".to_string()),
            Self::PricingRow => (None, "Skipped quotation or pricing row".to_string()),
            Self::MissingQuantity => (Some(Field::Quantity), "Skipped item without a quantity".to_string()),
            Self::UnreadableQuantity(raw) => (
                Some(Field::Quantity),
                format!("Skipped item with unreadable quantity '{}'", raw),
            ),
            Self::NonPositiveQuantity(quantity) => (
                Some(Field::Quantity),
                format!("Skipped item with non-positive quantity {}", quantity),
            ),
        };
        Some(ParseWarning::new(Some(row), field, message))
    }
}

enum RowOutcome {
    Accepted(RequisitionItem, Carried),
    Skipped(SkipReason),
}

/// Spreadsheet requisition parser.
///
/// Stateless between calls; one instance may be shared across threads.
#[derive(Debug, Clone)]
pub struct RequisitionParser {
    columns: ColumnMap,
    mode: ParseMode,
    metadata_scan_rows: usize,
    default_currency: String,
    date_order: DateOrder,
    reference_date: Option<NaiveDate>,
}

impl Default for RequisitionParser {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            mode: ParseMode::Lenient,
            metadata_scan_rows: 5,
            default_currency: DEFAULT_CURRENCY.to_string(),
            date_order: DateOrder::DayFirst,
            reference_date: None,
        }
    }
}

impl RequisitionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// A blank `default_currency` falls back to USD.
    pub fn from_config(config: &ParserConfig) -> Self {
        let default_currency = match config.default_currency.trim() {
            "" => {
                log_warn!("Blank default currency configured; using {}", DEFAULT_CURRENCY);
                DEFAULT_CURRENCY.to_string()
            }
            currency => currency.to_uppercase(),
        };

        Self {
            columns: ColumnMap::default().with_overrides(&config.extra_columns),
            mode: config.mode,
            metadata_scan_rows: config.metadata_scan_rows,
            default_currency,
            date_order: config.date_order,
            reference_date: None,
        }
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_columns(mut self, columns: ColumnMap) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_date_order(mut self, order: DateOrder) -> Self {
        self.date_order = order;
        self
    }

    /// Date used when the sheet has no usable delivery date. Defaults to today (UTC).
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Read the first sheet of an uploaded file and parse it.
    #[instrument(name = "parse_upload", skip_all, fields(filename = %filename, bytes = data.len()))]
    pub fn parse_file(&self, filename: &str, data: &[u8]) -> MaritimeResult<ParsedRequisition> {
        let sheet = read_workbook(filename, data, None)?;
        self.parse(&sheet.rows)
    }

    /// Parse sheet rows into a requisition and its line items.
    #[instrument(name = "parse_requisition", skip_all, fields(rows = rows.len(), mode = ?self.mode))]
    pub fn parse(&self, rows: &[SheetRow]) -> MaritimeResult<ParsedRequisition> {
        if rows.is_empty() {
            return Err(MaritimeError::EmptyInput);
        }

        let mut warnings = Vec::new();
        let requisition = self.extract_metadata(rows, &mut warnings)?;

        let mut items: Vec<RequisitionItem> = Vec::new();
        let mut carried = Carried::default();
        let mut skipped = 0usize;

        for row in rows {
            let line_number = items.len() as u32 + 1;
            match self.extract_item(row, &carried, line_number)? {
                RowOutcome::Accepted(item, next) => {
                    items.push(item);
                    carried = next;
                }
                RowOutcome::Skipped(reason) => {
                    skipped += 1;
                    log_debug!("Row {} skipped: {:?}", row.number, reason);
                    warnings.extend(reason.warning(row.number));
                }
            }
        }

        if items.is_empty() {
            return Err(MaritimeError::NoValidItems);
        }

        validate_model(&requisition)?;
        for item in &items {
            validate_model(item)?;
        }

        log_info!(
            "Parsed requisition for {} at {}: {} items, {} rows skipped",
            requisition.vessel_name,
            requisition.port_name,
            items.len(),
            skipped
        );

        Ok(ParsedRequisition {
            requisition,
            items,
            warnings,
        })
    }

    fn is_strict(&self) -> bool {
        self.mode == ParseMode::Strict
    }

    fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// First non-empty value for a field across the metadata block.
    fn scan(&self, rows: &[SheetRow], field: Field) -> Option<String> {
        rows.iter()
            .take(self.metadata_scan_rows)
            .find_map(|row| self.columns.lookup(row, field))
            .map(str::to_string)
    }

    /// Scan for a field that strict mode requires.
    fn scan_required(&self, rows: &[SheetRow], field: Field) -> MaritimeResult<Option<String>> {
        match self.scan(rows, field) {
            Some(value) => Ok(Some(value)),
            None if self.is_strict() => Err(MaritimeError::missing_column(self.columns.candidates(field), None)),
            None => Ok(None),
        }
    }

    /// Column-name resolution: trimmed value of the first matching candidate.
    fn resolve_text(&self, row: &SheetRow, field: Field, required: bool) -> MaritimeResult<String> {
        match self.columns.lookup(row, field) {
            Some(value) => Ok(value.to_string()),
            None if required => Err(MaritimeError::missing_column(
                self.columns.candidates(field),
                Some(row.number),
            )),
            None => Ok(String::new()),
        }
    }

    fn extract_metadata(&self, rows: &[SheetRow], warnings: &mut Vec<ParseWarning>) -> MaritimeResult<Requisition> {
        let vessel_name = self.scan_required(rows, Field::VesselName)?.unwrap_or_else(|| {
            warnings.push(ParseWarning::new(
                None,
                Some(Field::VesselName),
                format!("Vessel name not found; using '{}'", UNKNOWN_VESSEL),
            ));
            UNKNOWN_VESSEL.to_string()
        });

        let port_name = self.scan_required(rows, Field::PortName)?.unwrap_or_else(|| {
            warnings.push(ParseWarning::new(
                None,
                Some(Field::PortName),
                format!("Port name not found; using '{}'", UNKNOWN_PORT),
            ));
            UNKNOWN_PORT.to_string()
        });

        let delivery_date = match self.scan_required(rows, Field::DeliveryDate)? {
            Some(raw) => match parse_date(&raw, self.date_order) {
                Some(date) => date,
                None if self.is_strict() => return Err(MaritimeError::invalid_date(raw)),
                None => {
                    warnings.push(ParseWarning::new(
                        None,
                        Some(Field::DeliveryDate),
                        format!("Unreadable delivery date '{}'; using parse date", raw),
                    ));
                    self.today()
                }
            },
            None => {
                warnings.push(ParseWarning::new(
                    None,
                    Some(Field::DeliveryDate),
                    "Delivery date not found; using parse date",
                ));
                self.today()
            }
        };

        let requisition_date = match self.scan(rows, Field::RequisitionDate) {
            Some(raw) => match normalize_date(&raw, self.date_order) {
                Some(iso) => Some(iso),
                None if self.is_strict() => return Err(MaritimeError::invalid_date(raw)),
                None => {
                    warnings.push(ParseWarning::new(
                        None,
                        Some(Field::RequisitionDate),
                        format!("Requisition date '{}' kept as written", raw),
                    ));
                    Some(raw)
                }
            },
            None => None,
        };

        let currency = self
            .scan(rows, Field::Currency)
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| self.default_currency.clone());

        // IMO and notes only ever appear on the first row.
        let first = &rows[0];

        let mut requisition = Requisition::new(vessel_name, port_name, delivery_date);
        requisition.vessel_imo = self.columns.lookup(first, Field::VesselImo).map(str::to_string);
        requisition.requisition_number = self.scan(rows, Field::RequisitionNumber);
        requisition.requisition_title = self.scan(rows, Field::RequisitionTitle);
        requisition.requisition_date = requisition_date;
        requisition.requisition_group = self.scan(rows, Field::RequisitionGroup);
        requisition.currency = currency;
        requisition.notes = self.columns.lookup(first, Field::Notes).map(str::to_string);

        Ok(requisition)
    }

    fn extract_item(&self, row: &SheetRow, carried: &Carried, line_number: u32) -> MaritimeResult<RowOutcome> {
        let description = self.resolve_text(row, Field::Description, false)?;
        if description.is_empty() {
            return Ok(RowOutcome::Skipped(SkipReason::NoDescription));
        }

        match classify(row) {
            RowKind::Header => return Ok(RowOutcome::Skipped(SkipReason::HeaderRow)),
            RowKind::Pricing => return Ok(RowOutcome::Skipped(SkipReason::PricingRow)),
            RowKind::Candidate => {}
        }

        let quantity = match self.resolve_quantity(row)? {
            Ok(quantity) => quantity,
            Err(reason) => return Ok(RowOutcome::Skipped(reason)),
        };

        let next = carried.merge(
            &self.resolve_text(row, Field::ItemNumber, false)?,
            &self.resolve_text(row, Field::Unit, false)?,
            &self.resolve_text(row, Field::Department, false)?,
        );

        let mut item = RequisitionItem::new(line_number, description, quantity);
        item.item_number = non_empty(&next.item_number);
        item.unit = non_empty(&next.unit);
        item.department = non_empty(&next.department);
        item.specifications = non_empty(&self.resolve_text(row, Field::Specifications, false)?);
        item.notes = non_empty(&self.resolve_text(row, Field::ItemNotes, false)?);

        Ok(RowOutcome::Accepted(item, next))
    }

    /// Outer error aborts the parse (strict); inner error skips the row (lenient).
    fn resolve_quantity(&self, row: &SheetRow) -> MaritimeResult<Result<f64, SkipReason>> {
        let raw = self.resolve_text(row, Field::Quantity, self.is_strict())?;
        if raw.is_empty() {
            return Ok(Err(SkipReason::MissingQuantity));
        }

        match parse_number(&raw) {
            None if self.is_strict() => Err(MaritimeError::invalid_number(raw, Some(row.number))),
            None => Ok(Err(SkipReason::UnreadableQuantity(raw))),
            Some(quantity) if quantity <= 0.0 => {
                if self.is_strict() {
                    Err(MaritimeError::InvalidQuantity {
                        quantity,
                        row: Some(row.number),
                    })
                } else {
                    Ok(Err(SkipReason::NonPositiveQuantity(quantity)))
                }
            }
            Some(quantity) => Ok(Ok(quantity)),
        }
    }
}
