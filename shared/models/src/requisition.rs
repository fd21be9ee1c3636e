//! Requisition domain models.
//!
//! A requisition is the buyer's record of what a vessel needs delivered to a
//! port. It owns an ordered list of line items that are created together with
//! it from a single spreadsheet upload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Placeholder used when no vessel column could be resolved.
pub const UNKNOWN_VESSEL: &str = "Unknown Vessel";
/// Placeholder used when no port column could be resolved.
pub const UNKNOWN_PORT: &str = "Unknown Port";
/// Currency assumed when the sheet does not state one.
pub const DEFAULT_CURRENCY: &str = "USD";
/// Maximum number of characters kept in `RequisitionItem::item_name`.
pub const ITEM_NAME_MAX_CHARS: usize = 200;

/// Requisition header extracted from the top block of an uploaded sheet.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct Requisition {
    #[validate(length(min = 1, message = "Vessel name must not be empty"))]
    pub vessel_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vessel_imo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_title: Option<String>,
    /// ISO date when the sheet value was recognisable, otherwise the raw text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requisition_group: Option<String>,
    #[validate(length(min = 1, message = "Port name must not be empty"))]
    pub port_name: String,
    pub delivery_date: NaiveDate,
    #[validate(length(min = 1, message = "Currency must not be empty"))]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: RequisitionStatus,
}

impl Requisition {
    /// Create a draft requisition with the mandatory header fields set.
    pub fn new(vessel_name: String, port_name: String, delivery_date: NaiveDate) -> Self {
        Self {
            vessel_name,
            vessel_imo: None,
            requisition_number: None,
            requisition_title: None,
            requisition_date: None,
            requisition_group: None,
            port_name,
            delivery_date,
            currency: DEFAULT_CURRENCY.to_string(),
            notes: None,
            status: RequisitionStatus::Draft,
        }
    }

    /// ISO `YYYY-MM-DD` rendering of the delivery date.
    pub fn delivery_date_iso(&self) -> String {
        self.delivery_date.format("%Y-%m-%d").to_string()
    }

    /// True when the vessel name is the parser placeholder.
    pub fn has_unknown_vessel(&self) -> bool {
        self.vessel_name == UNKNOWN_VESSEL
    }

    /// True when the port name is the parser placeholder.
    pub fn has_unknown_port(&self) -> bool {
        self.port_name == UNKNOWN_PORT
    }
}

/// Lifecycle of a requisition once it has been stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequisitionStatus {
    #[default]
    Draft,
    RfqSent,
    QuotationsReceived,
    Completed,
}

impl RequisitionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::RfqSent => "rfq_sent",
            Self::QuotationsReceived => "quotations_received",
            Self::Completed => "completed",
        }
    }

    /// Status transitions only move forward, one step at a time.
    pub fn can_transition_to(&self, next: RequisitionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::RfqSent)
                | (Self::RfqSent, Self::QuotationsReceived)
                | (Self::QuotationsReceived, Self::Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested product line within a requisition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RequisitionItem {
    /// 1-based position in emission order.
    #[validate(range(min = 1))]
    pub line_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_number: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Item name must be between 1 and 200 characters"))]
    pub item_name: String,
    #[validate(length(min = 1, message = "Item description must not be empty"))]
    pub item_description: String,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RequisitionItem {
    /// Build an item from its description, deriving the truncated name.
    pub fn new(line_number: u32, description: String, quantity: f64) -> Self {
        Self {
            line_number,
            item_number: None,
            item_name: truncate_item_name(&description),
            item_description: description,
            quantity,
            unit: None,
            department: None,
            specifications: None,
            notes: None,
        }
    }

    /// Quantity must be a finite, strictly positive number.
    pub fn has_valid_quantity(&self) -> bool {
        self.quantity.is_finite() && self.quantity > 0.0
    }
}

/// First `ITEM_NAME_MAX_CHARS` characters of a description.
pub fn truncate_item_name(description: &str) -> String {
    description.chars().take(ITEM_NAME_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_are_forward_only() {
        use RequisitionStatus::*;

        assert!(Draft.can_transition_to(RfqSent));
        assert!(RfqSent.can_transition_to(QuotationsReceived));
        assert!(QuotationsReceived.can_transition_to(Completed));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Draft));
        assert!(!RfqSent.can_transition_to(RfqSent));
        assert!(Completed.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RequisitionStatus::QuotationsReceived).unwrap();
        assert_eq!(json, "\"quotations_received\"");
        assert_eq!(RequisitionStatus::RfqSent.to_string(), "rfq_sent");
    }

    #[test]
    fn test_item_name_truncated_on_char_boundary() {
        let description = "é".repeat(250);
        let item = RequisitionItem::new(1, description.clone(), 2.0);

        assert_eq!(item.item_name.chars().count(), ITEM_NAME_MAX_CHARS);
        assert_eq!(item.item_description, description);
    }

    #[test]
    fn test_delivery_date_serializes_as_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let requisition = Requisition::new("MV Star".into(), "Singapore".into(), date);

        let value = serde_json::to_value(&requisition).unwrap();
        assert_eq!(value["delivery_date"], "2024-05-01");
        assert_eq!(value["status"], "draft");
        assert_eq!(value["currency"], "USD");
        assert!(value.get("vessel_imo").is_none());
        assert_eq!(requisition.delivery_date_iso(), "2024-05-01");
    }

    #[test]
    fn test_empty_vessel_name_fails_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let requisition = Requisition::new(String::new(), "Singapore".into(), date);
        assert!(requisition.validate().is_err());
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(RequisitionItem::new(1, "Bolts".into(), 5.0).has_valid_quantity());
        assert!(!RequisitionItem::new(1, "Bolts".into(), 0.0).has_valid_quantity());
        assert!(!RequisitionItem::new(1, "Bolts".into(), f64::NAN).has_valid_quantity());
    }
}
