//! Column Synonyms
//!
//! ERP exports name the same column differently. Each field carries an
//! ordered list of header names; lookups try them in order and take the first
//! one with a non-empty value. Adding an export variant is a table change.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use super::reader::SheetRow;
use crate::log_warn;

/// Every requisition field the parser reads from a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    VesselName,
    VesselImo,
    RequisitionNumber,
    RequisitionTitle,
    RequisitionDate,
    RequisitionGroup,
    PortName,
    DeliveryDate,
    Currency,
    Notes,
    ItemNumber,
    Description,
    Quantity,
    Unit,
    Department,
    Specifications,
    ItemNotes,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::VesselName,
        Field::VesselImo,
        Field::RequisitionNumber,
        Field::RequisitionTitle,
        Field::RequisitionDate,
        Field::RequisitionGroup,
        Field::PortName,
        Field::DeliveryDate,
        Field::Currency,
        Field::Notes,
        Field::ItemNumber,
        Field::Description,
        Field::Quantity,
        Field::Unit,
        Field::Department,
        Field::Specifications,
        Field::ItemNotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VesselName => "vessel_name",
            Self::VesselImo => "vessel_imo",
            Self::RequisitionNumber => "requisition_number",
            Self::RequisitionTitle => "requisition_title",
            Self::RequisitionDate => "requisition_date",
            Self::RequisitionGroup => "requisition_group",
            Self::PortName => "port_name",
            Self::DeliveryDate => "delivery_date",
            Self::Currency => "currency",
            Self::Notes => "notes",
            Self::ItemNumber => "item_number",
            Self::Description => "description",
            Self::Quantity => "quantity",
            Self::Unit => "unit",
            Self::Department => "department",
            Self::Specifications => "specifications",
            Self::ItemNotes => "item_notes",
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
            .ok_or_else(|| format!("Unknown requisition field '{}'", name))
    }
}

/// Built-in header names, in lookup order.
const DEFAULT_SYNONYMS: &[(Field, &[&str])] = &[
    (Field::VesselName, &["Vessel", "Vessel Name", "vessel_name", "Ship", "Ship Name"]),
    (Field::VesselImo, &["IMO", "IMO No", "IMO Number", "vessel_imo"]),
    (
        Field::RequisitionNumber,
        &["Requisition No", "Requisition Number", "Req No", "Req. No.", "requisition_number"],
    ),
    (Field::RequisitionTitle, &["Requisition Title", "Title", "requisition_title"]),
    (Field::RequisitionDate, &["Requisition Date", "Req Date", "Date", "requisition_date"]),
    (Field::RequisitionGroup, &["Requisition Group", "Group", "requisition_group"]),
    (Field::PortName, &["Port", "Port Name", "Delivery Port", "port_name"]),
    (Field::DeliveryDate, &["Delivery Date", "ETA", "Required Date", "delivery_date"]),
    (Field::Currency, &["Currency", "Curr", "currency"]),
    (Field::Notes, &["Notes", "Requisition Notes", "notes"]),
    (
        Field::ItemNumber,
        &["Item No", "Item Number", "Item Code", "Part No", "Code", "item_number"],
    ),
    (
        Field::Description,
        &[
            "Description",
            "Item Description",
            "Desc",
            "Item",
            "Item Name",
            "description",
            "item_description",
            "item_name",
        ],
    ),
    (Field::Quantity, &["Qty", "Quantity", "Requested Qty", "Qty Requested", "quantity"]),
    (Field::Unit, &["Unit", "UoM", "UOM", "Unit of Measure", "unit"]),
    (Field::Department, &["Department", "Dept", "Store", "Category", "department"]),
    (
        Field::Specifications,
        &["Specifications", "Specification", "Specs", "specifications"],
    ),
    (Field::ItemNotes, &["Item Notes", "Item Remarks", "Remarks", "item_notes"]),
];

/// Field → ordered candidate header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    entries: BTreeMap<Field, Vec<String>>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        let entries = DEFAULT_SYNONYMS
            .iter()
            .map(|(field, names)| (*field, names.iter().map(|n| n.to_string()).collect()))
            .collect();
        Self { entries }
    }
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append extra header names for a field. Duplicates are ignored.
    pub fn with_extra<I, S>(mut self, field: Field, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates = self.entries.entry(field).or_default();
        for name in names {
            let name = name.into();
            if !name.is_empty() && !candidates.contains(&name) {
                candidates.push(name);
            }
        }
        self
    }

    /// Apply the `extra_columns` section of the parser configuration.
    /// Unknown field names are logged and ignored.
    pub fn with_overrides(self, overrides: &HashMap<String, Vec<String>>) -> Self {
        // Sorted so the resulting order does not depend on hash iteration.
        let sorted: BTreeMap<_, _> = overrides.iter().collect();
        sorted.into_iter().fold(self, |map, (name, names)| match name.parse::<Field>() {
            Ok(field) => map.with_extra(field, names.iter().cloned()),
            Err(reason) => {
                log_warn!("Ignoring extra columns: {}", reason);
                map
            }
        })
    }

    pub fn candidates(&self, field: Field) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Trimmed value of the first candidate present with a non-empty value.
    pub fn lookup<'r>(&self, row: &'r SheetRow, field: Field) -> Option<&'r str> {
        self.candidates(field).iter().find_map(|candidate| {
            row.get(candidate)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
    }
}
