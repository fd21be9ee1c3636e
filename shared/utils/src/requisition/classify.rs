//! Row Classification
//!
//! Content-sniffing predicates over a row's flattened cell text. ERP exports
//! repeat the column header inside the data and leave vendor pricing blocks in
//! the same sheet; neither may become a line item.

use super::reader::SheetRow;

/// Pairs of terms that together mark a repeated column-header row.
const HEADER_MARKERS: &[(&str, &str)] = &[("description", "quantity"), ("item name", "qty")];

/// Terms that mark vendor-filled quotation or pricing rows.
const PRICING_MARKERS: &[&str] = &[
    "quoted", "supplier", "vendor", "price", "discount", "total", "approval",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Pricing,
    Candidate,
}

pub fn is_header_text(text: &str) -> bool {
    let text = text.to_lowercase();
    HEADER_MARKERS
        .iter()
        .any(|(a, b)| text.contains(a) && text.contains(b))
}

pub fn is_pricing_text(text: &str) -> bool {
    let text = text.to_lowercase();
    PRICING_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Header rows win over pricing rows when both match.
pub fn classify(row: &SheetRow) -> RowKind {
    let text = row.text();
    if is_header_text(&text) {
        RowKind::Header
    } else if is_pricing_text(&text) {
        RowKind::Pricing
    } else {
        RowKind::Candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_rows() {
        assert!(is_header_text("No. Description Quantity Unit"));
        assert!(is_header_text("ITEM NAME QTY UOM"));
        assert!(!is_header_text("Description of pump seal"));
        assert!(!is_header_text("Item name only"));
    }

    #[test]
    fn test_pricing_rows() {
        assert!(is_pricing_text("Vendor Acme Price 100"));
        assert!(is_pricing_text("Quoted by supplier"));
        assert!(is_pricing_text("GRAND TOTAL"));
        assert!(is_pricing_text("Approval pending"));
        assert!(!is_pricing_text("Engine Oil 10 DRUM"));
    }

    #[test]
    fn test_classify_uses_cell_values_not_headers() {
        let item = SheetRow::from_pairs(3, [("Description", "Engine Oil"), ("Quantity", "10"), ("Unit Price", "")]);
        assert_eq!(classify(&item), RowKind::Candidate);

        let repeated_header =
            SheetRow::from_pairs(4, [("Description", "Description"), ("Quantity", "Quantity"), ("Unit Price", "")]);
        assert_eq!(classify(&repeated_header), RowKind::Header);

        let pricing = SheetRow::from_pairs(5, [("Description", "Vendor discount"), ("Quantity", "1"), ("Unit Price", "")]);
        assert_eq!(classify(&pricing), RowKind::Pricing);
    }
}
