//! End-to-end parsing of uploaded CSV requisitions.

use chrono::NaiveDate;
use maritime_utils::{
    ColumnMap, DateOrder, ErrorResponse, Field, MaritimeError, ParseMode, RequisitionParser,
};

const EXPORT: &str = "\
Vessel,IMO,Port,Delivery Date,Item No,Description,Qty,Unit,Dept,Supplier,Price
MV Northern Star,9321483,Rotterdam,15/07/2024,,,,,,,
,,,,A-100,Lube oil filter,4,PCS,ENGINE,,
,,,,,Fuel oil filter,2,,,,
,,,,Item No,Description,Quantity,Unit,Dept,,
,,,,B-200,Deck paint,20,LTR,DECK,,
,,,,,Quoted total,,,,Acme Marine,1250.00
";

fn parser() -> RequisitionParser {
    RequisitionParser::new().with_reference_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
}

#[test]
fn test_erp_export_with_header_block_and_pricing_footer() {
    let parsed = parser().parse_file("REQ-2024-031.csv", EXPORT.as_bytes()).unwrap();

    let requisition = &parsed.requisition;
    assert_eq!(requisition.vessel_name, "MV Northern Star");
    assert_eq!(requisition.vessel_imo.as_deref(), Some("9321483"));
    assert_eq!(requisition.port_name, "Rotterdam");
    assert_eq!(requisition.delivery_date_iso(), "2024-07-15");

    let names: Vec<_> = parsed.items.iter().map(|i| i.item_name.as_str()).collect();
    assert_eq!(names, ["Lube oil filter", "Fuel oil filter", "Deck paint"]);

    let second = &parsed.items[1];
    assert_eq!(second.line_number, 2);
    assert_eq!(second.item_number.as_deref(), Some("A-100"));
    assert_eq!(second.unit.as_deref(), Some("PCS"));
    assert_eq!(second.department.as_deref(), Some("ENGINE"));

    let third = &parsed.items[2];
    assert_eq!(third.line_number, 3);
    assert_eq!(third.item_number.as_deref(), Some("B-200"));
    assert_eq!(third.quantity, 20.0);

    // Source rows: repeated header on row 5, pricing on row 7.
    let skipped: Vec<_> = parsed.warnings.iter().filter_map(|w| w.row).collect();
    assert_eq!(skipped, [5, 7]);
}

#[test]
fn test_output_json_shape() {
    let parsed = parser().parse_file("req.csv", EXPORT.as_bytes()).unwrap();
    let value = serde_json::to_value(&parsed).unwrap();

    assert_eq!(value["requisition"]["delivery_date"], "2024-07-15");
    assert_eq!(value["requisition"]["status"], "draft");
    assert_eq!(value["items"][0]["line_number"], 1);
    assert!(value["items"][0].get("specifications").is_none());
}

#[test]
fn test_strict_upload_rejects_unreadable_quantity() {
    let csv = "Vessel,Port,ETA,Description,Qty\nMV Star,Busan,2024-05-01,Anchor chain,ten\n";
    let err = parser()
        .with_mode(ParseMode::Strict)
        .parse_file("req.csv", csv.as_bytes())
        .unwrap_err();

    assert_eq!(err, MaritimeError::invalid_number("ten", Some(2)));

    let response = ErrorResponse::from(err);
    assert_eq!(response.code, "INVALID_NUMBER");
    assert_eq!(response.error, "Failed to parse file: Invalid number (row 2): ten");
}

#[test]
fn test_custom_columns_and_month_first_dates() {
    let columns = ColumnMap::new()
        .with_extra(Field::Description, ["Bezeichnung"])
        .with_extra(Field::Quantity, ["Menge"]);
    let parser = parser()
        .with_columns(columns)
        .with_date_order(DateOrder::MonthFirst);

    let csv = "Vessel,Delivery Date,Bezeichnung,Menge\nMS Hamburg,07/15/2024,Kolbenring,6\n";
    let parsed = parser.parse_file("bestellung.csv", csv.as_bytes()).unwrap();

    assert_eq!(parsed.requisition.delivery_date_iso(), "2024-07-15");
    assert_eq!(parsed.items[0].item_description, "Kolbenring");
    assert_eq!(parsed.items[0].quantity, 6.0);
}

#[test]
fn test_unsupported_and_empty_uploads() {
    assert_eq!(
        parser().parse_file("req.pdf", b"%PDF-1.7").unwrap_err().error_code(),
        "UNSUPPORTED_FORMAT"
    );
    assert_eq!(
        parser().parse_file("req.csv", b"Description,Qty\n").unwrap_err(),
        MaritimeError::EmptyInput
    );
}
