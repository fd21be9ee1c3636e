//! Cell Coercion
//!
//! Number and date parsing for cell text. Dates are matched against a fixed
//! format list instead of guessing, so `03/04/2024` always means the same day
//! for a given `DateOrder`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How to read all-numeric dates such as `03/04/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `03/04/2024` is 3 April 2024.
    #[default]
    DayFirst,
    /// `03/04/2024` is 4 March 2024.
    MonthFirst,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const YEAR_FIRST_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

const MONTH_NAME_FORMATS: &[&str] = &[
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%y",
];

const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%y"];

const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y", "%m.%d.%Y", "%m-%d-%Y", "%m/%d/%y"];

/// Parse a calendar date, discarding any time of day or offset.
pub fn parse_date(value: &str, order: DateOrder) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.naive_local().date());
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(datetime.date());
    }

    let numeric = match order {
        DateOrder::DayFirst => DAY_FIRST_FORMATS,
        DateOrder::MonthFirst => MONTH_FIRST_FORMATS,
    };

    YEAR_FIRST_FORMATS
        .iter()
        .chain(MONTH_NAME_FORMATS)
        .chain(numeric)
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse a date and render it as `YYYY-MM-DD`.
pub fn normalize_date(value: &str, order: DateOrder) -> Option<String> {
    parse_date(value, order).map(|date| date.format("%Y-%m-%d").to_string())
}

fn grouped_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap())
}

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?").unwrap())
}

/// Parse a cell as a finite number.
///
/// Thousands separators are accepted only in well-formed groups (`1,250.5`).
/// Trailing text after a numeric prefix is ignored, so `10 pcs` reads as 10.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = if grouped_number().is_match(value) {
        value.replace(',', "").parse::<f64>().ok()
    } else {
        leading_number()
            .find(value)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    };

    parsed.filter(|n| n.is_finite())
}
