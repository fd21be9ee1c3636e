use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MaritimeError {
    #[error("Spreadsheet contains no rows")]
    EmptyInput,

    #[error("No items found in file")]
    NoValidItems,

    #[error("Required column not found{}: {columns}", row_suffix(.row))]
    MissingColumn { columns: String, row: Option<usize> },

    #[error("Invalid number{}: {value}", row_suffix(.row))]
    InvalidNumber { value: String, row: Option<usize> },

    #[error("Quantity must be greater than 0{}: {quantity}", row_suffix(.row))]
    InvalidQuantity { quantity: f64, row: Option<usize> },

    #[error("Invalid date: {value}")]
    InvalidDate { value: String },

    #[error("Spreadsheet error: {message}")]
    Spreadsheet { message: String },

    #[error("Unsupported file format: {filename}")]
    UnsupportedFormat { filename: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(row) => format!(" (row {})", row),
        None => String::new(),
    }
}

impl MaritimeError {
    pub fn missing_column(candidates: &[impl AsRef<str>], row: Option<usize>) -> Self {
        let columns = candidates
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(" or ");
        Self::MissingColumn { columns, row }
    }

    pub fn invalid_number(value: impl Into<String>, row: Option<usize>) -> Self {
        Self::InvalidNumber {
            value: value.into(),
            row,
        }
    }

    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    pub fn spreadsheet(message: impl Into<String>) -> Self {
        Self::Spreadsheet {
            message: message.into(),
        }
    }

    pub fn unsupported_format(filename: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            filename: filename.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::NoValidItems => "NO_VALID_ITEMS",
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::InvalidNumber { .. } => "INVALID_NUMBER",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::Spreadsheet { .. } => "SPREADSHEET_ERROR",
            Self::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::EmptyInput => 400,
            Self::NoValidItems => 422,
            Self::MissingColumn { .. } => 422,
            Self::InvalidNumber { .. } => 422,
            Self::InvalidQuantity { .. } => 422,
            Self::InvalidDate { .. } => 422,
            Self::Spreadsheet { .. } => 422,
            Self::UnsupportedFormat { .. } => 415,
            Self::Validation { .. } => 400,
            Self::Configuration { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }
}

pub type MaritimeResult<T> = Result<T, MaritimeError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<MaritimeError> for ErrorResponse {
    fn from(error: MaritimeError) -> Self {
        Self {
            error: format!("Failed to parse file: {}", error),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: serde_json::to_value(&error).ok(),
        }
    }
}

// Conversion from common error types
impl From<csv::Error> for MaritimeError {
    fn from(error: csv::Error) -> Self {
        Self::spreadsheet(error.to_string())
    }
}

impl From<std::io::Error> for MaritimeError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error.to_string())
    }
}

impl From<serde_json::Error> for MaritimeError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for MaritimeError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}
