//! Maritime Requisition Intake
//!
//! Parses an uploaded purchase-requisition spreadsheet and prints the
//! requisition header and its line items as JSON.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use maritime_utils::{
    init_logging, log_error, log_info, validate_file_size, validate_file_type, AppConfig,
    ErrorResponse, MaritimeError, MaritimeResult, ParseMode, ParsedRequisition, RequisitionParser,
};

#[derive(Debug, Parser)]
#[command(name = "requisition-intake", version, about = "Parse a purchase-requisition spreadsheet into JSON")]
struct Args {
    /// Spreadsheet to parse (.xlsx, .xls or .csv)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Fail on missing metadata or unusable item rows instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match intake(&args, &config) {
        Ok(parsed) => match render(&parsed, args.compact) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render output: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            log_error!(err, "Requisition intake failed");
            let response = ErrorResponse::from(err);
            match render(&response, args.compact) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", response.error),
            }
            ExitCode::FAILURE
        }
    }
}

fn intake(args: &Args, config: &AppConfig) -> MaritimeResult<ParsedRequisition> {
    let filename = file_name(&args.file)?;
    validate_file_type(filename, &config.upload.allowed_extensions)?;

    let data = std::fs::read(&args.file)?;
    validate_file_size(data.len() as u64, config.upload.max_file_size)?;

    let mut parser = RequisitionParser::from_config(&config.parser);
    if args.strict {
        parser = parser.with_mode(ParseMode::Strict);
    }

    log_info!("Parsing {} ({} bytes, {:?} mode)", filename, data.len(), parser.mode());
    parser.parse_file(filename, &data)
}

fn file_name(path: &Path) -> MaritimeResult<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| MaritimeError::unsupported_format(path.display().to_string()))
}

fn render<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}
