//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use anyhow::Result;
use askroute_core::StructuredResult;

/// Format a structured result
pub fn format_result(result: &StructuredResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format_result(result),
        OutputFormat::Text => Ok(terminal::format_result(result)),
    }
}
