//! JSON output formatter

use anyhow::Result;
use askroute_core::StructuredResult;

pub fn format_result(result: &StructuredResult) -> Result<String> {
    let mut out = serde_json::to_string_pretty(result)?;
    out.push('\n');
    Ok(out)
}
