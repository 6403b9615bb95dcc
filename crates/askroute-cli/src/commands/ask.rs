//! One-shot query

use crate::app::AskArgs;
use crate::output::format_result;
use anyhow::Result;
use askroute_core::{Config, Mode, Query, QueryRouter, Role};

pub async fn run(args: AskArgs, config: &Config) -> Result<()> {
    // Validate before touching any backend
    let role: Role = args.role.parse()?;
    let mode: Mode = args.mode.parse()?;
    let query = Query::new(role, mode, args.query.join(" "))?;

    let router = QueryRouter::from_config(config)?;
    let run = router.route_traced(&query).await?;

    for failure in &run.failures {
        eprintln!("Warning: {} source unavailable: {}", failure.kind, failure.cause);
    }
    if let Some(cause) = run.result.synthesis_error() {
        eprintln!("Warning: answer synthesis failed: {}", cause);
    }

    print!("{}", format_result(&run.result, args.format)?);
    Ok(())
}
