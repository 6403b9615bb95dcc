//! AskRoute CLI
//!
//! Role-aware question answering over retrieved evidence.

use anyhow::Result;
use askroute_core::error::exit_codes;
use askroute_core::{AskRouteError, Config};
use clap::Parser;

mod app;
mod commands;
mod output;
mod server;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config).await,
        Commands::Ask(args) => commands::ask::run(args, &config).await,
        Commands::Ingest(args) => commands::ingest::run(args, &config).await,
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<AskRouteError>()
        .map(AskRouteError::exit_code)
        .unwrap_or(exit_codes::GENERAL_ERROR)
}
