//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "askroute")]
#[command(
    author,
    version,
    about = "Role-aware answers from web, video, code and private documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to $ASKROUTE_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API
    Serve(ServeArgs),

    /// Answer one query and print the structured result
    Ask(AskArgs),

    /// Load documents into the private index
    Ingest(IngestArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.bind)
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct AskArgs {
    /// learner, trainer or admin
    #[arg(long)]
    pub role: String,

    /// external or internal
    #[arg(long)]
    pub mode: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Query text
    #[arg(required = true)]
    pub query: Vec<String>,
}

#[derive(Args)]
pub struct IngestArgs {
    /// JSON/YAML document list, or a directory of Markdown/text files
    pub path: PathBuf,

    /// Load and report documents without writing to the index
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
