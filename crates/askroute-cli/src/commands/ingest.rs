//! Document ingestion

use crate::app::IngestArgs;
use anyhow::Result;
use askroute_core::config::IndexBackend;
use askroute_core::ingest::{ingest, load_documents};
use askroute_core::{AskRouteError, Config, EmbeddingIndex};

pub async fn run(args: IngestArgs, config: &Config) -> Result<()> {
    let documents = load_documents(&args.path)?;
    println!(
        "Loaded {} documents from {}",
        documents.len(),
        args.path.display()
    );

    if args.dry_run {
        for doc in &documents {
            println!("  {} {} ({} chars)", doc.id, doc.title, doc.content.chars().count());
        }
        return Ok(());
    }

    let index = EmbeddingIndex::from_config(config)?.ok_or_else(|| {
        AskRouteError::IndexUnavailable(
            "document index is not configured (set PINECONE_API_KEY and PINECONE_HOST)"
                .to_string(),
        )
    })?;
    if config.index.backend == IndexBackend::Memory {
        eprintln!("Warning: memory index backend does not persist between runs");
    }

    let report = ingest(&index, &documents).await?;
    println!(
        "Indexed {}/{} documents in {} batches",
        report.written, report.loaded, report.batches
    );
    Ok(())
}
