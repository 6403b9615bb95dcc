//! Internal mode: semantic retrieval over the private document index

use super::{Pipeline, PipelineRun, PipelineState, SourceFailure, Stages, Trace};
use crate::compile::INTERNAL_PRIORITY;
use crate::error::{AskRouteError, Result};
use crate::index::{ScoredDocument, SemanticIndexClient};
use crate::query::{Mode, Query};
use crate::sources::{clean_text, HitDetail, RawHit, SourceKind};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Longest document excerpt placed in the context
const DOCUMENT_SNIPPET_CHARS: usize = 600;

pub struct InternalPipeline {
    index: Arc<dyn SemanticIndexClient>,
    stages: Stages,
}

impl InternalPipeline {
    pub fn new(index: Arc<dyn SemanticIndexClient>, stages: Stages) -> Self {
        Self { index, stages }
    }

    async fn retrieve(&self, query: &Query) -> Result<Vec<ScoredDocument>> {
        let timeout = self.index.timeout();
        let lookup = async {
            let vector = self.index.embed(query.text()).await?;
            self.index.query(&vector, self.index.top_k()).await
        };
        match tokio::time::timeout(timeout, lookup).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AskRouteError::IndexUnavailable(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

fn document_hit(scored: ScoredDocument) -> RawHit {
    let doc = scored.document;
    RawHit::new(
        doc.title,
        doc.id,
        clean_text(&doc.content, DOCUMENT_SNIPPET_CHARS),
        HitDetail::Document {
            source: doc.source,
            category: doc.category,
            tags: doc.tags,
        },
    )
    .with_score(scored.similarity)
}

#[async_trait]
impl Pipeline for InternalPipeline {
    fn mode(&self) -> Mode {
        Mode::Internal
    }

    /// Index and embedding failures degrade to an empty document set; they
    /// never fail the run.
    async fn run_traced(&self, query: &Query) -> Result<PipelineRun> {
        let mut trace = Trace::new(Mode::Internal);
        trace.enter(PipelineState::Retrieving);

        let mut failures = Vec::new();
        let documents = match self.retrieve(query).await {
            Ok(documents) => {
                tracing::info!("Index returned {} documents", documents.len());
                documents
            }
            Err(e) if e.is_retrieval_failure() => {
                tracing::warn!("Document index unavailable, continuing without documents: {}", e);
                failures.push(SourceFailure {
                    kind: SourceKind::Document,
                    cause: e.to_string(),
                });
                trace.enter(PipelineState::Degraded);
                Vec::new()
            }
            Err(e) => {
                trace.enter(PipelineState::Failed);
                return Err(e);
            }
        };

        trace.enter(PipelineState::Ranking);
        let limit = self.index.top_k();
        let raw: Vec<RawHit> = documents.into_iter().map(document_hit).collect();
        let mut ranked = BTreeMap::new();
        if !raw.is_empty() {
            ranked.insert(
                SourceKind::Document,
                self.stages.ranker.rank(raw, query.text(), limit),
            );
        }

        trace.enter(PipelineState::Compiling);
        let bundle = self.stages.compiler.compile(ranked, &INTERNAL_PRIORITY);

        let result = self.stages.synthesize(query, &bundle, &mut trace).await?;
        Ok(PipelineRun {
            result,
            trace: trace.into_states(),
            failures,
            context_chars: bundle.compiled_len(),
        })
    }
}
