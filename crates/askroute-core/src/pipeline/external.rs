//! External mode: web, video and code search fan-out

use super::{Pipeline, PipelineRun, PipelineState, SourceFailure, Stages, Trace};
use crate::compile::EXTERNAL_PRIORITY;
use crate::error::{AskRouteError, Result};
use crate::query::{Mode, Query};
use crate::sources::{RawHit, SourceClient, SourceKind};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct ExternalPipeline {
    sources: Vec<Arc<dyn SourceClient>>,
    stages: Stages,
}

impl ExternalPipeline {
    /// Requires at least one source
    pub fn new(sources: Vec<Arc<dyn SourceClient>>, stages: Stages) -> Result<Self> {
        if sources.is_empty() {
            return Err(AskRouteError::Config(
                "external mode needs at least one of web, video or code search".to_string(),
            ));
        }
        Ok(Self { sources, stages })
    }

    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Sources worth asking for this query. Code search only runs for
    /// programming questions.
    fn applicable(&self, query: &Query) -> Vec<&Arc<dyn SourceClient>> {
        let programming = self.stages.ranker.keywords().matches(query.text());
        self.sources
            .iter()
            .filter(|source| {
                let keep = programming || source.kind() != SourceKind::Code;
                if !keep {
                    tracing::debug!("Skipping code search for non-programming query");
                }
                keep
            })
            .collect()
    }

    /// Query the applicable sources concurrently, each under its own timeout
    async fn retrieve(&self, query: &Query) -> Vec<(SourceKind, usize, Result<Vec<RawHit>>)> {
        let calls = self.applicable(query).into_iter().map(|source| async move {
            let kind = source.kind();
            let limit = source.limit();
            let timeout = source.timeout();
            let outcome = match tokio::time::timeout(timeout, source.search(query.text(), limit))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(AskRouteError::source(
                    kind,
                    format!("timed out after {}ms", timeout.as_millis()),
                )),
            };
            (kind, limit, outcome)
        });
        join_all(calls).await
    }
}

#[async_trait]
impl Pipeline for ExternalPipeline {
    fn mode(&self) -> Mode {
        Mode::External
    }

    async fn run_traced(&self, query: &Query) -> Result<PipelineRun> {
        let mut trace = Trace::new(Mode::External);
        trace.enter(PipelineState::Retrieving);

        let mut hits: BTreeMap<SourceKind, (usize, Vec<RawHit>)> = BTreeMap::new();
        let mut failures = Vec::new();
        let outcomes = self.retrieve(query).await;
        let attempted = outcomes.len();
        for (kind, limit, outcome) in outcomes {
            match outcome {
                Ok(found) => {
                    tracing::info!("{} search returned {} hits", kind, found.len());
                    let entry = hits.entry(kind).or_insert((limit, Vec::new()));
                    entry.1.extend(found);
                }
                Err(e) => {
                    tracing::warn!("{} search failed: {}", kind, e);
                    failures.push(SourceFailure {
                        kind,
                        cause: e.to_string(),
                    });
                }
            }
        }

        if attempted > 0 && failures.len() == attempted {
            trace.enter(PipelineState::Failed);
            let causes: Vec<String> = failures
                .iter()
                .map(|f| format!("{}: {}", f.kind, f.cause))
                .collect();
            return Err(AskRouteError::AllSourcesUnavailable(causes.join("; ")));
        }
        if !failures.is_empty() {
            trace.enter(PipelineState::Degraded);
        }

        trace.enter(PipelineState::Ranking);
        let ranked = hits
            .into_iter()
            .map(|(kind, (limit, raw))| {
                let ranked = self.stages.ranker.rank(raw, query.text(), limit);
                tracing::debug!("{} hits ranked: {}", kind, ranked.len());
                (kind, ranked)
            })
            .collect();

        trace.enter(PipelineState::Compiling);
        let bundle = self.stages.compiler.compile(ranked, &EXTERNAL_PRIORITY);

        let result = self.stages.synthesize(query, &bundle, &mut trace).await?;
        Ok(PipelineRun {
            result,
            trace: trace.into_states(),
            failures,
            context_chars: bundle.compiled_len(),
        })
    }
}
