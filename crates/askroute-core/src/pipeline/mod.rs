//! Retrieval pipelines and the mode router
//!
//! A request moves through a fixed sequence of states:
//!
//! ```text
//! Received -> Retrieving -> [Degraded] -> Ranking -> Compiling -> Synthesizing -> Completed
//!                  \
//!                   -> Failed   (every required source failed)
//! ```
//!
//! Per-source failures are absorbed (the run is marked `Degraded`) and show up
//! only as missing entries in `sources_used`. A synthesis failure never fails
//! the run: the result carries the fallback answer and `synthesis_error`.

use crate::compile::{ContextCompiler, EvidenceBundle};
use crate::config::Config;
use crate::error::{AskRouteError, Result};
use crate::index::{EmbeddingIndex, SemanticIndexClient};
use crate::llm::{LLMClient, VLLMClient};
use crate::prompts::RolePrompts;
use crate::query::{Mode, Query};
use crate::rank::{KeywordSet, RelevanceRanker};
use crate::result::StructuredResult;
use crate::sources::{configured_sources, SourceKind};
use crate::synth::{fallback_result, ResponseSynthesizer};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

mod external;
mod internal;

pub use external::ExternalPipeline;
pub use internal::InternalPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Retrieving,
    Degraded,
    Ranking,
    Compiling,
    Synthesizing,
    Completed,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Received => "received",
            PipelineState::Retrieving => "retrieving",
            PipelineState::Degraded => "degraded",
            PipelineState::Ranking => "ranking",
            PipelineState::Compiling => "compiling",
            PipelineState::Synthesizing => "synthesizing",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A source that was attempted and did not deliver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub kind: SourceKind,
    pub cause: String,
}

/// Outcome of one successful run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub result: StructuredResult,
    pub trace: Vec<PipelineState>,
    pub failures: Vec<SourceFailure>,
    /// Characters of context handed to the model
    pub context_chars: usize,
}

impl PipelineRun {
    pub fn degraded(&self) -> bool {
        self.trace.contains(&PipelineState::Degraded)
    }
}

/// Records state transitions for one request
pub(crate) struct Trace {
    mode: Mode,
    states: Vec<PipelineState>,
}

impl Trace {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            mode,
            states: vec![PipelineState::Received],
        }
    }

    pub(crate) fn enter(&mut self, state: PipelineState) {
        tracing::debug!("[{}] {} -> {}", self.mode, self.current(), state);
        self.states.push(state);
    }

    fn current(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::Received)
    }

    pub(crate) fn into_states(self) -> Vec<PipelineState> {
        self.states
    }
}

/// Capability shared by the external and internal pipelines
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn mode(&self) -> Mode;

    /// Run and return the result with its state trace and source failures
    async fn run_traced(&self, query: &Query) -> Result<PipelineRun>;

    async fn run(&self, query: &Query) -> Result<StructuredResult> {
        Ok(self.run_traced(query).await?.result)
    }
}

/// Ranking, compilation and synthesis, shared by both pipelines
pub struct Stages {
    pub ranker: RelevanceRanker,
    pub compiler: ContextCompiler,
    pub synthesizer: ResponseSynthesizer,
    pub prompts: RolePrompts,
}

impl Stages {
    pub fn new(
        ranker: RelevanceRanker,
        compiler: ContextCompiler,
        synthesizer: ResponseSynthesizer,
        prompts: RolePrompts,
    ) -> Self {
        Self {
            ranker,
            compiler,
            synthesizer,
            prompts,
        }
    }

    pub fn from_config(config: &Config, llm: Arc<dyn LLMClient>) -> Self {
        let keywords = match &config.retrieval.programming_keywords {
            Some(list) => KeywordSet::new(list),
            None => KeywordSet::programming(),
        };
        Self::new(
            RelevanceRanker::new(
                Arc::new(keywords),
                config.retrieval.keyword_boost,
                config.retrieval.relevance_floor,
            ),
            ContextCompiler::new(config.retrieval.max_context_length),
            ResponseSynthesizer::new(llm),
            config.prompts.clone(),
        )
    }

    /// Synthesize over `bundle`, substituting the fallback on failure
    pub(crate) async fn synthesize(
        &self,
        query: &Query,
        bundle: &EvidenceBundle,
        trace: &mut Trace,
    ) -> Result<StructuredResult> {
        bundle.check_budget()?;
        trace.enter(PipelineState::Synthesizing);

        let instruction = self.prompts.instruction(query.role());
        let result = match self.synthesizer.synthesize(instruction, bundle, query).await {
            Ok(result) => result,
            Err(AskRouteError::SynthesisFailure(cause)) => {
                tracing::warn!("Synthesis failed, returning fallback answer: {}", cause);
                fallback_result(query.mode(), bundle, &cause)
            }
            Err(e) => return Err(e),
        };

        trace.enter(PipelineState::Completed);
        Ok(result)
    }
}

/// Dispatches a query to the pipeline for its mode
pub struct QueryRouter {
    external: Option<Arc<dyn Pipeline>>,
    internal: Option<Arc<dyn Pipeline>>,
}

impl QueryRouter {
    pub fn new(external: Option<Arc<dyn Pipeline>>, internal: Option<Arc<dyn Pipeline>>) -> Self {
        Self { external, internal }
    }

    /// Wire up pipelines from configuration. A mode whose required sources
    /// are not configured is left unavailable rather than failing startup.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm: Arc<dyn LLMClient> = Arc::new(VLLMClient::new(config.llm_service.clone())?);
        Self::with_llm(config, llm)
    }

    pub fn with_llm(config: &Config, llm: Arc<dyn LLMClient>) -> Result<Self> {
        let sources = configured_sources(&config.sources)?;
        let external: Option<Arc<dyn Pipeline>> = if sources.is_empty() {
            tracing::warn!("No external sources configured; external mode unavailable");
            None
        } else {
            let stages = Stages::from_config(config, llm.clone());
            Some(Arc::new(ExternalPipeline::new(sources, stages)?))
        };

        let index = EmbeddingIndex::with_client(config, llm.clone())?;
        let internal: Option<Arc<dyn Pipeline>> = match index {
            Some(index) => {
                let index: Arc<dyn SemanticIndexClient> = Arc::new(index);
                let stages = Stages::from_config(config, llm);
                Some(Arc::new(InternalPipeline::new(index, stages)))
            }
            None => {
                tracing::warn!("Document index not configured; internal mode unavailable");
                None
            }
        };

        Ok(Self::new(external, internal))
    }

    /// Modes that can currently be served
    pub fn available_modes(&self) -> Vec<Mode> {
        let mut modes = Vec::new();
        if self.external.is_some() {
            modes.push(Mode::External);
        }
        if self.internal.is_some() {
            modes.push(Mode::Internal);
        }
        modes
    }

    fn pipeline(&self, mode: Mode) -> Result<&Arc<dyn Pipeline>> {
        match mode {
            Mode::External => self.external.as_ref().ok_or_else(|| {
                AskRouteError::AllSourcesUnavailable(
                    "no external sources are configured".to_string(),
                )
            }),
            Mode::Internal => self.internal.as_ref().ok_or_else(|| {
                AskRouteError::IndexUnavailable("document index is not configured".to_string())
            }),
        }
    }

    pub async fn route_traced(&self, query: &Query) -> Result<PipelineRun> {
        tracing::info!(
            "Routing {} query for role {} ({} chars)",
            query.mode(),
            query.role(),
            query.text().chars().count()
        );
        let run = self.pipeline(query.mode())?.run_traced(query).await?;
        tracing::info!(
            "Query completed: sources_used={:?}, degraded={}, context={} chars",
            run.result.sources_used(),
            run.degraded(),
            run.context_chars
        );
        Ok(run)
    }

    pub async fn route(&self, query: &Query) -> Result<StructuredResult> {
        Ok(self.route_traced(query).await?.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_starts_received() {
        let mut trace = Trace::new(Mode::External);
        trace.enter(PipelineState::Retrieving);
        assert_eq!(
            trace.into_states(),
            vec![PipelineState::Received, PipelineState::Retrieving]
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::Degraded.to_string(), "degraded");
        assert_eq!(
            serde_json::to_value(PipelineState::Synthesizing).unwrap(),
            "synthesizing"
        );
    }

    #[tokio::test]
    async fn test_router_without_pipelines() {
        let router = QueryRouter::new(None, None);
        assert!(router.available_modes().is_empty());

        let query = Query::new(crate::query::Role::Admin, Mode::Internal, "q").unwrap();
        let err = router.route(&query).await.unwrap_err();
        assert!(matches!(err, AskRouteError::IndexUnavailable(_)));

        let query = Query::new(crate::query::Role::Admin, Mode::External, "q").unwrap();
        let err = router.route(&query).await.unwrap_err();
        assert!(matches!(err, AskRouteError::AllSourcesUnavailable(_)));
    }
}
