//! AskRoute Core Library
//!
//! Role- and mode-aware question answering over retrieved evidence.
//!
//! # Features
//! - External mode: concurrent web, video and code search with per-source timeouts
//! - Internal mode: semantic retrieval over a private document index
//! - Per-source relevance ranking and a bounded, priority-ordered context
//! - Schema-validated LLM synthesis with one corrective retry and a deterministic fallback

pub mod compile;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod query;
pub mod rank;
pub mod result;
pub mod sources;
pub mod synth;

pub use compile::{ContextCompiler, EvidenceBundle, EvidenceGroup};
pub use config::{Config, LLMServiceConfig, MAX_CONTEXT_LENGTH, MAX_SEARCH_RESULTS};
pub use error::{AskRouteError, Error, ErrorKind, Result};
pub use index::{DocumentRef, EmbeddingIndex, ScoredDocument, SemanticIndexClient};
pub use llm::{ChatMessage, Embedder, HttpEmbedder, LLMClient, MetricsSnapshot, VLLMClient};
pub use pipeline::{
    ExternalPipeline, InternalPipeline, Pipeline, PipelineRun, PipelineState, QueryRouter,
    SourceFailure, Stages,
};
pub use query::{ChatRequest, Mode, Query, Role};
pub use rank::{KeywordSet, RankedHit, RelevanceRanker};
pub use result::{ExternalResult, InternalResult, StructuredResult};
pub use sources::{HitDetail, RawHit, SourceClient, SourceKind};
pub use synth::ResponseSynthesizer;

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "askroute";
