//! External search providers
//!
//! Each provider wraps one search API behind the [`SourceClient`] trait:
//! - Web (SearxNG-compatible JSON search)
//! - Video (YouTube Data API v3)
//! - Code (GitHub repository and code search)
//!
//! A provider only exists when its configuration section is enabled and
//! carries the credentials it needs; unconfigured providers are simply left
//! out of the fan-out set.

use crate::config::SourcesConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

mod code;
mod http;
mod video;
mod web;

pub(crate) use http::clean_text;
pub use code::CodeSource;
pub use video::{format_iso_duration, VideoSource};
pub use web::WebSource;

/// Where a hit came from. Declaration order is the context priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Video,
    Code,
    Document,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Web => "web",
            SourceKind::Video => "video",
            SourceKind::Code => "code",
            SourceKind::Document => "document",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific fields of a hit
#[derive(Debug, Clone, PartialEq)]
pub enum HitDetail {
    Web,
    Video {
        channel: String,
        duration: String,
        views: String,
        published: String,
    },
    Repository {
        full_name: String,
        stars: u64,
    },
    CodeFile {
        repository: String,
        path: String,
    },
    Document {
        source: String,
        category: String,
        tags: Vec<String>,
    },
}

impl HitDetail {
    pub fn kind(&self) -> SourceKind {
        match self {
            HitDetail::Web => SourceKind::Web,
            HitDetail::Video { .. } => SourceKind::Video,
            HitDetail::Repository { .. } | HitDetail::CodeFile { .. } => SourceKind::Code,
            HitDetail::Document { .. } => SourceKind::Document,
        }
    }
}

/// One candidate result as returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    pub title: String,
    /// URL for web/video/code hits, document id for index hits
    pub url_or_id: String,
    pub snippet: String,
    /// Provider score, when the provider reports one (similarity for documents)
    pub raw_score: Option<f64>,
    pub detail: HitDetail,
}

impl RawHit {
    pub fn new(
        title: impl Into<String>,
        url_or_id: impl Into<String>,
        snippet: impl Into<String>,
        detail: HitDetail,
    ) -> Self {
        Self {
            title: title.into(),
            url_or_id: url_or_id.into(),
            snippet: snippet.into(),
            raw_score: None,
            detail,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.raw_score = Some(score);
        self
    }

    pub fn source_kind(&self) -> SourceKind {
        self.detail.kind()
    }
}

/// Search provider trait - all external sources must implement this
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which kind of hits this provider yields
    fn kind(&self) -> SourceKind;

    /// Budget for one `search` call; the pipeline cancels the call past it
    fn timeout(&self) -> Duration;

    /// Configured result count
    fn limit(&self) -> usize;

    /// Search the provider. An empty vector means "no results", not failure.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawHit>>;
}

/// Build every provider the configuration enables, in priority order
pub fn configured_sources(config: &SourcesConfig) -> Result<Vec<Arc<dyn SourceClient>>> {
    let mut sources: Vec<Arc<dyn SourceClient>> = Vec::new();

    match WebSource::from_config(&config.web)? {
        Some(s) => sources.push(Arc::new(s)),
        None => tracing::info!("Web source not configured, skipping"),
    }
    match VideoSource::from_config(&config.video)? {
        Some(s) => sources.push(Arc::new(s)),
        None => tracing::info!("Video source not configured (YOUTUBE_API_KEY unset?), skipping"),
    }
    match CodeSource::from_config(&config.code)? {
        Some(s) => sources.push(Arc::new(s)),
        None => tracing::info!("Code source not configured (GITHUB_TOKEN unset?), skipping"),
    }

    Ok(sources)
}
