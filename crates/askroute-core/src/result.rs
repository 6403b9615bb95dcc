//! Structured answers returned to callers
//!
//! Evidence lists are filled from the [`EvidenceBundle`], never from model
//! output, so every listed hit is one the model actually saw.

use crate::compile::EvidenceBundle;
use crate::query::Mode;
use crate::rank::RankedHit;
use crate::sources::{HitDetail, SourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Answer used when the model never produced a valid structure
pub const FALLBACK_ANSWER: &str =
    "Unable to synthesize a structured response. The retrieved sources are listed below.";

/// Upper bound on `related_topics`
pub const MAX_RELATED_TOPICS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StructuredResult {
    External(ExternalResult),
    Internal(InternalResult),
}

impl StructuredResult {
    pub fn mode(&self) -> Mode {
        match self {
            Self::External(_) => Mode::External,
            Self::Internal(_) => Mode::Internal,
        }
    }

    pub fn answer(&self) -> &str {
        match self {
            Self::External(r) => &r.answer,
            Self::Internal(r) => &r.answer,
        }
    }

    pub fn sources_used(&self) -> &BTreeSet<SourceKind> {
        match self {
            Self::External(r) => &r.sources_used,
            Self::Internal(r) => &r.sources_used,
        }
    }

    pub fn synthesis_error(&self) -> Option<&str> {
        match self {
            Self::External(r) => r.synthesis_error.as_deref(),
            Self::Internal(r) => r.synthesis_error.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub description: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub title: String,
    pub channel: String,
    pub duration: String,
    pub url: String,
    pub description: String,
    pub views: String,
    pub published: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoResult {
    pub repository: String,
    pub description: String,
    pub stars: u64,
    pub url: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeFileResult {
    pub file: String,
    pub repository: String,
    pub url: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalResult {
    pub answer: String,
    pub web_results: Vec<WebResult>,
    pub video_results: Vec<VideoResult>,
    pub code_repo_results: Vec<RepoResult>,
    pub code_file_results: Vec<CodeFileResult>,
    pub sources_used: BTreeSet<SourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
}

impl ExternalResult {
    pub fn from_bundle(answer: impl Into<String>, bundle: &EvidenceBundle) -> Self {
        let mut result = Self {
            answer: answer.into(),
            web_results: Vec::new(),
            video_results: Vec::new(),
            code_repo_results: Vec::new(),
            code_file_results: Vec::new(),
            sources_used: bundle.sources_used(),
            synthesis_error: None,
        };

        for group in bundle.groups() {
            for ranked in &group.hits {
                result.push(ranked);
            }
        }
        result
    }

    /// Deterministic result when synthesis failed
    pub fn fallback(bundle: &EvidenceBundle, cause: impl Into<String>) -> Self {
        Self {
            synthesis_error: Some(cause.into()),
            ..Self::from_bundle(FALLBACK_ANSWER, bundle)
        }
    }

    fn push(&mut self, ranked: &RankedHit) {
        let hit = &ranked.hit;
        match &hit.detail {
            HitDetail::Web => self.web_results.push(WebResult {
                title: hit.title.clone(),
                url: hit.url_or_id.clone(),
                description: hit.snippet.clone(),
                relevance: ranked.relevance,
            }),
            HitDetail::Video {
                channel,
                duration,
                views,
                published,
            } => self.video_results.push(VideoResult {
                title: hit.title.clone(),
                channel: channel.clone(),
                duration: duration.clone(),
                url: hit.url_or_id.clone(),
                description: hit.snippet.clone(),
                views: views.clone(),
                published: published.clone(),
                relevance: ranked.relevance,
            }),
            HitDetail::Repository { full_name, stars } => {
                self.code_repo_results.push(RepoResult {
                    repository: full_name.clone(),
                    description: hit.snippet.clone(),
                    stars: *stars,
                    url: hit.url_or_id.clone(),
                    relevance: ranked.relevance,
                })
            }
            HitDetail::CodeFile { repository, path } => {
                self.code_file_results.push(CodeFileResult {
                    file: path.clone(),
                    repository: repository.clone(),
                    url: hit.url_or_id.clone(),
                    relevance: ranked.relevance,
                })
            }
            HitDetail::Document { .. } => {
                tracing::warn!("Ignoring document hit in external result: {}", hit.url_or_id)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub category: String,
    pub relevance_score: f64,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalResult {
    pub answer: String,
    pub documents: Vec<InternalDocument>,
    pub confidence_score: f64,
    pub related_topics: BTreeSet<String>,
    pub sources_used: BTreeSet<SourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_error: Option<String>,
}

impl InternalResult {
    /// Assemble from the bundle's documents plus model-suggested topics
    pub fn from_bundle(
        answer: impl Into<String>,
        model_topics: &[String],
        bundle: &EvidenceBundle,
    ) -> Self {
        let included = bundle.hits(SourceKind::Document);
        let documents: Vec<InternalDocument> =
            included.iter().filter_map(to_document).collect();

        let tags = documents.iter().flat_map(|d| d.tags.iter());
        let related_topics = related_topics(tags.chain(model_topics.iter()));

        Self {
            answer: answer.into(),
            documents,
            confidence_score: confidence_score(included),
            related_topics,
            sources_used: bundle.sources_used(),
            synthesis_error: None,
        }
    }

    /// Deterministic result when synthesis failed; confidence drops to 0
    pub fn fallback(bundle: &EvidenceBundle, cause: impl Into<String>) -> Self {
        Self {
            confidence_score: 0.0,
            synthesis_error: Some(cause.into()),
            ..Self::from_bundle(FALLBACK_ANSWER, &[], bundle)
        }
    }
}

fn to_document(ranked: &RankedHit) -> Option<InternalDocument> {
    let hit = &ranked.hit;
    match &hit.detail {
        HitDetail::Document {
            source,
            category,
            tags,
        } => Some(InternalDocument {
            id: hit.url_or_id.clone(),
            title: hit.title.clone(),
            content: hit.snippet.clone(),
            source: source.clone(),
            category: category.clone(),
            relevance_score: ranked.relevance,
            tags: tags.clone(),
        }),
        _ => None,
    }
}

/// Mean similarity of the included documents, clamped to [0, 1]
pub fn confidence_score(included: &[RankedHit]) -> f64 {
    if included.is_empty() {
        return 0.0;
    }
    let total: f64 = included
        .iter()
        .map(|h| h.hit.raw_score.unwrap_or(h.relevance))
        .sum();
    let mean = total / included.len() as f64;
    if mean.is_finite() {
        mean.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// First `MAX_RELATED_TOPICS` distinct non-empty topics, in input order
fn related_topics<'a>(topics: impl Iterator<Item = &'a String>) -> BTreeSet<String> {
    let mut seen: Vec<String> = Vec::new();
    for topic in topics {
        let topic = topic.trim();
        if topic.is_empty() || seen.iter().any(|s| s.eq_ignore_ascii_case(topic)) {
            continue;
        }
        seen.push(topic.to_string());
        if seen.len() == MAX_RELATED_TOPICS {
            break;
        }
    }
    seen.into_iter().collect()
}
