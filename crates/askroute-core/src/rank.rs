//! Relevance scoring and per-source ranking
//!
//! Scores are computed per source kind and never compared across kinds:
//! - web, video: fraction of query terms present in title + snippet
//! - code: the same overlap, boosted when the hit mentions a programming keyword
//! - document: the embedding similarity, clamped into [0, 1]

use crate::sources::{RawHit, SourceKind};
use std::sync::Arc;

/// Common English stop words removed from queries before scoring
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "he", "in",
    "is", "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "does", "do",
    "did", "can", "could", "should", "would", "what", "where", "when", "why", "how", "who",
    "which", "this", "these", "those", "there", "here", "i", "me", "my", "you", "your",
];

const PROGRAMMING_KEYWORDS: &[&str] = &[
    "python", "javascript", "java", "c++", "c#", "go", "rust", "php", "ruby", "swift",
    "react", "angular", "vue", "node", "django", "flask", "spring", "laravel",
    "api", "library", "framework", "tool", "script", "bot", "automation",
    "algorithm", "data structure", "machine learning", "ai", "ml", "neural",
    "database", "sql", "nosql", "redis", "mongodb", "postgresql",
    "docker", "kubernetes", "aws", "azure", "gcp", "cloud",
    "git", "github", "gitlab", "ci/cd", "deployment", "devops",
    "mobile", "android", "ios", "flutter", "react native",
    "web", "frontend", "backend", "fullstack", "microservices",
];

/// A hit with its score and position within its own source
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHit {
    pub hit: RawHit,
    /// In [0, 1]
    pub relevance: f64,
    /// 0 = most relevant within its source
    pub rank: usize,
}

impl RankedHit {
    pub fn source_kind(&self) -> SourceKind {
        self.hit.source_kind()
    }
}

/// Replaceable set of keyword patterns used to recognise code-oriented text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for k in keywords {
            let k = k.as_ref().trim().to_lowercase();
            if !k.is_empty() && !out.contains(&k) {
                out.push(k);
            }
        }
        Self { keywords: out }
    }

    /// Built-in list of languages, frameworks and tooling terms
    pub fn programming() -> Self {
        Self::new(PROGRAMMING_KEYWORDS.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// True when any keyword occurs in `text` as a whole word or phrase
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| contains_word(&lower, k))
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::programming()
    }
}

/// `needle` occurs in `haystack` with no alphanumeric character on either side
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Lower-cased query terms with stop words and surrounding punctuation removed
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in query.split_whitespace() {
        let term = word
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
            .to_lowercase();
        if term.is_empty() || STOP_WORDS.contains(&term.as_str()) || terms.contains(&term) {
            continue;
        }
        terms.push(term);
    }
    terms
}

/// Fraction of `terms` present in the hit's title and snippet
pub fn lexical_overlap(terms: &[String], hit: &RawHit) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let text = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    let present = terms.iter().filter(|t| text.contains(t.as_str())).count();
    present as f64 / terms.len() as f64
}

pub struct RelevanceRanker {
    keywords: Arc<KeywordSet>,
    keyword_boost: f64,
    floor: f64,
}

impl Default for RelevanceRanker {
    fn default() -> Self {
        Self::new(Arc::new(KeywordSet::programming()), 0.2, 0.0)
    }
}

impl RelevanceRanker {
    pub fn new(keywords: Arc<KeywordSet>, keyword_boost: f64, floor: f64) -> Self {
        Self {
            keywords,
            keyword_boost: keyword_boost.clamp(0.0, 1.0),
            floor: floor.clamp(0.0, 1.0),
        }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Score one hit against pre-split query terms
    pub fn score(&self, terms: &[String], hit: &RawHit) -> f64 {
        let score = match hit.source_kind() {
            SourceKind::Document => hit.raw_score.unwrap_or(0.0),
            SourceKind::Code => {
                let base = lexical_overlap(terms, hit);
                let text = format!("{} {}", hit.title, hit.snippet);
                if self.keywords.matches(&text) {
                    base + self.keyword_boost
                } else {
                    base
                }
            }
            SourceKind::Web | SourceKind::Video => lexical_overlap(terms, hit),
        };
        if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Rank one source's hits: best first, stable on ties, floor applied,
    /// at most `limit` results, dense 0-based ranks.
    pub fn rank(&self, hits: Vec<RawHit>, query: &str, limit: usize) -> Vec<RankedHit> {
        let terms = query_terms(query);
        let mut scored: Vec<(RawHit, f64)> = hits
            .into_iter()
            .map(|hit| {
                let relevance = self.score(&terms, &hit);
                (hit, relevance)
            })
            .collect();

        // sort_by is stable: equal scores keep provider order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .filter(|(_, relevance)| *relevance >= self.floor)
            .take(limit)
            .enumerate()
            .map(|(rank, (hit, relevance))| RankedHit {
                hit,
                relevance,
                rank,
            })
            .collect()
    }
}
