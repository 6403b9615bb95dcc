//! Web search through a SearxNG-compatible JSON endpoint

use super::http::{build_client, clean_text, send_json};
use super::{HitDetail, RawHit, SourceClient, SourceKind};
use crate::config::WebSourceConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SNIPPET_CHARS: usize = 300;

pub struct WebSource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    limit: usize,
}

impl WebSource {
    /// Build from config; `None` when disabled or no search URL is set
    pub fn from_config(config: &WebSourceConfig) -> Result<Option<Self>> {
        let base_url = match (&config.url, config.enabled) {
            (Some(url), true) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => return Ok(None),
        };
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Some(Self {
            client: build_client(SourceKind::Web, timeout)?,
            base_url,
            timeout,
            limit: config.max_results,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f64>,
}

fn parse_results(response: SearchResponse, limit: usize) -> Vec<RawHit> {
    response
        .results
        .into_iter()
        .filter(|item| !item.url.is_empty())
        .take(limit)
        .map(|item| {
            let title = if item.title.trim().is_empty() {
                "N/A".to_string()
            } else {
                clean_text(&item.title, SNIPPET_CHARS)
            };
            let hit = RawHit::new(
                title,
                item.url,
                clean_text(&item.content, SNIPPET_CHARS),
                HitDetail::Web,
            );
            match item.score {
                Some(score) => hit.with_score(score),
                None => hit,
            }
        })
        .collect()
}

#[async_trait]
impl SourceClient for WebSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn limit(&self) -> usize {
        self.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawHit>> {
        let url = format!("{}/search", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("safesearch", "1")]);

        let response: SearchResponse = send_json(SourceKind::Web, request).await?;
        let hits = parse_results(response, limit);
        tracing::debug!("Web search returned {} hits", hits.len());
        Ok(hits)
    }
}
