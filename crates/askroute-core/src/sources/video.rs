//! Video search via the YouTube Data API v3

use super::http::{build_client, clean_text, send_json};
use super::{HitDetail, RawHit, SourceClient, SourceKind};
use crate::config::VideoSourceConfig;
use crate::error::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const DESCRIPTION_CHARS: usize = 200;
const NOT_AVAILABLE: &str = "N/A";

lazy_static! {
    static ref ISO_DURATION: Regex =
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").unwrap();
}

/// Render an ISO-8601 duration such as `PT1H2M3S` as `1h 2m 3s`
pub fn format_iso_duration(iso: &str) -> String {
    let Some(caps) = ISO_DURATION.captures(iso) else {
        return NOT_AVAILABLE.to_string();
    };
    let parts: Vec<String> = [(1, "h"), (2, "m"), (3, "s")]
        .iter()
        .filter_map(|(idx, unit)| {
            caps.get(*idx)
                .map(|m| m.as_str())
                .filter(|v| !v.trim_start_matches('0').is_empty())
                .map(|v| format!("{}{}", v.trim_start_matches('0'), unit))
        })
        .collect();
    if parts.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        parts.join(" ")
    }
}

fn format_published(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Group a raw view count in thousands: `1234567` -> `1,234,567`
fn format_views(raw: &str) -> String {
    let Ok(count) = raw.trim().parse::<u64>() else {
        return raw.to_string();
    };
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub struct VideoSource {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
    limit: usize,
}

impl VideoSource {
    /// Build from config; `None` when disabled or no API key is set
    pub fn from_config(config: &VideoSourceConfig) -> Result<Option<Self>> {
        let api_key = match (&config.api_key, config.enabled) {
            (Some(key), true) if !key.is_empty() => key.clone(),
            _ => return Ok(None),
        };
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Some(Self {
            client: build_client(SourceKind::Video, timeout)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            limit: config.max_results,
        }))
    }

    async fn fetch_details(&self, ids: &[String]) -> Result<VideoListResponse> {
        let joined = ids.join(",");
        let request = self.client.get(format!("{}/videos", self.api_url)).query(&[
            ("part", "snippet,contentDetails,statistics"),
            ("id", joined.as_str()),
            ("key", self.api_key.as_str()),
        ]);
        send_json(SourceKind::Video, request).await
    }
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    #[serde(default)]
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "channelTitle", default)]
    channel_title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "publishedAt", default)]
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(rename = "contentDetails", default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    #[serde(rename = "viewCount", default)]
    view_count: Option<String>,
}

fn video_hit(id: &str, snippet: &Snippet, duration: Option<&str>, views: Option<&str>) -> RawHit {
    let or_na = |v: Option<&String>| v.map(String::as_str).unwrap_or(NOT_AVAILABLE).to_string();
    RawHit::new(
        or_na(snippet.title.as_ref()),
        format!("https://www.youtube.com/watch?v={}", id),
        clean_text(
            snippet.description.as_deref().unwrap_or(NOT_AVAILABLE),
            DESCRIPTION_CHARS,
        ),
        HitDetail::Video {
            channel: or_na(snippet.channel_title.as_ref()),
            duration: duration
                .map(format_iso_duration)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            views: views.map(format_views).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            published: snippet
                .published_at
                .as_deref()
                .map(format_published)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        },
    )
}

/// Merge search order with detail records. Search order wins; videos the
/// detail call did not return keep their search snippet.
fn merge_results(search: SearchListResponse, details: VideoListResponse) -> Vec<RawHit> {
    let mut by_id: HashMap<String, VideoItem> = details
        .items
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    search
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            Some(match by_id.remove(&id) {
                Some(detail) => video_hit(
                    &id,
                    &detail.snippet,
                    detail
                        .content_details
                        .as_ref()
                        .and_then(|c| c.duration.as_deref()),
                    detail
                        .statistics
                        .as_ref()
                        .and_then(|s| s.view_count.as_deref()),
                ),
                None => video_hit(&id, &item.snippet, None, None),
            })
        })
        .collect()
}

#[async_trait]
impl SourceClient for VideoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Video
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn limit(&self) -> usize {
        self.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawHit>> {
        let max_results = limit.to_string();
        let request = self.client.get(format!("{}/search", self.api_url)).query(&[
            ("q", query),
            ("part", "id,snippet"),
            ("maxResults", max_results.as_str()),
            ("type", "video"),
            ("order", "relevance"),
            ("key", self.api_key.as_str()),
        ]);
        let search: SearchListResponse = send_json(SourceKind::Video, request).await?;

        let ids: Vec<String> = search
            .items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let details = match self.fetch_details(&ids).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!("Video detail lookup failed, using search snippets: {}", e);
                VideoListResponse::default()
            }
        };

        let mut hits = merge_results(search, details);
        hits.truncate(limit);
        tracing::debug!("Video search returned {} hits", hits.len());
        Ok(hits)
    }
}
