//! Code-hosting search (GitHub repositories and code)
//!
//! Code search requires an authenticated request, so the provider is only
//! built when a token is configured.

use super::http::{build_client, clean_text, send_json};
use super::{HitDetail, RawHit, SourceClient, SourceKind};
use crate::config::CodeSourceConfig;
use crate::error::{AskRouteError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SNIPPET_CHARS: usize = 300;

pub struct CodeSource {
    client: reqwest::Client,
    api_url: String,
    token: String,
    timeout: Duration,
    limit: usize,
}

impl CodeSource {
    /// Build from config; `None` when disabled or no token is set
    pub fn from_config(config: &CodeSourceConfig) -> Result<Option<Self>> {
        let token = match (&config.token, config.enabled) {
            (Some(token), true) if !token.is_empty() => token.clone(),
            _ => return Ok(None),
        };
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Some(Self {
            client: build_client(SourceKind::Code, timeout)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            timeout,
            limit: config.max_results,
        }))
    }

    fn request(&self, path: &str, params: &[(&str, &str)]) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.api_url, path))
            .query(params)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("Authorization", format!("Bearer {}", self.token))
    }

    async fn search_repositories(&self, query: &str, per_page: &str) -> Result<Vec<RawHit>> {
        let request = self.request(
            "/search/repositories",
            &[
                ("q", query),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", per_page),
            ],
        );
        let response: SearchResponse<Repository> = send_json(SourceKind::Code, request).await?;
        Ok(response.items.into_iter().map(repository_hit).collect())
    }

    async fn search_code(&self, query: &str, per_page: &str) -> Result<Vec<RawHit>> {
        let request = self.request("/search/code", &[("q", query), ("per_page", per_page)]);
        let response: SearchResponse<CodeItem> = send_json(SourceKind::Code, request).await?;
        Ok(response.items.into_iter().map(code_hit).collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct CodeItem {
    path: String,
    html_url: String,
    repository: CodeRepository,
}

#[derive(Debug, Deserialize)]
struct CodeRepository {
    full_name: String,
}

fn repository_hit(repo: Repository) -> RawHit {
    RawHit::new(
        repo.full_name.clone(),
        repo.html_url,
        clean_text(repo.description.as_deref().unwrap_or("N/A"), SNIPPET_CHARS),
        HitDetail::Repository {
            full_name: repo.full_name,
            stars: repo.stargazers_count,
        },
    )
    .with_score(repo.stargazers_count as f64)
}

fn code_hit(item: CodeItem) -> RawHit {
    RawHit::new(
        format!("{}/{}", item.repository.full_name, item.path),
        item.html_url,
        format!("File {} in {}", item.path, item.repository.full_name),
        HitDetail::CodeFile {
            repository: item.repository.full_name,
            path: item.path,
        },
    )
}

/// Repositories first, then code files. One failing half is tolerated.
fn combine(repos: Result<Vec<RawHit>>, code: Result<Vec<RawHit>>) -> Result<Vec<RawHit>> {
    match (repos, code) {
        (Ok(mut repos), Ok(code)) => {
            repos.extend(code);
            Ok(repos)
        }
        (Ok(repos), Err(e)) => {
            tracing::warn!("GitHub code search failed, keeping repositories: {}", e);
            Ok(repos)
        }
        (Err(e), Ok(code)) => {
            tracing::warn!("GitHub repository search failed, keeping code: {}", e);
            Ok(code)
        }
        (Err(repo_err), Err(code_err)) => Err(AskRouteError::source(
            SourceKind::Code,
            format!("repositories: {}; code: {}", repo_err, code_err),
        )),
    }
}

#[async_trait]
impl SourceClient for CodeSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Code
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn limit(&self) -> usize {
        self.limit
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawHit>> {
        let per_page = limit.to_string();
        let (repos, code) = tokio::join!(
            self.search_repositories(query, &per_page),
            self.search_code(query, &per_page)
        );
        let hits = combine(repos, code)?;
        tracing::debug!("Code search returned {} hits", hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_parsing() {
        let body = r#"{"total_count": 2, "items": [
            {"full_name": "python/cpython", "description": "The Python programming language",
             "stargazers_count": 60000, "html_url": "https://github.com/python/cpython"},
            {"full_name": "someone/empty", "description": null,
             "stargazers_count": 3, "html_url": "https://github.com/someone/empty"}
        ]}"#;
        let response: SearchResponse<Repository> = serde_json::from_str(body).unwrap();
        let hits: Vec<RawHit> = response.items.into_iter().map(repository_hit).collect();
        assert_eq!(hits[0].title, "python/cpython");
        assert_eq!(hits[0].raw_score, Some(60000.0));
        assert_eq!(hits[1].snippet, "N/A");
        assert!(matches!(
            hits[0].detail,
            HitDetail::Repository { stars: 60000, .. }
        ));
    }

    #[test]
    fn test_code_parsing() {
        let body = r#"{"items": [
            {"name": "main.py", "path": "src/main.py",
             "html_url": "https://github.com/a/b/blob/main/src/main.py",
             "repository": {"full_name": "a/b"}}
        ]}"#;
        let response: SearchResponse<CodeItem> = serde_json::from_str(body).unwrap();
        let hit = code_hit(response.items.into_iter().next().unwrap());
        assert_eq!(hit.title, "a/b/src/main.py");
        assert_eq!(hit.source_kind(), SourceKind::Code);
        assert!(hit.raw_score.is_none());
    }

    fn hit(title: &str) -> RawHit {
        RawHit::new(
            title,
            "https://github.com/x",
            "",
            HitDetail::Repository {
                full_name: title.into(),
                stars: 0,
            },
        )
    }

    #[test]
    fn test_combine_tolerates_one_failure() {
        let repos = Ok(vec![hit("a/b")]);
        let code = Err(AskRouteError::source(SourceKind::Code, "403"));
        let hits = combine(repos, code).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_combine_fails_when_both_fail() {
        let err = combine(
            Err(AskRouteError::source(SourceKind::Code, "timeout")),
            Err(AskRouteError::source(SourceKind::Code, "401")),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AskRouteError::SourceUnavailable {
                kind: SourceKind::Code,
                ..
            }
        ));
    }

    #[test]
    fn test_combine_orders_repositories_first() {
        let hits = combine(Ok(vec![hit("repo")]), Ok(vec![hit("file")])).unwrap();
        assert_eq!(hits[0].title, "repo");
        assert_eq!(hits[1].title, "file");
    }

    #[test]
    fn test_disabled_without_token() {
        let config = CodeSourceConfig {
            token: None,
            ..CodeSourceConfig::default()
        };
        assert!(CodeSource::from_config(&config).unwrap().is_none());
    }
}
