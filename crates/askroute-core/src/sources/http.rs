//! Shared HTTP plumbing for providers

use super::SourceKind;
use crate::error::{AskRouteError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub(crate) fn build_client(kind: SourceKind, timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("askroute/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| AskRouteError::source(kind, format!("failed to build HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, folding every failure into
/// `SourceUnavailable` for the given kind.
pub(crate) async fn send_json<T: DeserializeOwned>(
    kind: SourceKind,
    request: RequestBuilder,
) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            AskRouteError::source(kind, "request timed out")
        } else if e.is_connect() {
            AskRouteError::source(kind, format!("cannot reach server: {}", e))
        } else {
            AskRouteError::source(kind, format!("request failed: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let cause = match status {
            StatusCode::UNAUTHORIZED => "unauthorized (401): credential missing or invalid".into(),
            StatusCode::FORBIDDEN => "forbidden (403): rate limit or quota exhausted".into(),
            StatusCode::TOO_MANY_REQUESTS => "rate limit exceeded (429)".into(),
            s if s.is_server_error() => format!("server error ({})", s.as_u16()),
            s => format!(
                "HTTP error {}: {}",
                s.as_u16(),
                s.canonical_reason().unwrap_or("Unknown error")
            ),
        };
        return Err(AskRouteError::source(kind, cause));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AskRouteError::source(kind, format!("malformed response: {}", e)))
}

/// Collapse whitespace runs and cut to `max_chars`, marking the cut with `...`
pub(crate) fn clean_text(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("a\n\n  b\tc", 100), "a b c");
    }

    #[test]
    fn test_clean_text_truncates_on_chars() {
        let text = "é".repeat(300);
        let cleaned = clean_text(&text, 200);
        assert_eq!(cleaned.chars().count(), 203);
        assert!(cleaned.ends_with("..."));
    }
}
