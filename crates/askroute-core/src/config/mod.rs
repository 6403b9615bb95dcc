//! Configuration management

use crate::error::{AskRouteError, Result};
use crate::prompts::RolePrompts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default per-source result count
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Default compiled context budget, in characters
pub const MAX_CONTEXT_LENGTH: usize = 4000;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// External search providers
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Private document index (internal mode)
    #[serde(default)]
    pub index: IndexConfig,

    /// Ranking and context compilation knobs
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Role instruction text
    #[serde(default)]
    pub prompts: RolePrompts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    std::env::var("ASKROUTE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions (will be auto-detected if not specified)
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Ask the service for a JSON object response
    #[serde(default = "default_true")]
    pub json_mode: bool,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("ASKROUTE_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            model: default_chat_model(),
            embedding_url: std::env::var("ASKROUTE_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("ASKROUTE_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("ASKROUTE_LLM_API_KEY").ok(),
            timeout_secs: default_llm_timeout(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            json_mode: true,
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("ASKROUTE_LLM_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("ASKROUTE_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_true() -> bool {
    true
}

fn default_source_timeout() -> u64 {
    10
}

fn default_max_results() -> usize {
    MAX_SEARCH_RESULTS
}

/// External provider settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourcesConfig {
    #[serde(default)]
    pub web: WebSourceConfig,
    #[serde(default)]
    pub video: VideoSourceConfig,
    #[serde(default)]
    pub code: CodeSourceConfig,
}

/// SearxNG-compatible web search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL of the search instance
    #[serde(default = "default_web_url")]
    pub url: Option<String>,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for WebSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_web_url(),
            timeout_secs: default_source_timeout(),
            max_results: default_max_results(),
        }
    }
}

fn default_web_url() -> Option<String> {
    std::env::var("ASKROUTE_WEB_URL").ok()
}

/// YouTube Data API v3
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_youtube_key")]
    pub api_key: Option<String>,
    #[serde(default = "default_youtube_url")]
    pub api_url: String,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for VideoSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: default_youtube_key(),
            api_url: default_youtube_url(),
            timeout_secs: default_source_timeout(),
            max_results: default_max_results(),
        }
    }
}

fn default_youtube_key() -> Option<String> {
    std::env::var("YOUTUBE_API_KEY").ok()
}

fn default_youtube_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

/// GitHub search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_github_token")]
    pub token: Option<String>,
    #[serde(default = "default_github_url")]
    pub api_url: String,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for CodeSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token: default_github_token(),
            api_url: default_github_url(),
            timeout_secs: default_source_timeout(),
            max_results: default_max_results(),
        }
    }
}

fn default_github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok()
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

/// Vector store backing the internal index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Pinecone,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: IndexBackend,
    /// Index host, e.g. `https://my-index-abc123.svc.pinecone.io`
    #[serde(default = "default_pinecone_host")]
    pub host: Option<String>,
    #[serde(default = "default_pinecone_key")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_max_results")]
    pub top_k: usize,
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: IndexBackend::default(),
            host: default_pinecone_host(),
            api_key: default_pinecone_key(),
            namespace: None,
            top_k: default_max_results(),
            timeout_secs: default_source_timeout(),
        }
    }
}

fn default_pinecone_host() -> Option<String> {
    std::env::var("PINECONE_HOST").ok()
}

fn default_pinecone_key() -> Option<String> {
    std::env::var("PINECONE_API_KEY").ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Compiled context budget in characters
    #[serde(default = "default_context_length")]
    pub max_context_length: usize,

    /// Hits scoring below this are dropped by the ranker
    #[serde(default)]
    pub relevance_floor: f64,

    /// Added to code hits that mention a programming keyword
    #[serde(default = "default_keyword_boost")]
    pub keyword_boost: f64,

    /// Replaces the built-in keyword list when set
    #[serde(default)]
    pub programming_keywords: Option<Vec<String>>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_length: default_context_length(),
            relevance_floor: 0.0,
            keyword_boost: default_keyword_boost(),
            programming_keywords: None,
        }
    }
}

fn default_context_length() -> usize {
    MAX_CONTEXT_LENGTH
}

fn default_keyword_boost() -> f64 {
    0.2
}

impl Config {
    /// Load config from `$ASKROUTE_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("ASKROUTE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        if path.exists() {
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Reject values the pipelines cannot work with
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if !(0.0..=1.0).contains(&r.relevance_floor) {
            return Err(AskRouteError::Config(format!(
                "retrieval.relevance_floor must be within [0, 1], got {}",
                r.relevance_floor
            )));
        }
        if !(0.0..=1.0).contains(&r.keyword_boost) {
            return Err(AskRouteError::Config(format!(
                "retrieval.keyword_boost must be within [0, 1], got {}",
                r.keyword_boost
            )));
        }
        if self.index.top_k == 0 {
            return Err(AskRouteError::Config("index.top_k must be positive".into()));
        }
        Ok(())
    }
}
