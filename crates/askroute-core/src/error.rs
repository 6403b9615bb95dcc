//! Error types for askroute

use crate::sources::SourceKind;
use serde::Serialize;
use thiserror::Error;

/// Result type alias using AskRouteError
pub type Result<T> = std::result::Result<T, AskRouteError>;

/// Error type alias for convenience
pub type Error = AskRouteError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const UNAVAILABLE: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for askroute
#[derive(Debug, Error)]
pub enum AskRouteError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Source unavailable ({kind}): {cause}")]
    SourceUnavailable { kind: SourceKind, cause: String },

    #[error("All sources unavailable: {0}")]
    AllSourcesUnavailable(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Synthesis failure: {0}")]
    SynthesisFailure(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Machine-readable error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    SourceUnavailable,
    IndexUnavailable,
    SynthesisFailure,
    Internal,
}

impl AskRouteError {
    /// Shorthand for a per-source failure
    pub fn source(kind: SourceKind, cause: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            kind,
            cause: cause.to_string(),
        }
    }

    /// Classify this error for the outer surfaces
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::SourceUnavailable { .. } | Self::AllSourcesUnavailable(_) => {
                ErrorKind::SourceUnavailable
            }
            Self::IndexUnavailable(_) | Self::EmbeddingFailure(_) => ErrorKind::IndexUnavailable,
            Self::Model(_) | Self::SynthesisFailure(_) => ErrorKind::SynthesisFailure,
            _ => ErrorKind::Internal,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidRequest => exit_codes::INVALID_INPUT,
            ErrorKind::SourceUnavailable | ErrorKind::IndexUnavailable => exit_codes::UNAVAILABLE,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// True for failures the pipelines absorb through degradation
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::SourceUnavailable | ErrorKind::IndexUnavailable
        )
    }
}
