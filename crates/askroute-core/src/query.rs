//! Request model: who is asking, which pipeline, and what

use crate::error::{AskRouteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller role, selects the instruction given to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Trainer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Learner, Role::Trainer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Trainer => "trainer",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AskRouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learner" => Ok(Role::Learner),
            "trainer" => Ok(Role::Trainer),
            "admin" => Ok(Role::Admin),
            other => Err(AskRouteError::InvalidRequest(format!(
                "unknown role '{}', expected learner, trainer or admin",
                other
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which retrieval pipeline serves the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    External,
    Internal,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::External => "external",
            Mode::Internal => "internal",
        }
    }
}

impl FromStr for Mode {
    type Err = AskRouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "external" => Ok(Mode::External),
            "internal" => Ok(Mode::Internal),
            other => Err(AskRouteError::InvalidRequest(format!(
                "unknown mode '{}', expected external or internal",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated user query. Fields are private so the text can never be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    role: Role,
    mode: Mode,
    text: String,
}

impl Query {
    pub fn new(role: Role, mode: Mode, text: impl Into<String>) -> Result<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(AskRouteError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }
        Ok(Self { role, mode, text })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Untrusted request body as received over the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl TryFrom<ChatRequest> for Query {
    type Error = AskRouteError;

    fn try_from(req: ChatRequest) -> Result<Self> {
        let role: Role = req
            .role
            .as_deref()
            .ok_or_else(|| AskRouteError::InvalidRequest("missing field 'role'".to_string()))?
            .parse()?;
        let mode: Mode = req
            .mode
            .as_deref()
            .ok_or_else(|| AskRouteError::InvalidRequest("missing field 'mode'".to_string()))?
            .parse()?;
        let text = req
            .query
            .ok_or_else(|| AskRouteError::InvalidRequest("missing field 'query'".to_string()))?;
        Query::new(role, mode, text)
    }
}
