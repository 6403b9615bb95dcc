//! Role instructions and prompt templates

use crate::query::{Mode, Role};
use serde::{Deserialize, Serialize};

/// Instruction text per role. Every role has an entry, so lookup cannot miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePrompts {
    #[serde(default = "default_learner")]
    pub learner: String,
    #[serde(default = "default_trainer")]
    pub trainer: String,
    #[serde(default = "default_admin")]
    pub admin: String,
}

impl Default for RolePrompts {
    fn default() -> Self {
        Self {
            learner: default_learner(),
            trainer: default_trainer(),
            admin: default_admin(),
        }
    }
}

impl RolePrompts {
    pub fn instruction(&self, role: Role) -> &str {
        match role {
            Role::Learner => &self.learner,
            Role::Trainer => &self.trainer,
            Role::Admin => &self.admin,
        }
    }
}

fn default_learner() -> String {
    "You are a helpful learning assistant for students.".to_string()
}

fn default_trainer() -> String {
    "You are a knowledgeable trainer assistant.".to_string()
}

fn default_admin() -> String {
    "You are an admin assistant with oversight capabilities.".to_string()
}

/// JSON shape the model must answer with, per mode
pub fn schema_hint(mode: Mode) -> &'static str {
    match mode {
        Mode::External => r#"{"answer": "comprehensive answer to the user query"}"#,
        Mode::Internal => {
            r#"{"answer": "comprehensive answer based on internal knowledge", "related_topics": ["topic", "..."]}"#
        }
    }
}

/// Build the user turn for a synthesis request
pub fn build_answer_prompt(mode: Mode, query: &str, context: &str) -> String {
    let (label, empty) = match mode {
        Mode::External => ("Context from web sources", "No relevant information found."),
        Mode::Internal => ("Internal context", "No relevant internal documents found."),
    };
    let context = if context.is_empty() { empty } else { context };

    format!(
        r#"User Query: {}

{}:
{}

Please provide a comprehensive answer based on the context above.
If the context doesn't contain relevant information, provide a general answer.

Respond ONLY with valid JSON matching this schema:
{}"#,
        query,
        label,
        context,
        schema_hint(mode)
    )
}

/// Follow-up turn after the model produced an invalid structure
pub fn build_correction_prompt(mode: Mode, error: &str) -> String {
    format!(
        r#"Your previous response could not be used: {}
Reply again with ONLY a JSON object matching this schema, no prose and no code fences:
{}"#,
        error,
        schema_hint(mode)
    )
}
