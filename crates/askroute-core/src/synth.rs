//! Answer synthesis with schema validation

use crate::compile::EvidenceBundle;
use crate::error::{AskRouteError, Result};
use crate::llm::{ChatMessage, LLMClient};
use crate::prompts::{build_answer_prompt, build_correction_prompt};
use crate::query::{Mode, Query};
use crate::result::{ExternalResult, InternalResult, StructuredResult};
use serde::Deserialize;
use std::sync::Arc;

/// Fields the model is asked to produce
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelAnswer {
    pub answer: String,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

/// Extract and validate the model's JSON object.
///
/// Tolerates code fences and surrounding prose; the payload is everything
/// between the first `{` and the last `}`.
pub fn parse_model_answer(response: &str) -> std::result::Result<ModelAnswer, String> {
    let json_str = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => return Err("no JSON object found in response".to_string()),
    };

    let parsed: ModelAnswer =
        serde_json::from_str(json_str).map_err(|e| format!("invalid JSON structure: {}", e))?;

    if parsed.answer.trim().is_empty() {
        return Err("field `answer` must be a non-empty string".to_string());
    }
    Ok(parsed)
}

pub struct ResponseSynthesizer {
    client: Arc<dyn LLMClient>,
}

impl ResponseSynthesizer {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Ask the model for an answer over `bundle` and assemble the result.
    ///
    /// An invalid structure is retried once with the validation error echoed
    /// back. A second invalid structure, or any transport error, yields
    /// `SynthesisFailure`.
    pub async fn synthesize(
        &self,
        role_instruction: &str,
        bundle: &EvidenceBundle,
        query: &Query,
    ) -> Result<StructuredResult> {
        let mode = query.mode();
        let prompt = build_answer_prompt(mode, query.text(), bundle.compiled_text());
        tracing::debug!(
            "Synthesis prompt: {} chars ({} chars of context)",
            prompt.chars().count(),
            bundle.compiled_len()
        );

        let mut messages = vec![
            ChatMessage::system(role_instruction),
            ChatMessage::user(prompt),
        ];

        let first = self.complete(messages.clone()).await?;
        let answer = match parse_model_answer(&first) {
            Ok(answer) => answer,
            Err(reason) => {
                tracing::warn!("Model returned an invalid structure ({}), retrying once", reason);
                messages.push(ChatMessage::assistant(first));
                messages.push(ChatMessage::user(build_correction_prompt(mode, &reason)));

                let second = self.complete(messages).await?;
                parse_model_answer(&second).map_err(|reason| {
                    AskRouteError::SynthesisFailure(format!(
                        "invalid structure after retry: {}",
                        reason
                    ))
                })?
            }
        };

        Ok(assemble(mode, answer, bundle))
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.client
            .chat_completion(messages)
            .await
            .map_err(|e| AskRouteError::SynthesisFailure(e.to_string()))
    }
}

fn assemble(mode: Mode, answer: ModelAnswer, bundle: &EvidenceBundle) -> StructuredResult {
    let text = answer.answer.trim().to_string();
    match mode {
        Mode::External => StructuredResult::External(ExternalResult::from_bundle(text, bundle)),
        Mode::Internal => StructuredResult::Internal(InternalResult::from_bundle(
            text,
            &answer.related_topics,
            bundle,
        )),
    }
}

/// The deterministic result surfaced after `SynthesisFailure`
pub fn fallback_result(mode: Mode, bundle: &EvidenceBundle, cause: &str) -> StructuredResult {
    match mode {
        Mode::External => StructuredResult::External(ExternalResult::fallback(bundle, cause)),
        Mode::Internal => StructuredResult::Internal(InternalResult::fallback(bundle, cause)),
    }
}
