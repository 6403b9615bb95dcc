//! In-process fakes for sources, the document index and the model

#![allow(dead_code)]

use askroute_core::compile::ContextCompiler;
use askroute_core::llm::{ChatMessage, LLMClient};
use askroute_core::prompts::RolePrompts;
use askroute_core::{
    AskRouteError, DocumentRef, HitDetail, RawHit, RelevanceRanker, ResponseSynthesizer, Result,
    ScoredDocument, SemanticIndexClient, SourceClient, SourceKind, Stages,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct FakeSource {
    kind: SourceKind,
    hits: Vec<RawHit>,
    fail: Option<String>,
    delay: Option<Duration>,
    timeout: Duration,
}

impl FakeSource {
    pub fn returning(kind: SourceKind, hits: Vec<RawHit>) -> Arc<dyn SourceClient> {
        Arc::new(Self {
            kind,
            hits,
            fail: None,
            delay: None,
            timeout: Duration::from_secs(5),
        })
    }

    pub fn failing(kind: SourceKind, cause: &str) -> Arc<dyn SourceClient> {
        Arc::new(Self {
            kind,
            hits: Vec::new(),
            fail: Some(cause.to_string()),
            delay: None,
            timeout: Duration::from_secs(5),
        })
    }

    pub fn slow(
        kind: SourceKind,
        hits: Vec<RawHit>,
        delay: Duration,
        timeout: Duration,
    ) -> Arc<dyn SourceClient> {
        Arc::new(Self {
            kind,
            hits,
            fail: None,
            delay: Some(delay),
            timeout,
        })
    }
}

#[async_trait]
impl SourceClient for FakeSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn limit(&self) -> usize {
        5
    }

    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<RawHit>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(cause) = &self.fail {
            return Err(AskRouteError::source(self.kind, cause));
        }
        Ok(self.hits.iter().take(limit).cloned().collect())
    }
}

/// Replays scripted replies; once exhausted, answers with valid JSON
pub struct FakeLlm {
    replies: Mutex<Vec<Result<String>>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Arc<Self> {
        Self::scripted(vec![Ok(format!(
            r#"{{"answer": "{}", "related_topics": ["best practices"]}}"#,
            answer
        ))])
    }

    pub fn scripted(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for FakeLlm {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.prompts.lock().unwrap().push(messages);
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(r#"{"answer": "default answer"}"#.to_string()))
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0]).collect())
    }

    fn embedding_dimensions(&self) -> usize {
        1
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

pub enum IndexBehaviour {
    Documents(Vec<ScoredDocument>),
    Unavailable,
    EmbeddingFails,
}

pub struct FakeIndex {
    behaviour: IndexBehaviour,
}

impl FakeIndex {
    pub fn new(behaviour: IndexBehaviour) -> Arc<Self> {
        Arc::new(Self { behaviour })
    }
}

#[async_trait]
impl SemanticIndexClient for FakeIndex {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        match self.behaviour {
            IndexBehaviour::EmbeddingFails => {
                Err(AskRouteError::EmbeddingFailure("encoder offline".into()))
            }
            _ => Ok(vec![0.5, 0.5]),
        }
    }

    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>> {
        match &self.behaviour {
            IndexBehaviour::Documents(docs) => Ok(docs.iter().take(top_k).cloned().collect()),
            _ => Err(AskRouteError::IndexUnavailable("connection refused".into())),
        }
    }

    async fn upsert(&self, documents: &[DocumentRef]) -> Result<usize> {
        Ok(documents.len())
    }

    fn top_k(&self) -> usize {
        5
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}

pub fn stages(llm: Arc<FakeLlm>) -> Stages {
    stages_with_budget(llm, 4000)
}

pub fn stages_with_budget(llm: Arc<FakeLlm>, budget: usize) -> Stages {
    Stages::new(
        RelevanceRanker::default(),
        ContextCompiler::new(budget),
        ResponseSynthesizer::new(llm),
        RolePrompts::default(),
    )
}

pub fn web_hit(title: &str, snippet: &str) -> RawHit {
    RawHit::new(title, format!("https://example.com/{}", title.len()), snippet, HitDetail::Web)
}

pub fn video_hit(title: &str, snippet: &str) -> RawHit {
    RawHit::new(
        title,
        "https://www.youtube.com/watch?v=abc",
        snippet,
        HitDetail::Video {
            channel: "Channel".into(),
            duration: "10m 5s".into(),
            views: "1,000".into(),
            published: "2024-01-01".into(),
        },
    )
}

pub fn repo_hit(name: &str, snippet: &str) -> RawHit {
    RawHit::new(
        name,
        format!("https://github.com/{}", name),
        snippet,
        HitDetail::Repository {
            full_name: name.into(),
            stars: 100,
        },
    )
    .with_score(100.0)
}

pub fn scored(id: &str, title: &str, similarity: f64, tags: &[&str]) -> ScoredDocument {
    ScoredDocument {
        document: DocumentRef {
            id: id.into(),
            title: title.into(),
            content: format!("{} content", title),
            source: "knowledge_base".into(),
            category: "programming".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        },
        similarity,
    }
}
