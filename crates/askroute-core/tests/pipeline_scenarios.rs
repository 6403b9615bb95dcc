//! End-to-end pipeline behaviour with in-process fakes
//!
//! Covers:
//! 1. Single-source external answers
//! 2. Index outage in internal mode
//! 3. Budget truncation across sources
//! 4. Repeated malformed model output
//! 5. Partial and total source failure, timeouts, concurrency

mod common;

use askroute_core::result::FALLBACK_ANSWER;
use askroute_core::{
    AskRouteError, ExternalPipeline, InternalPipeline, Mode, Pipeline, PipelineState, Query,
    QueryRouter, Role, SourceClient, SourceKind, StructuredResult,
};
use common::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

fn external(sources: Vec<Arc<dyn SourceClient>>, llm: Arc<FakeLlm>) -> ExternalPipeline {
    ExternalPipeline::new(sources, stages(llm)).unwrap()
}

fn kinds(list: &[SourceKind]) -> BTreeSet<SourceKind> {
    list.iter().copied().collect()
}

#[tokio::test]
async fn test_single_source_external_answer() {
    let llm = FakeLlm::answering("Python is a general-purpose programming language.");
    let pipeline = external(
        vec![
            FakeSource::returning(
                SourceKind::Web,
                vec![
                    web_hit("Python.org", "Welcome to Python programming"),
                    web_hit("What is Python?", "Python is an interpreted language"),
                    web_hit("Python Tutorial", "Learn Python programming"),
                ],
            ),
            FakeSource::returning(SourceKind::Video, vec![]),
            FakeSource::returning(SourceKind::Code, vec![]),
        ],
        llm.clone(),
    );
    let query = Query::new(Role::Learner, Mode::External, "What is Python programming?").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    let StructuredResult::External(result) = &run.result else {
        panic!("expected external result");
    };

    assert_eq!(result.sources_used, kinds(&[SourceKind::Web]));
    assert!(!result.answer.is_empty());
    assert_eq!(result.web_results.len(), 3);
    assert!(result.video_results.is_empty());
    assert!(result.code_repo_results.is_empty());
    assert!(result.code_file_results.is_empty());
    assert!(result.synthesis_error.is_none());
    assert!(!run.degraded());
    assert_eq!(
        run.trace,
        vec![
            PipelineState::Received,
            PipelineState::Retrieving,
            PipelineState::Ranking,
            PipelineState::Compiling,
            PipelineState::Synthesizing,
            PipelineState::Completed,
        ]
    );

    // Most relevant web hit is listed first
    assert!(result.web_results[0].relevance >= result.web_results[2].relevance);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0][0].content.contains("learning assistant"));
    assert!(prompts[0][1].content.contains("[web] Python.org"));
}

#[tokio::test]
async fn test_index_outage_still_answers() {
    let llm = FakeLlm::answering("General guidance.");
    let pipeline = InternalPipeline::new(FakeIndex::new(IndexBehaviour::Unavailable), stages(llm));
    let query = Query::new(Role::Admin, Mode::Internal, "deployment checklist").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    let StructuredResult::Internal(result) = &run.result else {
        panic!("expected internal result");
    };

    assert!(result.documents.is_empty());
    assert_eq!(result.confidence_score, 0.0);
    assert!(result.sources_used.is_empty());
    assert!(run.degraded());
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].kind, SourceKind::Document);
}

#[tokio::test]
async fn test_embedding_failure_degrades_like_outage() {
    let pipeline = InternalPipeline::new(
        FakeIndex::new(IndexBehaviour::EmbeddingFails),
        stages(FakeLlm::answering("ok")),
    );
    let query = Query::new(Role::Learner, Mode::Internal, "anything").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    assert!(run.degraded());
    assert!(run.result.sources_used().is_empty());
}

#[tokio::test]
async fn test_internal_confidence_and_topics() {
    let llm = FakeLlm::answering("Use virtual environments.");
    let index = FakeIndex::new(IndexBehaviour::Documents(vec![
        scored("doc_001", "Python Best Practices", 0.9, &["python", "best-practices"]),
        scored("doc_002", "Testing Guide", 0.7, &["testing"]),
    ]));
    let pipeline = InternalPipeline::new(index, stages(llm));
    let query = Query::new(Role::Trainer, Mode::Internal, "python practices").unwrap();

    let result = pipeline.run(&query).await.unwrap();
    let StructuredResult::Internal(result) = result else {
        panic!("expected internal result");
    };

    assert_eq!(result.documents.len(), 2);
    assert_eq!(result.documents[0].id, "doc_001");
    assert!((result.confidence_score - 0.8).abs() < 1e-9);
    assert_eq!(result.sources_used, kinds(&[SourceKind::Document]));
    assert!(result.related_topics.contains("python"));
    assert!(result.related_topics.contains("best practices"));
}

#[tokio::test]
async fn test_oversized_document_does_not_crowd_out_others() {
    let mut handbook = scored("doc_big", "Employee Handbook", 0.95, &["hr"]);
    handbook.document.content = "Section text about benefits. ".repeat(200);
    let index = FakeIndex::new(IndexBehaviour::Documents(vec![
        handbook,
        scored("doc_leave", "Leave policy", 0.9, &["leave"]),
    ]));
    let llm = FakeLlm::answering("Submit leave requests two weeks ahead.");
    let pipeline = InternalPipeline::new(index, stages(llm.clone()));
    let query = Query::new(Role::Admin, Mode::Internal, "leave policy").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    let StructuredResult::Internal(result) = &run.result else {
        panic!("expected internal result");
    };

    assert!(run.context_chars <= 4000);
    assert_eq!(result.documents.len(), 2);
    assert_eq!(result.documents[0].id, "doc_big");
    assert_eq!(result.documents[1].id, "doc_leave");
    assert!((result.confidence_score - 0.925).abs() < 1e-9);
    assert_eq!(result.sources_used, kinds(&[SourceKind::Document]));
    assert!(llm.prompts()[0][1].content.contains("Leave policy"));
}

#[tokio::test]
async fn test_code_search_skipped_for_non_programming_query() {
    let pipeline = external(
        vec![
            FakeSource::returning(
                SourceKind::Web,
                vec![web_hit("Sourdough basics", "how to bake sourdough bread")],
            ),
            FakeSource::failing(SourceKind::Code, "code search should not run"),
        ],
        FakeLlm::answering("Feed your starter first."),
    );
    let query = Query::new(Role::Learner, Mode::External, "how to bake sourdough bread").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    let StructuredResult::External(result) = &run.result else {
        panic!("expected external result");
    };

    assert!(run.failures.is_empty());
    assert!(!run.degraded());
    assert!(result.code_repo_results.is_empty());
    assert_eq!(result.sources_used, kinds(&[SourceKind::Web]));
}

#[tokio::test]
async fn test_code_search_runs_for_programming_query() {
    let pipeline = external(
        vec![
            FakeSource::returning(SourceKind::Web, vec![web_hit("Docs", "rust ownership")]),
            FakeSource::returning(SourceKind::Code, vec![repo_hit("rust-lang/book", "rust ownership")]),
        ],
        FakeLlm::answering("Ownership moves values."),
    );
    let query = Query::new(Role::Learner, Mode::External, "rust ownership").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    assert_eq!(
        run.result.sources_used(),
        &kinds(&[SourceKind::Web, SourceKind::Code])
    );
}

#[tokio::test]
async fn test_only_code_source_and_non_programming_query() {
    let pipeline = external(
        vec![FakeSource::failing(SourceKind::Code, "code search should not run")],
        FakeLlm::answering("General answer."),
    );
    let query = Query::new(Role::Learner, Mode::External, "team offsite ideas").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    assert!(run.failures.is_empty());
    assert!(run.result.sources_used().is_empty());
}

#[tokio::test]
async fn test_budget_excludes_later_sources() {
    let long = "x".repeat(1000);
    let llm = FakeLlm::answering("Summary.");
    let pipeline = external(
        vec![
            FakeSource::returning(SourceKind::Web, vec![web_hit("W0", &long), web_hit("W1", &long)]),
            FakeSource::returning(
                SourceKind::Video,
                vec![video_hit("V0", &long), video_hit("V1", &long)],
            ),
            FakeSource::returning(SourceKind::Code, vec![repo_hit("C0", &long), repo_hit("C1", &long)]),
        ],
        llm.clone(),
    );
    let query = Query::new(Role::Trainer, Mode::External, "teaching plan").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    let StructuredResult::External(result) = &run.result else {
        panic!("expected external result");
    };

    assert!(run.context_chars <= 4000);
    assert_eq!(result.web_results.len(), 2);
    assert_eq!(result.video_results.len(), 1);
    assert!(result.code_repo_results.is_empty());
    assert_eq!(
        result.sources_used,
        kinds(&[SourceKind::Web, SourceKind::Video])
    );

    let prompt = &llm.prompts()[0][1].content;
    assert!(!prompt.contains("[code]"));
    assert!(prompts_use_trainer(&llm));
}

fn prompts_use_trainer(llm: &FakeLlm) -> bool {
    llm.prompts()[0][0].content.contains("trainer assistant")
}

#[tokio::test]
async fn test_malformed_model_output_falls_back() {
    let llm = FakeLlm::scripted(vec![Ok("I think...".into()), Ok("still not json".into())]);
    let pipeline = external(
        vec![FakeSource::returning(
            SourceKind::Web,
            vec![web_hit("Rust Book", "The Rust programming language")],
        )],
        llm.clone(),
    );
    let query = Query::new(Role::Learner, Mode::External, "learn rust").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    assert_eq!(run.result.answer(), FALLBACK_ANSWER);
    assert!(run.result.synthesis_error().is_some());
    assert_eq!(run.result.sources_used(), &kinds(&[SourceKind::Web]));
    assert_eq!(run.trace.last(), Some(&PipelineState::Completed));
    assert_eq!(llm.prompts().len(), 2);

    let json = serde_json::to_value(&run.result).unwrap();
    assert_eq!(json["answer"], FALLBACK_ANSWER);
    assert_eq!(json["web_results"][0]["title"], "Rust Book");
}

#[tokio::test]
async fn test_internal_fallback_zeroes_confidence() {
    let llm = FakeLlm::scripted(vec![Ok("{}".into()), Ok(r#"{"answer": ""}"#.into())]);
    let index = FakeIndex::new(IndexBehaviour::Documents(vec![scored("d", "Doc", 0.95, &[])]));
    let pipeline = InternalPipeline::new(index, stages(llm));
    let query = Query::new(Role::Admin, Mode::Internal, "policy").unwrap();

    let StructuredResult::Internal(result) = pipeline.run(&query).await.unwrap() else {
        panic!("expected internal result");
    };
    assert_eq!(result.confidence_score, 0.0);
    assert_eq!(result.documents.len(), 1);
    assert!(result.synthesis_error.is_some());
}

#[tokio::test]
async fn test_partial_failure_is_degraded() {
    let pipeline = external(
        vec![
            FakeSource::failing(SourceKind::Web, "HTTP 503"),
            FakeSource::returning(SourceKind::Video, vec![video_hit("Intro to Go", "go basics")]),
        ],
        FakeLlm::answering("Go is a language."),
    );
    let query = Query::new(Role::Learner, Mode::External, "go basics").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    assert!(run.degraded());
    assert_eq!(run.result.sources_used(), &kinds(&[SourceKind::Video]));
    assert_eq!(run.failures[0].kind, SourceKind::Web);
    assert!(run.failures[0].cause.contains("HTTP 503"));
}

#[tokio::test]
async fn test_all_sources_failing_is_an_error() {
    let llm = FakeLlm::answering("unused");
    let pipeline = external(
        vec![
            FakeSource::failing(SourceKind::Web, "down"),
            FakeSource::failing(SourceKind::Code, "rate limited"),
        ],
        llm.clone(),
    );
    let query = Query::new(Role::Learner, Mode::External, "python packaging").unwrap();

    let err = pipeline.run(&query).await.unwrap_err();
    assert!(matches!(err, AskRouteError::AllSourcesUnavailable(_)));
    assert!(err.to_string().contains("rate limited"));
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn test_empty_sources_are_not_failures() {
    let pipeline = external(
        vec![
            FakeSource::returning(SourceKind::Web, vec![]),
            FakeSource::returning(SourceKind::Video, vec![]),
        ],
        FakeLlm::answering("Nothing found, but here is a general answer."),
    );
    let query = Query::new(Role::Learner, Mode::External, "obscure topic").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    assert!(!run.degraded());
    assert!(run.result.sources_used().is_empty());
    assert_eq!(run.context_chars, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_source_is_dropped() {
    let pipeline = external(
        vec![
            FakeSource::slow(
                SourceKind::Video,
                vec![video_hit("late", "")],
                Duration::from_secs(60),
                Duration::from_secs(2),
            ),
            FakeSource::returning(SourceKind::Web, vec![web_hit("on time", "")]),
        ],
        FakeLlm::answering("ok"),
    );
    let query = Query::new(Role::Learner, Mode::External, "timing").unwrap();

    let run = pipeline.run_traced(&query).await.unwrap();
    assert!(run.degraded());
    assert_eq!(run.result.sources_used(), &kinds(&[SourceKind::Web]));
    assert!(run.failures[0].cause.contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_sources_are_queried_concurrently() {
    let delay = Duration::from_secs(3);
    let timeout = Duration::from_secs(10);
    let pipeline = external(
        vec![
            FakeSource::slow(SourceKind::Web, vec![web_hit("w", "")], delay, timeout),
            FakeSource::slow(SourceKind::Video, vec![video_hit("v", "")], delay, timeout),
            FakeSource::slow(SourceKind::Code, vec![repo_hit("c", "")], delay, timeout),
        ],
        FakeLlm::answering("ok"),
    );
    let query = Query::new(Role::Learner, Mode::External, "parallel rust").unwrap();

    let start = tokio::time::Instant::now();
    let run = pipeline.run_traced(&query).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(6));
    assert_eq!(run.result.sources_used().len(), 3);
}

#[tokio::test]
async fn test_router_dispatches_by_mode() {
    let llm = FakeLlm::answering("routed");
    let external: Arc<dyn Pipeline> = Arc::new(external(
        vec![FakeSource::returning(SourceKind::Web, vec![web_hit("a", "b")])],
        llm.clone(),
    ));
    let internal: Arc<dyn Pipeline> = Arc::new(InternalPipeline::new(
        FakeIndex::new(IndexBehaviour::Documents(vec![])),
        stages(llm),
    ));
    let router = QueryRouter::new(Some(external), Some(internal));
    assert_eq!(router.available_modes(), vec![Mode::External, Mode::Internal]);

    let query = Query::new(Role::Learner, Mode::External, "a").unwrap();
    assert_eq!(router.route(&query).await.unwrap().mode(), Mode::External);

    let query = Query::new(Role::Learner, Mode::Internal, "a").unwrap();
    assert_eq!(router.route(&query).await.unwrap().mode(), Mode::Internal);
}

#[test]
fn test_external_pipeline_requires_a_source() {
    let result = ExternalPipeline::new(vec![], stages(FakeLlm::answering("x")));
    assert!(matches!(result, Err(AskRouteError::Config(_))));
}
