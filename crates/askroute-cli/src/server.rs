//! HTTP API
//!
//! - `POST /chat` with `{"role", "mode", "query"}` returns `{"response": <result>}`
//! - `GET /health` returns service status and LLM call counters
//!
//! Errors use `{"error": {"kind", "message"}}`. A failed synthesis is not an
//! error here: the result carries the fallback answer and `synthesis_error`.

use anyhow::Result;
use askroute_core::{
    AskRouteError, ChatRequest, Config, ErrorKind, Mode, MetricsSnapshot, Query, QueryRouter,
    StructuredResult, VLLMClient,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    router: Arc<QueryRouter>,
    llm: Option<Arc<VLLMClient>>,
}

impl AppState {
    pub fn new(router: Arc<QueryRouter>, llm: Option<Arc<VLLMClient>>) -> Self {
        Self { router, llm }
    }
}

/// Build the router with permissive CORS
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Serve until the process is terminated
pub async fn run_server(config: &Config) -> Result<()> {
    let llm = Arc::new(VLLMClient::new(config.llm_service.clone())?);
    let router = QueryRouter::with_llm(config, llm.clone())?;
    let modes: Vec<&str> = router.available_modes().iter().map(Mode::as_str).collect();

    let state = AppState::new(Arc::new(router), Some(llm));
    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    println!("askroute listening on http://{}", bind_addr);
    println!("  modes: {}", if modes.is_empty() { "none".to_string() } else { modes.join(", ") });
    tracing::info!("Server bound to {}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: ErrorKind,
    message: String,
}

struct AppError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
}

impl From<AskRouteError> for AppError {
    fn from(err: AskRouteError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::SourceUnavailable
            | ErrorKind::IndexUnavailable
            | ErrorKind::SynthesisFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: ErrorKind::InvalidRequest,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

// ============ POST /chat ============

#[derive(Serialize)]
struct ChatResponse {
    response: StructuredResult,
}

async fn handle_chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;
    let query = Query::try_from(request)?;
    let response = state.router.route(&query).await?;
    Ok(Json(ChatResponse { response }))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    modes: Vec<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    llm: Option<MetricsSnapshot>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running",
        version: env!("CARGO_PKG_VERSION"),
        modes: state.router.available_modes(),
        llm: state.llm.as_ref().map(|llm| llm.metrics()),
    })
}
