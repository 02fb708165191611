use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use folio_core::assistant::AssistantError;
use folio_core::sync::{SyncError, SyncRequest};
use folio_github::RepoSummary;

use super::server::AppState;

#[derive(serde::Deserialize)]
pub(crate) struct ChatPayload {
    #[serde(default)]
    pub message: String,
}

#[derive(serde::Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(serde::Serialize)]
struct ReposResponse {
    repos: Vec<RepoSummary>,
}

#[derive(serde::Serialize)]
struct SyncResponse {
    success: bool,
    count: usize,
    skipped_repos: usize,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: &'static str,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Response {
    match state.backend.chat(payload.message).await {
        Ok(reply) => Json(ChatResponse { reply }).into_response(),
        Err(e) => error_response("chat", &e),
    }
}

pub(crate) async fn repos_handler(State(state): State<AppState>) -> Response {
    match state.backend.list_repos().await {
        Ok(repos) => Json(ReposResponse { repos }).into_response(),
        Err(e) => error_response("repos", &e),
    }
}

pub(crate) async fn sync_handler(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Response {
    match state.backend.sync(request).await {
        Ok(outcome) => Json(SyncResponse {
            success: true,
            count: outcome.documents,
            skipped_repos: outcome.skipped_repos,
        })
        .into_response(),
        Err(e) => error_response("sync", &e),
    }
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

fn error_response(route: &'static str, err: &AssistantError) -> Response {
    let (status, error) = match err {
        AssistantError::EmptyMessage => (StatusCode::BAD_REQUEST, "Message is required"),
        AssistantError::Sync(SyncError::InProgress { .. }) => {
            (StatusCode::CONFLICT, "Sync already in progress")
        }
        _ => {
            tracing::error!(route, committed = err.committed(), "request failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    };
    (status, Json(ErrorResponse { error })).into_response()
}
