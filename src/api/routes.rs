//! HTTP route handlers for the API

use super::AppState;
use crate::categorize::{SummaryResponse, TaskItem};
use crate::error::SessionError;
use crate::summary::render_markdown;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

// ============================================================================
// Errors
// ============================================================================

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
        };
        (
            status,
            Json(serde_json::json!({
                "error": self.kind(),
                "detail": self.to_string(),
            })),
        )
            .into_response()
    }
}

/// Malformed or incomplete request bodies, in the same shape as engine errors.
/// Syntax errors and a missing content type are reported as 422 too.
fn rejection_response(rejection: JsonRejection) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({
            "error": "invalid_input",
            "detail": rejection.body_text(),
        })),
    )
        .into_response()
}

// ============================================================================
// Health Check
// ============================================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub task_name: String,
}

pub async fn start_session(
    State(state): State<AppState>,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection),
    };

    let mut engine = state.engine();
    match engine.start(&req.task_name) {
        Ok(record) => (StatusCode::CREATED, Json(engine.view(record))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Pauses an active session, or resumes it when it is already paused
pub async fn pause_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut engine = state.engine();
    match engine.pause_or_resume(&id) {
        Ok(record) => Json(engine.view(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn stop_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut engine = state.engine();
    match engine.stop(&id) {
        Ok(record) => Json(engine.view(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Returns the active session, or JSON `null` when nothing is running
pub async fn get_active_session(State(state): State<AppState>) -> Response {
    let engine = state.engine();
    let active = engine.get_active().map(|record| engine.view(record));
    Json(active).into_response()
}

pub async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let engine = state.engine();
    match engine.get(&id) {
        Ok(record) => Json(engine.view(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Summaries
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub sessions: Vec<TaskItem>,
    /// Optional list of allowed category names
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// Comma-separated list of allowed category names
    pub categories: Option<String>,
    /// Heading for the Markdown report
    pub title: Option<String>,
}

impl SummaryQuery {
    fn known_categories(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Categorize an explicit list of tasks
pub async fn generate_summary(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejection_response(rejection),
    };

    let summary = state
        .categorizer
        .categorize(&req.sessions, &req.categories)
        .await;
    Json(summary).into_response()
}

/// Categorize every stopped session tracked by this process
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Json<SummaryResponse> {
    Json(summarize_finalized(&state, &query).await)
}

pub async fn get_summary_markdown(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Response {
    let summary = summarize_finalized(&state, &query).await;
    let title = query.title.as_deref().unwrap_or("Work Summary");
    (
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_markdown(&summary, title),
    )
        .into_response()
}

async fn summarize_finalized(state: &AppState, query: &SummaryQuery) -> SummaryResponse {
    // Release the engine lock before awaiting the categorizer
    let tasks = {
        let engine = state.engine();
        engine.finalized_tasks()
    };
    state
        .categorizer
        .categorize(&tasks, &query.known_categories())
        .await
}
