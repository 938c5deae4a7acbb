//! REST API handlers.
//!
//! Worker-facing routes (`GET /v1/checks`, `POST /v1/results`) keep the
//! worker wire shapes: a `{ "results": [...] }` envelope and an empty 202.
//! The remaining routes use the JSON response wrapper.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::warn;

use upwatch_core::{CheckList, NewHealthCheck, ProbeReport};
use upwatch_pipeline::PipelineError;
use upwatch_state::StateError;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub(crate) fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Checks ─────────────────────────────────────────────────────────

/// GET /v1/checks — the active check set, in the worker wire shape.
pub async fn list_checks(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_checks(None) {
        Ok(results) => Json(CheckList { results }).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /v1/checks
pub async fn create_check(
    State(state): State<ApiState>,
    Json(input): Json<NewHealthCheck>,
) -> impl IntoResponse {
    match state.store.create_check(input) {
        Ok(check) => (StatusCode::CREATED, ApiResponse::ok(check)).into_response(),
        Err(e @ StateError::Invalid(_)) => {
            error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /v1/checks/{id}
pub async fn get_check(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.fetch_check(&id) {
        Ok(Some(check)) => ApiResponse::ok(check).into_response(),
        Ok(None) => error_response("health check not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Results ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResultsQuery {
    pub limit: Option<usize>,
}

/// GET /v1/checks/{id}/results
pub async fn list_results(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> impl IntoResponse {
    match state.store.list_results(&id, query.limit) {
        Ok(results) => ApiResponse::ok(results).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

#[derive(Deserialize)]
pub struct UptimeQuery {
    /// Fixed UTC offset for day bucketing, e.g. `+02:00`. Defaults to UTC.
    pub offset: Option<String>,
}

/// GET /v1/checks/{id}/uptime
pub async fn daily_uptime(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<UptimeQuery>,
) -> impl IntoResponse {
    let offset = query.offset.as_deref().unwrap_or("UTC");
    match state.store.daily_error_aggregate(&id, offset) {
        Ok(days) => ApiResponse::ok(days).into_response(),
        Err(e @ StateError::Invalid(_)) => {
            error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// POST /v1/results — funnel one probe report through the pipeline.
pub async fn submit_result(
    State(state): State<ApiState>,
    Json(report): Json<ProbeReport>,
) -> impl IntoResponse {
    match state.pipeline.ingest(&report).await {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(PipelineError::UnknownCheck(id)) => {
            warn!(check_id = %id, "result submitted for unknown check");
            error_response("health check not found", StatusCode::NOT_FOUND).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}
