//! upwatch-api — the internal REST surface.
//!
//! Serves the check set to workers, accepts probe-report submissions into
//! the shared pipeline, and exposes the result/uptime reads the
//! presentation layer consumes. Every route sits behind a static
//! shared-secret token header.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/v1/checks` | List active checks (worker fetch) |
//! | POST | `/v1/checks` | Create a check |
//! | GET | `/v1/checks/{id}` | Get one check |
//! | GET | `/v1/checks/{id}/results` | List results, newest first |
//! | GET | `/v1/checks/{id}/uptime` | Daily error aggregate |
//! | POST | `/v1/results` | Submit one probe report (202/404) |

pub mod handlers;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};

use upwatch_core::AUTH_TOKEN_HEADER;
use upwatch_pipeline::ResultPipeline;
use upwatch_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub pipeline: ResultPipeline,
    /// Pre-shared token expected in the `x-upwatch-token` header.
    pub token: String,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let v1 = Router::new()
        .route(
            "/checks",
            get(handlers::list_checks).post(handlers::create_check),
        )
        .route("/checks/{id}", get(handlers::get_check))
        .route("/checks/{id}/results", get(handlers::list_results))
        .route("/checks/{id}/uptime", get(handlers::daily_uptime))
        .route("/results", post(handlers::submit_result))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_token,
        ))
        .with_state(state);

    Router::new().nest("/v1", v1)
}

/// Reject requests whose token header is absent or wrong.
async fn require_token(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if presented != Some(state.token.as_str()) {
        return handlers::error_response("invalid or missing token", StatusCode::UNAUTHORIZED)
            .into_response();
    }

    next.run(request).await
}
