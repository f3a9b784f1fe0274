mod auth;
mod dashboard;
mod health;
mod mentor;
mod syllabus;
mod test_records;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::middleware::auth::require_auth;
use crate::middleware::rate_limit::auth_rate_limit;
use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/syllabus", syllabus::router())
        .nest("/tests", test_records::router())
        .nest("/dashboard", dashboard::router())
        .nest("/mentor", mentor::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let auth = auth::router(state.clone())
        .layer(middleware::from_fn_with_state(state.clone(), auth_rate_limit));

    let api = Router::new()
        .nest("/auth", auth)
        .nest("/health", health::router())
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}

/// Decodes a JSON request body, mapping malformed input to 400.
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|err| {
        tracing::debug!(error = %err, "rejected request body");
        AppError::bad_request("Invalid request body")
    })
}
