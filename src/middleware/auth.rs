use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::{extract_token, verify_request_token_cached, AuthError};
use crate::response::AppError;
use crate::state::AppState;

/// Rejects requests without a live session and hands the caller to handlers as `Extension<AuthUser>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return AppError::unauthorized("No token provided").into_response();
    };

    let jwt = &state.config().jwt;
    match verify_request_token_cached(state.db_proxy(), jwt, &token, state.cache()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(AuthError::Database(err)) => {
            AppError::internal(format!("session lookup failed: {err}")).into_response()
        }
        Err(err) => {
            tracing::debug!(error = %err, "token rejected");
            AppError::unauthorized("Invalid token").into_response()
        }
    }
}
