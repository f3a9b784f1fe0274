use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{self as auth_core, AuthUser, AUTH_COOKIE_NAME};
use crate::cache::keys::session_key;
use crate::db::operations::user::{self, NewUser};
use crate::db::operations::{now_ms, session};
use crate::middleware::auth::require_auth;
use crate::response::AppError;
use crate::routes::parse_json_body;
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;

pub fn router(state: AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/verify", get(verify))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/test", get(test))
        .merge(authenticated)
}

#[derive(Debug, Default, Deserialize)]
struct SignupRequest {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct AuthResponse {
    token: String,
    user: AuthUser,
}

#[derive(Serialize)]
struct VerifyResponse {
    user: AuthUser,
}

#[derive(Serialize)]
struct LogoutResponse {
    success: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Passwords are taken verbatim, so whitespace counts as content.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

async fn signup(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let payload: SignupRequest = parse_json_body(&body)?;

    let (Some(email), Some(password), Some(name)) = (
        non_empty(payload.email),
        present(payload.password),
        non_empty(payload.name),
    ) else {
        return Err(AppError::bad_request("Please provide email, password, and name"));
    };

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request("Password must be at least 6 characters"));
    }

    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("Please provide a valid email address"));
    }
    let name = name.trim().to_string();

    let pool = state.db_proxy().pool();
    if user::get_user_id_by_email(pool, &email).await.map_err(internal)?.is_some() {
        return Err(AppError::conflict("User already exists with this email"));
    }

    let password_hash = auth_core::hash_password(&password).map_err(internal)?;
    let user_id = uuid::Uuid::new_v4().to_string();
    let issued = auth_core::sign_jwt_for_user(&state.config().jwt, &user_id).map_err(internal)?;

    let now = now_ms();
    let mut tx = pool.begin().await.map_err(internal)?;
    let record = match user::insert_user(
        &mut tx,
        NewUser {
            id: &user_id,
            email: &email,
            password_hash: &password_hash,
            name: &name,
        },
        now,
    )
    .await
    {
        Ok(record) => record,
        Err(err) if user::is_unique_violation(&err) => {
            return Err(AppError::conflict("User already exists with this email"));
        }
        Err(err) => return Err(internal(err)),
    };
    session::insert_session(&mut *tx, &user_id, &issued.token_hash, issued.expires_at_ms, now)
        .await
        .map_err(internal)?;
    tx.commit().await.map_err(internal)?;

    tracing::info!(user_id = %record.id, "user signed up");
    Ok(token_response(&state, StatusCode::CREATED, issued.token, record.into()))
}

async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let payload: LoginRequest = parse_json_body(&body)?;

    let (Some(email), Some(password)) = (non_empty(payload.email), present(payload.password))
    else {
        return Err(AppError::bad_request("Please provide email and password"));
    };
    let email = email.trim().to_lowercase();

    let pool = state.db_proxy().pool();
    let Some(row) = user::select_user_for_login(pool, &email).await.map_err(internal)? else {
        return Err(AppError::unauthorized("Invalid credentials"));
    };
    if !auth_core::verify_password(&password, &row.password_hash) {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let issued = auth_core::sign_jwt_for_user(&state.config().jwt, &row.user.id).map_err(internal)?;
    session::insert_session(pool, &row.user.id, &issued.token_hash, issued.expires_at_ms, now_ms())
        .await
        .map_err(internal)?;

    tracing::info!(user_id = %row.user.id, "user logged in");
    Ok(token_response(&state, StatusCode::OK, issued.token, row.user.into()))
}

async fn verify(Extension(user): Extension<AuthUser>) -> Json<VerifyResponse> {
    Json(VerifyResponse { user })
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let token = auth_core::extract_token(&headers)
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;
    let token_hash = auth_core::hash_token(&token);

    session::delete_session_by_token_hash(state.db_proxy().pool(), &token_hash)
        .await
        .map_err(internal)?;
    if let Some(cache) = state.cache() {
        cache.delete(&session_key(&token_hash)).await;
    }

    let mut response_headers = HeaderMap::new();
    if let Some(cookie) = clear_auth_cookie_header(state.config().is_production()) {
        response_headers.insert(header::SET_COOKIE, cookie);
    }

    Ok((
        response_headers,
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully",
        }),
    )
        .into_response())
}

async fn test() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Auth routes are working!",
    })
}

fn internal(err: impl std::fmt::Display) -> AppError {
    AppError::internal(err.to_string())
}

fn token_response(state: &AppState, status: StatusCode, token: String, user: AuthUser) -> Response {
    let config = state.config();
    let mut headers = HeaderMap::new();
    if let Some(cookie) =
        auth_cookie_header(&token, config.jwt.expires_in_ms / 1000, config.is_production())
    {
        headers.insert(header::SET_COOKIE, cookie);
    }
    (status, headers, Json(AuthResponse { token, user })).into_response()
}

fn auth_cookie_header(token: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie =
        format!("{AUTH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

fn clear_auth_cookie_header(secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{AUTH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

fn is_valid_email(value: &str) -> bool {
    if value.is_empty() || value.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.contains('@') && domain.contains('.')
        && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("asha@example.com"));
        assert!(!is_valid_email("asha@localhost"));
        assert!(!is_valid_email("asha example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
        assert!(!is_valid_email("asha@example."));
    }

    #[test]
    fn test_password_presence_keeps_whitespace() {
        assert_eq!(present(Some("      ".into())), Some("      ".to_string()));
        assert_eq!(present(Some(String::new())), None);
        assert_eq!(present(None), None);
        assert_eq!(non_empty(Some("   ".into())), None);
    }

    #[test]
    fn test_cookie_headers() {
        let set = auth_cookie_header("abc", 60, false).unwrap();
        assert_eq!(
            set.to_str().unwrap(),
            "auth_token=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
        let cleared = clear_auth_cookie_header(true).unwrap();
        assert!(cleared.to_str().unwrap().ends_with("Max-Age=0; Secure"));
    }
}
