use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{get, post, send, signup};

#[tokio::test]
async fn test_health_root() {
    let app = common::create_test_app().await;
    let response = get(&app, "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["database"], "connected");
    assert!(response.body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_live_and_info() {
    let app = common::create_test_app().await;

    let live = get(&app, "/api/health/live", None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body["status"], "healthy");

    let info = get(&app, "/api/health/info", None).await;
    assert_eq!(info.status, StatusCode::OK);
    assert_eq!(info.body["service"], "gate-trek-backend");
    assert_eq!(info.body["environment"], "test");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = common::create_test_app().await;
    let response = get(&app, "/api/does-not-exist", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "Route not found");
    assert_eq!(response.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_auth_test_route() {
    let app = common::create_test_app().await;
    let response = get(&app, "/api/auth/test", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Auth routes are working!");
}

#[tokio::test]
async fn test_signup_returns_token_user_and_cookie() {
    let app = common::create_test_app().await;
    let response = post(
        &app,
        "/api/auth/signup",
        None,
        json!({"email": "  Asha@Example.COM ", "password": "secret123", "name": "Asha"}),
    )
    .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body["token"].is_string());
    assert_eq!(response.body["user"]["email"], "asha@example.com");
    assert_eq!(response.body["user"]["name"], "Asha");
    assert!(response.body["user"]["id"].is_string());
    assert!(response.body["user"].get("passwordHash").is_none());

    let cookie = response.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_signup_validation() {
    let app = common::create_test_app().await;

    let missing = post(&app, "/api/auth/signup", None, json!({"email": "a@b.com", "password": "secret123"})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Please provide email, password, and name");

    let short = post(
        &app,
        "/api/auth/signup",
        None,
        json!({"email": "a@b.com", "password": "12345", "name": "A"}),
    )
    .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["error"], "Password must be at least 6 characters");

    let bad_email = post(
        &app,
        "/api/auth/signup",
        None,
        json!({"email": "not-an-email", "password": "secret123", "name": "A"}),
    )
    .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_whitespace_password_is_accepted_verbatim() {
    let app = common::create_test_app().await;
    let created = post(
        &app,
        "/api/auth/signup",
        None,
        json!({"email": "spaces@example.com", "password": "      ", "name": "Spaces"}),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);

    let ok = post(
        &app,
        "/api/auth/login",
        None,
        json!({"email": "spaces@example.com", "password": "      "}),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);

    let trimmed = post(
        &app,
        "/api/auth/login",
        None,
        json!({"email": "spaces@example.com", "password": " "}),
    )
    .await;
    assert_eq!(trimmed.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = common::create_test_app().await;
    signup(&app, "dup@example.com").await;

    let again = post(
        &app,
        "/api/auth/signup",
        None,
        json!({"email": "DUP@example.com", "password": "other123", "name": "Other"}),
    )
    .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"], "User already exists with this email");
}

#[tokio::test]
async fn test_login_flow() {
    let app = common::create_test_app().await;
    signup(&app, "login@example.com").await;

    let ok = post(
        &app,
        "/api/auth/login",
        None,
        json!({"email": "login@example.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["user"]["email"], "login@example.com");

    let wrong_password = post(
        &app,
        "/api/auth/login",
        None,
        json!({"email": "login@example.com", "password": "nope-nope"}),
    )
    .await;
    let unknown_user = post(
        &app,
        "/api/auth/login",
        None,
        json!({"email": "ghost@example.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["error"], "Invalid credentials");

    let missing = post(&app, "/api/auth/login", None, json!({"email": "login@example.com"})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Please provide email and password");
}

#[tokio::test]
async fn test_verify_and_logout_revokes_token() {
    let app = common::create_test_app().await;
    let token = signup(&app, "verify@example.com").await;

    let verified = get(&app, "/api/auth/verify", Some(&token)).await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["user"]["email"], "verify@example.com");

    let logout = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["success"], true);
    assert!(logout.headers[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

    let after = get(&app, "/api/auth/verify", Some(&token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(after.body["error"], "Invalid token");
}

#[tokio::test]
async fn test_verify_rejects_missing_and_forged_tokens() {
    let app = common::create_test_app().await;

    let missing = get(&app, "/api/auth/verify", None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["error"], "No token provided");

    let forged = get(&app, "/api/auth/verify", Some("a.b.c")).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.body["error"], "Invalid token");
}

#[tokio::test]
async fn test_cookie_token_is_accepted() {
    let app = common::create_test_app().await;
    let token = signup(&app, "cookie@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/verify")
                .header(header::COOKIE, format!("auth_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = common::create_test_app().await;

    for uri in ["/api/syllabus", "/api/tests", "/api/dashboard"] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body["code"], "UNAUTHORIZED");
    }

    let mentor = post(&app, "/api/mentor/chat", None, json!({"prompt": "hi"})).await;
    assert_eq!(mentor.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
