use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

mod common;

use common::{get, post, send, signup};

fn patch_body(field: &str, value: Value) -> Option<Value> {
    Some(json!({"field": field, "value": value}))
}

#[tokio::test]
async fn test_initialize_defaults_then_idempotent() {
    let app = common::create_test_app().await;
    let token = signup(&app, "init@example.com").await;

    let empty = get(&app, "/api/syllabus", Some(&token)).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body, json!([]));

    let first = send(&app, Method::POST, "/api/syllabus/initialize", Some(&token), None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["message"], "Syllabus initialized");
    let subjects = first.body["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 11);
    let chapters: usize = subjects
        .iter()
        .map(|s| s["chapters"].as_array().unwrap().len())
        .sum();
    assert_eq!(chapters, 56);
    assert_eq!(subjects[0]["id"], "em");
    assert_eq!(subjects[10]["id"], "ga");
    assert_eq!(subjects[0]["chapters"][0]["id"], "em-1");
    assert_eq!(subjects[0]["chapters"][0]["isCompleted"], false);

    let second = post(&app, "/api/syllabus/initialize", Some(&token), json!([])).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["message"], "Syllabus already initialized");
    assert_eq!(second.body["subjects"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_initialize_with_custom_subjects_preserves_order() {
    let app = common::create_test_app().await;
    let token = signup(&app, "custom@example.com").await;

    let body = json!([
        {"id": "z", "name": "Zeta", "chapters": [
            {"id": "z-2", "name": "Second", "isCompleted": true},
            {"id": "z-1", "name": "First"}
        ]},
        {"id": "a", "name": "Alpha", "chapters": []}
    ]);
    let response = post(&app, "/api/syllabus/initialize", Some(&token), body).await;
    assert_eq!(response.status, StatusCode::OK);

    let listed = get(&app, "/api/syllabus", Some(&token)).await;
    let subjects = listed.body.as_array().unwrap();
    assert_eq!(subjects[0]["id"], "z");
    assert_eq!(subjects[1]["id"], "a");
    assert_eq!(subjects[0]["chapters"][0]["id"], "z-2");
    assert_eq!(subjects[0]["chapters"][0]["isCompleted"], true);
    assert_eq!(subjects[0]["chapters"][1]["revision2"], false);
    assert_eq!(subjects[1]["chapters"], json!([]));
}

#[tokio::test]
async fn test_seed_only_when_empty() {
    let app = common::create_test_app().await;
    let token = signup(&app, "seed@example.com").await;

    let body = json!([{"id": "os", "name": "Operating Systems", "chapters": [{"id": "os-1", "name": "Paging"}]}]);
    let seeded = post(&app, "/api/syllabus/seed", Some(&token), body.clone()).await;
    assert_eq!(seeded.status, StatusCode::OK);
    assert_eq!(seeded.body["message"], "Seeded successfully");

    let again = post(&app, "/api/syllabus/seed", Some(&token), body).await;
    assert_eq!(again.body["message"], "Syllabus already exists for this user");

    let listed = get(&app, "/api/syllabus", Some(&token)).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_seed_rejects_duplicate_ids_atomically() {
    let app = common::create_test_app().await;
    let token = signup(&app, "atomic@example.com").await;

    let body = json!([
        {"id": "os", "name": "OS", "chapters": [{"id": "os-1", "name": "A"}, {"id": "os-1", "name": "B"}]}
    ]);
    let response = post(&app, "/api/syllabus/seed", Some(&token), body).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let listed = get(&app, "/api/syllabus", Some(&token)).await;
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn test_patch_chapter_flag() {
    let app = common::create_test_app().await;
    let token = signup(&app, "patch@example.com").await;
    send(&app, Method::POST, "/api/syllabus/initialize", Some(&token), None).await;

    let uri = "/api/syllabus/os/chapters/os-2";
    let response = send(&app, Method::PATCH, uri, Some(&token), patch_body("pyqSolved", json!(true))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"success": true}));

    let listed = get(&app, "/api/syllabus", Some(&token)).await;
    let os = listed
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == "os")
        .unwrap();
    assert_eq!(os["chapters"][1]["pyqSolved"], true);
    assert_eq!(os["chapters"][1]["isCompleted"], false);
    assert_eq!(os["chapters"][0]["pyqSolved"], false);

    let cleared = send(&app, Method::PATCH, uri, Some(&token), patch_body("pyqSolved", json!(false))).await;
    assert_eq!(cleared.status, StatusCode::OK);
}

#[tokio::test]
async fn test_patch_validation_and_not_found() {
    let app = common::create_test_app().await;
    let token = signup(&app, "patch-bad@example.com").await;
    send(&app, Method::POST, "/api/syllabus/initialize", Some(&token), None).await;

    let uri = "/api/syllabus/os/chapters/os-1";
    let bad_field = send(&app, Method::PATCH, uri, Some(&token), patch_body("name", json!("hacked"))).await;
    assert_eq!(bad_field.status, StatusCode::BAD_REQUEST);

    let bad_value = send(&app, Method::PATCH, uri, Some(&token), patch_body("revision1", json!("yes"))).await;
    assert_eq!(bad_value.status, StatusCode::BAD_REQUEST);

    let missing = send(
        &app,
        Method::PATCH,
        "/api/syllabus/os/chapters/os-99",
        Some(&token),
        patch_body("revision1", json!(true)),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let app = common::create_test_app().await;
    let alice = signup(&app, "alice@example.com").await;
    let bob = signup(&app, "bob@example.com").await;

    send(&app, Method::POST, "/api/syllabus/initialize", Some(&alice), None).await;

    let bob_view = get(&app, "/api/syllabus", Some(&bob)).await;
    assert_eq!(bob_view.body, json!([]));

    let bob_patch = send(
        &app,
        Method::PATCH,
        "/api/syllabus/os/chapters/os-1",
        Some(&bob),
        patch_body("isCompleted", json!(true)),
    )
    .await;
    assert_eq!(bob_patch.status, StatusCode::NOT_FOUND);

    let bob_init = send(&app, Method::POST, "/api/syllabus/initialize", Some(&bob), None).await;
    assert_eq!(bob_init.body["message"], "Syllabus initialized");
}
