//! Integration tests for the encoding admin HTTP endpoints.
//!
//! Test Pattern:
//! - Each test seeds its own temporary SQLite file through `TestDatabase`
//! - The router is served in-process on 127.0.0.1:0
//! - Endpoints are called over HTTP with reqwest

use serde_json::{json, Value};

use ponto_api::{router, AppState};
use ponto_core::EncodingConfig;
use ponto_db::test_fixtures::TestDatabase;

/// Serve the router for `test_db` and return its base URL.
async fn spawn_app(test_db: &TestDatabase) -> String {
    let state = AppState::new(test_db.db.clone(), EncodingConfig::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn seed(test_db: &TestDatabase) -> i64 {
    let user = test_db
        .insert("users", &[("first_name", "Jo??o"), ("last_name", "Silva")])
        .await;
    test_db
        .insert("projects", &[("name", "Configura????o"), ("description", "ok")])
        .await;
    user
}

#[tokio::test]
async fn test_health() {
    let test_db = TestDatabase::new().await;
    let base_url = spawn_app(&test_db).await;

    let response = reqwest::get(format!("{}/health", base_url)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_check_then_fix_then_check() {
    let test_db = TestDatabase::new().await;
    let user = seed(&test_db).await;
    let base_url = spawn_app(&test_db).await;
    let client = reqwest::Client::new();

    let check: Value = client
        .get(format!("{}/api/admin/encoding/check", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["success"], true);
    assert_eq!(check["corrupted"], true);
    assert_eq!(check["total_corrupted"], 2);
    assert_eq!(check["tables"].as_array().unwrap().len(), 6);

    let response = client
        .post(format!("{}/api/admin/encoding/fix", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let fix: Value = response.json().await.unwrap();
    assert_eq!(fix["success"], true);
    assert_eq!(fix["total_records_fixed"], 2);
    assert_eq!(fix["total_changes"], 2);
    assert_eq!(fix["changes"][0]["before"], "Jo??o");
    assert_eq!(fix["changes"][0]["after"], "João");
    assert_eq!(fix["changes"][0]["id"], user);

    let check: Value = client
        .get(format!("{}/api/admin/encoding/check", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["corrupted"], false);
    assert_eq!(check["total_corrupted"], 0);
}

#[tokio::test]
async fn test_tables_filter() {
    let test_db = TestDatabase::new().await;
    seed(&test_db).await;
    let base_url = spawn_app(&test_db).await;
    let client = reqwest::Client::new();

    let fix: Value = client
        .post(format!("{}/api/admin/encoding/fix?tables=projects", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fix["total_records_fixed"], 1);
    assert_eq!(fix["tables"].as_array().unwrap().len(), 1);
    assert_eq!(fix["changes"][0]["after"], "Configuração");

    let response = client
        .get(format!("{}/api/admin/encoding/check?tables=absences", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("absences"));
}

#[tokio::test]
async fn test_diagnose() {
    let test_db = TestDatabase::new().await;
    seed(&test_db).await;
    let base_url = spawn_app(&test_db).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("{}/api/admin/encoding/diagnose?tables=users", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["tables_with_corruption"], 1);
    let sample = &body["tables"][0]["samples"][0];
    assert_eq!(sample["value"], "Jo??o");
    assert_eq!(sample["signatures"][0], "question_run");
    assert_eq!(sample["char_codes"][2]["code"], 63);

    let response = client
        .get(format!("{}/api/admin/encoding/diagnose?limit=0", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_fix_text() {
    let test_db = TestDatabase::new().await;
    let base_url = spawn_app(&test_db).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/admin/encoding/fix-text", base_url))
        .json(&json!({ "text": "Gon??alves" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["fixed"], "Gonçalves");
    assert_eq!(body["corrupted"], true);
    assert_eq!(body["changed"], true);

    let body: Value = client
        .post(format!("{}/api/admin/encoding/fix-text", base_url))
        .json(&json!({ "text": "normal text" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["fixed"], "normal text");
    assert_eq!(body["corrupted"], false);
    assert_eq!(body["changed"], false);

    let response = client
        .post(format!("{}/api/admin/encoding/fix-text", base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_connection_failure_is_500() {
    let test_db = TestDatabase::new().await;
    let base_url = spawn_app(&test_db).await;
    test_db.pool.close().await;

    let response = reqwest::get(format!("{}/api/admin/encoding/check", base_url))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Database error"));
}

#[tokio::test]
async fn test_self_test_endpoints() {
    let test_db = TestDatabase::new().await;
    let base_url = spawn_app(&test_db).await;

    let body: Value = reqwest::get(format!("{}/api/test/encoding", base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["reference_flagged"], false);
    assert_eq!(body["portuguese_names"][0], "João Silva");
    assert_eq!(body["char_codes"]["ção"][0]["hex"], "e7");

    let body: Value = reqwest::get(format!(
        "{}/api/test/encoding/corruption-simulation",
        base_url
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    let examples = body["examples"].as_array().unwrap();
    assert!(!examples.is_empty());
    for example in examples {
        assert_eq!(example["detected"], true, "{}", example["corrupted"]);
        assert_eq!(example["repaired_matches"], true, "{}", example["corrupted"]);
    }
}
