use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use todo_server::store::{NewDocument, StoreTimestamp, StoredTodo, TodoPatch};
use todo_server::{app, app_with_store, MemoryStore, StoreError, TodoStore};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

/// Sends one request through a router sharing `store`.
async fn send(store: &Arc<MemoryStore>, request: Request<String>) -> axum::response::Response {
    app_with_store(store.clone()).oneshot(request).await.unwrap()
}

async fn list(store: &Arc<MemoryStore>) -> Vec<Value> {
    let resp = send(store, empty_request("GET", "/todos")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

async fn create(store: &Arc<MemoryStore>, text: &str) -> Value {
    let body = json!({ "text": text }).to_string();
    let resp = send(store, json_request("POST", "/todos", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

/// A store whose every call fails.
struct BrokenStore;

#[async_trait]
impl TodoStore for BrokenStore {
    async fn list_newest_first(&self) -> Result<Vec<StoredTodo>, StoreError> {
        Err(StoreError::Unavailable("secret backend detail".to_string()))
    }

    async fn insert(&self, _doc: NewDocument) -> Result<StoredTodo, StoreError> {
        Err(StoreError::Unavailable("secret backend detail".to_string()))
    }

    async fn update(&self, _id: &str, _patch: TodoPatch) -> Result<StoredTodo, StoreError> {
        Err(StoreError::Unavailable("secret backend detail".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("secret backend detail".to_string()))
    }
}

// --- list ---

#[tokio::test]
async fn list_todos_empty() {
    let resp = app().oneshot(empty_request("GET", "/todos")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Value> = body_json(resp).await;
    assert!(todos.is_empty());
}

#[tokio::test]
async fn list_returns_reverse_insertion_order() {
    let store = Arc::new(MemoryStore::new());
    for text in ["first", "second", "third", "fourth"] {
        create(&store, text).await;
    }

    let texts: Vec<String> = list(&store)
        .await
        .iter()
        .map(|t| t["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, ["fourth", "third", "second", "first"]);
}

#[tokio::test]
async fn list_falls_back_to_now_for_unconvertible_timestamps() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(NewDocument {
            text: "legacy".to_string(),
            completed: true,
            created_at: StoreTimestamp {
                seconds: i64::MAX,
                nanos: 0,
            },
        })
        .await
        .unwrap();

    let todos = list(&store).await;
    assert_eq!(todos.len(), 1);
    let created_at = todos[0]["createdAt"].as_str().unwrap();
    let parsed = chrono::DateTime::parse_from_rfc3339(created_at).unwrap();
    let age = chrono::Utc::now().signed_duration_since(parsed);
    assert!(age.num_seconds().abs() < 60, "fallback should be the current time");
}

// --- create ---

#[tokio::test]
async fn create_todo_trims_text() {
    let resp = app()
        .oneshot(json_request("POST", "/todos", r#"{"text":"  Buy milk  "}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todo: Value = body_json(resp).await;
    assert_eq!(todo["text"], "Buy milk");
    assert_eq!(todo["completed"], false);
    assert!(!todo["id"].as_str().unwrap().is_empty());
    let created_at = todo["createdAt"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
    assert!(created_at.ends_with('Z'));
}

#[tokio::test]
async fn create_ignores_client_supplied_completed() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/todos",
            r#"{"text":"Already done","completed":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let todo: Value = body_json(resp).await;
    assert_eq!(todo["completed"], false);
}

#[tokio::test]
async fn create_rejects_invalid_text_without_storing() {
    let store = Arc::new(MemoryStore::new());
    for body in [r#"{}"#, r#"{"text":""}"#, r#"{"text":"   "}"#, r#"{"text":5}"#, r#"{"text":null}"#] {
        let resp = send(&store, json_request("POST", "/todos", body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
        let err: Value = body_json(resp).await;
        assert_eq!(err, json!({"error": "Text is required"}));
    }
    assert!(list(&store).await.is_empty());
}

#[tokio::test]
async fn create_malformed_json_returns_400() {
    let resp = app()
        .oneshot(json_request("POST", "/todos", r#"{"text": "#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = body_json(resp).await;
    assert_eq!(err["error"], "Invalid JSON body");
}

// --- update ---

#[tokio::test]
async fn update_requires_id() {
    let resp = app()
        .oneshot(json_request("PUT", "/todos", r#"{"completed":true}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = body_json(resp).await;
    assert_eq!(err["error"], "Todo ID is required");
}

#[tokio::test]
async fn update_blank_text_does_not_mutate() {
    let store = Arc::new(MemoryStore::new());
    let created = create(&store, "keep").await;
    let id = created["id"].as_str().unwrap();

    let body = json!({ "id": id, "text": " \t ", "completed": true }).to_string();
    let resp = send(&store, json_request("PUT", "/todos", &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = body_json(resp).await;
    assert_eq!(err["error"], "Text cannot be empty");

    let todos = list(&store).await;
    assert_eq!(todos[0]["text"], "keep");
    assert_eq!(todos[0]["completed"], false);
}

#[tokio::test]
async fn update_fields_are_independent() {
    let store = Arc::new(MemoryStore::new());
    let created = create(&store, "Walk dog").await;
    let id = created["id"].as_str().unwrap();

    // only completed
    let body = json!({ "id": id, "completed": true }).to_string();
    let resp = send(&store, json_request("PUT", "/todos", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: Value = body_json(resp).await;
    assert_eq!(ack, json!({"success": true, "id": id, "completed": true}));
    let todos = list(&store).await;
    assert_eq!(todos[0]["text"], "Walk dog");
    assert_eq!(todos[0]["completed"], true);

    // only text, trimmed
    let body = json!({ "id": id, "text": "  Walk cat " }).to_string();
    let resp = send(&store, json_request("PUT", "/todos", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: Value = body_json(resp).await;
    assert_eq!(ack, json!({"success": true, "id": id, "text": "Walk cat"}));
    let todos = list(&store).await;
    assert_eq!(todos[0]["text"], "Walk cat");
    assert_eq!(todos[0]["completed"], true);
    assert_eq!(todos[0]["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn update_coerces_completed() {
    let store = Arc::new(MemoryStore::new());
    let created = create(&store, "coerce").await;
    let id = created["id"].as_str().unwrap();

    for (raw, expected) in [(json!(1), true), (json!(""), false), (json!("yes"), true), (json!(null), false)] {
        let body = json!({ "id": id, "completed": raw }).to_string();
        let resp = send(&store, json_request("PUT", "/todos", &body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let ack: Value = body_json(resp).await;
        assert_eq!(ack["completed"], expected, "completed {raw}");
    }
}

#[tokio::test]
async fn update_unknown_id_is_a_generic_500() {
    let store = Arc::new(MemoryStore::new());
    let body = r#"{"id":"missing","completed":true}"#;
    let resp = send(&store, json_request("PUT", "/todos", body)).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let err: Value = body_json(resp).await;
    assert_eq!(err, json!({"error": "Failed to update todo"}));
    assert!(list(&store).await.is_empty());
}

// --- delete ---

#[tokio::test]
async fn delete_requires_id() {
    for uri in ["/todos", "/todos?id="] {
        let resp = app().oneshot(empty_request("DELETE", uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        let err: Value = body_json(resp).await;
        assert_eq!(err["error"], "Todo ID is required");
    }
}

#[tokio::test]
async fn delete_with_unreadable_query_answers_json() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/todos?id=a&id=b"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers()[http::header::CONTENT_TYPE],
        "application/json"
    );
    let err: Value = body_json(resp).await;
    assert_eq!(err, json!({"error": "Todo ID is required"}));
}

#[tokio::test]
async fn delete_unknown_id_succeeds() {
    let resp = app()
        .oneshot(empty_request("DELETE", "/todos?id=never-existed"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let ack: Value = body_json(resp).await;
    assert_eq!(ack, json!({"success": true, "id": "never-existed"}));
}

// --- store faults ---

#[tokio::test]
async fn store_failures_return_generic_500() {
    let cases = [
        (empty_request("GET", "/todos"), "Failed to fetch todos"),
        (json_request("POST", "/todos", r#"{"text":"x"}"#), "Failed to create todo"),
        (json_request("PUT", "/todos", r#"{"id":"a","completed":true}"#), "Failed to update todo"),
        (empty_request("DELETE", "/todos?id=a"), "Failed to delete todo"),
    ];
    for (request, message) in cases {
        let resp = app_with_store(Arc::new(BrokenStore)).oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: Value = body_json(resp).await;
        assert_eq!(err, json!({ "error": message }));
    }
}

#[tokio::test]
async fn validation_precedes_store_access() {
    let resp = app_with_store(Arc::new(BrokenStore))
        .oneshot(json_request("POST", "/todos", r#"{"text":" "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let store = Arc::new(MemoryStore::new());

    // create
    let created = create(&store, "Buy milk").await;
    assert_eq!(created["text"], "Buy milk");
    assert_eq!(created["completed"], false);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    // list — exactly the created item
    let todos = list(&store).await;
    assert_eq!(todos, vec![created.clone()]);

    // complete it
    let body = json!({ "id": id, "completed": true }).to_string();
    let resp = send(&store, json_request("PUT", "/todos", &body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let todos = list(&store).await;
    assert_eq!(todos[0]["completed"], true);
    assert_eq!(todos[0]["text"], "Buy milk");

    // delete
    let resp = send(&store, empty_request("DELETE", &format!("/todos?id={id}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: Value = body_json(resp).await;
    assert_eq!(ack["success"], true);
    assert_eq!(ack["id"], id.as_str());

    // list after delete — empty
    assert!(list(&store).await.is_empty());
}
