//! HTTP service for a single collection of todos.
//!
//! # Overview
//! One resource path, four methods: `GET /todos` lists newest first,
//! `POST /todos` creates, `PUT /todos` partially updates by the `id` in the
//! body, `DELETE /todos?id=` removes. Validation failures answer 400 with a
//! specific message; store failures answer 500 with a generic one.
//!
//! # Design
//! - Handlers are thin: they extract JSON/query input and delegate to
//!   `TodoService`, which owns validation and response shaping.
//! - The store is an `Arc<dyn TodoStore>` so tests can swap in failing or
//!   pre-seeded stores.
//! - Body and query extraction failures are mapped to the same
//!   `{"error": ..}` shape as every other client fault.

pub mod config;
pub mod error;
pub mod service;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::{ErrorBody, ServiceError};
pub use service::{DeleteAck, TodoService, TodoView, UpdateAck, UpdateInput};
pub use store::{MemoryStore, StoreError, TodoStore};

#[derive(Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

/// Router backed by a fresh in-memory store.
pub fn app() -> Router {
    app_with_store(Arc::new(MemoryStore::new()))
}

pub fn app_with_store(store: Arc<dyn TodoStore>) -> Router {
    Router::new()
        .route(
            "/todos",
            get(list_todos)
                .post(create_todo)
                .put(update_todo)
                .delete(delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(TodoService::new(store))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// The body must be a JSON object; anything else is a client fault.
fn json_object(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<serde_json::Map<String, Value>, ServiceError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(ServiceError::Validation(ServiceError::INVALID_BODY)),
        Err(rejection) => {
            tracing::debug!(%rejection, "unreadable request body");
            Err(ServiceError::Validation(ServiceError::INVALID_BODY))
        }
    }
}

async fn list_todos(
    State(service): State<TodoService>,
) -> Result<Json<Vec<TodoView>>, ServiceError> {
    service.list().await.map(Json)
}

async fn create_todo(
    State(service): State<TodoService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TodoView>, ServiceError> {
    let body = json_object(body)?;
    service.create(body.get("text")).await.map(Json)
}

async fn update_todo(
    State(service): State<TodoService>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateAck>, ServiceError> {
    let body = json_object(body)?;
    service.update(UpdateInput::from_object(body)).await.map(Json)
}

/// An unreadable query string counts as a missing id.
fn delete_params(
    query: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<DeleteParams, ServiceError> {
    query.map(|Query(params)| params).map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable query string");
        ServiceError::Validation(ServiceError::ID_REQUIRED)
    })
}

async fn delete_todo(
    State(service): State<TodoService>,
    query: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<DeleteAck>, ServiceError> {
    let params = delete_params(query)?;
    service.delete(params.id.as_deref()).await.map(Json)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn todo_view_serializes_camel_case() {
        let todo = TodoView {
            id: "abc".to_string(),
            text: "Test".to_string(),
            completed: false,
            created_at: "2024-05-01T10:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["text"], "Test");
        assert_eq!(json["completed"], false);
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00.000Z");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn update_ack_omits_unchanged_fields() {
        let ack = UpdateAck {
            success: true,
            id: "abc".to_string(),
            text: None,
            completed: Some(true),
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"success": true, "id": "abc", "completed": true})
        );
    }

    #[test]
    fn json_object_rejects_non_objects() {
        let err = json_object(Ok(Json(json!(["text"])))).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ServiceError::INVALID_BODY)));

        let map = json_object(Ok(Json(json!({"text": "ok"})))).unwrap();
        assert_eq!(map["text"], "ok");
    }

    #[test]
    fn delete_params_id_is_optional() {
        let params: DeleteParams = serde_json::from_str(r#"{}"#).unwrap();
        assert!(params.id.is_none());
    }
}
