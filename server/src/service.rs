//! The four todo operations, independent of HTTP.
//!
//! # Design
//! Inputs arrive as raw JSON values so validation can tell an absent key from
//! a present-but-wrong one, mirroring what a browser client actually sends.
//! Each operation is one store call; nothing is retried.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Operation, ServiceError};
use crate::store::{NewDocument, StoreTimestamp, StoredTodo, TodoPatch, TodoStore};

/// A todo as returned over the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoView {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: String,
}

impl TodoView {
    fn from_stored(todo: StoredTodo) -> Self {
        let created_at = todo.created_at.to_datetime().unwrap_or_else(Utc::now);
        Self {
            id: todo.id,
            text: todo.text,
            completed: todo.completed,
            created_at: iso8601(created_at),
        }
    }
}

/// Acknowledgement for update: the id plus only the fields that changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdateAck {
    pub success: bool,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteAck {
    pub success: bool,
    pub id: String,
}

/// Parsed update body. Each field is `None` when its key is absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateInput {
    pub id: Option<Value>,
    pub text: Option<Value>,
    pub completed: Option<Value>,
}

impl UpdateInput {
    pub fn from_object(mut body: Map<String, Value>) -> Self {
        Self {
            id: body.remove("id"),
            text: body.remove("text"),
            completed: body.remove("completed"),
        }
    }
}

/// Millisecond-precision UTC timestamp, e.g. `2024-05-01T10:00:00.000Z`.
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Boolean coercion with JavaScript truthiness.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Trimmed text when `value` is a string with non-whitespace content.
fn non_blank(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn required_id(value: Option<&Value>) -> Result<String, ServiceError> {
    match value {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        _ => Err(ServiceError::Validation(ServiceError::ID_REQUIRED)),
    }
}

#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<TodoView>, ServiceError> {
        let todos = self
            .store
            .list_newest_first()
            .await
            .map_err(|e| ServiceError::store(Operation::List, e))?;
        Ok(todos.into_iter().map(TodoView::from_stored).collect())
    }

    pub async fn create(&self, text: Option<&Value>) -> Result<TodoView, ServiceError> {
        let text = text
            .and_then(non_blank)
            .ok_or(ServiceError::Validation(ServiceError::TEXT_REQUIRED))?;
        let doc = NewDocument {
            text,
            completed: false,
            created_at: StoreTimestamp::now(),
        };
        let stored = self
            .store
            .insert(doc)
            .await
            .map_err(|e| ServiceError::store(Operation::Create, e))?;
        tracing::info!(id = %stored.id, "todo created");
        Ok(TodoView::from_stored(stored))
    }

    pub async fn update(&self, input: UpdateInput) -> Result<UpdateAck, ServiceError> {
        let id = required_id(input.id.as_ref())?;

        let mut patch = TodoPatch::default();
        if let Some(text) = &input.text {
            let text = non_blank(text).ok_or(ServiceError::Validation(ServiceError::TEXT_EMPTY))?;
            patch.text = Some(text);
        }
        if let Some(completed) = &input.completed {
            patch.completed = Some(truthy(completed));
        }

        self.store
            .update(&id, patch.clone())
            .await
            .map_err(|e| ServiceError::store(Operation::Update, e))?;
        tracing::info!(%id, text = patch.text.is_some(), completed = ?patch.completed, "todo updated");

        Ok(UpdateAck {
            success: true,
            id,
            text: patch.text,
            completed: patch.completed,
        })
    }

    /// Deleting an id the store does not hold still succeeds.
    pub async fn delete(&self, id: Option<&str>) -> Result<DeleteAck, ServiceError> {
        let id = match id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(ServiceError::Validation(ServiceError::ID_REQUIRED)),
        };
        let removed = self
            .store
            .delete(&id)
            .await
            .map_err(|e| ServiceError::store(Operation::Delete, e))?;
        tracing::info!(%id, removed, "todo deleted");
        Ok(DeleteAck { success: true, id })
    }
}
