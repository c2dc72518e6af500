//! Document store behind the todo service.
//!
//! # Design
//! The service only needs four primitives from its backing collection, so
//! the store is a small object-safe trait shared as `Arc<dyn TodoStore>`.
//! Documents carry a native `StoreTimestamp`; conversion to a calendar date
//! happens at the API boundary, not here.
//!
//! `MemoryStore` keeps documents in a `HashMap` behind a tokio `RwLock`.
//! Every insert also takes a monotonically increasing sequence number so
//! documents created within the same clock tick still list newest first.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors surfaced by a `TodoStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document with the given id exists.
    #[error("no document with id {0}")]
    Missing(String),

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Native timestamp as persisted by the store: seconds and nanoseconds since
/// the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoreTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl StoreTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanos: at.timestamp_subsec_nanos(),
        }
    }

    /// Returns `None` when the stored value is outside chrono's range or the
    /// nanosecond part is not normalized.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if self.nanos >= 1_000_000_000 {
            return None;
        }
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// Document body as written by the service on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub text: String,
    pub completed: bool,
    pub created_at: StoreTimestamp,
}

/// A persisted document together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTodo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: StoreTimestamp,
}

/// Partial update. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All documents ordered by `created_at`, newest first.
    async fn list_newest_first(&self) -> Result<Vec<StoredTodo>, StoreError>;

    /// Persist a new document under a fresh id.
    async fn insert(&self, doc: NewDocument) -> Result<StoredTodo, StoreError>;

    /// Apply `patch` to an existing document.
    async fn update(&self, id: &str, patch: TodoPatch) -> Result<StoredTodo, StoreError>;

    /// Remove a document. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    todo: StoredTodo,
}

/// In-process `TodoStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn list_newest_first(&self) -> Result<Vec<StoredTodo>, StoreError> {
        let docs = self.docs.read().await;
        let mut entries: Vec<&Entry> = docs.values().collect();
        entries.sort_by(|a, b| {
            (b.todo.created_at, b.seq).cmp(&(a.todo.created_at, a.seq))
        });
        Ok(entries.into_iter().map(|e| e.todo.clone()).collect())
    }

    async fn insert(&self, doc: NewDocument) -> Result<StoredTodo, StoreError> {
        let todo = StoredTodo {
            id: Uuid::new_v4().simple().to_string(),
            text: doc.text,
            completed: doc.completed,
            created_at: doc.created_at,
        };
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.docs.write().await.insert(
            todo.id.clone(),
            Entry {
                seq,
                todo: todo.clone(),
            },
        );
        Ok(todo)
    }

    async fn update(&self, id: &str, patch: TodoPatch) -> Result<StoredTodo, StoreError> {
        let mut docs = self.docs.write().await;
        let entry = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        if let Some(text) = patch.text {
            entry.todo.text = text;
        }
        if let Some(completed) = patch.completed {
            entry.todo.completed = completed;
        }
        Ok(entry.todo.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.docs.write().await.remove(id).is_some())
    }
}
