//! Service error type and its HTTP mapping.
//!
//! # Design
//! Validation faults carry the exact client-facing message and map to 400.
//! Store faults keep the source error for logging but only ever expose the
//! per-operation generic message with a 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// The operation a store fault happened in; selects the generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch todos",
            Operation::Create => "Failed to create todo",
            Operation::Update => "Failed to update todo",
            Operation::Delete => "Failed to delete todo",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A required field is missing or blank, or the body is not a JSON object.
    #[error("{0}")]
    Validation(&'static str),

    /// The store failed; never shown to the caller.
    #[error("{op:?} failed: {source}")]
    Store {
        op: Operation,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    pub const TEXT_REQUIRED: &'static str = "Text is required";
    pub const TEXT_EMPTY: &'static str = "Text cannot be empty";
    pub const ID_REQUIRED: &'static str = "Todo ID is required";
    pub const INVALID_BODY: &'static str = "Invalid JSON body";

    pub fn store(op: Operation, source: StoreError) -> Self {
        ServiceError::Store { op, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServiceError::Validation(msg) => *msg,
            ServiceError::Store { op, .. } => op.failure_message(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match &self {
            ServiceError::Store { op, source } => {
                tracing::error!(?op, error = %source, "store operation failed");
            }
            other => tracing::debug!(error = %other, "request rejected"),
        }
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
