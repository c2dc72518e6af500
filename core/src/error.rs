//! Error types for the todo API client.
//!
//! # Design
//! Status classes get their own variants: `Rejected` for client faults the
//! server explained, `ServerFault` for 5xx. `NotFound` stays separate because
//! callers distinguish "no such todo" from other rejections. The UI layer
//! renders every variant the same way, through `Display`.

/// Errors returned by `TodoClient` parse methods and reported by hosts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server rejected the request (4xx other than 404).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The server failed (5xx).
    #[error("{message}")]
    ServerFault { status: u16, message: String },

    /// Any other unexpected status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The host could not complete the HTTP round-trip.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Whether the server blamed the request rather than itself.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, ApiError::NotFound(_) | ApiError::Rejected { .. })
    }
}
