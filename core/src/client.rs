//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.
//!
//! `build_command` / `parse_command` connect the same methods to the
//! `state` machine so a host only shuttles bytes.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::state::{Action, Command, Outcome, Request};
use crate::types::{CreateTodo, DeleteAck, ErrorBody, Todo, UpdateAck, UpdateTodo};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        HttpRequest::bodyless(HttpMethod::Get, self.todos_url())
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::json(HttpMethod::Post, self.todos_url(), body))
    }

    pub fn build_update_todo(&self, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::json(HttpMethod::Put, self.todos_url(), body))
    }

    /// The id travels as a percent-encoded `id` query parameter.
    pub fn build_delete_todo(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let query = serde_urlencoded::to_string([("id", id)])
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::bodyless(
            HttpMethod::Delete,
            format!("{}?{query}", self.todos_url()),
        ))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        parse_ok(response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        parse_ok(response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<UpdateAck, ApiError> {
        parse_ok(response)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<DeleteAck, ApiError> {
        parse_ok(response)
    }

    pub fn build_command(&self, command: &Command) -> Result<HttpRequest, ApiError> {
        match &command.request {
            Request::List => Ok(self.build_list_todos()),
            Request::Create(input) => self.build_create_todo(input),
            Request::Update(input) => self.build_update_todo(input),
            Request::Delete { id } => self.build_delete_todo(id),
        }
    }

    /// Turn the response to `command` into the action that resolves it.
    pub fn parse_command(&self, command: &Command, response: HttpResponse) -> Action {
        let result = match &command.request {
            Request::List => self.parse_list_todos(response).map(Outcome::Listed),
            Request::Create(_) => self.parse_create_todo(response).map(Outcome::Created),
            Request::Update(_) => self.parse_update_todo(response).map(Outcome::Updated),
            Request::Delete { .. } => self.parse_delete_todo(response).map(Outcome::Deleted),
        };
        Action::Resolved {
            ticket: command.ticket,
            result,
        }
    }
}

fn parse_ok<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .map(|b| b.error)
        .unwrap_or_else(|_| response.body.clone());
    Err(match response.status {
        404 => ApiError::NotFound(message),
        status @ 400..=499 => ApiError::Rejected { status, message },
        status @ 500..=599 => ApiError::ServerFault { status, message },
        status => ApiError::HttpError {
            status,
            body: response.body.clone(),
        },
    })
}
