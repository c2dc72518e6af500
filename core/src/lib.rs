//! Client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and keeps a local mirror of
//! the list in `TodoListState`, a reducer driven by `Action`s.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `TodoListState::apply` emits at most one `Command` per action; the host
//!   executes it and feeds back `Action::Resolved`.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod state;
pub mod types;

pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use state::{
    Action, Command, EditState, LoadState, Outcome, Reconcile, ReconcilePolicy, Request, Ticket,
    TodoListState,
};
pub use types::{CreateTodo, DeleteAck, ErrorBody, Todo, UpdateAck, UpdateTodo};
