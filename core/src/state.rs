//! Client-side mirror of the todo list as an explicit state machine.
//!
//! # Design
//! `TodoListState::apply` is the only way state changes. Each user intent
//! or request completion is one `Action`; a transition may emit at most one
//! `Command` for the host to execute. The host feeds the outcome back as
//! `Action::Resolved` carrying the command's `Ticket`, so the state can tell
//! which in-flight operation finished and what to roll back on failure.
//!
//! How a confirmed or failed request reconciles with local state is chosen
//! per operation through `ReconcilePolicy`, not by the order of statements.

use std::collections::HashMap;

use crate::error::ApiError;
use crate::types::{CreateTodo, DeleteAck, Todo, UpdateAck, UpdateTodo};

/// Correlates a `Command` with its `Action::Resolved`.
pub type Ticket = u64;

/// When a local change becomes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reconcile {
    /// Apply only after the service confirms; failure leaves state untouched.
    #[default]
    OnConfirm,
    /// Apply immediately; roll back if the service reports failure.
    Optimistic,
}

/// Reconciliation per operation. Create has no entry: the id and timestamp
/// come from the store, so a new todo is only shown once confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcilePolicy {
    pub toggle: Reconcile,
    pub edit: Reconcile,
    pub delete: Reconcile,
}

impl ReconcilePolicy {
    pub fn optimistic() -> Self {
        Self {
            toggle: Reconcile::Optimistic,
            edit: Reconcile::Optimistic,
            delete: Reconcile::Optimistic,
        }
    }
}

/// A request the host must execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List,
    Create(CreateTodo),
    Update(UpdateTodo),
    Delete { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub ticket: Ticket,
    pub request: Request,
}

impl Command {
    /// Resolution for a request the host could not complete.
    pub fn failed(&self, error: ApiError) -> Action {
        Action::Resolved {
            ticket: self.ticket,
            result: Err(error),
        }
    }
}

/// Successful result of a `Request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Listed(Vec<Todo>),
    Created(Todo),
    Updated(UpdateAck),
    Deleted(DeleteAck),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Load,
    InputChanged(String),
    Submit,
    Toggle { id: String },
    StartEdit { id: String },
    EditChanged(String),
    ConfirmEdit,
    CancelEdit,
    Delete { id: String },
    DismissError,
    Resolved {
        ticket: Ticket,
        result: Result<Outcome, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// The single item being edited and its draft text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub id: String,
    pub draft: String,
}

/// In-flight request and what to restore if it fails. Rollback data is only
/// present when the change was applied optimistically.
#[derive(Debug, Clone)]
enum Pending {
    Load,
    Create,
    Toggle { id: String, previous: Option<bool> },
    Edit { id: String, previous: Option<String> },
    Delete { id: String, removed: Option<(usize, Todo)> },
}

#[derive(Debug, Clone, Default)]
pub struct TodoListState {
    todos: Vec<Todo>,
    input: String,
    editing: Option<EditState>,
    creating: bool,
    load: LoadState,
    error: Option<String>,
    policy: ReconcilePolicy,
    pending: HashMap<Ticket, Pending>,
    next_ticket: Ticket,
}

impl TodoListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ReconcilePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn editing(&self) -> Option<&EditState> {
        self.editing.as_ref()
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// The banner message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    /// Whether `Submit` would send a create request.
    pub fn can_submit(&self) -> bool {
        !self.creating && !self.input.trim().is_empty()
    }

    pub fn apply(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Load => {
                if self.pending.values().any(|p| matches!(p, Pending::Load)) {
                    return None;
                }
                self.load = LoadState::Loading;
                Some(self.issue(Pending::Load, Request::List))
            }
            Action::InputChanged(text) => {
                self.input = text;
                None
            }
            Action::Submit => {
                if !self.can_submit() {
                    return None;
                }
                self.creating = true;
                let text = self.input.trim().to_string();
                Some(self.issue(Pending::Create, Request::Create(CreateTodo { text })))
            }
            Action::Toggle { id } => self.toggle(id),
            Action::StartEdit { id } => {
                let draft = self.find(&id)?.text.clone();
                self.editing = Some(EditState { id, draft });
                None
            }
            Action::EditChanged(draft) => {
                if let Some(edit) = self.editing.as_mut() {
                    edit.draft = draft;
                }
                None
            }
            Action::ConfirmEdit => self.confirm_edit(),
            Action::CancelEdit => {
                self.editing = None;
                None
            }
            Action::Delete { id } => self.delete(id),
            Action::DismissError => {
                self.error = None;
                None
            }
            Action::Resolved { ticket, result } => {
                self.resolve(ticket, result);
                None
            }
        }
    }

    fn issue(&mut self, pending: Pending, request: Request) -> Command {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending.insert(ticket, pending);
        Command { ticket, request }
    }

    fn find(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|t| t.id == id)
    }

    fn toggle(&mut self, id: String) -> Option<Command> {
        let current = self.find(&id)?.completed;
        let previous = match self.policy.toggle {
            Reconcile::OnConfirm => None,
            Reconcile::Optimistic => {
                if let Some(todo) = self.find_mut(&id) {
                    todo.completed = !current;
                }
                Some(current)
            }
        };
        let request = Request::Update(UpdateTodo {
            id: id.clone(),
            text: None,
            completed: Some(!current),
        });
        Some(self.issue(Pending::Toggle { id, previous }, request))
    }

    fn confirm_edit(&mut self) -> Option<Command> {
        let edit = self.editing.as_ref()?;
        let text = edit.draft.trim().to_string();
        if text.is_empty() {
            return None;
        }
        let id = edit.id.clone();
        let previous = match self.policy.edit {
            Reconcile::OnConfirm => None,
            Reconcile::Optimistic => {
                let todo = self.find_mut(&id)?;
                let previous = std::mem::replace(&mut todo.text, text.clone());
                self.editing = None;
                Some(previous)
            }
        };
        let request = Request::Update(UpdateTodo {
            id: id.clone(),
            text: Some(text),
            completed: None,
        });
        Some(self.issue(Pending::Edit { id, previous }, request))
    }

    fn delete(&mut self, id: String) -> Option<Command> {
        let index = self.todos.iter().position(|t| t.id == id)?;
        let removed = match self.policy.delete {
            Reconcile::OnConfirm => None,
            Reconcile::Optimistic => Some((index, self.todos.remove(index))),
        };
        let request = Request::Delete { id: id.clone() };
        Some(self.issue(Pending::Delete { id, removed }, request))
    }

    fn apply_ack(&mut self, ack: &UpdateAck) {
        if let Some(todo) = self.find_mut(&ack.id) {
            if let Some(text) = &ack.text {
                todo.text = text.clone();
            }
            if let Some(completed) = ack.completed {
                todo.completed = completed;
            }
        }
    }

    fn fail(&mut self, error: &ApiError) {
        self.error = Some(error.to_string());
    }

    fn resolve(&mut self, ticket: Ticket, result: Result<Outcome, ApiError>) {
        let Some(pending) = self.pending.remove(&ticket) else {
            tracing::debug!(ticket, "ignoring resolution for unknown ticket");
            return;
        };

        match (pending, result) {
            (Pending::Load, Ok(Outcome::Listed(todos))) => {
                self.todos = todos;
                self.load = LoadState::Loaded;
            }
            (Pending::Create, Ok(Outcome::Created(todo))) => {
                self.creating = false;
                self.todos.insert(0, todo);
                self.input.clear();
            }
            (Pending::Toggle { .. }, Ok(Outcome::Updated(ack))) => self.apply_ack(&ack),
            (Pending::Edit { id, .. }, Ok(Outcome::Updated(ack))) => {
                self.apply_ack(&ack);
                if self.editing.as_ref().is_some_and(|edit| edit.id == id) {
                    self.editing = None;
                }
            }
            (Pending::Delete { id, .. }, Ok(Outcome::Deleted(_))) => {
                self.todos.retain(|t| t.id != id);
                if self.editing.as_ref().is_some_and(|edit| edit.id == id) {
                    self.editing = None;
                }
            }
            (pending, Err(e)) => self.roll_back(pending, &e),
            (pending, Ok(outcome)) => {
                tracing::warn!(?pending, ?outcome, "outcome does not match request");
                let error = ApiError::Deserialization("response does not match request".to_string());
                self.roll_back(pending, &error);
            }
        }
    }

    /// Undoes whatever `pending` applied up front and raises the banner.
    fn roll_back(&mut self, pending: Pending, error: &ApiError) {
        match pending {
            Pending::Load => self.load = LoadState::Failed(error.to_string()),
            Pending::Create => self.creating = false,
            Pending::Toggle { id, previous } => {
                if let (Some(previous), Some(todo)) = (previous, self.find_mut(&id)) {
                    todo.completed = previous;
                }
            }
            Pending::Edit { id, previous } => {
                if let (Some(previous), Some(todo)) = (previous, self.find_mut(&id)) {
                    todo.text = previous;
                }
            }
            Pending::Delete { removed, .. } => {
                if let Some((index, todo)) = removed {
                    let index = index.min(self.todos.len());
                    self.todos.insert(index, todo);
                }
            }
        }
        self.fail(error);
    }
}
