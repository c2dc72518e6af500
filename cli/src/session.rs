//! Drives `TodoListState` against the service: every emitted command is
//! executed immediately and its resolution fed back.

use std::fmt::Write as _;

use todo_core::{Action, LoadState, ReconcilePolicy, TodoClient, TodoListState};

use crate::transport::Transport;

pub struct Session {
    client: TodoClient,
    transport: Transport,
    state: TodoListState,
}

impl Session {
    pub fn new(base_url: &str, policy: ReconcilePolicy) -> Self {
        Self {
            client: TodoClient::new(base_url),
            transport: Transport::new(),
            state: TodoListState::with_policy(policy),
        }
    }

    pub fn state(&self) -> &TodoListState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) {
        let Some(command) = self.state.apply(action) else {
            return;
        };
        let resolution = match self
            .client
            .build_command(&command)
            .and_then(|req| self.transport.execute(req))
        {
            Ok(response) => self.client.parse_command(&command, response),
            Err(e) => command.failed(e),
        };
        self.state.apply(resolution);
    }

    /// Loads the list; fails with the banner message when that did not work.
    pub fn load(&mut self) -> anyhow::Result<()> {
        self.dispatch(Action::Load);
        match self.state.load_state() {
            LoadState::Loaded => Ok(()),
            LoadState::Failed(message) => anyhow::bail!("could not load todos: {message}"),
            other => anyhow::bail!("unexpected load state {other:?}"),
        }
    }

    /// Fails with the banner message if the last actions left one.
    pub fn check(&self) -> anyhow::Result<()> {
        match self.state.error() {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }

    pub fn ensure_known(&self, id: &str) -> anyhow::Result<()> {
        if self.state.todos().iter().any(|t| t.id == id) {
            Ok(())
        } else {
            anyhow::bail!("no todo with id {id}")
        }
    }
}

/// One line per todo, newest first, then the counts.
pub fn render(state: &TodoListState) -> String {
    let mut out = String::new();
    if state.todos().is_empty() {
        out.push_str("No tasks yet.\n");
    }
    for todo in state.todos() {
        let mark = if todo.completed { 'x' } else { ' ' };
        let _ = writeln!(
            out,
            "[{mark}] {}  ({}, {})",
            todo.text,
            todo.id,
            todo.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    let _ = writeln!(
        out,
        "{} active, {} completed",
        state.active_count(),
        state.completed_count()
    );
    out
}
