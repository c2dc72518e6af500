//! Command-line front end for the todo service.
//!
//! Usage:
//!   todo [--url <URL>] [--optimistic] <list|add|toggle|edit|rm> [args]

mod session;
mod transport;

use clap::{Parser, Subcommand};
use todo_core::{Action, ReconcilePolicy};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session::{render, Session};

#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(about = "Manage the todo list served by todo-server")]
struct Cli {
    /// Base URL of the todo service
    #[arg(long, env = "TODO_API_URL", default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Apply toggle/edit/delete locally before the service confirms
    #[arg(long)]
    optimistic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show all todos, newest first
    List,
    /// Add a todo
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Flip a todo between active and completed
    Toggle { id: String },
    /// Replace a todo's text
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Delete a todo
    Rm { id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let policy = if cli.optimistic {
        ReconcilePolicy::optimistic()
    } else {
        ReconcilePolicy::default()
    };

    let mut session = Session::new(&cli.url, policy);
    session.load()?;

    match cli.command {
        Commands::List => {}
        Commands::Add { text } => {
            session.dispatch(Action::InputChanged(text.join(" ")));
            if !session.state().can_submit() {
                anyhow::bail!("text must not be blank");
            }
            session.dispatch(Action::Submit);
        }
        Commands::Toggle { id } => {
            session.ensure_known(&id)?;
            session.dispatch(Action::Toggle { id });
        }
        Commands::Edit { id, text } => {
            session.ensure_known(&id)?;
            session.dispatch(Action::StartEdit { id });
            session.dispatch(Action::EditChanged(text.join(" ")));
            if session.state().editing().is_some_and(|e| e.draft.trim().is_empty()) {
                anyhow::bail!("text must not be blank");
            }
            session.dispatch(Action::ConfirmEdit);
        }
        Commands::Rm { id } => {
            session.ensure_known(&id)?;
            session.dispatch(Action::Delete { id });
        }
    }

    print!("{}", render(session.state()));
    session.check()
}
