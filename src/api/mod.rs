//! API layer: the HTTP client plus the request/completion messages that
//! connect it to the UI state.
//!
//! `AppState` never performs I/O. Its transitions return [`Command`]s; the
//! [`Dispatcher`] runs each one on the tokio runtime and posts the matching
//! [`Completion`] back to the UI thread.
pub mod client;

use std::sync::mpsc::Sender;

use tokio::runtime::Handle;
use tracing::debug;

use crate::error::Result;
use crate::model::{UserPayload, Usuario};

pub use client::{DEFAULT_API_URL, UsuariosClient};

/// Which record a mutation addresses. Used to refuse duplicate submissions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// The record being created (there is at most one create form).
    New,
    Record(u64),
}

/// A request the UI wants issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Load { generation: u64 },
    Create(UserPayload),
    Update { id: u64, payload: UserPayload },
    Delete { id: u64 },
}

impl Command {
    pub fn target(&self) -> Option<Target> {
        match self {
            Command::Load { .. } => None,
            Command::Create(_) => Some(Target::New),
            Command::Update { id, .. } | Command::Delete { id } => Some(Target::Record(*id)),
        }
    }
}

/// Outcome of a [`Command`], delivered back to the UI thread.
#[derive(Debug)]
pub enum Completion {
    Loaded {
        generation: u64,
        result: Result<Vec<Usuario>>,
    },
    Created(Result<()>),
    Updated { id: u64, result: Result<()> },
    Deleted { id: u64, result: Result<()> },
}

impl UsuariosClient {
    /// Run one command to completion.
    pub async fn execute(&self, cmd: Command) -> Completion {
        match cmd {
            Command::Load { generation } => Completion::Loaded {
                generation,
                result: self.list().await,
            },
            Command::Create(payload) => Completion::Created(self.create(&payload).await),
            Command::Update { id, payload } => Completion::Updated {
                id,
                result: self.update(id, &payload).await,
            },
            Command::Delete { id } => Completion::Deleted {
                id,
                result: self.delete(id).await,
            },
        }
    }
}

/// Spawns commands on a tokio runtime and reports completions over a channel.
pub struct Dispatcher {
    client: UsuariosClient,
    handle: Handle,
    tx: Sender<Completion>,
}

impl Dispatcher {
    pub fn new(client: UsuariosClient, handle: Handle, tx: Sender<Completion>) -> Self {
        Self { client, handle, tx }
    }

    pub fn dispatch(&self, cmd: Command) {
        debug!(?cmd, "Dispatching request");
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let completion = client.execute(cmd).await;
            // The receiver is gone once the UI has exited; late responses are dropped.
            let _ = tx.send(completion);
        });
    }
}
