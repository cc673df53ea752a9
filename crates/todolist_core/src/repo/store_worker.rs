//! Background worker that owns a `TaskStore`.
//!
//! # Responsibility
//! - Run store operations off the caller's thread.
//! - Broadcast the full task collection after every successful mutation.
//! - Route mutation failures back to the requester only.
//!
//! # Invariants
//! - Requests are applied one at a time in the order they were received,
//!   so same-record writes never interleave.
//! - Each subscriber receives events in the order the worker produced them.
//! - A subscriber whose receiver was dropped is removed on the next send;
//!   this is not an error.

use crate::model::task::{Task, TaskId};
use crate::repo::task_store::{StoreError, StoreResult, TaskStore};
use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

const WORKER_THREAD_NAME: &str = "todolist-store";

/// Mutation forwarded to the store worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    Insert { title: String },
    UpdateTitle { id: TaskId, title: String },
    Delete { id: TaskId },
    SetCompleted { id: TaskId, completed: bool },
}

impl StoreRequest {
    /// Stable operation name used in log events.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::UpdateTitle { .. } => "update_title",
            Self::Delete { .. } => "delete",
            Self::SetCompleted { .. } => "set_completed",
        }
    }

    /// Target record, when the request addresses an existing task.
    pub fn target(&self) -> Option<TaskId> {
        match self {
            Self::Insert { .. } => None,
            Self::UpdateTitle { id, .. } | Self::Delete { id } | Self::SetCompleted { id, .. } => {
                Some(*id)
            }
        }
    }
}

/// Event delivered to subscribers and requesters.
#[derive(Debug)]
pub enum StoreEvent {
    /// Full task collection after a change, or on subscribe/refresh.
    Snapshot(Vec<Task>),
    /// A request issued by this receiver's owner was persisted.
    ///
    /// Sent after the resulting snapshot, so the requester has already seen
    /// it. `inserted` carries the new id for inserts.
    Applied {
        request: StoreRequest,
        inserted: Option<TaskId>,
    },
    /// A request issued by this receiver's owner failed.
    Failed {
        request: StoreRequest,
        error: StoreError,
    },
    /// The collection could not be read back.
    SnapshotFailed(StoreError),
}

enum Command {
    Subscribe(Sender<StoreEvent>),
    Refresh(Sender<StoreEvent>),
    Apply {
        request: StoreRequest,
        reply: Option<Sender<StoreEvent>>,
    },
    Shutdown,
}

/// Cloneable front end used to talk to a running worker.
#[derive(Clone)]
pub struct StoreHandle {
    commands: Sender<Command>,
}

impl StoreHandle {
    /// Registers `events` for snapshot broadcasts.
    ///
    /// The current collection is sent to `events` right away.
    pub fn subscribe(&self, events: Sender<StoreEvent>) -> StoreResult<()> {
        self.send(Command::Subscribe(events))
    }

    /// Creates a fresh subscription channel and returns its receiving end.
    pub fn observe_all(&self) -> StoreResult<Receiver<StoreEvent>> {
        let (events, receiver) = mpsc::channel();
        self.subscribe(events)?;
        Ok(receiver)
    }

    /// Queues `request`; the result arrives later as an event.
    ///
    /// `reply` receives the `Applied`/`Failed` outcome for this request.
    ///
    /// # Errors
    /// - Returns `StoreError::WorkerStopped` when the worker is gone.
    pub fn submit(
        &self,
        request: StoreRequest,
        reply: Option<Sender<StoreEvent>>,
    ) -> StoreResult<()> {
        self.send(Command::Apply { request, reply })
    }

    /// Asks the worker to send the current collection to `reply` only.
    pub fn refresh(&self, reply: Sender<StoreEvent>) -> StoreResult<()> {
        self.send(Command::Refresh(reply))
    }

    fn send(&self, command: Command) -> StoreResult<()> {
        self.commands
            .send(command)
            .map_err(|_| StoreError::WorkerStopped)
    }
}

/// Owner of the worker thread.
///
/// Dropping it drains already-queued requests and then stops the thread.
pub struct StoreWorker {
    commands: Sender<Command>,
    thread: Option<JoinHandle<()>>,
}

impl StoreWorker {
    /// Moves `store` onto a dedicated thread and starts serving requests.
    ///
    /// # Errors
    /// - Returns the OS error when the thread cannot be spawned.
    pub fn spawn<S>(store: S) -> std::io::Result<(Self, StoreHandle)>
    where
        S: TaskStore + 'static,
    {
        let (commands, receiver) = mpsc::channel();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run(store, receiver))?;

        info!("event=store_worker_start module=store status=ok");
        let handle = StoreHandle {
            commands: commands.clone(),
        };
        Ok((
            Self {
                commands,
                thread: Some(thread),
            },
            handle,
        ))
    }

    /// Stops the worker after queued requests are applied.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if thread.join().is_err() {
            error!("event=store_worker_stop module=store status=error error_code=worker_panicked");
            return;
        }
        info!("event=store_worker_stop module=store status=ok");
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<S: TaskStore>(store: S, commands: Receiver<Command>) {
    let mut subscribers: Vec<Sender<StoreEvent>> = Vec::new();

    while let Ok(command) = commands.recv() {
        match command {
            Command::Subscribe(events) => {
                let _ = events.send(read_snapshot(&store));
                subscribers.push(events);
                debug!(
                    "event=store_subscribe module=store status=ok subscribers={}",
                    subscribers.len()
                );
            }
            Command::Refresh(reply) => {
                let _ = reply.send(read_snapshot(&store));
            }
            Command::Apply { request, reply } => {
                apply_request(&store, request, reply.as_ref(), &mut subscribers);
            }
            Command::Shutdown => break,
        }
    }
}

fn apply_request<S: TaskStore>(
    store: &S,
    request: StoreRequest,
    reply: Option<&Sender<StoreEvent>>,
    subscribers: &mut Vec<Sender<StoreEvent>>,
) {
    let started_at = Instant::now();
    let op = request.op_name();
    let target = request.target().unwrap_or_default();

    let outcome = match &request {
        StoreRequest::Insert { title } => store.insert_task(title).map(Some),
        StoreRequest::UpdateTitle { id, title } => store.update_title(*id, title).map(|()| None),
        StoreRequest::Delete { id } => store.delete_task(*id).map(|()| None),
        StoreRequest::SetCompleted { id, completed } => {
            store.set_completed(*id, *completed).map(|()| None)
        }
    };

    match outcome {
        Ok(inserted) => {
            let task_id = inserted.unwrap_or(target);
            info!(
                "event=store_apply module=store status=ok op={op} task_id={task_id} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            publish_snapshot(store, reply, subscribers);
            if let Some(reply) = reply {
                let _ = reply.send(StoreEvent::Applied { request, inserted });
            }
        }
        Err(err) => {
            if err.is_not_found() || err.is_validation() {
                warn!(
                    "event=store_apply module=store status=rejected op={op} task_id={target} error={err}"
                );
            } else {
                error!(
                    "event=store_apply module=store status=error op={op} task_id={target} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
            }
            if let Some(reply) = reply {
                let _ = reply.send(StoreEvent::Failed {
                    request,
                    error: err,
                });
            }
        }
    }
}

fn publish_snapshot<S: TaskStore>(
    store: &S,
    reply: Option<&Sender<StoreEvent>>,
    subscribers: &mut Vec<Sender<StoreEvent>>,
) {
    let tasks = match store.list_tasks() {
        Ok(tasks) => tasks,
        Err(err) => {
            error!("event=store_publish module=store status=error error={err}");
            if let Some(reply) = reply {
                let _ = reply.send(StoreEvent::SnapshotFailed(err));
            }
            return;
        }
    };

    let before = subscribers.len();
    subscribers.retain(|events| events.send(StoreEvent::Snapshot(tasks.clone())).is_ok());
    if subscribers.len() != before {
        debug!(
            "event=store_publish module=store status=ok pruned_subscribers={} subscribers={}",
            before - subscribers.len(),
            subscribers.len()
        );
    }
}

fn read_snapshot<S: TaskStore>(store: &S) -> StoreEvent {
    match store.list_tasks() {
        Ok(tasks) => StoreEvent::Snapshot(tasks),
        Err(err) => {
            error!("event=store_snapshot module=store status=error error={err}");
            StoreEvent::SnapshotFailed(err)
        }
    }
}
