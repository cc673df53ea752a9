//! Task list controller.
//!
//! # Responsibility
//! - Validate titles before anything reaches the store.
//! - Forward mutations to the store worker without blocking.
//! - Hold the latest snapshot and filter and derive the visible list.
//!
//! # Invariants
//! - The controller never edits task fields itself; the snapshot changes
//!   only when the store reports a new one.
//! - Store events are applied in arrival order; none are skipped.
//! - Errors never clear the last-known-good snapshot.
//! - `visible_tasks()` always equals `filter.apply(snapshot)`.

use crate::model::filter::TaskFilter;
use crate::model::task::{
    is_valid_title, normalize_title, Task, TaskId, TaskValidationError, TITLE_TOO_SHORT_MESSAGE,
};
use crate::repo::store_worker::{StoreEvent, StoreHandle, StoreRequest};
use crate::repo::task_store::StoreError;
use crate::service::intent::Intent;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};

pub type ControllerResult<T> = Result<T, ControllerError>;

/// How an error should be surfaced by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPresentation {
    /// Message next to the offending input.
    Inline,
    /// Logged only.
    Silent,
    /// Non-blocking banner; the current list stays on screen.
    Banner,
}

/// Errors recorded or returned by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// Title rejected before reaching the store.
    Validation(TaskValidationError),
    /// The addressed task no longer exists.
    NotFound(TaskId),
    /// The storage medium failed or the worker is gone.
    Storage(String),
}

impl ControllerError {
    pub fn presentation(&self) -> ErrorPresentation {
        match self {
            Self::Validation(_) => ErrorPresentation::Inline,
            Self::NotFound(_) => ErrorPresentation::Silent,
            Self::Storage(_) => ErrorPresentation::Banner,
        }
    }

    /// Text to show the user, if this error is shown at all.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Validation(_) => Some(TITLE_TOO_SHORT_MESSAGE.to_string()),
            Self::NotFound(_) => None,
            Self::Storage(message) => Some(format!("Could not save changes: {message}")),
        }
    }
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Storage(message) => write!(f, "storage failure: {message}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Filtered view pushed to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleTaskList {
    pub filter: TaskFilter,
    pub tasks: Vec<Task>,
}

/// Mediates between presentation intents and the store worker.
///
/// Owned by a single thread. Store results arrive through an internal
/// channel and are applied by `process_pending`/`wait_for_update`.
/// Dropping the controller detaches it from the worker; events still in
/// flight are discarded by the worker.
pub struct TaskListController {
    store: StoreHandle,
    events_tx: Sender<StoreEvent>,
    events: Receiver<StoreEvent>,
    snapshot: Vec<Task>,
    filter: TaskFilter,
    visible: Vec<Task>,
    last_error: Option<ControllerError>,
    last_inserted: Option<TaskId>,
    in_flight: usize,
    observers: Vec<Sender<VisibleTaskList>>,
}

impl TaskListController {
    /// Subscribes a new controller to the store worker.
    ///
    /// Starts with an empty snapshot and `TaskFilter::ShowAll`; the current
    /// collection arrives as the first event.
    ///
    /// # Errors
    /// - Returns `ControllerError::Storage` when the worker is not running.
    pub fn new(store: StoreHandle) -> ControllerResult<Self> {
        let (events_tx, events) = mpsc::channel();
        store.subscribe(events_tx.clone())?;

        Ok(Self {
            store,
            events_tx,
            events,
            snapshot: Vec::new(),
            filter: TaskFilter::default(),
            visible: Vec::new(),
            last_error: None,
            last_inserted: None,
            in_flight: 0,
            observers: Vec::new(),
        })
    }

    /// Shared title predicate for live enable/disable of submit controls.
    pub fn is_valid_title(title: &str) -> bool {
        is_valid_title(title)
    }

    /// Inline error text for a draft title, `None` when it is acceptable.
    pub fn title_error(title: &str) -> Option<&'static str> {
        if is_valid_title(title) {
            None
        } else {
            Some(TITLE_TOO_SHORT_MESSAGE)
        }
    }

    /// Validates `title` and queues an insert.
    ///
    /// # Errors
    /// - `ControllerError::Validation` when the trimmed title is too short;
    ///   the store is not called.
    /// - `ControllerError::Storage` when the worker is gone.
    pub fn add_task(&mut self, title: &str) -> ControllerResult<()> {
        let title = self.accept_title(title)?;
        info!(
            "event=task_add module=controller status=submitted title_len={}",
            title.chars().count()
        );
        self.submit(StoreRequest::Insert { title })
    }

    /// Validates `title` and queues a rename of `id`.
    ///
    /// On validation failure the stored title is left unchanged.
    pub fn update_task(&mut self, id: TaskId, title: &str) -> ControllerResult<()> {
        let title = self.accept_title(title)?;
        info!("event=task_update module=controller status=submitted task_id={id}");
        self.submit(StoreRequest::UpdateTitle { id, title })
    }

    /// Queues a permanent delete of `id`.
    pub fn delete_task(&mut self, id: TaskId) -> ControllerResult<()> {
        info!("event=task_delete module=controller status=submitted task_id={id}");
        self.submit(StoreRequest::Delete { id })
    }

    /// Queues `Active -> Done` for `id`.
    pub fn mark_done(&mut self, id: TaskId) -> ControllerResult<()> {
        info!("event=task_mark_done module=controller status=submitted task_id={id}");
        self.submit(StoreRequest::SetCompleted {
            id,
            completed: true,
        })
    }

    /// Switches the filter and republishes the visible list.
    pub fn set_filter(&mut self, filter: TaskFilter) {
        debug!(
            "event=filter_set module=controller status=ok filter={:?}",
            filter
        );
        self.filter = filter;
        self.recompute();
    }

    /// Executes one intent.
    pub fn dispatch(&mut self, intent: Intent) -> ControllerResult<()> {
        match intent {
            Intent::AddTask { title } => self.add_task(&title),
            Intent::UpdateTask { id, title } => self.update_task(id, &title),
            Intent::DeleteTask { id } => self.delete_task(id),
            Intent::MarkDone { id } => self.mark_done(id),
            Intent::SetFilter(filter) => {
                self.set_filter(filter);
                Ok(())
            }
        }
    }

    pub fn visible_tasks(&self) -> &[Task] {
        &self.visible
    }

    /// Latest full collection reported by the store.
    pub fn snapshot(&self) -> &[Task] {
        &self.snapshot
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn last_error(&self) -> Option<&ControllerError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Id of the most recent insert confirmed by the store.
    pub fn last_inserted(&self) -> Option<TaskId> {
        self.last_inserted
    }

    /// Requests submitted by this controller that have not resolved yet.
    pub fn pending_requests(&self) -> usize {
        self.in_flight
    }

    /// Returns whether every submitted request has resolved.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Returns a receiver of visible-list updates.
    ///
    /// The current value is delivered immediately.
    pub fn subscribe(&mut self) -> Receiver<VisibleTaskList> {
        let (observer, receiver) = mpsc::channel();
        let _ = observer.send(self.current_view());
        self.observers.push(observer);
        receiver
    }

    /// Applies every queued store event without blocking.
    ///
    /// Returns the number of events applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Blocks up to `timeout` for the next store event, then drains the rest.
    pub fn wait_for_update(&mut self, timeout: Duration) -> usize {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.apply_event(event);
                1 + self.process_pending()
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Applies store events until `done` holds or `timeout` elapses.
    ///
    /// Returns whether `done` held before the deadline.
    pub fn wait_until(&mut self, timeout: Duration, done: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        self.process_pending();
        while !done(self) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.wait_for_update(remaining);
        }
        true
    }

    fn accept_title(&mut self, title: &str) -> ControllerResult<String> {
        match normalize_title(title) {
            Ok(title) => {
                if matches!(self.last_error, Some(ControllerError::Validation(_))) {
                    self.last_error = None;
                }
                Ok(title)
            }
            Err(err) => {
                debug!("event=title_rejected module=controller status=rejected error={err}");
                Err(self.record(ControllerError::Validation(err)))
            }
        }
    }

    fn submit(&mut self, request: StoreRequest) -> ControllerResult<()> {
        let op = request.op_name();
        if let Err(err) = self.store.submit(request, Some(self.events_tx.clone())) {
            error!("event=store_submit module=controller status=error op={op} error={err}");
            return Err(self.record(err.into()));
        }
        self.in_flight += 1;
        Ok(())
    }

    fn apply_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Snapshot(tasks) => {
                self.snapshot = tasks;
                self.recompute();
            }
            StoreEvent::Applied { inserted, .. } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                if inserted.is_some() {
                    self.last_inserted = inserted;
                }
            }
            StoreEvent::Failed { request, error } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.apply_failure(&request, error);
            }
            StoreEvent::SnapshotFailed(err) => {
                error!("event=snapshot_apply module=controller status=error error={err}");
                self.record(err.into());
            }
        }
    }

    fn apply_failure(&mut self, request: &StoreRequest, error: StoreError) {
        let op = request.op_name();
        let err = ControllerError::from(error);
        match &err {
            ControllerError::NotFound(id) => {
                warn!(
                    "event=store_result module=controller status=stale op={op} task_id={id}"
                );
                if let Err(refresh_err) = self.store.refresh(self.events_tx.clone()) {
                    self.record(refresh_err.into());
                    return;
                }
            }
            ControllerError::Validation(_) | ControllerError::Storage(_) => {
                error!("event=store_result module=controller status=error op={op} error={err}");
            }
        }
        self.record(err);
    }

    fn record(&mut self, err: ControllerError) -> ControllerError {
        self.last_error = Some(err.clone());
        err
    }

    fn recompute(&mut self) {
        self.visible = self.filter.apply(&self.snapshot);
        let view = self.current_view();
        self.observers
            .retain(|observer| observer.send(view.clone()).is_ok());
    }

    fn current_view(&self) -> VisibleTaskList {
        VisibleTaskList {
            filter: self.filter,
            tasks: self.visible.clone(),
        }
    }
}
