//! State shared between the scheduler and the job-producing paths.
//!
//! The board and the scheduler's running flag sit behind one mutex. The lock
//! is only taken in synchronous sections and never held across an `.await`,
//! so each section is atomic with respect to the others.

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};

use replicator_core::{JobKey, JobRecord, TaskBoard};

/// Something observable happened to the tracked jobs.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A job was started or re-linked and is now tracked.
    JobRegistered(JobRecord),
    /// A poll or the startup load rewrote a record.
    JobUpdated(JobRecord),
    /// The job reached `completed` or `failed` and is no longer polled.
    JobFinished(JobRecord),
    /// The job vanished from the server's status report and is no longer polled.
    JobDropped(JobRecord),
    /// A poll tick failed; polling continues on schedule.
    PollFailed(String),
    PollingStarted,
    PollingStopped,
}

#[derive(Debug, Default)]
pub(crate) struct PollSlot {
    pub(crate) running: bool,
    pub(crate) generation: u64,
    pub(crate) stop: Option<watch::Sender<bool>>,
}

impl PollSlot {
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }

    /// Mark idle and wake the loop if it is waiting for its next tick.
    pub(crate) fn halt(&mut self) {
        self.running = false;
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }
    }
}

#[derive(Debug)]
pub(crate) struct EngineState {
    pub(crate) board: TaskBoard,
    pub(crate) poll: PollSlot,
}

#[derive(Debug, Clone)]
pub(crate) struct SharedState(Arc<Mutex<EngineState>>);

impl SharedState {
    pub(crate) fn new(missing_grace_polls: u32) -> Self {
        Self(Arc::new(Mutex::new(EngineState {
            board: TaskBoard::new(missing_grace_polls),
            poll: PollSlot::default(),
        })))
    }

    /// A panic while holding the lock leaves plain data behind; keep going.
    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new job as `pending` and start tracking it.
    pub(crate) fn register_job(&self, key: JobKey, display_name: &str, message: &str) -> JobRecord {
        self.lock()
            .board
            .register_job(key, display_name, message, Utc::now())
    }
}

/// Fan-out of [`TrackerEvent`]s to any number of subscribers.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink(Arc<Mutex<Vec<mpsc::UnboundedSender<TrackerEvent>>>>);

impl EventSink {
    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<TrackerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: TrackerEvent) {
        let mut subscribers = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn emit_all(&self, events: impl IntoIterator<Item = TrackerEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}
