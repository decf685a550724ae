use std::sync::Arc;
use tracing::{info, warn};

use replicator_api_client::ReplicateResponse;
use replicator_core::JobKey;
use replicator_core::board::INITIATED_MESSAGE;

use crate::backend::ReplicationBackend;
use crate::scheduler::PollScheduler;
use crate::state::{EventSink, SharedState, TrackerEvent};

/// Result of asking the service to replicate one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Initiated { message: String },
    /// The service reported the host as already replicating; it is tracked anyway.
    AlreadyRunning { message: String },
    /// Nothing was registered.
    Failed { reason: String },
}

impl StartOutcome {
    pub fn is_tracked(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// Starts replication jobs and hands them to the poll loop.
pub struct JobInitiator<B> {
    backend: Arc<B>,
    state: SharedState,
    events: EventSink,
    scheduler: PollScheduler<B>,
}

impl<B: ReplicationBackend> JobInitiator<B> {
    pub(crate) fn new(
        backend: Arc<B>,
        state: SharedState,
        events: EventSink,
        scheduler: PollScheduler<B>,
    ) -> Self {
        Self {
            backend,
            state,
            events,
            scheduler,
        }
    }

    /// Request replication of `key`. Duplicate calls are not deduplicated;
    /// they converge on the same record.
    pub async fn start(&self, key: JobKey, display_name: &str) -> StartOutcome {
        info!("Starting replication for {display_name} ({key})");

        let outcome = match self.backend.replicate(key.as_str()).await {
            Ok(ReplicateResponse::Started(body)) => StartOutcome::Initiated {
                message: body.message_or(&format!("Replication initiated for {display_name}.")),
            },
            Ok(ReplicateResponse::AlreadyRunning(body)) => StartOutcome::AlreadyRunning {
                message: body
                    .message_or(&format!("Replication already running for {display_name}.")),
            },
            Err(e) => {
                warn!("Failed to start replication for {key}: {e}");
                return StartOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let record = self
            .state
            .register_job(key, display_name, INITIATED_MESSAGE);
        self.events.emit(TrackerEvent::JobRegistered(record));
        self.scheduler.start();
        outcome
    }
}
