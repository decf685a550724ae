//! Orphan discovery and re-linking.
//!
//! An orphan is a destination host with no replication task behind it.
//! Re-linking binds it to a source host id; the service then schedules a
//! replay, which is tracked like any other job under the source id.

use std::sync::Arc;
use tracing::{info, warn};

use replicator_api::RelinkRequest;
use replicator_api_client::ApiError;
use replicator_core::board::RELINKED_MESSAGE;
use replicator_core::{JobKey, JobRecord, OrphanCandidate};

use crate::backend::ReplicationBackend;
use crate::scheduler::PollScheduler;
use crate::state::{EventSink, SharedState, TrackerEvent};

#[derive(Debug, thiserror::Error)]
pub enum RelinkError {
    #[error("Please provide both Destination Host ID and Source Host ID.")]
    MissingIdentifier,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelinkOutcome {
    pub message: String,
    pub record: JobRecord,
}

pub struct OrphanRelink<B> {
    backend: Arc<B>,
    state: SharedState,
    events: EventSink,
    scheduler: PollScheduler<B>,
}

impl<B: ReplicationBackend> OrphanRelink<B> {
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

    /// Fetch orphans and replace the working list with the result.
    ///
    /// On failure the previous working list is left as it was.
    pub async fn discover(&self) -> Result<Vec<OrphanCandidate>, ApiError> {
        let candidates = self.backend.orphaned_hosts().await.inspect_err(|e| {
            warn!("Error checking for orphaned hosts: {e}");
        })?;
        info!("Found {} orphaned host(s)", candidates.len());
        self.state
            .lock()
            .board
            .orphans_mut()
            .replace(candidates.clone());
        Ok(candidates)
    }

    pub fn candidates(&self) -> Vec<OrphanCandidate> {
        self.state.lock().board.orphans().candidates().to_vec()
    }

    /// Bind `dest_host_id` to `source_host_id` and track the resulting replay.
    ///
    /// Both ids must be non-empty; otherwise no request is sent. Nothing is
    /// mutated unless the service accepts the re-link.
    pub async fn relink(
        &self,
        dest_host_id: &str,
        source_host_id: &str,
    ) -> Result<RelinkOutcome, RelinkError> {
        let dest_host_id = dest_host_id.trim();
        let source_host_id = source_host_id.trim();
        if dest_host_id.is_empty() || source_host_id.is_empty() {
            return Err(RelinkError::MissingIdentifier);
        }

        info!("Re-linking destination host {dest_host_id} to source host {source_host_id}");
        let req = RelinkRequest {
            dest_host_id: dest_host_id.to_string(),
            source_host_id: source_host_id.to_string(),
        };
        let resp = self.backend.relink_host(&req).await.inspect_err(|e| {
            warn!("Error during re-linking of {dest_host_id}: {e}");
        })?;
        let message = resp.message_or(RELINKED_MESSAGE);

        let record = {
            let mut state = self.state.lock();
            let display_name = state
                .board
                .orphans_mut()
                .remove(dest_host_id)
                .map(|c| c.dest_host_name)
                .unwrap_or_else(|| format!("Host ID {dest_host_id}"));
            state.board.register_job(
                JobKey::from(source_host_id),
                &display_name,
                &message,
                chrono::Utc::now(),
            )
        };

        self.events.emit(TrackerEvent::JobRegistered(record.clone()));
        self.scheduler.start();
        Ok(RelinkOutcome { message, record })
    }
}
