use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use replicator_api::{ConfigFields, HostSummary, StatusBatch};
use replicator_api_client::ApiError;
use replicator_core::view::matches_filter;
use replicator_core::{JobKey, JobRecord, OrphanCandidate};

use crate::backend::ReplicationBackend;
use crate::initiator::{JobInitiator, StartOutcome};
use crate::relink::{OrphanRelink, RelinkError, RelinkOutcome};
use crate::scheduler::{DEFAULT_POLL_INTERVAL, PollScheduler};
use crate::state::{EventSink, SharedState, TrackerEvent};

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    pub missing_grace_polls: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            missing_grace_polls: 0,
        }
    }
}

/// Entry point of the engine.
///
/// Owns the shared board and wires the job initiator and the orphan
/// workflow to a single [`PollScheduler`].
pub struct Tracker<B> {
    backend: Arc<B>,
    state: SharedState,
    events: EventSink,
    scheduler: PollScheduler<B>,
    initiator: JobInitiator<B>,
    orphans: OrphanRelink<B>,
}

impl<B: ReplicationBackend> Tracker<B> {
    pub fn new(backend: B, settings: TrackerSettings) -> Self {
        let backend = Arc::new(backend);
        let state = SharedState::new(settings.missing_grace_polls);
        let events = EventSink::default();
        let scheduler = PollScheduler::new(
            Arc::clone(&backend),
            state.clone(),
            events.clone(),
            settings.poll_interval,
        );
        let initiator = JobInitiator::new(
            Arc::clone(&backend),
            state.clone(),
            events.clone(),
            scheduler.clone(),
        );
        let orphans = OrphanRelink::new(
            Arc::clone(&backend),
            state.clone(),
            events.clone(),
            scheduler.clone(),
        );
        Self {
            backend,
            state,
            events,
            scheduler,
            initiator,
            orphans,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn scheduler(&self) -> &PollScheduler<B> {
        &self.scheduler
    }

    pub fn initiator(&self) -> &JobInitiator<B> {
        &self.initiator
    }

    pub fn orphan_workflow(&self) -> &OrphanRelink<B> {
        &self.orphans
    }

    /// Receive every [`TrackerEvent`] emitted from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TrackerEvent> {
        self.events.subscribe()
    }

    // ── Connection ────────────────────────────────────────────────────────

    /// Push Zabbix connection settings, then list the source hosts.
    pub async fn connect(&self, fields: &ConfigFields) -> Result<Vec<HostSummary>, ApiError> {
        self.backend.save_config(fields).await?;
        info!("Configuration saved, loading source hosts");
        self.source_hosts().await
    }

    pub async fn source_hosts(&self) -> Result<Vec<HostSummary>, ApiError> {
        let hosts = self.backend.source_hosts().await?;
        info!("Loaded {} source host(s)", hosts.len());
        Ok(hosts)
    }

    // ── Tracking ──────────────────────────────────────────────────────────

    /// Seed the board from the service's current task list and start
    /// polling if any task is still live. Returns the number of tracked jobs.
    pub async fn load(&self) -> Result<usize, ApiError> {
        let active = self.load_snapshot().await?;
        if active > 0 {
            self.scheduler.start();
        }
        Ok(active)
    }

    /// Seed the board like [`Tracker::load`] without starting the poll loop.
    /// Callers that want live updates start it with `scheduler().start()`.
    pub async fn load_snapshot(&self) -> Result<usize, ApiError> {
        let batch = self.backend.replay_status().await?;
        let (active, records) = {
            let mut state = self.state.lock();
            let active = state.board.load_snapshot(&batch, Utc::now());
            let records: Vec<JobRecord> = batch
                .keys()
                .filter_map(|key| state.board.record(key.as_str()).cloned())
                .collect();
            (active, records)
        };
        info!(
            "Loaded {} replication task(s), {} still active",
            records.len(),
            active
        );
        self.events
            .emit_all(records.into_iter().map(TrackerEvent::JobUpdated));
        Ok(active)
    }

    /// Status of one task straight from the service. Does not touch the board.
    pub async fn status_for(&self, key: &str) -> Result<StatusBatch, ApiError> {
        self.backend.replay_status_for(key).await
    }

    pub async fn start_job(&self, key: JobKey, display_name: &str) -> StartOutcome {
        self.initiator.start(key, display_name).await
    }

    // ── Orphans ───────────────────────────────────────────────────────────

    pub async fn discover_orphans(&self) -> Result<Vec<OrphanCandidate>, ApiError> {
        self.orphans.discover().await
    }

    pub fn orphans(&self) -> Vec<OrphanCandidate> {
        self.orphans.candidates()
    }

    pub async fn relink(
        &self,
        dest_host_id: &str,
        source_host_id: &str,
    ) -> Result<RelinkOutcome, RelinkError> {
        self.orphans.relink(dest_host_id, source_host_id).await
    }

    /// Ask the service to rebuild the item mapping of an existing task.
    pub async fn rebuild_mapping(&self, source_host_id: &str) -> Result<String, ApiError> {
        let resp = self.backend.rebuild_mapping(source_host_id).await?;
        Ok(resp.message_or("Item mapping rebuilt."))
    }

    // ── Views ─────────────────────────────────────────────────────────────

    pub fn records(&self) -> Vec<JobRecord> {
        self.state.lock().board.records()
    }

    pub fn record(&self, key: &str) -> Option<JobRecord> {
        self.state.lock().board.record(key).cloned()
    }

    /// Records whose name or key contains `term` (case-insensitive).
    pub fn filter(&self, term: &str) -> Vec<JobRecord> {
        self.records()
            .into_iter()
            .filter(|r| matches_filter(r, term))
            .collect()
    }

    pub fn active_keys(&self) -> Vec<JobKey> {
        self.state.lock().board.active().keys()
    }

    pub fn is_tracking(&self, key: &str) -> bool {
        self.state.lock().board.active().contains(key)
    }

    /// Dismiss every completed job from the board.
    pub fn clear_completed(&self) -> Vec<JobKey> {
        self.state.lock().board.clear_completed()
    }

    pub fn remove_if_terminal(&self, key: &str) -> bool {
        self.state.lock().board.remove_if_terminal(key)
    }

    pub fn shutdown(&self) {
        self.scheduler.stop();
    }
}
