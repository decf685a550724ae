//! The tracking state shared by every job-producing path.
//!
//! [`TaskBoard`] owns the status store, the active set, the reconciler's miss
//! history and the orphan working list. Every key in the active set has a
//! record in the store.

use chrono::{DateTime, Utc};

use crate::active::ActiveSet;
use crate::job::{JobKey, LifecycleState, StatusPayload};
use crate::orphan::OrphanList;
use crate::reconcile::{ReconcileReport, Reconciler, StatusBatch};
use crate::store::{JobRecord, StatusStore};

/// Message recorded for a freshly started job.
pub const INITIATED_MESSAGE: &str = "Initiated. Waiting for status update...";

/// Default message for a successful re-link when the server sends none.
pub const RELINKED_MESSAGE: &str = "Re-linked and scheduled for replay.";

/// Label for records discovered by the startup load without a host name.
pub fn startup_display_name(key: &JobKey, payload: &StatusPayload) -> String {
    payload
        .dest_host_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Host ID {key}"))
}

#[derive(Debug, Default)]
pub struct TaskBoard {
    store: StatusStore,
    active: ActiveSet,
    reconciler: Reconciler,
    orphans: OrphanList,
}

impl TaskBoard {
    pub fn new(missing_grace_polls: u32) -> Self {
        Self {
            reconciler: Reconciler::new(missing_grace_polls),
            ..Default::default()
        }
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    pub fn orphans(&self) -> &OrphanList {
        &self.orphans
    }

    pub fn orphans_mut(&mut self) -> &mut OrphanList {
        &mut self.orphans
    }

    /// Register a newly created job as `pending` and start tracking it.
    pub fn register_job(
        &mut self,
        key: JobKey,
        display_name: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> JobRecord {
        let payload = StatusPayload::new(LifecycleState::Pending.as_str(), message);
        self.reconciler.reset(key.as_str());
        let record = self
            .store
            .upsert(&key, display_name, message, Some(&payload), now)
            .clone();
        self.active.add(key);
        record
    }

    /// Seed the board from a full status response at startup.
    ///
    /// Every entry gets a record; non-terminal entries are tracked. Returns
    /// the number of keys now in the active set.
    pub fn load_snapshot(&mut self, batch: &StatusBatch, now: DateTime<Utc>) -> usize {
        for (key, payload) in batch {
            let name = startup_display_name(key, payload);
            let message = payload.display_message();
            let state = self
                .store
                .upsert(key, &name, &message, Some(payload), now)
                .state;
            if state.is_terminal() {
                self.active.remove(key.as_str());
            } else {
                self.active.add(key.clone());
            }
        }
        self.active.len()
    }

    pub fn reconcile(&mut self, batch: &StatusBatch, now: DateTime<Utc>) -> ReconcileReport {
        self.reconciler
            .reconcile(&mut self.store, &mut self.active, batch, now)
    }

    /// Operator dismissal of a finished job. No-op for tracked jobs.
    pub fn remove_if_terminal(&mut self, key: &str) -> bool {
        if self.active.contains(key) {
            return false;
        }
        self.store.remove_if_terminal(key)
    }

    pub fn clear_completed(&mut self) -> Vec<JobKey> {
        self.store.clear_completed()
    }

    pub fn record(&self, key: &str) -> Option<&JobRecord> {
        self.store.get(key)
    }

    /// Owned copies of all records in creation order.
    pub fn records(&self) -> Vec<JobRecord> {
        self.store.records().into_iter().cloned().collect()
    }
}
