//! Merge a status poll into the store and active set.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::active::ActiveSet;
use crate::job::{JobKey, StatusPayload};
use crate::store::StatusStore;

/// One full `GET /api/replay/status` response keyed by job.
pub type StatusBatch = BTreeMap<JobKey, StatusPayload>;

/// Message recorded for a tracked job the server stopped reporting.
pub const STATUS_UNAVAILABLE_MESSAGE: &str = "Status unavailable (possibly finished or error).";

/// Fallback label for a record created without a known host name.
pub fn fallback_display_name(key: &JobKey) -> String {
    format!("Host {key}")
}

/// What a single reconciliation pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Keys whose record was rewritten from a payload.
    pub updated: Vec<JobKey>,
    /// Keys that reached a terminal state and left the active set.
    pub finished: Vec<JobKey>,
    /// Keys missing from the batch that were dropped from the active set.
    pub dropped: Vec<JobKey>,
    /// Keys missing from the batch but still inside their grace period.
    pub deferred: Vec<JobKey>,
}

impl ReconcileReport {
    pub fn touched(&self) -> impl Iterator<Item = &JobKey> {
        self.updated.iter().chain(self.dropped.iter())
    }
}

/// Applies status batches. Tracks consecutive misses per key so a transient
/// omission can be tolerated for `missing_grace_polls` passes.
#[derive(Debug, Default)]
pub struct Reconciler {
    missing_grace_polls: u32,
    misses: HashMap<JobKey, u32>,
}

impl Reconciler {
    pub fn new(missing_grace_polls: u32) -> Self {
        Self {
            missing_grace_polls,
            misses: HashMap::new(),
        }
    }

    pub fn missing_grace_polls(&self) -> u32 {
        self.missing_grace_polls
    }

    /// Forget miss history for a key that was (re)registered.
    pub fn reset(&mut self, key: &str) {
        self.misses.remove(key);
    }

    /// Reconcile every active key against `batch`.
    ///
    /// Iterates a snapshot of the active set taken before any removal.
    pub fn reconcile(
        &mut self,
        store: &mut StatusStore,
        active: &mut ActiveSet,
        batch: &StatusBatch,
        now: DateTime<Utc>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for key in active.keys() {
            let name = store
                .get(key.as_str())
                .map(|r| r.display_name.clone())
                .unwrap_or_else(|| fallback_display_name(&key));

            match batch.get(&key) {
                Some(payload) => {
                    self.misses.remove(&key);
                    let message = payload.display_message();
                    let state = store.upsert(&key, &name, &message, Some(payload), now).state;
                    if state.is_terminal() {
                        info!("Job {key} finished ({state}), no longer polling");
                        active.remove(key.as_str());
                        report.finished.push(key.clone());
                    }
                    report.updated.push(key);
                }
                None => {
                    let misses = self.misses.entry(key.clone()).or_insert(0);
                    *misses += 1;
                    if *misses <= self.missing_grace_polls {
                        debug!(
                            "Job {key} missing from status response ({}/{})",
                            misses, self.missing_grace_polls
                        );
                        report.deferred.push(key);
                        continue;
                    }
                    self.misses.remove(&key);
                    info!("Job {key} not found in status response, no longer polling");
                    store.upsert(&key, &name, STATUS_UNAVAILABLE_MESSAGE, None, now);
                    active.remove(key.as_str());
                    report.dropped.push(key);
                }
            }
        }

        report
    }
}
