use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::job::{JobKey, LifecycleState, StatusPayload, classify};

/// Last-known view of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub key: JobKey,
    pub display_name: String,
    pub state: LifecycleState,
    pub last_message: String,
    pub last_updated: DateTime<Utc>,
    #[serde(skip)]
    seq: u64,
}

/// In-memory mapping from job key to its latest record.
///
/// Records are never dropped implicitly; only [`StatusStore::remove_if_terminal`]
/// deletes, and only finished jobs.
#[derive(Debug, Default)]
pub struct StatusStore {
    records: HashMap<JobKey, JobRecord>,
    next_seq: u64,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update the record for `key`.
    ///
    /// `display_name` only applies when the record is created. State, message
    /// and timestamp are always overwritten.
    pub fn upsert(
        &mut self,
        key: &JobKey,
        display_name: &str,
        message: &str,
        payload: Option<&StatusPayload>,
        now: DateTime<Utc>,
    ) -> &JobRecord {
        let state = classify(payload, message);
        let seq = self.next_seq;
        let record = self.records.entry(key.clone()).or_insert_with(|| JobRecord {
            key: key.clone(),
            display_name: display_name.to_string(),
            state,
            last_message: String::new(),
            last_updated: now,
            seq,
        });
        if record.seq == seq {
            self.next_seq += 1;
        }
        record.state = state;
        record.last_message = message.to_string();
        record.last_updated = now;
        record
    }

    pub fn get(&self, key: &str) -> Option<&JobRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in creation order.
    pub fn records(&self) -> Vec<&JobRecord> {
        let mut records: Vec<&JobRecord> = self.records.values().collect();
        records.sort_by_key(|r| r.seq);
        records
    }

    /// Delete the record for `key` if it is in a terminal state.
    pub fn remove_if_terminal(&mut self, key: &str) -> bool {
        match self.records.get(key) {
            Some(record) if record.state.is_terminal() => {
                self.records.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Drop every `completed` record. Failed jobs stay visible.
    pub fn clear_completed(&mut self) -> Vec<JobKey> {
        let completed: Vec<JobKey> = self
            .records()
            .into_iter()
            .filter(|r| r.state == LifecycleState::Completed)
            .map(|r| r.key.clone())
            .collect();
        completed
            .into_iter()
            .filter(|key| self.remove_if_terminal(key.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn upsert_creates_then_updates_single_record() {
        let mut store = StatusStore::new();
        let key = JobKey::from("7");
        let now = testing::at(0);

        store.upsert(&key, "hostA", "Initiated. Waiting for status update...", None, now);
        let later = testing::at(5);
        let payload = StatusPayload::new("running", "processing items");
        let rec = store.upsert(&key, "ignored", "processing items", Some(&payload), later);

        assert_eq!(rec.display_name, "hostA");
        assert_eq!(rec.state, LifecycleState::Running);
        assert_eq!(rec.last_message, "processing items");
        assert_eq!(rec.last_updated, later);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn records_keep_creation_order() {
        let mut store = StatusStore::new();
        for key in ["30", "4", "100"] {
            store.upsert(&JobKey::from(key), key, "waiting", None, testing::at(0));
        }
        store.upsert(&JobKey::from("4"), "4", "running", None, testing::at(1));

        let order: Vec<&str> = store.records().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(order, vec!["30", "4", "100"]);
    }

    #[test]
    fn remove_if_terminal_ignores_live_jobs() {
        let mut store = StatusStore::new();
        store.upsert(&JobKey::from("1"), "a", "running", None, testing::at(0));
        store.upsert(&JobKey::from("2"), "b", "failed hard", None, testing::at(0));

        assert!(!store.remove_if_terminal("1"));
        assert!(!store.remove_if_terminal("missing"));
        assert!(store.remove_if_terminal("2"));
        assert!(store.contains("1"));
        assert!(!store.contains("2"));
    }

    #[test]
    fn clear_completed_keeps_failed_records() {
        let mut store = StatusStore::new();
        store.upsert(&JobKey::from("1"), "a", "completed", None, testing::at(0));
        store.upsert(&JobKey::from("2"), "b", "failed", None, testing::at(0));
        store.upsert(&JobKey::from("3"), "c", "running", None, testing::at(0));

        let cleared = store.clear_completed();
        assert_eq!(cleared, vec![JobKey::from("1")]);
        assert_eq!(store.len(), 2);
    }
}
