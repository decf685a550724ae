use std::collections::BTreeSet;

use crate::job::JobKey;

/// Job keys that are still in flight and therefore polled.
#[derive(Debug, Default, Clone)]
pub struct ActiveSet {
    keys: BTreeSet<JobKey>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the key was not already tracked.
    pub fn add(&mut self, key: JobKey) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.keys.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Owned snapshot, safe to iterate while the set is mutated.
    pub fn keys(&self) -> Vec<JobKey> {
        self.keys.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_are_idempotent() {
        let mut set = ActiveSet::new();
        assert!(set.add(JobKey::from("3")));
        assert!(!set.add(JobKey::from("3")));
        assert_eq!(set.len(), 1);

        assert!(set.remove("3"));
        assert!(!set.remove("3"));
        assert!(set.is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_set() {
        let mut set = ActiveSet::new();
        set.add(JobKey::from("a"));
        set.add(JobKey::from("b"));

        let snapshot = set.keys();
        for key in &snapshot {
            set.remove(key.as_str());
        }
        assert_eq!(snapshot.len(), 2);
        assert!(set.is_empty());
    }
}
