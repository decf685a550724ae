use serde::{Deserialize, Serialize};

/// A destination host with no replication task linking it to a source host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanCandidate {
    pub dest_host_id: String,
    pub dest_host_name: String,
    /// Source host id recovered from the destination host's macros, if any.
    #[serde(default)]
    pub source_host_id_hint: Option<String>,
}

/// Working list of orphans from the most recent discovery.
#[derive(Debug, Default, Clone)]
pub struct OrphanList {
    candidates: Vec<OrphanCandidate>,
}

impl OrphanList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list wholesale with a fresh discovery result.
    pub fn replace(&mut self, candidates: Vec<OrphanCandidate>) {
        self.candidates = candidates;
    }

    pub fn candidates(&self) -> &[OrphanCandidate] {
        &self.candidates
    }

    pub fn find(&self, dest_host_id: &str) -> Option<&OrphanCandidate> {
        self.candidates
            .iter()
            .find(|c| c.dest_host_id == dest_host_id)
    }

    pub fn remove(&mut self, dest_host_id: &str) -> Option<OrphanCandidate> {
        let idx = self
            .candidates
            .iter()
            .position(|c| c.dest_host_id == dest_host_id)?;
        Some(self.candidates.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
