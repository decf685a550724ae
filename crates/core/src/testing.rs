use chrono::{DateTime, TimeZone, Utc};

use crate::job::{JobKey, StatusPayload};
use crate::orphan::OrphanCandidate;
use crate::reconcile::StatusBatch;

/// Fixed instant `secs` seconds after a stable test epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0)
        .single()
        .map(|t| t + chrono::Duration::seconds(secs))
        .unwrap_or_default()
}

/// Status batch from `(key, status, message)` triples.
pub fn batch(entries: &[(&str, &str, &str)]) -> StatusBatch {
    entries
        .iter()
        .map(|(key, status, message)| (JobKey::from(*key), StatusPayload::new(status, message)))
        .collect()
}

pub fn orphan(dest_id: &str, dest_name: &str, hint: Option<&str>) -> OrphanCandidate {
    OrphanCandidate {
        dest_host_id: dest_id.to_string(),
        dest_host_name: dest_name.to_string(),
        source_host_id_hint: hint.map(str::to_string),
    }
}
