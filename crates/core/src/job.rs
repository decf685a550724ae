//! Job identity and lifecycle classification.
//!
//! A job's lifecycle state is re-derived on every update: an explicit status
//! field from the server wins, otherwise the state is inferred from the
//! free-text message using a fixed, ordered keyword table.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Message used when a payload carries neither a message nor a status.
pub const UNKNOWN_STATUS_MESSAGE: &str = "Unknown status";

/// Opaque identifier of one tracked job (a source host id, or the source id
/// supplied while re-linking an orphan).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobKey(String);

impl JobKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for JobKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Lifecycle of a replication job as seen by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Pending,
    Running,
    Completed,
    Failed,
    Error,
    Unknown,
}

/// Ordered keyword rules for message-text inference. First match wins.
const MESSAGE_RULES: &[(&[&str], LifecycleState)] = &[
    (&["completed", "success"], LifecycleState::Completed),
    (&["failed", "error"], LifecycleState::Failed),
    (&["running", "processing"], LifecycleState::Running),
    (&["initiated", "waiting"], LifecycleState::Pending),
];

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    /// `completed` and `failed` end tracking; everything else keeps polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Normalize a server-supplied status. Unrecognized values map to `Pending`.
    pub fn from_status(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "error" => Self::Error,
            "unknown" => Self::Unknown,
            _ => Self::Pending,
        }
    }

    /// Infer a state from a human-readable message.
    pub fn infer_from_message(message: &str) -> Self {
        let text = message.to_lowercase();
        MESSAGE_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|kw| text.contains(kw)))
            .map(|(_, state)| *state)
            .unwrap_or(Self::Pending)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One job's entry in a `GET /api/replay/status` response.
///
/// Only `status` and `message` drive classification; the remaining fields
/// are informational and may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_host_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_host_name: Option<String>,
    /// Unix seconds, as stored by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<serde_json::Value>,
}

impl StatusPayload {
    pub fn new(status: &str, message: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn explicit_status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn explicit_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }

    /// Text shown for this payload: the message, else the raw status.
    pub fn display_message(&self) -> String {
        self.explicit_message()
            .or_else(|| self.explicit_status())
            .unwrap_or(UNKNOWN_STATUS_MESSAGE)
            .to_string()
    }
}

/// Classify a job update.
///
/// An explicit status in `payload` wins. Otherwise the state is inferred from
/// `message`; a payload with neither yields [`UNKNOWN_STATUS_MESSAGE`], which
/// matches no rule and lands on `Pending`.
pub fn classify(payload: Option<&StatusPayload>, message: &str) -> LifecycleState {
    match payload.and_then(StatusPayload::explicit_status) {
        Some(status) => LifecycleState::from_status(status),
        None => LifecycleState::infer_from_message(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_status_is_case_insensitive() {
        assert_eq!(LifecycleState::from_status("RUNNING"), LifecycleState::Running);
        assert_eq!(LifecycleState::from_status(" Completed "), LifecycleState::Completed);
        assert_eq!(LifecycleState::from_status("error"), LifecycleState::Error);
    }

    #[test]
    fn unrecognized_status_defaults_to_pending() {
        assert_eq!(LifecycleState::from_status("queued"), LifecycleState::Pending);
        assert_eq!(LifecycleState::from_status(""), LifecycleState::Pending);
    }

    #[test]
    fn message_rules_apply_in_order() {
        // "completed" outranks "error" when both appear.
        assert_eq!(
            LifecycleState::infer_from_message("Completed with error count 0"),
            LifecycleState::Completed
        );
        assert_eq!(
            LifecycleState::infer_from_message("Replay FAILED: timeout"),
            LifecycleState::Failed
        );
        assert_eq!(
            LifecycleState::infer_from_message("processing history batch 3"),
            LifecycleState::Running
        );
        assert_eq!(
            LifecycleState::infer_from_message("Initiated. Waiting for status update..."),
            LifecycleState::Pending
        );
        assert_eq!(
            LifecycleState::infer_from_message("something else"),
            LifecycleState::Pending
        );
    }

    #[test]
    fn disappearance_message_classifies_as_failed() {
        assert_eq!(
            LifecycleState::infer_from_message("Status unavailable (possibly finished or error)."),
            LifecycleState::Failed
        );
    }

    #[test]
    fn classify_prefers_explicit_status_over_message() {
        let payload = StatusPayload::new("running", "replay completed for batch 1");
        assert_eq!(
            classify(Some(&payload), &payload.display_message()),
            LifecycleState::Running
        );
    }

    #[test]
    fn classify_falls_back_to_message_when_status_blank() {
        let payload = StatusPayload {
            status: Some("  ".into()),
            message: Some("Replication success".into()),
            ..Default::default()
        };
        assert_eq!(
            classify(Some(&payload), &payload.display_message()),
            LifecycleState::Completed
        );
    }

    #[test]
    fn empty_payload_stays_pending() {
        let payload = StatusPayload::default();
        assert_eq!(payload.display_message(), UNKNOWN_STATUS_MESSAGE);
        assert_eq!(
            classify(Some(&payload), &payload.display_message()),
            LifecycleState::Pending
        );
    }

    #[test]
    fn explicit_unknown_status_is_soft() {
        let payload = StatusPayload::new("unknown", "");
        let state = classify(Some(&payload), &payload.display_message());
        assert_eq!(state, LifecycleState::Unknown);
        assert!(!state.is_terminal());
    }

    #[test]
    fn payload_decodes_full_service_entry() {
        let payload: StatusPayload = serde_json::from_str(
            r#"{
                "dest_host_id": "20011",
                "dest_host_name": "srv1",
                "status": "running",
                "message": "processing",
                "start_time": 1712000000.25,
                "first_history_timestamp": 1711990000,
                "item_mapping": {"23296": "41002"},
                "last_sent_index": {"23296": 17},
                "cycle_offset": 0,
                "progress": 0.0
            }"#,
        )
        .unwrap();
        assert_eq!(payload.start_time, Some(1712000000.25));
        assert_eq!(payload.dest_host_id.as_deref(), Some("20011"));
        assert_eq!(payload.progress, Some(serde_json::json!(0.0)));
        assert_eq!(
            classify(Some(&payload), &payload.display_message()),
            LifecycleState::Running
        );
    }

    #[test]
    fn payload_accepts_null_columns() {
        let payload: StatusPayload = serde_json::from_str(
            r#"{"dest_host_id":null,"dest_host_name":null,"status":"pending","message":"Initiated","start_time":null,"item_mapping":null,"progress":null}"#,
        )
        .unwrap();
        assert_eq!(payload.start_time, None);
        assert_eq!(payload.progress, None);
    }

    #[test]
    fn payload_deserializes_with_extra_fields() {
        let payload: StatusPayload = serde_json::from_str(
            r#"{"status":"running","message":"m","dest_host_name":"srv1","progress":42,"item_mapping":{}}"#,
        )
        .unwrap();
        assert_eq!(payload.status.as_deref(), Some("running"));
        assert_eq!(payload.dest_host_name.as_deref(), Some("srv1"));
        assert_eq!(payload.progress, Some(serde_json::json!(42)));
    }

    #[test]
    fn job_key_serializes_transparently() {
        let key = JobKey::from("10084");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"10084\"");
    }
}
