//! Wire types for the Zabbix replicator HTTP API.
//!
//! This crate is the single source of truth for request/response shapes used
//! by the client. Status and orphan payloads are the tracking types from
//! `replicator-core`, re-exported here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use replicator_core::{JobKey, OrphanCandidate, StatusBatch, StatusPayload};

// ─── Paths ───────────────────────────────────────────────────────────────────

pub const CONFIG_PATH: &str = "/config";
pub const SOURCE_HOSTS_PATH: &str = "/source/hosts";
pub const REPLICATE_PATH: &str = "/replicate";
pub const REPLAY_STATUS_PATH: &str = "/replay/status";
pub const ORPHANED_HOSTS_PATH: &str = "/orphaned_hosts";
pub const RELINK_HOST_PATH: &str = "/relink_host";
pub const REBUILD_MAPPING_PATH: &str = "/rebuild_mapping";

// ─── Shared responses ────────────────────────────────────────────────────────

/// `{ "message": "..." }` returned by most successful calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    /// Server message, or `fallback` when absent or empty.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// JSON error shape `{ "error": "..." }` returned by failing calls.
///
/// Configuration validation failures also list the missing field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Flat key/value body for `POST /api/config`.
pub type ConfigFields = BTreeMap<String, serde_json::Value>;

// ─── Source hosts ────────────────────────────────────────────────────────────

/// Zabbix interface type `1` is the agent interface.
const AGENT_INTERFACE_TYPE: &str = "1";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostInterface {
    #[serde(rename = "type", default)]
    pub interface_type: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub dns: Option<String>,
}

/// One entry of `GET /api/source/hosts`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostSummary {
    pub hostid: String,
    pub name: String,
    #[serde(default)]
    pub interfaces: Vec<HostInterface>,
}

impl HostSummary {
    /// Interface shown next to the host name: the first non-agent interface,
    /// otherwise the first one.
    pub fn primary_interface(&self) -> Option<&HostInterface> {
        self.interfaces
            .iter()
            .find(|i| i.interface_type != AGENT_INTERFACE_TYPE)
            .or_else(|| self.interfaces.first())
    }

    /// `name (address)`, or just `name` for hosts without interfaces.
    pub fn display_label(&self) -> String {
        match self.primary_interface() {
            Some(iface) => {
                let address = [iface.ip.as_deref(), iface.dns.as_deref()]
                    .into_iter()
                    .flatten()
                    .find(|a| !a.is_empty())
                    .unwrap_or("N/A");
                format!("{} ({address})", self.name)
            }
            None => self.name.clone(),
        }
    }
}

// ─── Replication ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicateRequest {
    pub hostid: String,
}

// ─── Orphaned hosts ──────────────────────────────────────────────────────────

/// `GET /api/orphaned_hosts` answers with a list, or with `{ "message" }`
/// when the destination has no cloned-host group at all.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OrphanedHostsResponse {
    Hosts(Vec<OrphanCandidate>),
    Notice(MessageResponse),
}

impl OrphanedHostsResponse {
    pub fn into_candidates(self) -> Vec<OrphanCandidate> {
        match self {
            Self::Hosts(hosts) => hosts,
            Self::Notice(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelinkRequest {
    pub dest_host_id: String,
    pub source_host_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RebuildMappingRequest {
    pub source_host_id: String,
}
