use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use replicator_api::*;

use crate::error::{ApiError, Result};

/// Result of `POST /api/replicate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicateResponse {
    /// A new replication task was created.
    Started(MessageResponse),
    /// `202 Accepted`: the host is already being (or has been) replicated.
    AlreadyRunning(MessageResponse),
}

/// Typed HTTP client for the replicator API.
///
/// One method per endpoint; every call returns the decoded body on success
/// or an [`ApiError`] describing the failure.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.client.get(self.url(path)).send().await?;
        parse_response(resp).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        parse_response(resp).await
    }

    // ── Configuration ─────────────────────────────────────────────────────

    pub async fn save_config(&self, fields: &ConfigFields) -> Result<MessageResponse> {
        self.post_json(CONFIG_PATH, fields).await
    }

    pub async fn source_hosts(&self) -> Result<Vec<HostSummary>> {
        self.get_json(SOURCE_HOSTS_PATH).await
    }

    // ── Replication ───────────────────────────────────────────────────────

    pub async fn replicate(&self, host_id: &str) -> Result<ReplicateResponse> {
        let req = ReplicateRequest {
            hostid: host_id.to_string(),
        };
        let resp = self
            .client
            .post(self.url(REPLICATE_PATH))
            .json(&req)
            .send()
            .await?;
        let already_running = resp.status() == StatusCode::ACCEPTED;
        let body: MessageResponse = parse_response(resp).await?;
        Ok(if already_running {
            ReplicateResponse::AlreadyRunning(body)
        } else {
            ReplicateResponse::Started(body)
        })
    }

    /// Status of every known replication task.
    pub async fn replay_status(&self) -> Result<StatusBatch> {
        self.get_json(REPLAY_STATUS_PATH).await
    }

    /// Status of a single task. The server answers 404 for unknown hosts.
    pub async fn replay_status_for(&self, host_id: &str) -> Result<StatusBatch> {
        let resp = self
            .client
            .get(self.url(REPLAY_STATUS_PATH))
            .query(&[("hostid", host_id)])
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Orphaned hosts ────────────────────────────────────────────────────

    pub async fn orphaned_hosts(&self) -> Result<Vec<OrphanCandidate>> {
        let resp: OrphanedHostsResponse = self.get_json(ORPHANED_HOSTS_PATH).await?;
        Ok(resp.into_candidates())
    }

    pub async fn relink_host(&self, req: &RelinkRequest) -> Result<MessageResponse> {
        self.post_json(RELINK_HOST_PATH, req).await
    }

    pub async fn rebuild_mapping(&self, source_host_id: &str) -> Result<MessageResponse> {
        let req = RebuildMappingRequest {
            source_host_id: source_host_id.to_string(),
        };
        self.post_json(REBUILD_MAPPING_PATH, &req).await
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or a server error carrying the `{error}` text.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let url = resp.url().path().to_string();
    let body = resp.text().await?;
    if !status.is_success() {
        debug!("{url} answered {status}: {body}");
        return Err(ApiError::from_status(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}
