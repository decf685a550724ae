use std::future::Future;

use replicator_api::{
    ConfigFields, HostSummary, MessageResponse, OrphanCandidate, RelinkRequest, StatusBatch,
};
use replicator_api_client::{ApiClient, ApiError, ReplicateResponse};

/// The replicator service as seen by the engine.
///
/// [`ApiClient`] is the production implementation; tests drive the engine
/// with an in-process fake.
pub trait ReplicationBackend: Send + Sync + 'static {
    fn save_config(
        &self,
        fields: &ConfigFields,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;

    fn source_hosts(&self) -> impl Future<Output = Result<Vec<HostSummary>, ApiError>> + Send;

    fn replicate(
        &self,
        host_id: &str,
    ) -> impl Future<Output = Result<ReplicateResponse, ApiError>> + Send;

    fn replay_status(&self) -> impl Future<Output = Result<StatusBatch, ApiError>> + Send;

    fn replay_status_for(
        &self,
        host_id: &str,
    ) -> impl Future<Output = Result<StatusBatch, ApiError>> + Send;

    fn orphaned_hosts(
        &self,
    ) -> impl Future<Output = Result<Vec<OrphanCandidate>, ApiError>> + Send;

    fn relink_host(
        &self,
        req: &RelinkRequest,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;

    fn rebuild_mapping(
        &self,
        source_host_id: &str,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send;
}

impl ReplicationBackend for ApiClient {
    fn save_config(
        &self,
        fields: &ConfigFields,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send {
        ApiClient::save_config(self, fields)
    }

    fn source_hosts(&self) -> impl Future<Output = Result<Vec<HostSummary>, ApiError>> + Send {
        ApiClient::source_hosts(self)
    }

    fn replicate(
        &self,
        host_id: &str,
    ) -> impl Future<Output = Result<ReplicateResponse, ApiError>> + Send {
        ApiClient::replicate(self, host_id)
    }

    fn replay_status(&self) -> impl Future<Output = Result<StatusBatch, ApiError>> + Send {
        ApiClient::replay_status(self)
    }

    fn replay_status_for(
        &self,
        host_id: &str,
    ) -> impl Future<Output = Result<StatusBatch, ApiError>> + Send {
        ApiClient::replay_status_for(self, host_id)
    }

    fn orphaned_hosts(
        &self,
    ) -> impl Future<Output = Result<Vec<OrphanCandidate>, ApiError>> + Send {
        ApiClient::orphaned_hosts(self)
    }

    fn relink_host(
        &self,
        req: &RelinkRequest,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send {
        ApiClient::relink_host(self, req)
    }

    fn rebuild_mapping(
        &self,
        source_host_id: &str,
    ) -> impl Future<Output = Result<MessageResponse, ApiError>> + Send {
        ApiClient::rebuild_mapping(self, source_host_id)
    }
}
