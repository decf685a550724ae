pub mod client;
pub mod error;

pub use client::{ApiClient, ReplicateResponse};
pub use error::ApiError;
pub use replicator_api;
pub use reqwest::StatusCode;
