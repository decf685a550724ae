use reqwest::StatusCode;

use replicator_api::ErrorResponse;

/// Failure of a single API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-2xx response. `message` is the server's `error` text when present,
    /// followed by any field names it reported as missing.
    #[error("{message}")]
    Server { status: StatusCode, message: String },
}

impl ApiError {
    /// Build a server error from a non-2xx status and its raw body.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
        let missing = parsed
            .as_ref()
            .map(|e| e.missing.join(", "))
            .unwrap_or_default();
        let mut message = parsed
            .and_then(|e| e.error)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        if !missing.is_empty() {
            message = format!("{message} (missing: {missing})");
        }
        Self::Server { status, message }
    }

    /// Network or malformed-body failures, as opposed to server refusals.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Decode(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Decode(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_uses_error_field_verbatim() {
        let err = ApiError::from_status(
            StatusCode::CONFLICT,
            r#"{"error":"Source host ID 5 is already linked to a different destination host ID 11."}"#,
        );
        assert_eq!(
            err.to_string(),
            "Source host ID 5 is already linked to a different destination host ID 11."
        );
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(!err.is_transport());
    }

    #[test]
    fn config_rejection_lists_missing_fields() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Missing required configuration fields","missing":["source_url","dest_token"],"message":"Please provide these fields or set them in .env: source_url, dest_token","has_form_values":false,"has_env_values":false}"#,
        );
        assert_eq!(
            err.to_string(),
            "Missing required configuration fields (missing: source_url, dest_token)"
        );
    }

    #[test]
    fn server_error_without_json_falls_back_to_status() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err.to_string(), "HTTP error! status: 502");
    }
}
