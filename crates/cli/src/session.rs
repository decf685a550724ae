use anyhow::{Context, Result};
use std::time::Duration;

use replicator_api_client::ApiClient;
use replicator_engine::{Tracker, TrackerSettings};
use replicator_runtime_config::{ReplicatorConfig, load_config};

/// Loaded configuration plus a tracker bound to the configured service.
pub struct Session {
    pub config: ReplicatorConfig,
    pub tracker: Tracker<ApiClient>,
}

impl Session {
    pub fn open(server: Option<&str>) -> Result<Self> {
        let mut config = load_config()?;
        if let Some(url) = server {
            config.server.url = url.to_string();
        }
        Self::with_config(config)
    }

    pub fn with_config(config: ReplicatorConfig) -> Result<Self> {
        let client = ApiClient::new(
            &config.server.url,
            Duration::from_secs(config.server.timeout_secs),
        )
        .with_context(|| format!("Failed to create client for {}", config.server.url))?;
        let tracker = Tracker::new(client, tracker_settings(&config));
        Ok(Self { config, tracker })
    }
}

pub fn tracker_settings(config: &ReplicatorConfig) -> TrackerSettings {
    TrackerSettings {
        poll_interval: Duration::from_secs(config.polling.interval_secs.max(1)),
        missing_grace_polls: config.polling.missing_grace_polls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_polling_section() {
        let mut config = ReplicatorConfig::default();
        config.polling.interval_secs = 10;
        config.polling.missing_grace_polls = 2;

        let settings = tracker_settings(&config);

        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(settings.missing_grace_polls, 2);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut config = ReplicatorConfig::default();
        config.polling.interval_secs = 0;
        assert_eq!(
            tracker_settings(&config).poll_interval,
            Duration::from_secs(1)
        );
    }
}
