//! Runtime configuration for the replicator console.
//!
//! Persisted as `replicator.toml` under `~/.config/zabbix-replicator/`. Every
//! field has a default so a missing file or a partial file both load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "replicator.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplicatorConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub zabbix: ZabbixSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Base URL of the replicator service (without the `/api` suffix).
    #[serde(default = "default_server_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Consecutive status responses a tracked job may be missing from before
    /// it is treated as finished. `0` drops it on the first omission.
    #[serde(default)]
    pub missing_grace_polls: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            missing_grace_polls: 0,
        }
    }
}

/// Zabbix connection details pushed to the service with `POST /api/config`.
/// Empty values are omitted so the service's own defaults apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZabbixSettings {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub source_token: String,
    #[serde(default)]
    pub dest_url: String,
    #[serde(default)]
    pub dest_token: String,
    #[serde(default)]
    pub dest_trapper_host: String,
    #[serde(default = "default_trapper_port")]
    pub dest_trapper_port: u16,
}

impl Default for ZabbixSettings {
    fn default() -> Self {
        Self {
            source_url: String::new(),
            source_token: String::new(),
            dest_url: String::new(),
            dest_token: String::new(),
            dest_trapper_host: String::new(),
            dest_trapper_port: default_trapper_port(),
        }
    }
}

impl ZabbixSettings {
    /// Flat key/value body for the service's configuration endpoint.
    pub fn to_config_fields(&self) -> BTreeMap<String, serde_json::Value> {
        let strings = [
            ("source_url", &self.source_url),
            ("source_token", &self.source_token),
            ("dest_url", &self.dest_url),
            ("dest_token", &self.dest_token),
            ("dest_trapper_host", &self.dest_trapper_host),
        ];
        let mut fields: BTreeMap<String, serde_json::Value> = strings
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(v.trim())))
            .collect();
        fields.insert(
            "dest_trapper_port".to_string(),
            serde_json::Value::from(self.dest_trapper_port),
        );
        fields
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_interval_secs() -> u64 {
    5
}
fn default_trapper_port() -> u16 {
    10051
}

// ── Paths and persistence ───────────────────────────────────────────────

/// Get the config directory path (~/.config/zabbix-replicator/)
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(".config").join("zabbix-replicator"))
}

/// Canonical config file path.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load config from the canonical path, falling back to defaults.
pub fn load_config() -> Result<ReplicatorConfig> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<ReplicatorConfig> {
    if !path.exists() {
        return Ok(ReplicatorConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let config: ReplicatorConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config at {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &ReplicatorConfig) -> Result<PathBuf> {
    let path = config_path()?;
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &ReplicatorConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config at {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = ReplicatorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("url = \"http://localhost:5000\""));
        assert!(toml_str.contains("interval_secs = 5"));
        assert!(toml_str.contains("missing_grace_polls = 0"));
        assert!(toml_str.contains("dest_trapper_port = 10051"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ReplicatorConfig = toml::from_str(
            r#"
[polling]
missing_grace_polls = 2
"#,
        )
        .unwrap();
        assert_eq!(config.polling.missing_grace_polls, 2);
        assert_eq!(config.polling.interval_secs, 5);
        assert_eq!(config.server.timeout_secs, 30);
    }

    #[test]
    fn config_fields_skip_blank_values() {
        let zabbix = ZabbixSettings {
            source_url: "https://zbx-src/api_jsonrpc.php".into(),
            source_token: "  ".into(),
            dest_trapper_port: 10052,
            ..Default::default()
        };
        let fields = zabbix.to_config_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["source_url"], "https://zbx-src/api_jsonrpc.php");
        assert_eq!(fields["dest_trapper_port"], 10052);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut config = ReplicatorConfig::default();
        config.server.url = "http://replicator:5000".into();
        config.polling.interval_secs = 10;

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.server.url, "http://replicator:5000");
        assert_eq!(loaded.polling.interval_secs, 10);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(loaded.server.url, "http://localhost:5000");
    }
}
