//! Server and remote-mirror configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::constants::{DEFAULT_BAN_COLLECTION, DEFAULT_SNAPSHOT_COLLECTION, LOG_CAPACITY};

/// Settings for the optional remote mirror
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote store (e.g. `https://xyz.example.co`)
    #[serde(default)]
    pub url: Option<String>,
    /// Credential sent as `apikey` and bearer token
    #[serde(default)]
    pub key: Option<String>,
    /// Collection receiving `{ip, time}` ban events
    #[serde(default = "default_ban_collection")]
    pub ban_collection: String,
    /// Collection receiving snapshot payloads from the save path
    #[serde(default = "default_snapshot_collection")]
    pub snapshot_collection: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ban_collection() -> String {
    DEFAULT_BAN_COLLECTION.to_string()
}

fn default_snapshot_collection() -> String {
    DEFAULT_SNAPSHOT_COLLECTION.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_capacity() -> usize {
    LOG_CAPACITY
}

fn default_addr() -> SocketAddr {
    ([0, 0, 0, 0], 3000).into()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl RemoteConfig {
    /// Local-only configuration
    pub fn disabled() -> Self {
        Self {
            url: None,
            key: None,
            ban_collection: default_ban_collection(),
            snapshot_collection: default_snapshot_collection(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_credentials(mut self, url: impl Into<String>, key: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.key = Some(key.into());
        self
    }

    /// Mirroring is active iff both URL and key are present and non-empty
    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }

    /// Trimmed `(url, key)` pair when mirroring is active
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.url)?, non_empty(&self.key)?))
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanwatchConfig {
    /// Listen address
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
    /// Maximum number of log entries kept in memory
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Remote mirror settings
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl BanwatchConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

impl Default for BanwatchConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            log_capacity: default_log_capacity(),
            remote: RemoteConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_requires_url_and_key() {
        assert!(!RemoteConfig::disabled().is_configured());

        let url_only = RemoteConfig {
            url: Some("https://remote.test".into()),
            ..RemoteConfig::disabled()
        };
        assert!(!url_only.is_configured());

        let blank_key = RemoteConfig::disabled().with_credentials("https://remote.test", "   ");
        assert!(!blank_key.is_configured());

        let full = RemoteConfig::disabled().with_credentials(" https://remote.test ", "secret");
        assert_eq!(full.credentials(), Some(("https://remote.test", "secret")));
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let config: BanwatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.log_capacity, LOG_CAPACITY);
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.remote.ban_collection, DEFAULT_BAN_COLLECTION);
        assert_eq!(config.remote.snapshot_collection, DEFAULT_SNAPSHOT_COLLECTION);
        assert!(!config.remote.is_configured());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("banwatch-config-{}.json", std::process::id()));
        let mut config = BanwatchConfig::default();
        config.log_capacity = 42;
        config.remote = RemoteConfig::disabled().with_credentials("https://remote.test", "k");
        config.save(&path).unwrap();

        let loaded = BanwatchConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.log_capacity, 42);
        assert!(loaded.remote.is_configured());
    }
}
