//! Shared application state: the volatile store plus the optional mirror

use std::sync::Arc;

use banwatch_core::{BanwatchConfig, Store};
use tokio::task::JoinHandle;

use crate::error::MirrorError;
use crate::metrics;
use crate::mirror::{BanRecord, RemoteMirror};

/// Shared store type
pub type SharedStore = Arc<tokio::sync::RwLock<Store>>;

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Banlist, logs and counters
    pub store: SharedStore,
    /// Remote mirror, `None` in local-only mode
    pub mirror: Option<RemoteMirror>,
    /// Collection receiving ban events
    pub ban_collection: String,
    /// Collection receiving snapshot payloads
    pub snapshot_collection: String,
}

impl AppState {
    /// Build state from config. Fails only if the HTTP client cannot be built.
    pub fn from_config(config: &BanwatchConfig) -> Result<Self, MirrorError> {
        let mirror = RemoteMirror::from_config(&config.remote)?;
        Ok(Self {
            store: create_shared_store(config.log_capacity),
            mirror,
            ban_collection: config.remote.ban_collection.clone(),
            snapshot_collection: config.remote.snapshot_collection.clone(),
        })
    }

    /// Local-only state with default settings
    pub fn local() -> Self {
        let config = BanwatchConfig::default();
        Self {
            store: create_shared_store(config.log_capacity),
            mirror: None,
            ban_collection: config.remote.ban_collection,
            snapshot_collection: config.remote.snapshot_collection,
        }
    }

    pub fn remote_configured(&self) -> bool {
        self.mirror.is_some()
    }

    /// Fire-and-forget insert of a ban event.
    ///
    /// The returned handle may be dropped; the task keeps running and records
    /// any failure in the log buffer.
    pub fn spawn_ban_mirror(&self, ip: &str) -> Option<JoinHandle<()>> {
        let mirror = self.mirror.clone()?;
        let store = self.store.clone();
        let collection = self.ban_collection.clone();
        let record = BanRecord::now(ip);

        Some(tokio::spawn(async move {
            match mirror.insert(&collection, &record).await {
                Ok(_) => {
                    metrics::record_mirror(metrics::KIND_BAN, metrics::OUTCOME_OK);
                    tracing::debug!(ip = %record.ip, "Ban mirrored to remote");
                }
                Err(e) => {
                    metrics::record_mirror(metrics::KIND_BAN, metrics::OUTCOME_REMOTE_ERROR);
                    tracing::warn!(ip = %record.ip, error = %e, "Remote ban save failed");
                    store
                        .write()
                        .await
                        .append_log(format!("remote ban save failed: {}", e));
                }
            }
        }))
    }
}

/// Create an empty shared store
pub fn create_shared_store(log_capacity: usize) -> SharedStore {
    Arc::new(tokio::sync::RwLock::new(Store::with_log_capacity(log_capacity)))
}
