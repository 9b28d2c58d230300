//! banwatch-core: in-memory banlist state and configuration
//!
//! The [`Store`] holds everything the API mutates:
//! - Banlist: set of banned IP strings, insertion idempotent
//! - LogBuffer: newest-first timestamped log, capped at [`constants::LOG_CAPACITY`]
//! - Counters: `calls` and `blocked`, monotonically non-decreasing
//!
//! The store is ephemeral. A restart yields a fresh, empty store; the optional
//! remote mirror is best-effort and never authoritative.

mod config;
mod error;
mod store;

pub use config::{BanwatchConfig, RemoteConfig};
pub use error::Error;
pub use store::{now_iso8601, Banlist, Counters, LogBuffer, LogEntry, StatsSnapshot, Store};

pub type Result<T> = std::result::Result<T, Error>;

pub mod constants {
    /// Maximum number of log entries retained
    pub const LOG_CAPACITY: usize = 500;

    /// Remote collection for ban events
    pub const DEFAULT_BAN_COLLECTION: &str = "banlist";

    /// Remote collection for snapshot payloads
    pub const DEFAULT_SNAPSHOT_COLLECTION: &str = "snapshots";
}
