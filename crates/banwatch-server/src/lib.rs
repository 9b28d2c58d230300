//! banwatch-server: HTTP API over the in-memory banlist
//!
//! Dispatches on path prefix and method, mutates the shared store and
//! optionally mirrors ban events to a remote REST collection.

pub mod error;
pub mod metrics;
pub mod mirror;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, MirrorError, ServerError};
pub use mirror::{BanRecord, RemoteMirror};
pub use routes::{create_router, Endpoint, LogBody};
pub use server::{BanwatchServer, ServerBuilder};
pub use state::{create_shared_store, AppState, SharedStore};
