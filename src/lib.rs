//! banwatch: in-memory IP banlist API
//!
//! Re-exports the store crate and the HTTP layer.

pub use banwatch_core;
pub use banwatch_server;
