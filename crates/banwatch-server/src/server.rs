//! Banlist API server

use std::net::SocketAddr;

use banwatch_core::{BanwatchConfig, RemoteConfig};
use tokio::net::TcpListener;

use crate::error::{Result, ServerError};
use crate::routes::create_router;
use crate::state::AppState;

/// Banlist API server
pub struct BanwatchServer {
    state: AppState,
    addr: SocketAddr,
}

impl BanwatchServer {
    /// Create a new server with the given configuration
    pub fn new(config: &BanwatchConfig) -> Result<Self> {
        let state = AppState::from_config(config)?;
        Ok(Self {
            state,
            addr: config.addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the server until the process is stopped
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let router = create_router(self.state);

        tracing::info!("Starting banlist API on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Get the server state for testing
    pub fn state(&self) -> AppState {
        self.state.clone()
    }
}

/// Builder for BanwatchServer
pub struct ServerBuilder {
    config: BanwatchConfig,
}

impl ServerBuilder {
    pub fn new(config: BanwatchConfig) -> Self {
        Self { config }
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.config.addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.addr.set_port(port);
        self
    }

    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.config.log_capacity = capacity;
        self
    }

    pub fn remote(mut self, remote: RemoteConfig) -> Self {
        self.config.remote = remote;
        self
    }

    pub fn build(self) -> Result<BanwatchServer> {
        if !self.config.remote.is_configured() {
            tracing::info!("No remote configured, running in local-only mode");
        }
        BanwatchServer::new(&self.config)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new(BanwatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let server = ServerBuilder::default()
            .addr(([127, 0, 0, 1], 0).into())
            .port(4100)
            .log_capacity(10)
            .build()
            .unwrap();

        assert_eq!(server.addr(), SocketAddr::from(([127, 0, 0, 1], 4100)));
        assert!(!server.state().remote_configured());
    }

    #[test]
    fn test_builder_with_remote() {
        let remote = RemoteConfig::disabled().with_credentials("https://remote.test", "key");
        let server = ServerBuilder::default().remote(remote).build().unwrap();
        assert!(server.state().remote_configured());
    }
}
