//! banwatch-server binary: banlist API
//!
//! Run with:
//! ```bash
//! cargo run -p banwatch-server -- --port 3000 --remote-url https://xyz.example.co --remote-key ...
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use banwatch_core::BanwatchConfig;
use banwatch_server::{metrics, ServerBuilder};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "banwatch-server")]
#[command(about = "In-memory IP banlist API with optional remote mirroring")]
struct Args {
    /// JSON config file; flags and env vars override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "BANWATCH_BIND")]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Remote store base URL
    #[arg(long, env = "REMOTE_URL")]
    remote_url: Option<String>,

    /// Remote store API key
    #[arg(long, env = "REMOTE_KEY", hide_env_values = true)]
    remote_key: Option<String>,

    /// Remote collection for ban events
    #[arg(long, env = "BAN_COLLECTION")]
    ban_collection: Option<String>,

    /// Remote collection for snapshot payloads
    #[arg(long, env = "SNAPSHOT_COLLECTION")]
    snapshot_collection: Option<String>,

    /// Maximum number of log entries kept in memory (minimum 1)
    #[arg(long, env = "LOG_CAPACITY")]
    log_capacity: Option<usize>,

    /// Remote request timeout in seconds
    #[arg(long, env = "REMOTE_TIMEOUT_SECS")]
    remote_timeout_secs: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(BanwatchConfig, Option<SocketAddr>)> {
        let mut config = match &self.config {
            Some(path) => BanwatchConfig::load(path)?,
            None => BanwatchConfig::default(),
        };

        if let Some(ip) = self.bind {
            config.addr.set_ip(ip);
        }
        if let Some(port) = self.port {
            config.addr.set_port(port);
        }
        if let Some(capacity) = self.log_capacity {
            config.log_capacity = capacity;
        }
        if self.remote_url.is_some() {
            config.remote.url = self.remote_url;
        }
        if self.remote_key.is_some() {
            config.remote.key = self.remote_key;
        }
        if let Some(collection) = self.ban_collection {
            config.remote.ban_collection = collection;
        }
        if let Some(collection) = self.snapshot_collection {
            config.remote.snapshot_collection = collection;
        }
        if let Some(secs) = self.remote_timeout_secs {
            config.remote.timeout_secs = secs;
        }

        anyhow::ensure!(config.log_capacity > 0, "log capacity must be at least 1");

        Ok((config, self.metrics_addr))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("banwatch_server=info".parse()?),
        )
        .init();

    let (config, metrics_addr) = Args::parse().into_config()?;

    if let Some(addr) = metrics_addr {
        metrics::init_prometheus_exporter(addr)?;
        tracing::info!(%addr, "Prometheus exporter listening");
    }

    let server = ServerBuilder::new(config).build()?;

    tracing::info!(
        addr = %server.addr(),
        remote = server.state().remote_configured(),
        "Server ready"
    );
    server.run().await?;

    Ok(())
}
