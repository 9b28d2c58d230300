//! Prometheus metrics for the banlist API
//!
//! Labels carry endpoint and outcome only, never the IP being checked.

use metrics::{counter, gauge, histogram};
use std::net::SocketAddr;
use std::time::Duration;

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_CLIENT_ERROR: &str = "client_error";
pub const OUTCOME_SERVER_ERROR: &str = "server_error";
pub const OUTCOME_REMOTE_ERROR: &str = "remote_error";

pub const KIND_BAN: &str = "ban";
pub const KIND_SNAPSHOT: &str = "snapshot";

pub fn record_request(endpoint: &str, outcome: &str, duration: Duration) {
    counter!("banwatch_requests_total", "endpoint" => endpoint.to_string(), "outcome" => outcome.to_string()).increment(1);
    histogram!("banwatch_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

pub fn record_check(blocked: bool) {
    let result = if blocked { "blocked" } else { "allowed" };
    counter!("banwatch_checks_total", "result" => result).increment(1);
}

pub fn record_mirror(kind: &str, outcome: &str) {
    counter!("banwatch_mirror_total", "kind" => kind.to_string(), "outcome" => outcome.to_string()).increment(1);
}

pub fn set_banlist_size(size: usize) {
    gauge!("banwatch_banlist_size").set(size as f64);
}

/// Map an HTTP status to an outcome label
pub fn outcome_for(status: u16) -> &'static str {
    match status {
        200..=399 => OUTCOME_OK,
        502 => OUTCOME_REMOTE_ERROR,
        400..=499 => OUTCOME_CLIENT_ERROR,
        _ => OUTCOME_SERVER_ERROR,
    }
}

/// Install the Prometheus recorder with its own scrape listener
pub fn init_prometheus_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_for() {
        assert_eq!(outcome_for(200), OUTCOME_OK);
        assert_eq!(outcome_for(400), OUTCOME_CLIENT_ERROR);
        assert_eq!(outcome_for(404), OUTCOME_CLIENT_ERROR);
        assert_eq!(outcome_for(500), OUTCOME_SERVER_ERROR);
        assert_eq!(outcome_for(502), OUTCOME_REMOTE_ERROR);
    }
}
