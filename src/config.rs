use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::error::{MonitorError, Result};
use crate::probe::DEFAULT_PROBE_TIMEOUT;
use crate::scheduler::DEFAULT_CHECK_INTERVAL;
use crate::sweep::DEFAULT_MAX_CONCURRENT_PROBES;

/// URL Status Checker - periodic HTTP liveness and latency probes
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Interface to bind the API server on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the API server on
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// Seconds between scheduled sweeps
    #[arg(long, env = "CHECK_INTERVAL_SECS", default_value_t = DEFAULT_CHECK_INTERVAL.as_secs())]
    pub check_interval_secs: u64,

    /// Per-request probe timeout in seconds
    #[arg(long, env = "PROBE_TIMEOUT_SECS", default_value_t = DEFAULT_PROBE_TIMEOUT.as_secs())]
    pub probe_timeout_secs: u64,

    /// Maximum probes in flight within one sweep
    #[arg(long, env = "MAX_CONCURRENT_PROBES", default_value_t = DEFAULT_MAX_CONCURRENT_PROBES)]
    pub max_concurrent_probes: usize,

    /// Directory served for the dashboard
    #[arg(long, env = "STATIC_DIR", default_value = "static")]
    pub static_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| MonitorError::InvalidAddress(format!("{}:{}: {e}", self.host, self.port)))
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}
