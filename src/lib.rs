//! URL Status Checker
//!
//! Periodically probes a fixed list of HTTP endpoints, records liveness
//! and latency, and serves the results over a JSON API plus a Prometheus
//! scrape endpoint.
//!
//! ```text
//!   Scheduler ──┐                  ┌──▶ MetricsAggregator ──▶ /api/metrics
//!               ├──▶ Monitor ──▶ Prober
//!  /api/check ──┘  (sweep_all)     └──▶ HistoryBuffer ─────▶ /api/history
//! ```

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod history;
pub mod metrics;
pub mod middleware;
pub mod probe;
pub mod scheduler;
pub mod server;
pub mod sweep;
pub mod targets;

#[cfg(test)]
mod testing;

pub use error::{MonitorError, Result};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Probe pipeline plus the metrics and history it feeds.
    pub monitor: Arc<sweep::Monitor>,
}
