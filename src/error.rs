use thiserror::Error;

/// Result alias used across the checker.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Faults internal to the checker itself.
///
/// A misbehaving monitored target never produces one of these: transport
/// and HTTP failures are captured inside `ProbeOutcome`.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Metric registration or exposition failed
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Exposition output was not valid UTF-8
    #[error("metrics exposition is not valid UTF-8: {0}")]
    MetricsEncoding(#[from] std::string::FromUtf8Error),

    /// The shared HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid target URL {url}: {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("duplicate target URL: {0}")]
    DuplicateTarget(String),

    #[error("invalid bind address: {0}")]
    InvalidAddress(String),

    /// Scheduler lifecycle misuse (e.g. starting twice)
    #[error("scheduler cannot go from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
