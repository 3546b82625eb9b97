use std::error::Error as _;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::error::{MonitorError, Result};
use crate::targets::Target;

// ─── Configuration ───────────────────────────────────────────────

/// Identifying header sent with every probe.
const PROBE_USER_AGENT: &str = "URL-Monitor-Bot/1.0";

/// Per-request timeout when none is configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Status code recorded when no HTTP response was obtained.
pub const NETWORK_ERROR_STATUS: u16 = 0;

/// Wire format for every timestamp the API emits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Outcome ─────────────────────────────────────────────────────

/// The recorded result of one probe. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    pub url: String,
    /// HTTP status, or `NETWORK_ERROR_STATUS` when the request failed
    pub status_code: u16,
    /// Seconds, rounded to milliseconds
    pub response_time: f64,
    /// Unrounded wall time, used for metric observations
    #[serde(skip)]
    pub elapsed: Duration,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// Outcome for a request that produced an HTTP status.
    pub fn from_status(url: impl Into<String>, status_code: u16, elapsed: Duration) -> Self {
        let success = is_up(status_code);
        Self {
            url: url.into(),
            status_code,
            response_time: round_millis(elapsed),
            elapsed,
            timestamp: Local::now(),
            success,
            message: if success { "UP" } else { "DOWN" }.into(),
            error: None,
        }
    }

    /// Outcome for a request that failed before yielding a status.
    pub fn from_failure(
        url: impl Into<String>,
        kind: &str,
        detail: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            status_code: NETWORK_ERROR_STATUS,
            response_time: round_millis(elapsed),
            elapsed,
            timestamp: Local::now(),
            success: false,
            message: format!("Error: {kind}"),
            error: Some(detail.into()),
        }
    }

    /// Label used for the per-status check counter.
    pub fn status_bucket(&self) -> String {
        if self.error.is_some() {
            "error".into()
        } else {
            self.status_code.to_string()
        }
    }
}

/// 2xx and 3xx count as up.
pub fn is_up(status_code: u16) -> bool {
    (200..400).contains(&status_code)
}

fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn serialize_timestamp<S: Serializer>(
    ts: &DateTime<Local>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

// ─── Prober ──────────────────────────────────────────────────────

/// Performs single HTTP GET checks. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::from_builder(reqwest::Client::builder(), timeout)
    }

    /// Ignores proxy environment variables so loopback targets are reached directly.
    #[cfg(test)]
    pub fn without_proxy(timeout: Duration) -> Result<Self> {
        Self::from_builder(reqwest::Client::builder().no_proxy(), timeout)
    }

    fn from_builder(builder: reqwest::ClientBuilder, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(PROBE_USER_AGENT));

        let client = builder
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(MonitorError::HttpClient)?;

        Ok(Self { client })
    }

    /// Probe one target. Every failure mode is folded into the outcome.
    pub async fn probe(&self, target: &Target) -> ProbeOutcome {
        let t0 = Instant::now();
        let result = self.fetch(&target.url).await;
        let elapsed = t0.elapsed();

        let outcome = match result {
            Ok(status) => ProbeOutcome::from_status(&target.url, status, elapsed),
            Err(e) => {
                ProbeOutcome::from_failure(&target.url, error_kind(&e), error_chain(&e), elapsed)
            }
        };

        if outcome.success {
            info!(
                url = %outcome.url,
                category = %target.category,
                status_code = outcome.status_code,
                response_time = outcome.response_time,
                "target up"
            );
        } else {
            warn!(
                url = %outcome.url,
                category = %target.category,
                status_code = outcome.status_code,
                response_time = outcome.response_time,
                message = %outcome.message,
                "target down"
            );
        }

        outcome
    }

    /// Send the request and drain the body; the status is only trusted
    /// once the whole response has arrived.
    async fn fetch(&self, url: &str) -> std::result::Result<u16, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        response.bytes().await?;
        Ok(status)
    }
}

/// Short name for the kind of transport failure.
fn error_kind(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "Timeout"
    } else if err.is_connect() {
        "ConnectionError"
    } else if err.is_redirect() {
        "TooManyRedirects"
    } else if err.is_builder() {
        "InvalidURL"
    } else if err.is_body() || err.is_decode() {
        "ContentDecodingError"
    } else if err.is_request() {
        "RequestError"
    } else {
        "RequestException"
    }
}

/// reqwest's Display stops at the outermost layer; walk the sources.
fn error_chain(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
