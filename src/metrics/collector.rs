use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use serde::Serialize;

use super::percentiles::PercentileSet;
use crate::error::Result;
use crate::probe::ProbeOutcome;

// ─── Configuration ───────────────────────────────────────────────

/// Response-time buckets (seconds) for the exposition histogram
const RESPONSE_TIME_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// HdrHistogram range: 1 μs → 60 s, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 60_000_000;
const HIST_SIGFIG: u8 = 3;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe per-target probe metrics.
///
/// Every instance owns its own `prometheus::Registry`, so building one per
/// test (or several concurrently) never trips duplicate registration.
/// The sweep calls `record()`, `/api/metrics` calls `encode()`.
pub struct MetricsAggregator {
    registry: Registry,
    checks: IntCounterVec,
    response_time: HistogramVec,
    status_code: IntGaugeVec,
    up: IntGaugeVec,
    // Also serializes `record()` so a scrape never sees half an update
    latency: Mutex<BTreeMap<String, Histogram<u64>>>,
}

/// Latency percentiles for one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetLatency {
    pub url: String,
    pub latency_us: PercentileSet,
}

// ─── MetricsAggregator impl ──────────────────────────────────────

impl MetricsAggregator {
    /// Build and register all four metric families. Fails only on a
    /// malformed metric definition, which is fatal at startup.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let checks = IntCounterVec::new(
            Opts::new("url_check_total", "Total number of URL checks"),
            &["url", "status_code"],
        )?;
        let response_time = HistogramVec::new(
            HistogramOpts::new("url_response_time_seconds", "URL response time in seconds")
                .buckets(RESPONSE_TIME_BUCKETS.to_vec()),
            &["url"],
        )?;
        let status_code = IntGaugeVec::new(
            Opts::new("url_status_code", "Current status code of URL"),
            &["url"],
        )?;
        let up = IntGaugeVec::new(Opts::new("url_up", "URL is up (1) or down (0)"), &["url"])?;

        registry.register(Box::new(checks.clone()))?;
        registry.register(Box::new(response_time.clone()))?;
        registry.register(Box::new(status_code.clone()))?;
        registry.register(Box::new(up.clone()))?;

        Ok(Self {
            registry,
            checks,
            response_time,
            status_code,
            up,
            latency: Mutex::new(BTreeMap::new()),
        })
    }

    /// Record one probe outcome. Each call counts as one real probe.
    pub fn record(&self, outcome: &ProbeOutcome) {
        let url = outcome.url.as_str();
        let bucket = outcome.status_bucket();
        let mut latency = self.latency.lock();

        self.checks.with_label_values(&[url, bucket.as_str()]).inc();
        self.response_time
            .with_label_values(&[url])
            .observe(outcome.elapsed.as_secs_f64());
        self.status_code
            .with_label_values(&[url])
            .set(i64::from(outcome.status_code));
        self.up
            .with_label_values(&[url])
            .set(i64::from(outcome.success));

        // Clamp to ≥ 1 μs, saturate at the histogram ceiling
        let micros = (outcome.elapsed.as_micros() as u64).clamp(HIST_LOW, HIST_HIGH);
        let hist = match latency.entry(outcome.url.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                match Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG) {
                    Ok(h) => e.insert(h),
                    Err(err) => {
                        tracing::error!(error = %err, "latency histogram creation failed");
                        return;
                    }
                }
            }
        };
        let _ = hist.record(micros);
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn encode(&self) -> Result<String> {
        // Hold the record lock so the snapshot is never mid-update
        let _guard = self.latency.lock();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Content type matching `encode()` output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Per-target percentile breakdown, sorted by URL.
    pub fn latency_snapshot(&self) -> Vec<TargetLatency> {
        self.latency
            .lock()
            .iter()
            .map(|(url, hist)| TargetLatency {
                url: url.clone(),
                latency_us: PercentileSet::from_histogram(hist),
            })
            .collect()
    }
}

#[cfg(test)]
impl MetricsAggregator {
    pub fn check_count(&self, url: &str, bucket: &str) -> u64 {
        self.checks.with_label_values(&[url, bucket]).get()
    }

    pub fn up_value(&self, url: &str) -> i64 {
        self.up.with_label_values(&[url]).get()
    }

    pub fn status_value(&self, url: &str) -> i64 {
        self.status_code.with_label_values(&[url]).get()
    }

    pub fn sample_count(&self, url: &str) -> u64 {
        self.response_time.with_label_values(&[url]).get_sample_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn up(url: &str, ms: u64) -> ProbeOutcome {
        ProbeOutcome::from_status(url, 200, Duration::from_millis(ms))
    }

    #[test]
    fn record_updates_all_four_families() {
        let metrics = MetricsAggregator::new().unwrap();
        metrics.record(&up("http://a", 120));
        metrics.record(&ProbeOutcome::from_status("http://a", 503, Duration::from_millis(80)));

        assert_eq!(metrics.check_count("http://a", "200"), 1);
        assert_eq!(metrics.check_count("http://a", "503"), 1);
        assert_eq!(metrics.sample_count("http://a"), 2);
        assert_eq!(metrics.status_value("http://a"), 503);
        assert_eq!(metrics.up_value("http://a"), 0);
    }

    #[test]
    fn network_errors_use_error_bucket() {
        let metrics = MetricsAggregator::new().unwrap();
        metrics.record(&ProbeOutcome::from_failure(
            "http://b",
            "ConnectionError",
            "refused",
            Duration::from_millis(3),
        ));

        assert_eq!(metrics.check_count("http://b", "error"), 1);
        assert_eq!(metrics.check_count("http://b", "0"), 0);
        assert_eq!(metrics.status_value("http://b"), 0);
        assert_eq!(metrics.up_value("http://b"), 0);
    }

    #[test]
    fn exposition_contains_recorded_series() {
        let metrics = MetricsAggregator::new().unwrap();
        metrics.record(&up("http://a", 40));

        let text = metrics.encode().unwrap();
        assert!(text.contains("# TYPE url_check_total counter"));
        assert!(text.contains("# TYPE url_response_time_seconds histogram"));
        assert!(text.contains("# TYPE url_status_code gauge"));
        assert!(text.contains("# TYPE url_up gauge"));
        assert!(text.contains("url_up{url=\"http://a\"} 1"));
        assert!(text.contains("url_status_code{url=\"http://a\"} 200"));
        assert!(text.contains("url_response_time_seconds_count{url=\"http://a\"} 1"));
        assert!(metrics.content_type().starts_with("text/plain"));
    }

    #[test]
    fn independent_instances_build_concurrently() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(MetricsAggregator::new))
            .collect();

        for h in handles {
            let metrics = h.join().unwrap().unwrap();
            metrics.record(&up("http://a", 10));
            let families = metrics.registry.gather();
            assert_eq!(families.len(), 4);
            assert_eq!(metrics.check_count("http://a", "200"), 1);
        }
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let metrics = Arc::new(MetricsAggregator::new().unwrap());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    let url = format!("http://t{i}");
                    for _ in 0..100 {
                        metrics.record(&up(&url, 5));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for i in 0..16 {
            let url = format!("http://t{i}");
            assert_eq!(metrics.check_count(&url, "200"), 100);
            assert_eq!(metrics.sample_count(&url), 100);
        }
        let snapshot = metrics.latency_snapshot();
        assert_eq!(snapshot.len(), 16);
        assert!(snapshot.iter().all(|t| t.latency_us.count == 100));
    }

    #[test]
    fn latency_snapshot_reports_percentiles() {
        let metrics = MetricsAggregator::new().unwrap();
        for ms in [10, 20, 30, 40, 1000] {
            metrics.record(&up("http://a", ms));
        }

        let snapshot = metrics.latency_snapshot();
        assert_eq!(snapshot.len(), 1);
        let set = &snapshot[0].latency_us;
        assert_eq!(set.count, 5);
        assert!(set.min >= 9_990 && set.min <= 10_010);
        assert!(set.max >= 999_000);
        assert!(set.p50 >= 29_000 && set.p50 <= 31_000);
    }
}
