use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{error, info, warn};

use crate::history::HistoryBuffer;
use crate::metrics::MetricsAggregator;
use crate::probe::{serialize_timestamp, ProbeOutcome, Prober};
use crate::targets::TargetRegistry;

/// Default cap on in-flight probes within one sweep
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 8;

// ─── Public types ────────────────────────────────────────────────

/// What started a sweep; only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    OnDemand,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::OnDemand => "on-demand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepSummary {
    pub total_urls_checked: usize,
    pub successful: usize,
    pub failed: usize,
    pub uptime_percentage: f64,
}

impl SweepSummary {
    pub fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        let total = outcomes.len();
        let successful = outcomes.iter().filter(|o| o.success).count();
        let uptime_percentage = if total == 0 {
            0.0
        } else {
            (successful as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };

        Self {
            total_urls_checked: total,
            successful,
            failed: total - successful,
            uptime_percentage,
        }
    }
}

/// One full pass over the registry, in registry order. Not retained.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub summary: SweepSummary,
    pub results: Vec<ProbeOutcome>,
}

/// Probes the registry and feeds outcomes into the shared metrics and
/// history. Shared by the scheduler and the `/api/check` handler.
pub struct Monitor {
    ctx: SweepContext,
}

/// Everything a sweep touches. Cloned into the task that runs it.
#[derive(Clone)]
struct SweepContext {
    registry: Arc<TargetRegistry>,
    prober: Prober,
    metrics: Arc<MetricsAggregator>,
    history: Arc<HistoryBuffer>,
    max_concurrency: usize,
    sweeps_completed: Arc<AtomicU64>,
}

/// `message` kind for a target whose probe task died before reporting
const TASK_FAILED_KIND: &str = "TaskFailed";

// ─── Monitor impl ────────────────────────────────────────────────

impl Monitor {
    pub fn new(
        registry: Arc<TargetRegistry>,
        prober: Prober,
        metrics: Arc<MetricsAggregator>,
        history: Arc<HistoryBuffer>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            ctx: SweepContext {
                registry,
                prober,
                metrics,
                history,
                max_concurrency: max_concurrency.max(1),
                sweeps_completed: Arc::new(AtomicU64::new(0)),
            },
        }
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.ctx.registry
    }

    pub fn metrics(&self) -> &MetricsAggregator {
        &self.ctx.metrics
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.ctx.history
    }

    pub fn sweeps_completed(&self) -> u64 {
        self.ctx.sweeps_completed.load(Ordering::Relaxed)
    }

    /// Probe every target once, at most `max_concurrency` at a time.
    ///
    /// Each outcome reaches metrics and history as soon as its probe
    /// finishes; the returned results are re-ordered to registry order.
    /// The sweep runs on its own task: dropping this future detaches it,
    /// and every probe still completes and is recorded.
    pub async fn sweep_all(&self, trigger: Trigger) -> SweepResult {
        if self.ctx.registry.is_empty() {
            warn!(trigger = trigger.as_str(), "sweep with an empty target registry");
        }

        match tokio::spawn(self.ctx.clone().run(trigger)).await {
            Ok(result) => result,
            Err(e) => {
                // Only reachable while the runtime shuts down
                error!(trigger = trigger.as_str(), error = %e, "sweep task failed");
                let detail = e.to_string();
                let results: Vec<ProbeOutcome> = self
                    .ctx
                    .registry
                    .iter()
                    .map(|t| task_failure(&t.url, &detail))
                    .collect();
                SweepResult {
                    timestamp: Local::now(),
                    summary: SweepSummary::from_outcomes(&results),
                    results,
                }
            }
        }
    }
}

// ─── Sweep task ──────────────────────────────────────────────────

impl SweepContext {
    async fn run(self, trigger: Trigger) -> SweepResult {
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut slot_of = HashMap::with_capacity(self.registry.len());

        for (idx, target) in self.registry.iter().enumerate() {
            let target = target.clone();
            let prober = self.prober.clone();
            let metrics = self.metrics.clone();
            let history = self.history.clone();
            let permits = permits.clone();

            let handle = tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                let outcome = prober.probe(&target).await;
                metrics.record(&outcome);
                history.append(outcome.clone());
                outcome
            });
            slot_of.insert(handle.id(), idx);
        }

        let results =
            collect_in_order(&self.registry, tasks, &slot_of, &self.metrics, &self.history).await;
        let summary = SweepSummary::from_outcomes(&results);
        self.sweeps_completed.fetch_add(1, Ordering::Relaxed);

        info!(
            trigger = trigger.as_str(),
            successful = summary.successful,
            total = summary.total_urls_checked,
            uptime = summary.uptime_percentage,
            "sweep completed"
        );

        SweepResult {
            timestamp: Local::now(),
            summary,
            results,
        }
    }
}

/// Join every probe task and lay the outcomes out in registry order.
///
/// A task that panicked leaves no outcome of its own; its target gets a
/// `TaskFailed` outcome, recorded like any other, so a sweep always
/// reports exactly one outcome per target.
async fn collect_in_order(
    registry: &TargetRegistry,
    mut tasks: JoinSet<ProbeOutcome>,
    slot_of: &HashMap<task::Id, usize>,
    metrics: &MetricsAggregator,
    history: &HistoryBuffer,
) -> Vec<ProbeOutcome> {
    let mut slots: Vec<Option<ProbeOutcome>> = vec![None; registry.len()];
    let mut failures: HashMap<usize, String> = HashMap::new();

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => {
                if let Some(&idx) = slot_of.get(&id) {
                    slots[idx] = Some(outcome);
                }
            }
            Err(e) => {
                error!(error = %e, "probe task failed");
                if let Some(&idx) = slot_of.get(&e.id()) {
                    failures.insert(idx, e.to_string());
                }
            }
        }
    }

    registry
        .iter()
        .zip(slots)
        .enumerate()
        .map(|(idx, (target, slot))| {
            slot.unwrap_or_else(|| {
                let detail = failures
                    .remove(&idx)
                    .unwrap_or_else(|| "task ended without an outcome".into());
                let outcome = task_failure(&target.url, &detail);
                metrics.record(&outcome);
                history.append(outcome.clone());
                outcome
            })
        })
        .collect()
}

fn task_failure(url: &str, detail: &str) -> ProbeOutcome {
    ProbeOutcome::from_failure(url, TASK_FAILED_KIND, detail, Duration::ZERO)
}
