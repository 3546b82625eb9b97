use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::collector::TargetLatency;
use crate::handlers::AppError;
use crate::AppState;

/// Push cadence for `/api/stats/stream`
const STATS_PUSH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub sweeps_completed: u64,
    pub targets: Vec<TargetLatency>,
}

fn snapshot(state: &AppState) -> StatsSnapshot {
    StatsSnapshot {
        sweeps_completed: state.monitor.sweeps_completed(),
        targets: state.monitor.metrics().latency_snapshot(),
    }
}

// ─── GET /api/metrics ────────────────────────────────────────────
/// Prometheus text exposition for scrapers.

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let metrics = state.monitor.metrics();
    let body = metrics.encode()?;
    Ok(([(CONTENT_TYPE, metrics.content_type())], body))
}

// ─── GET /api/stats ──────────────────────────────────────────────

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(snapshot(&state))
}

// ─── GET /api/stats/stream ───────────────────────────────────────
/// Server-Sent Events: one `StatsSnapshot` as JSON every 5 s.

pub async fn stats_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(STATS_PUSH_INTERVAL);

    let stream = IntervalStream::new(interval).map(move |_| {
        let json = serde_json::to_string(&snapshot(&state)).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
