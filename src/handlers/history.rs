use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::probe::ProbeOutcome;
use crate::AppState;

/// Entries returned by `/api/history`
const HISTORY_WINDOW: usize = 20;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub recent_checks: Vec<ProbeOutcome>,
    /// Entries currently buffered, so never above the buffer capacity
    pub total_checks: usize,
    /// Probes recorded since startup
    pub lifetime_checks: u64,
    pub capacity: usize,
}

// ─── GET /api/history ────────────────────────────────────────────

pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryResponse> {
    let history = state.monitor.history();
    Json(HistoryResponse {
        recent_checks: history.recent(HISTORY_WINDOW),
        total_checks: history.len(),
        lifetime_checks: history.lifetime_count(),
        capacity: history.capacity(),
    })
}
