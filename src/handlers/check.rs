use axum::{extract::State, Json};
use std::sync::Arc;

use crate::sweep::{SweepResult, Trigger};
use crate::AppState;

// ─── GET /api/check ──────────────────────────────────────────────

/// Probe every target now. Per-target failures are reported inline;
/// this handler itself cannot fail.
pub async fn check_all(State(state): State<Arc<AppState>>) -> Json<SweepResult> {
    Json(state.monitor.sweep_all(Trigger::OnDemand).await)
}
