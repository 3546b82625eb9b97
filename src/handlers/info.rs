use axum::{extract::State, Json};
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::probe::format_timestamp;
use crate::AppState;

const SERVICE_NAME: &str = "URL Status Checker";

#[derive(Debug, Serialize)]
pub struct UrlsResponse {
    pub monitored_urls: Vec<String>,
    pub total_urls: usize,
}

// ─── GET /api ────────────────────────────────────────────────────

pub async fn api_info() -> Json<Value> {
    Json(json!({
        "message": format!("{SERVICE_NAME} API"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/": "Dashboard frontend",
            "/api": "This information page",
            "/api/check": "Check all URLs once and return results",
            "/api/metrics": "Prometheus metrics (for monitoring)",
            "/api/health": "Health check endpoint",
            "/api/urls": "List of monitored URLs",
            "/api/history": "Recent check history",
            "/api/stats": "Per-URL latency percentiles",
            "/api/stats/stream": "Latency percentiles as server-sent events",
        },
        "status": "running",
    }))
}

// ─── GET /api/health ─────────────────────────────────────────────

/// Liveness only; never probes anything.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": format_timestamp(&Local::now()),
        "service": SERVICE_NAME,
    }))
}

// ─── GET /api/urls ───────────────────────────────────────────────

pub async fn list_urls(State(state): State<Arc<AppState>>) -> Json<UrlsResponse> {
    let registry = state.monitor.registry();
    Json(UrlsResponse {
        monitored_urls: registry.urls(),
        total_urls: registry.len(),
    })
}
