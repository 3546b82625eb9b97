use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        // ── Service info ────────────────────────────────────────
        .route("/api", get(handlers::info::api_info))
        .route("/api/health", get(handlers::info::health))
        .route("/api/urls", get(handlers::info::list_urls))
        // ── Probing ─────────────────────────────────────────────
        .route("/api/check", get(handlers::check::check_all))
        .route("/api/history", get(handlers::history::get_history))
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/stats", get(stream::get_stats))
        .route("/api/stats/stream", get(stream::stats_stream))
        .with_state(state)
        // ── Dashboard; anything else is a 404 ───────────────────
        .fallback_service(ServeDir::new(static_dir))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryBuffer;
    use crate::metrics::MetricsAggregator;
    use crate::probe::{ProbeOutcome, Prober};
    use crate::sweep::{Monitor, DEFAULT_MAX_CONCURRENT_PROBES};
    use crate::targets::{Target, TargetRegistry};
    use crate::testing::spawn_fake_target;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with(targets: Vec<Target>) -> (Router, Arc<AppState>) {
        app_serving(targets, "no-such-static-dir")
    }

    fn app_serving(targets: Vec<Target>, static_dir: &str) -> (Router, Arc<AppState>) {
        let monitor = Arc::new(Monitor::new(
            Arc::new(TargetRegistry::new(targets).unwrap()),
            Prober::without_proxy(Duration::from_secs(5)).unwrap(),
            Arc::new(MetricsAggregator::new().unwrap()),
            Arc::new(HistoryBuffer::default()),
            DEFAULT_MAX_CONCURRENT_PROBES,
        ));
        let state = Arc::new(AppState { monitor });
        (create_router(state.clone(), static_dir), state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_is_static() {
        let (app, state) = app_with(Vec::new());
        let (status, json) = get_json(app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
        assert_eq!(state.monitor.sweeps_completed(), 0);
    }

    #[tokio::test]
    async fn api_info_lists_endpoints() {
        let (app, _) = app_with(Vec::new());
        let (status, json) = get_json(app, "/api").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "running");
        assert!(json["endpoints"]["/api/check"].is_string());
    }

    #[tokio::test]
    async fn urls_reflect_registry() {
        let (app, _) = app_with(vec![
            Target::new("https://a.example", "A"),
            Target::new("https://b.example", "B"),
        ]);
        let (_, json) = get_json(app, "/api/urls").await;

        assert_eq!(json["total_urls"], 2);
        assert_eq!(json["monitored_urls"][0], "https://a.example");
        assert_eq!(json["monitored_urls"][1], "https://b.example");
    }

    #[tokio::test]
    async fn check_runs_a_sweep() {
        let base = spawn_fake_target().await;
        let (app, state) = app_with(vec![
            Target::new(format!("{base}/ok"), "A"),
            Target::new(format!("{base}/missing"), "B"),
        ]);
        let (status, json) = get_json(app, "/api/check").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["timestamp"].is_string());
        assert_eq!(json["summary"]["total_urls_checked"], 2);
        assert_eq!(json["summary"]["successful"], 1);
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["summary"]["uptime_percentage"], 50.0);
        assert_eq!(json["results"][0]["message"], "UP");
        assert_eq!(json["results"][1]["status_code"], 404);
        assert_eq!(state.monitor.history().len(), 2);
    }

    #[tokio::test]
    async fn history_returns_last_twenty() {
        let (app, state) = app_with(Vec::new());
        for i in 0..60 {
            state.monitor.history().append(ProbeOutcome::from_status(
                format!("http://t{i}"),
                200,
                Duration::from_millis(1),
            ));
        }
        let (_, json) = get_json(app, "/api/history").await;

        let recent = json["recent_checks"].as_array().unwrap();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0]["url"], "http://t40");
        assert_eq!(recent[19]["url"], "http://t59");
        assert_eq!(json["total_checks"], 50);
        assert_eq!(json["lifetime_checks"], 60);
    }

    #[tokio::test]
    async fn metrics_are_prometheus_text() {
        let (app, state) = app_with(Vec::new());
        state.monitor.metrics().record(&ProbeOutcome::from_status(
            "http://a",
            200,
            Duration::from_millis(10),
        ));

        let response = app
            .oneshot(Request::builder().uri("/api/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("text/plain"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("url_up{url=\"http://a\"} 1"));
    }

    #[tokio::test]
    async fn stats_report_latency_per_target() {
        let (app, state) = app_with(Vec::new());
        state.monitor.metrics().record(&ProbeOutcome::from_status(
            "http://a",
            200,
            Duration::from_millis(10),
        ));
        let (_, json) = get_json(app, "/api/stats").await;

        assert_eq!(json["sweeps_completed"], 0);
        assert_eq!(json["targets"][0]["url"], "http://a");
        assert_eq!(json["targets"][0]["latency_us"]["count"], 1);
    }

    #[tokio::test]
    async fn responses_carry_timing_headers() {
        let (app, _) = app_with(Vec::new());
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-response-time-us"));
        assert!(response.headers().contains_key("server-timing"));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (app, _) = app_with(Vec::new());
        let response = app
            .oneshot(Request::builder().uri("/invalid-route").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn home_page_serves_dashboard() {
        let (app, _) = app_serving(Vec::new(), concat!(env!("CARGO_MANIFEST_DIR"), "/static"));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("URL Status Checker"));
    }
}
