use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Adds two response headers:
///
///   X-Response-Time-Us  — total handler wall time in microseconds
///   Server-Timing       — same value in the standard Server-Timing format
///
/// API requests are also logged at debug level.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros();

    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    // Static files and the SSE stream are too noisy
    if path.starts_with("/api") && !path.ends_with("/stream") {
        tracing::debug!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_us = us as u64,
            "request served"
        );
    }

    response
}
