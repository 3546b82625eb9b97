//! In-process fake targets for tests.

use std::time::Duration;

use axum::{
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::Redirect,
    routing::get,
    Router,
};

/// Serve a small fake target on `127.0.0.1:0` and return its base URL.
///
/// Routes: `/ok` 200, `/moved` redirect to `/ok`, `/missing` 404,
/// `/fail` 500, `/slow` 200 after two seconds, `/agent` 200 only for
/// the checker's user agent (418 otherwise).
pub async fn spawn_fake_target() -> String {
    let app = Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/moved", get(|| async { Redirect::to("/ok") }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/fail", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        )
        .route(
            "/agent",
            get(|headers: HeaderMap| async move {
                match headers.get(USER_AGENT).and_then(|v| v.to_str().ok()) {
                    Some("URL-Monitor-Bot/1.0") => StatusCode::OK,
                    _ => StatusCode::IM_A_TEAPOT,
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A URL on a local port with nothing listening.
pub async fn unused_local_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}
