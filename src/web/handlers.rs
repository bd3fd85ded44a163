//! HTTP handlers for the exporter endpoints.

use crate::device::Snapshot;
use crate::metrics::TEXT_FORMAT;
use crate::web::AppState;
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Json},
};
use serde_json::json;
use tracing::debug;

/// Poll the device (subject to the cooldown) and render metrics.
///
/// Scrapes queue on the collector lock, so only one poll is ever in flight.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    debug!("{} was called", state.config.telemetry_path);

    let body = state.collector.lock().await.scrape().await;
    ([(header::CONTENT_TYPE, TEXT_FORMAT)], body)
}

/// Current cached snapshot as JSON. Never polls the device.
pub async fn get_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.cache.current().as_ref().clone())
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let last_success = state.cache.last_success().map(|at| at.to_rfc3339());

    Json(json!({
        "status": "ok",
        "service": "herpstat-exporter",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "last_poll_success": last_success,
    }))
}

/// Landing page pointing at the telemetry path.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(INDEX_HTML.replace("{telemetry_path}", &state.config.telemetry_path))
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Herpstat SpyderWeb Exporter</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 40px; color: #333; }
        h1 { color: #2e7d32; }
        li { margin-bottom: 8px; }
    </style>
</head>
<body>
    <h1>Herpstat SpyderWeb Exporter</h1>
    <p>Prometheus exporter for Herpstat SpyderWeb controllers.</p>
    <ul>
        <li><a href="{telemetry_path}">Metrics</a></li>
        <li><a href="/api/snapshot">Cached snapshot (JSON)</a></li>
        <li><a href="/api/health">Health</a></li>
    </ul>
</body>
</html>
"#;
