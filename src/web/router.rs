//! Web application router and middleware setup.

use crate::web::handlers;
use crate::web::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the axum application with all routes and middleware.
///
/// The telemetry path comes from the state's [`WebConfig`](crate::WebConfig),
/// which must already be validated.
pub fn create_app(state: AppState) -> Router {
    let telemetry_path = state.config.telemetry_path.clone();

    Router::new()
        .route("/", get(handlers::index))
        .route(&telemetry_path, get(handlers::metrics))
        .route("/api/snapshot", get(handlers::get_snapshot))
        .route("/api/health", get(handlers::health_check))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceConfig;
    use crate::metrics::DeviceCollector;
    use crate::web::WebConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AppState {
        // Never contacted: none of these routes poll the device.
        let collector = DeviceCollector::for_device(&DeviceConfig::new("127.0.0.1:9")).unwrap();
        AppState::new(WebConfig::default(), collector)
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_links_telemetry_path() {
        let (status, body) = get_body(create_app(state()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"href="/metrics""#));
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = get_body(create_app(state()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["last_poll_success"].is_null());
    }

    #[tokio::test]
    async fn test_snapshot_before_first_poll_is_empty() {
        let (status, body) = get_body(create_app(state()), "/api/snapshot").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["fetched_at"].is_null());
        assert_eq!(json["outputs"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = get_body(create_app(state()), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
