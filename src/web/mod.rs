//! HTTP server exposing the exporter's metrics.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::device::SnapshotCache;
use crate::error::{ExporterError, Result};
use crate::metrics::DeviceCollector;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The collector; locked for the whole of a scrape
    pub collector: Arc<Mutex<DeviceCollector>>,
    /// Read side of the collector's snapshot cache
    pub cache: Arc<SnapshotCache>,
    pub config: WebConfig,
}

impl AppState {
    pub fn new(config: WebConfig, collector: DeviceCollector) -> Self {
        let cache = collector.cache();
        Self {
            collector: Arc::new(Mutex::new(collector)),
            cache,
            config,
        }
    }
}

/// Start the web server and serve until Ctrl-C.
pub async fn start_web_server(config: WebConfig, collector: DeviceCollector) -> Result<()> {
    config.validate()?;

    let app = create_app(AppState::new(config.clone(), collector));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Failed to bind to address: {}", e)))?;
    let addr = listener.local_addr()?;

    info!("Listening on http://{}", addr);
    info!("Metrics available at http://{}{}", addr, config.telemetry_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
