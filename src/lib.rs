//! # Herpstat Exporter
//!
//! A Prometheus exporter for Herpstat SpyderWeb reptile-habitat controllers.
//! Every scrape asks the device for `/RAWSTATUS` (at most once per cooldown
//! window), decodes the system section and its numbered outputs into a
//! [`Snapshot`], and renders the cached snapshot as metrics.
//!
//! ## Features
//!
//! - **Cooldown gate**: never polls faster than the vendor's 10 second limit
//! - **Retries**: transport errors and garbled bodies are retried 3 times
//! - **Stale-while-failing**: a failed poll serves the last good snapshot
//!   and reports `herpstat_up 0`
//! - **Library + Binary**: use as a crate or standalone application
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use herpstat_exporter::{start_web_server, DeviceCollector, DeviceConfig, WebConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let collector = DeviceCollector::for_device(&DeviceConfig::new("192.168.1.50"))?;
//!
//!     // Serve metrics on :10010/metrics
//!     start_web_server(WebConfig::default(), collector).await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod metrics;
pub mod web;

// Re-export public API
pub use device::{
    DeviceConfig, OutputInfo, PollCoordinator, PollOutcome, RateGate, RetryPolicy,
    RetryingFetcher, Snapshot, SnapshotCache, SystemInfo,
};
pub use error::{DecodeError, ExporterError, Result};
pub use metrics::{DeviceCollector, HerpstatCollector};
pub use web::{start_web_server, WebConfig};

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 10010;

/// The default path metrics are served under
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
