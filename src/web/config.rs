//! Web server configuration.

use crate::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};

/// Paths served by the router besides the telemetry path.
const RESERVED_PATHS: &[&str] = &["/", "/api/snapshot", "/api/health"];

/// Configuration for the web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Path under which metrics are exposed
    pub telemetry_path: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            telemetry_path: crate::DEFAULT_TELEMETRY_PATH.to_string(),
        }
    }
}

impl WebConfig {
    /// Create a new web configuration with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the host for the web server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port for the web server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the path metrics are served under.
    pub fn with_telemetry_path(mut self, path: impl Into<String>) -> Self {
        self.telemetry_path = path.into();
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.telemetry_path.starts_with('/') {
            return Err(ExporterError::config_error(format!(
                "telemetry path {:?} must start with '/'",
                self.telemetry_path
            )));
        }
        if RESERVED_PATHS.contains(&self.telemetry_path.as_str()) {
            return Err(ExporterError::config_error(format!(
                "telemetry path {:?} is already used by the exporter",
                self.telemetry_path
            )));
        }
        if self.host.is_empty() {
            return Err(ExporterError::config_error("bind host is empty"));
        }

        Ok(())
    }
}
