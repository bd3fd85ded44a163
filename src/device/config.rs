//! Device polling configuration.

use crate::device::fetcher::RetryPolicy;
use crate::device::gate::DEFAULT_POLL_INTERVAL;
use crate::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempts per poll before giving up and serving cached data.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 3;

/// Wait between two attempts of the same poll.
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(3);

/// Timeout for a single request to the device.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How to reach and poll a Herpstat SpyderWeb.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host or `host:port` of the device, without a scheme
    pub address: String,
    /// Minimum time between two real polls
    pub poll_interval: Duration,
    /// Attempts per poll
    pub attempts: u32,
    /// Wait between attempts
    pub retry_wait: Duration,
    /// Timeout for each HTTP request
    pub request_timeout: Duration,
}

impl DeviceConfig {
    /// Create a configuration for the device at `address` with the defaults
    /// the vendor recommends.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            attempts: DEFAULT_POLL_ATTEMPTS,
            retry_wait: DEFAULT_RETRY_WAIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// URL of the raw status endpoint.
    pub fn status_url(&self) -> String {
        format!("http://{}/RAWSTATUS", self.address)
    }

    /// URL of the admin page that documents the polling limit.
    pub fn admin_url(&self) -> String {
        format!("http://{}/handleAdminControls", self.address)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            wait: self.retry_wait,
        }
    }

    /// Check the configuration before anything talks to the device.
    pub fn validate(&self) -> Result<()> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ExporterError::config_error("device address is empty"));
        }
        if address.contains("://") || address.contains('/') {
            return Err(ExporterError::config_error(format!(
                "device address {address:?} should be a host or host:port, without scheme or path"
            )));
        }
        reqwest::Url::parse(&self.status_url()).map_err(|e| {
            ExporterError::config_error(format!("invalid device address {address:?}: {e}"))
        })?;

        if self.attempts == 0 {
            return Err(ExporterError::config_error("attempts must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(ExporterError::config_error("request timeout must be greater than zero"));
        }

        Ok(())
    }
}
