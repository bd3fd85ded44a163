//! Poll coordination: cooldown gate, fetch, decode, publish.

use crate::device::cache::SnapshotCache;
use crate::device::clock::Clock;
use crate::device::config::DeviceConfig;
use crate::device::decoder::decode;
use crate::device::fetcher::{Attempted, RetryingFetcher, StatusSource};
use crate::device::gate::RateGate;
use crate::error::{ExporterError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, warn, Instrument, Span};

/// What a call to [`PollCoordinator::poll_outcome`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new snapshot was decoded and published
    Fresh { attempts: u32 },
    /// Still inside the cooldown window; the cached snapshot stands
    Cooldown,
    /// Every attempt failed; the cached snapshot is now stale
    Failed,
}

impl PollOutcome {
    /// Whether the cached snapshot can be served as current data.
    pub fn is_success(&self) -> bool {
        !matches!(self, PollOutcome::Failed)
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, PollOutcome::Fresh { .. })
    }
}

/// Drives one poll of the device on request.
///
/// `poll` takes `&mut self`: callers sharing a coordinator must serialize
/// access (the web layer keeps it behind an async mutex), so the gate and
/// the cache only ever have one writer.
pub struct PollCoordinator<S, C> {
    gate: RateGate,
    fetcher: RetryingFetcher<S, C>,
    cache: Arc<SnapshotCache>,
    admin_url: String,
    span: Span,
}

impl<S: StatusSource, C: Clock> PollCoordinator<S, C> {
    /// `span` is the logging handle for this device; the fetcher reports its
    /// attempts under the same span.
    pub fn new(source: S, clock: C, config: &DeviceConfig, span: Span) -> Self {
        let gate = RateGate::new(config.poll_interval, clock.now());
        let fetcher = RetryingFetcher::new(source, clock, config.retry_policy(), span.clone());

        Self {
            gate,
            fetcher,
            cache: Arc::new(SnapshotCache::new()),
            admin_url: config.admin_url(),
            span,
        }
    }

    /// Handle to the cache this coordinator publishes into.
    pub fn cache(&self) -> Arc<SnapshotCache> {
        Arc::clone(&self.cache)
    }

    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    /// Poll the device unless it was polled too recently.
    ///
    /// Returns `false` only when every attempt failed; a cooldown skip still
    /// counts as success because the cached snapshot is valid.
    pub async fn poll(&mut self) -> bool {
        self.poll_outcome().await.is_success()
    }

    /// Like [`poll`](Self::poll), reporting which path was taken.
    pub async fn poll_outcome(&mut self) -> PollOutcome {
        let span = self.span.clone();
        self.run().instrument(span).await
    }

    async fn run(&mut self) -> PollOutcome {
        if !self.gate.try_acquire(self.fetcher.clock().now()) {
            warn!(
                "Polling too quickly! Please set polling interval to {:.0} seconds.",
                self.gate.interval().as_secs_f64()
            );
            warn!("See {} for more information.", self.admin_url);
            return PollOutcome::Cooldown;
        }

        match self.fetcher.fetch_with(decode_body).await {
            Ok(Attempted {
                value: mut snapshot,
                attempts,
            }) => {
                snapshot.fetched_at = Some(Utc::now());
                self.cache.replace(snapshot);
                self.gate.advance(self.fetcher.clock().now());
                PollOutcome::Fresh { attempts }
            }
            Err(err) => {
                error!(error = %err, "poll failed, keeping previously cached data");
                PollOutcome::Failed
            }
        }
    }
}

fn decode_body(body: &[u8]) -> Result<crate::device::Snapshot> {
    decode(body).map_err(ExporterError::from)
}
