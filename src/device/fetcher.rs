//! Fetching `/RAWSTATUS` with a bounded retry budget.

use crate::device::clock::Clock;
use crate::device::config::{DeviceConfig, DEFAULT_POLL_ATTEMPTS, DEFAULT_RETRY_WAIT};
use crate::error::{ExporterError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument, Span};

/// One raw read of the device status.
pub trait StatusSource: Send + Sync {
    /// Perform a single request and return the response body.
    fn fetch_status(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

impl<S: StatusSource> StatusSource for Arc<S> {
    fn fetch_status(&self) -> impl Future<Output = Result<Vec<u8>>> + Send {
        (**self).fetch_status()
    }
}

/// [`StatusSource`] that performs an HTTP GET against the device.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: String,
}

impl HttpStatusSource {
    /// Build a source for the configured device. Every request is bounded
    /// by `config.request_timeout`.
    pub fn new(config: &DeviceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.status_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self) -> Result<Vec<u8>> {
        debug!(url = %self.url, "getting data from herpstat");

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

/// How many times to try within one poll, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_POLL_ATTEMPTS,
            wait: DEFAULT_RETRY_WAIT,
        }
    }
}

/// A value produced by [`RetryingFetcher::fetch_with`] and the attempt that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// Runs a [`StatusSource`] under a [`RetryPolicy`].
pub struct RetryingFetcher<S, C> {
    source: S,
    clock: C,
    policy: RetryPolicy,
    span: Span,
}

impl<S: StatusSource, C: Clock> RetryingFetcher<S, C> {
    /// `span` is the logging handle every attempt is reported under.
    pub fn new(source: S, clock: C, policy: RetryPolicy, span: Span) -> Self {
        Self {
            source,
            clock,
            policy,
            span,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fetch the raw body, retrying transport failures.
    pub async fn fetch(&self) -> Result<Attempted<Vec<u8>>> {
        self.fetch_with(|body| Ok(body.to_vec())).await
    }

    /// Fetch the body and hand it to `accept`. A retryable error from either
    /// the request or `accept` costs one attempt; the wait is skipped after
    /// the last one.
    pub async fn fetch_with<T, F>(&self, accept: F) -> Result<Attempted<T>>
    where
        F: FnMut(&[u8]) -> Result<T> + Send,
        T: Send,
    {
        self.run(accept).instrument(self.span.clone()).await
    }

    async fn run<T, F>(&self, mut accept: F) -> Result<Attempted<T>>
    where
        F: FnMut(&[u8]) -> Result<T> + Send,
        T: Send,
    {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("poll attempt {}/{}", attempt, attempts);

            let result = match self.source.fetch_status().await {
                Ok(body) => {
                    let accepted = accept(&body);
                    if accepted.is_err() {
                        debug!(body = %String::from_utf8_lossy(&body), "rejected body");
                    }
                    accepted
                }
                Err(err) => Err(err),
            };

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Successfully read device status after {} attempts", attempt);
                    }
                    return Ok(Attempted {
                        value,
                        attempts: attempt,
                    });
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    warn!(attempt, error = %err, "poll attempt failed");

                    if attempt >= attempts {
                        error!("unable to get data from device after {} attempts", attempts);
                        return Err(ExporterError::RetriesExhausted {
                            attempts,
                            last: Box::new(err),
                        });
                    }

                    warn!(
                        "Waiting {:.0} seconds before trying again...",
                        self.policy.wait.as_secs_f64()
                    );
                    self.clock.sleep(self.policy.wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::device::clock::ManualClock;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed list of responses, then fails with HTTP 503.
    pub(crate) struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<u8>>>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        pub(crate) fn new(responses: Vec<Result<Vec<u8>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicU32::new(0),
            }
        }

        pub(crate) fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ExporterError::Status(503)))
        }
    }

    fn fetcher(
        responses: Vec<Result<Vec<u8>>>,
    ) -> (
        RetryingFetcher<Arc<ScriptedSource>, Arc<ManualClock>>,
        Arc<ScriptedSource>,
        Arc<ManualClock>,
    ) {
        let source = Arc::new(ScriptedSource::new(responses));
        let clock = Arc::new(ManualClock::new());
        let fetcher = RetryingFetcher::new(
            source.clone(),
            clock.clone(),
            RetryPolicy::default(),
            Span::none(),
        );
        (fetcher, source, clock)
    }

    #[tokio::test]
    async fn test_first_attempt_success_does_not_wait() {
        let (fetcher, source, clock) = fetcher(vec![Ok(b"ok".to_vec())]);

        let fetched = fetcher.fetch().await.unwrap();

        assert_eq!(fetched.value, b"ok");
        assert_eq!(fetched.attempts, 1);
        assert_eq!(source.calls(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (fetcher, source, clock) = fetcher(vec![
            Err(ExporterError::Status(500)),
            Err(ExporterError::Status(502)),
            Ok(b"third".to_vec()),
        ]);

        let fetched = fetcher.fetch().await.unwrap();

        assert_eq!(fetched.value, b"third");
        assert_eq!(fetched.attempts, 3);
        assert_eq!(source.calls(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3); 2]);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget_without_trailing_wait() {
        let (fetcher, source, clock) = fetcher(Vec::new());

        let err = fetcher.fetch().await.unwrap_err();

        assert!(matches!(
            err,
            ExporterError::RetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(source.calls(), 3);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_bodies_use_the_same_budget() {
        let (fetcher, source, _clock) =
            fetcher(vec![Ok(b"garbled".to_vec()), Ok(b"fine".to_vec())]);

        let fetched = fetcher
            .fetch_with(|body| {
                if body == b"garbled" {
                    Err(crate::error::DecodeError::NotAnObject.into())
                } else {
                    Ok(body.len())
                }
            })
            .await
            .unwrap();

        assert_eq!(fetched.value, 4);
        assert_eq!(fetched.attempts, 2);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_stop_immediately() {
        let (fetcher, source, clock) =
            fetcher(vec![Err(ExporterError::config_error("nope")), Ok(Vec::new())]);

        assert!(matches!(
            fetcher.fetch().await,
            Err(ExporterError::Config(_))
        ));
        assert_eq!(source.calls(), 1);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_http_source_url() {
        let source = HttpStatusSource::new(&DeviceConfig::new("10.0.0.7")).unwrap();
        assert_eq!(source.url(), "http://10.0.0.7/RAWSTATUS");
    }
}
