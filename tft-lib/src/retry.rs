//! Retrying failed requests with exponential backoff.
//!
//! [`with_retry`] runs an operation up to [`RetryConfig::max_attempts`]
//! times. Between attempts it sleeps, either for as long as a throttled
//! response asked us to or for an exponentially growing, jittered delay.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ErrorKind, Result};

/// Default number of attempts, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Default upper bound for any single delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Upper bound (exclusive) of the random jitter added to backoff delays
const MAX_JITTER_MS: u64 = 500;

/// Decides whether a failed attempt is worth repeating
pub type RetryPredicate = Arc<dyn Fn(&ErrorKind) -> bool + Send + Sync>;

/// How often and how patiently to retry a failing request
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total number of attempts. Values below 1 are treated as 1.
    pub max_attempts: u32,

    /// Delay before the first retry; doubles with every further attempt
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// No single delay is ever longer than this, server hints included
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Replaces the built-in retry classification when set.
    ///
    /// The built-in rules are not consulted at all for a custom predicate,
    /// so it has to cover throttling and network failures itself if those
    /// should still be retried.
    #[serde(skip)]
    pub retry_on: Option<RetryPredicate>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            retry_on: None,
        }
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("retry_on", &self.retry_on.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl RetryConfig {
    /// Use `predicate` instead of the built-in retry classification
    #[must_use]
    pub fn with_retry_on<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ErrorKind) -> bool + Send + Sync + 'static,
    {
        self.retry_on = Some(Arc::new(predicate));
        self
    }

    /// Never repeat a request
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether `error` should be retried under this config
    #[must_use]
    pub fn should_retry(&self, error: &ErrorKind) -> bool {
        match &self.retry_on {
            Some(predicate) => predicate(error),
            None => error.should_retry(),
        }
    }

    /// How long to wait after the 0-based `attempt` failed with `error`
    #[must_use]
    pub fn delay(&self, attempt: u32, error: &ErrorKind) -> Duration {
        if let Some(hint) = error.retry_after() {
            return hint.min(self.max_delay);
        }

        let backoff = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt));
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..MAX_JITTER_MS));
        backoff.saturating_add(jitter).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails with an error that should not be
/// retried, or runs out of attempts.
///
/// Every call to `operation` is a fresh attempt, so anything it does (like
/// waiting for rate limit admission) happens again on each retry.
///
/// # Errors
///
/// Returns the error of the last attempt, unchanged.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.attempts();
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt + 1 >= attempts {
            log::debug!("Giving up after {attempts} attempt(s): {error}");
            return Err(error);
        }
        if !config.should_retry(&error) {
            return Err(error);
        }

        let delay = config.delay(attempt, &error);
        log::debug!(
            "Attempt {}/{attempts} failed ({error}), retrying in {}ms",
            attempt + 1,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// An extension trait to help determine if a failed request is retryable.
///
/// Inspired by `Retryable` from
/// [reqwest-middleware](https://github.com/TrueLayer/reqwest-middleware/blob/f854725791ccf4a02c401a26cab3d9db753f468c/reqwest-retry/src/retryable.rs)
pub(crate) trait RetryExt {
    fn should_retry(&self) -> bool;
}

impl RetryExt for StatusCode {
    fn should_retry(&self) -> bool {
        self.is_server_error()
            || *self == StatusCode::REQUEST_TIMEOUT
            || *self == StatusCode::TOO_MANY_REQUESTS
    }
}

impl RetryExt for reqwest::Error {
    #[allow(clippy::if_same_then_else)]
    fn should_retry(&self) -> bool {
        if self.is_timeout() || self.is_connect() {
            true
        } else if self.is_builder() || self.is_redirect() {
            false
        } else if let Some(hyper_error) = get_source_error_type::<hyper::Error>(self) {
            // IncompleteMessage means the connection was cut halfway through
            // an otherwise well-formed response, Canceled that the server
            // closed it. Both are worth another try.
            if hyper_error.is_incomplete_message() || hyper_error.is_canceled() {
                true
            } else if let Some(io_error) = get_source_error_type::<io::Error>(hyper_error) {
                io_error.should_retry()
            } else {
                false
            }
        } else if let Some(status) = self.status() {
            status.should_retry()
        } else {
            false
        }
    }
}

impl RetryExt for io::Error {
    fn should_retry(&self) -> bool {
        matches!(
            self.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::TimedOut
                | io::ErrorKind::UnexpectedEof
        )
    }
}

impl RetryExt for ErrorKind {
    fn should_retry(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::NetworkRequest(e) => e.should_retry() || mentions_transient_failure(e),
            _ => false,
        }
    }
}

/// Phrases that give away a transient network failure somewhere down an
/// error chain, for errors that carry no better classification
const TRANSIENT_PHRASES: &[&str] = &[
    "fetch failed",
    "network",
    "connection reset",
    "connection closed",
    "timed out",
    "timeout",
    "socket hang up",
    "broken pipe",
];

fn mentions_transient_failure(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let message = err.to_string().to_lowercase();
        if TRANSIENT_PHRASES.iter().any(|phrase| message.contains(phrase)) {
            return true;
        }
        current = err.source();
    }
    false
}

/// Downcasts the given err source into T.
fn get_source_error_type<T: StdError + 'static>(err: &dyn StdError) -> Option<&T> {
    let mut source = err.source();

    while let Some(err) = source {
        if let Some(typed) = err.downcast_ref::<T>() {
            return Some(typed);
        }
        source = err.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn throttled(retry_after: Option<Duration>) -> ErrorKind {
        ErrorKind::RateLimited {
            url: "https://kr.api.riotgames.com/tft".into(),
            retry_after,
            body: None,
        }
    }

    fn not_found() -> ErrorKind {
        ErrorKind::Api {
            url: "https://kr.api.riotgames.com/tft".into(),
            status: StatusCode::NOT_FOUND,
            body: None,
        }
    }

    /// Fails with `error` for the first `failures` calls, then succeeds
    fn flaky(
        calls: &AtomicU32,
        failures: u32,
        error: fn() -> ErrorKind,
    ) -> impl FnMut() -> std::future::Ready<Result<&'static str>> + '_ {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < failures { Err(error()) } else { Ok("done") })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryConfig::default(), flaky(&calls, 2, || throttled(None))).await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_respects_retry_after() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let result = with_retry(
            &RetryConfig::default(),
            flaky(&calls, 1, || throttled(Some(Duration::from_millis(100)))),
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_with_last_error() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 2,
            ..RetryConfig::default()
        };
        let result = with_retry(&config, flaky(&calls, u32::MAX, || throttled(None))).await;

        assert_eq!(result, Err(throttled(None)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        let result = with_retry(&config, flaky(&calls, u32::MAX, || throttled(None))).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 5,
            ..RetryConfig::default()
        };
        let result = with_retry(&config, flaky(&calls, u32::MAX, not_found)).await;

        assert_eq!(result, Err(not_found()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_predicate_replaces_default() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::default().with_retry_on(|_| true);
        let result = with_retry(&config, flaky(&calls, 2, not_found)).await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Throttling is no longer retried unless the predicate says so
        let calls = AtomicU32::new(0);
        let config = RetryConfig::default().with_retry_on(|_| false);
        let result = with_retry(&config, flaky(&calls, 2, || throttled(None))).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_uses_hint_capped_at_max() {
        let config = RetryConfig::default();
        assert_eq!(
            config.delay(0, &throttled(Some(Duration::from_secs(5)))),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.delay(0, &throttled(Some(Duration::from_secs(120)))),
            DEFAULT_MAX_DELAY
        );
    }

    #[rstest]
    #[case(0, Duration::from_secs(1))]
    #[case(1, Duration::from_secs(2))]
    #[case(2, Duration::from_secs(4))]
    fn test_delay_backoff_with_jitter(#[case] attempt: u32, #[case] backoff: Duration) {
        let delay = RetryConfig::default().delay(attempt, &throttled(None));
        assert!(delay >= backoff);
        assert!(delay < backoff + Duration::from_millis(MAX_JITTER_MS));
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig::default();
        assert_eq!(config.delay(10, &throttled(None)), DEFAULT_MAX_DELAY);
        assert_eq!(config.delay(40, &throttled(None)), DEFAULT_MAX_DELAY);
    }

    #[rstest]
    #[case(throttled(None), true)]
    #[case(not_found(), false)]
    #[case(ErrorKind::Api { url: String::new(), status: StatusCode::SERVICE_UNAVAILABLE, body: None }, false)]
    #[case(ErrorKind::Api { url: String::new(), status: StatusCode::REQUEST_TIMEOUT, body: None }, false)]
    #[case(ErrorKind::Destroyed, false)]
    #[case(ErrorKind::UnknownBucket("league".into()), false)]
    #[case(ErrorKind::MissingApiKey, false)]
    fn test_default_classification(#[case] error: ErrorKind, #[case] retryable: bool) {
        assert_eq!(error.should_retry(), retryable);
        assert_eq!(RetryConfig::default().should_retry(&error), retryable);
    }

    #[test]
    fn test_io_classification() {
        assert!(io::Error::from(io::ErrorKind::ConnectionReset).should_retry());
        assert!(!io::Error::from(io::ErrorKind::NotFound).should_retry());
    }

    #[rstest]
    #[case("socket hang up", true)]
    #[case("network is unreachable", true)]
    #[case("operation timed out", true)]
    #[case("permission denied", false)]
    fn test_transient_phrases(#[case] message: &str, #[case] transient: bool) {
        let error = io::Error::other(message.to_string());
        assert_eq!(mentions_transient_failure(&error), transient);
    }

    #[test]
    fn test_status_classification() {
        assert!(StatusCode::REQUEST_TIMEOUT.should_retry());
        assert!(StatusCode::TOO_MANY_REQUESTS.should_retry());
        assert!(StatusCode::INTERNAL_SERVER_ERROR.should_retry());
        assert!(!StatusCode::FORBIDDEN.should_retry());
        assert!(!StatusCode::OK.should_retry());
    }

    #[test]
    fn test_config_from_toml() {
        let config: RetryConfig = toml::from_str(
            r#"
            max_attempts = 5
            base_delay = "250ms"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay, Duration::from_millis(250));
        assert_eq!(config.max_delay, DEFAULT_MAX_DELAY);
        assert!(config.retry_on.is_none());
    }
}
