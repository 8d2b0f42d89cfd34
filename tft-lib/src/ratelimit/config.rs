use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::ratelimit::BucketName;
use crate::{ErrorKind, Result};

/// Default share of the nominal limit we allow ourselves to use
pub const DEFAULT_BUFFER_RATE: f64 = 0.9;

/// Name of the application-wide bucket that wraps every request
pub const APPLICATION_BUCKET: &str = "application";

/// Bucket for `/tft/league/v1/*`
pub const LEAGUE_BUCKET: &str = "league";
/// Bucket for match id lists
pub const MATCH_LIST_BUCKET: &str = "match-list";
/// Bucket for single match details
pub const MATCH_DETAIL_BUCKET: &str = "match-detail";
/// Bucket for `/tft/summoner/v1/*`
pub const SUMMONER_BUCKET: &str = "summoner";

/// Admission budget of one bucket: at most `max_requests` per rolling
/// `window`, scaled down by `buffer_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
    /// Nominal number of requests allowed per window
    pub max_requests: u32,

    /// Length of the rolling window
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Share of `max_requests` we actually use, in `(0, 1]`.
    /// Falls back to the limiter-wide default when unset.
    #[serde(default)]
    pub buffer_rate: Option<f64>,
}

impl BucketConfig {
    /// A budget of `max_requests` per `window` with the default buffer rate
    #[must_use]
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            buffer_rate: None,
        }
    }

    /// Set an explicit buffer rate for this bucket
    #[must_use]
    pub const fn with_buffer_rate(mut self, buffer_rate: f64) -> Self {
        self.buffer_rate = Some(buffer_rate);
        self
    }

    /// The buffer rate in effect, falling back to `default_rate`
    #[must_use]
    pub fn effective_buffer_rate(&self, default_rate: f64) -> f64 {
        self.buffer_rate.unwrap_or(default_rate)
    }

    /// Number of requests that may be in the window at once:
    /// `floor(max_requests * buffer_rate)`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn effective_max(&self, default_rate: f64) -> usize {
        (f64::from(self.max_requests) * self.effective_buffer_rate(default_rate)).floor() as usize
    }

    /// Check that this bucket can ever admit a request
    pub(crate) fn validate(&self, name: &BucketName, default_rate: f64) -> Result<()> {
        let invalid = |reason: String| ErrorKind::InvalidBucketConfig {
            name: name.clone(),
            reason,
        };

        if self.max_requests == 0 {
            return Err(invalid("maxRequests must be greater than 0".into()));
        }
        if self.window.is_zero() {
            return Err(invalid("window must be greater than 0".into()));
        }
        let rate = self.effective_buffer_rate(default_rate);
        if !is_valid_buffer_rate(rate) {
            return Err(invalid(format!(
                "bufferRate must be between 0 (exclusive) and 1 (inclusive), got {rate}"
            )));
        }
        if self.effective_max(default_rate) == 0 {
            return Err(invalid(format!(
                "{} requests scaled by {rate} leaves no capacity",
                self.max_requests
            )));
        }
        Ok(())
    }
}

/// Whether `rate` lies in `(0, 1]`
#[must_use]
pub fn is_valid_buffer_rate(rate: f64) -> bool {
    rate > 0.0 && rate <= 1.0
}

/// Bucket configurations keyed by bucket name
pub type BucketConfigs = HashMap<BucketName, BucketConfig>;

/// Partial configuration for a bucket; unset fields keep their defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketOverride {
    /// Replaces `max_requests`
    pub max_requests: Option<u32>,

    /// Replaces `window`
    #[serde(default, with = "humantime_serde")]
    pub window: Option<Duration>,

    /// Replaces `buffer_rate`
    pub buffer_rate: Option<f64>,
}

impl BucketOverride {
    /// Apply this override on top of `base`
    #[must_use]
    pub fn apply(&self, base: &BucketConfig) -> BucketConfig {
        BucketConfig {
            max_requests: self.max_requests.unwrap_or(base.max_requests),
            window: self.window.unwrap_or(base.window),
            buffer_rate: self.buffer_rate.or(base.buffer_rate),
        }
    }
}

/// Per-bucket overrides keyed by bucket name
pub type BucketOverrides = HashMap<BucketName, BucketOverride>;

/// Riot's published per-method limits for the TFT endpoints
#[must_use]
pub fn default_bucket_configs() -> BucketConfigs {
    [
        (LEAGUE_BUCKET, BucketConfig::new(270, Duration::from_secs(60))),
        (
            MATCH_LIST_BUCKET,
            BucketConfig::new(600, Duration::from_secs(10)),
        ),
        (
            MATCH_DETAIL_BUCKET,
            BucketConfig::new(250, Duration::from_secs(10)),
        ),
        (
            SUMMONER_BUCKET,
            BucketConfig::new(1600, Duration::from_secs(60)),
        ),
    ]
    .into_iter()
    .map(|(name, config)| (BucketName::from(name), config))
    .collect()
}
