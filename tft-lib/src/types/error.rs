use serde::{Serialize, Serializer};
use std::hash::Hash;
use std::time::Duration;
use thiserror::Error;

use http::StatusCode;

use crate::ratelimit::BucketName;

/// Possible errors when talking to the TFT API through `tft_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The server throttled the request (HTTP 429).
    ///
    /// `retry_after` carries the server's `Retry-After` hint, if it sent a
    /// numeric one.
    #[error("Rate limited on {url}")]
    RateLimited {
        /// The throttled URL
        url: String,
        /// How long the server asked us to back off
        retry_after: Option<Duration>,
        /// The response body, if it was valid JSON
        body: Option<serde_json::Value>,
    },

    /// The server answered with a non-success status other than 429
    #[error("API request failed: {status}")]
    Api {
        /// The requested URL
        url: String,
        /// Status code of the response
        status: StatusCode,
        /// The response body, if it was valid JSON
        body: Option<serde_json::Value>,
    },

    /// Network error while sending the request or reading the response.
    /// Request timeouts surface here as well.
    #[error("Network error: {0}")]
    NetworkRequest(#[source] reqwest::Error),

    /// No bucket with this name was registered with the rate limiter
    #[error("Unknown rate limit bucket: \"{0}\"")]
    UnknownBucket(BucketName),

    /// The rate limiter was torn down; no more work is accepted
    #[error("RateLimiter destroyed")]
    Destroyed,

    /// Admitted work was dropped before it produced a result
    #[error("Work admitted on bucket \"{0}\" was aborted before completing")]
    WorkAborted(BucketName),

    /// No API key was given when building the client
    #[error("apiKey is required")]
    MissingApiKey,

    /// The buffer rate is outside of `(0, 1]`
    #[error("bufferRate must be between 0 (exclusive) and 1 (inclusive), got {0}")]
    InvalidBufferRate(f64),

    /// A bucket configuration cannot admit any request
    #[error("Invalid configuration for bucket \"{name}\": {reason}")]
    InvalidBucketConfig {
        /// The offending bucket
        name: BucketName,
        /// Why the configuration was rejected
        reason: String,
    },

    /// The given header could not be parsed.
    #[error("Header could not be parsed.")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    /// The request client cannot be created
    #[error("Error creating request client: {0}")]
    BuildRequestClient(#[source] reqwest::Error),

    /// A base URL or endpoint URL cannot be built
    #[error("Cannot build URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot have endpoint paths appended to it
    #[error("Base URL cannot carry endpoint paths: {0}")]
    InvalidBaseUrl(String),
}

impl ErrorKind {
    /// Return the underlying `reqwest::Error`, if any
    #[must_use]
    pub const fn reqwest_error(&self) -> Option<&reqwest::Error> {
        match self {
            Self::NetworkRequest(e) | Self::BuildRequestClient(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this is the server telling us to slow down
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// The HTTP status behind this error, if it came from a response
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::Api { status, .. } => Some(*status),
            Self::NetworkRequest(e) => e.status(),
            _ => None,
        }
    }

    /// The server's retry hint of a throttled request
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// The parsed response body of a failed request
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::RateLimited { body, .. } | Self::Api { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::RateLimited {
                    url: u1,
                    retry_after: r1,
                    body: b1,
                },
                Self::RateLimited {
                    url: u2,
                    retry_after: r2,
                    body: b2,
                },
            ) => u1 == u2 && r1 == r2 && b1 == b2,
            (
                Self::Api {
                    url: u1,
                    status: s1,
                    body: b1,
                },
                Self::Api {
                    url: u2,
                    status: s2,
                    body: b2,
                },
            ) => u1 == u2 && s1 == s2 && b1 == b2,
            (Self::NetworkRequest(e1), Self::NetworkRequest(e2))
            | (Self::BuildRequestClient(e1), Self::BuildRequestClient(e2)) => {
                e1.to_string() == e2.to_string()
            }
            (Self::UnknownBucket(n1), Self::UnknownBucket(n2))
            | (Self::WorkAborted(n1), Self::WorkAborted(n2)) => n1 == n2,
            (Self::InvalidBufferRate(r1), Self::InvalidBufferRate(r2)) => {
                r1.to_bits() == r2.to_bits()
            }
            (
                Self::InvalidBucketConfig {
                    name: n1,
                    reason: r1,
                },
                Self::InvalidBucketConfig {
                    name: n2,
                    reason: r2,
                },
            ) => n1 == n2 && r1 == r2,
            (Self::InvalidUrl(e1), Self::InvalidUrl(e2)) => e1 == e2,
            (Self::InvalidBaseUrl(u1), Self::InvalidBaseUrl(u2)) => u1 == u2,
            (Self::Destroyed, Self::Destroyed)
            | (Self::MissingApiKey, Self::MissingApiKey)
            | (Self::InvalidHeader(_), Self::InvalidHeader(_)) => true,
            _ => false,
        }
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H>(&self, state: &mut H)
    where
        H: std::hash::Hasher,
    {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::RateLimited { url, .. } | Self::Api { url, .. } => url.hash(state),
            Self::UnknownBucket(name) | Self::WorkAborted(name) => name.hash(state),
            Self::InvalidBucketConfig { name, reason } => (name, reason).hash(state),
            _ => self.to_string().hash(state),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
