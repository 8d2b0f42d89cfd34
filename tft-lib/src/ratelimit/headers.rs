//! Handle rate limiting headers.

use http::{HeaderMap, HeaderValue, header::RETRY_AFTER};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum RetryAfterParseError {
    #[error("Unable to parse value '{0}'")]
    ValueError(String),

    #[error("Header value contains invalid chars")]
    HeaderValueError,
}

/// Parse a `Retry-After` value given in (possibly fractional) seconds.
///
/// The API only ever sends delay-seconds, so HTTP dates are rejected
/// along with negative, non-finite and out-of-range numbers.
pub(crate) fn parse_retry_after(value: &HeaderValue) -> Result<Duration, RetryAfterParseError> {
    let value = value
        .to_str()
        .map_err(|_| RetryAfterParseError::HeaderValueError)?
        .trim();

    value
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| RetryAfterParseError::ValueError(value.into()))
}

/// The retry hint of a throttled response, if the server sent a usable one
pub(crate) fn retry_after_hint(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?;
    match parse_retry_after(value) {
        Ok(delay) => Some(delay),
        Err(e) => {
            log::debug!("Ignoring Retry-After header: {e}");
            None
        }
    }
}
