use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// The name of a rate limit bucket, e.g. `league` or `match-list`.
///
/// Every bucket is an independent admission budget. Names are compared
/// verbatim, so `"League"` and `"league"` are different buckets.
///
/// # Examples
///
/// ```
/// use tft_lib::ratelimit::BucketName;
///
/// let name = BucketName::from("match-list");
/// assert_eq!(name.as_str(), "match-list");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketName(String);

impl BucketName {
    /// Get the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the name as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BucketName {
    fn from(name: String) -> Self {
        BucketName(name)
    }
}

impl From<&str> for BucketName {
    fn from(name: &str) -> Self {
        BucketName(name.to_string())
    }
}

impl From<&BucketName> for BucketName {
    fn from(name: &BucketName) -> Self {
        name.clone()
    }
}

impl Borrow<str> for BucketName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
