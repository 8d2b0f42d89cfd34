use std::collections::BTreeMap;

use serde::Serialize;

use super::name::BucketName;

/// A [`BTreeMap`] mapping bucket names to their [`BucketStatus`],
/// ordered by name for stable output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BucketStatusMap(BTreeMap<BucketName, BucketStatus>);

impl BucketStatusMap {
    /// Status of a single bucket
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BucketStatus> {
        self.0.get(name)
    }

    /// Iterate over all buckets in name order
    pub fn iter(&self) -> impl Iterator<Item = (&BucketName, &BucketStatus)> {
        self.0.iter()
    }

    /// Number of buckets
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no buckets at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(BucketName, BucketStatus)> for BucketStatusMap {
    fn from_iter<I: IntoIterator<Item = (BucketName, BucketStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Point-in-time occupancy of a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketStatus {
    /// Requests that could be admitted right now
    pub available: usize,
    /// Requests waiting for a slot
    pub queued: usize,
    /// Admitted requests that have not completed yet
    pub in_flight: usize,
}
