use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ratelimit::{
    APPLICATION_BUCKET, Bucket, BucketConfig, BucketConfigs, BucketName, BucketStatus,
    BucketStatusMap, batch::run_batch, is_valid_buffer_rate,
};
use crate::{ErrorKind, Result};

/// Admission control over a fixed set of named buckets.
///
/// The `RateLimiter` routes work to the bucket it names and waits until
/// that bucket grants a slot. It is cheap to clone; clones share the same
/// buckets.
///
/// # Architecture
///
/// - Buckets are created once, at construction, from a name to
///   [`BucketConfig`] mapping. Unknown names are an error, not a new bucket.
/// - An optional application-wide bucket sits in front of every other
///   bucket. Work has to be admitted by both, the application bucket first.
/// - [`RateLimiter::destroy`] tears everything down for good.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tft_lib::ratelimit::{BucketConfig, BucketConfigs, RateLimiter};
///
/// # #[tokio::main]
/// # async fn main() -> tft_lib::Result<()> {
/// let mut configs = BucketConfigs::new();
/// configs.insert("league".into(), BucketConfig::new(100, Duration::from_secs(1)));
///
/// let limiter = RateLimiter::new(configs, 0.9, None)?;
/// assert_eq!(limiter.status("league")?.available, 90);
///
/// let answer = limiter.execute("league", || async { Ok(42) }).await?;
/// assert_eq!(answer, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// All buckets by name, including the application bucket if any
    buckets: Arc<HashMap<BucketName, Arc<Bucket>>>,

    /// Bucket every request has to pass before its own
    application: Option<Arc<Bucket>>,

    /// Set once by [`RateLimiter::destroy`]
    destroyed: Arc<AtomicBool>,
}

impl RateLimiter {
    /// Create a limiter with one bucket per entry in `configs`.
    ///
    /// Buckets without their own buffer rate use `default_buffer_rate`.
    /// If `application` is set, it becomes the [`APPLICATION_BUCKET`]
    /// that wraps every other bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `default_buffer_rate` is not within `(0, 1]`
    /// - a bucket config could never admit a request
    pub fn new(
        configs: BucketConfigs,
        default_buffer_rate: f64,
        application: Option<BucketConfig>,
    ) -> Result<Self> {
        if !is_valid_buffer_rate(default_buffer_rate) {
            return Err(ErrorKind::InvalidBufferRate(default_buffer_rate));
        }

        let mut configs = configs;
        if let Some(config) = application {
            configs.insert(APPLICATION_BUCKET.into(), config);
        }

        let mut buckets = HashMap::with_capacity(configs.len());
        for (name, config) in configs {
            config.validate(&name, default_buffer_rate)?;
            log::debug!(
                "Bucket {name}: {} request(s) per {:?}",
                config.effective_max(default_buffer_rate),
                config.window
            );
            let bucket = Arc::new(Bucket::new(name.clone(), &config, default_buffer_rate));
            buckets.insert(name, bucket);
        }

        let application = application.and_then(|_| buckets.get(APPLICATION_BUCKET).cloned());

        Ok(Self {
            buckets: Arc::new(buckets),
            application,
            destroyed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Run `work` once the named bucket (and the application bucket, if
    /// configured) has admitted it.
    ///
    /// Resolves to whatever `work` resolves to. The bucket slot is held until
    /// `work` settles.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Destroyed`] after [`RateLimiter::destroy`]
    /// - [`ErrorKind::UnknownBucket`] if `bucket` was never configured
    /// - any error returned by `work`
    pub async fn execute<F, Fut, T>(&self, bucket: &str, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_destroyed() {
            return Err(ErrorKind::Destroyed);
        }
        let target = Arc::clone(self.bucket(bucket)?);

        match &self.application {
            Some(application) if !Arc::ptr_eq(application, &target) => {
                application
                    .execute(move || async move { target.execute(work).await })
                    .await
            }
            _ => target.execute(work).await,
        }
    }

    /// Run `work` for every key through the named bucket.
    ///
    /// `work(key)` is only called once the key has been admitted. At most `concurrency` keys are handed to the bucket at once (all of
    /// them if `None`). Results are in the order of `keys`. The first failure
    /// fails the batch.
    ///
    /// # Errors
    ///
    /// Same as [`RateLimiter::execute`], for the first key that fails.
    pub async fn execute_batch<K, W, Fut, T>(
        &self,
        bucket: &str,
        keys: Vec<K>,
        work: W,
        concurrency: Option<usize>,
    ) -> Result<Vec<T>>
    where
        K: Send + 'static,
        W: Fn(K) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_destroyed() {
            return Err(ErrorKind::Destroyed);
        }
        // Fail before touching any key
        self.bucket(bucket)?;

        run_batch(keys, concurrency, |key| {
            let work = work.clone();
            self.execute(bucket, move || work(key))
        })
        .await
    }

    /// Snapshot of a single bucket
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownBucket`] if `bucket` was never configured.
    pub fn status(&self, bucket: &str) -> Result<BucketStatus> {
        Ok(self.bucket(bucket)?.status())
    }

    /// Snapshot of every bucket, ordered by name
    #[must_use]
    pub fn all_statuses(&self) -> BucketStatusMap {
        self.buckets
            .iter()
            .map(|(name, bucket)| (name.clone(), bucket.status()))
            .collect()
    }

    /// Names of all configured buckets, in no particular order
    pub fn bucket_names(&self) -> impl Iterator<Item = &BucketName> {
        self.buckets.keys()
    }

    /// Whether the application-wide bucket is active
    #[must_use]
    pub const fn has_application_bucket(&self) -> bool {
        self.application.is_some()
    }

    /// Tear down every bucket.
    ///
    /// Queued work fails with [`ErrorKind::Destroyed`] right away, work that
    /// is already running is left to finish. Afterwards every call fails with
    /// [`ErrorKind::Destroyed`]. Calling this again has no effect.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("Destroying rate limiter");
        for bucket in self.buckets.values() {
            bucket.close();
        }
    }

    /// Whether [`RateLimiter::destroy`] was called
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn bucket(&self, name: &str) -> Result<&Arc<Bucket>> {
        self.buckets
            .get(name)
            .ok_or_else(|| ErrorKind::UnknownBucket(name.into()))
    }
}
