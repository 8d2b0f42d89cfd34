//! Per-bucket admission control for API requests.
//!
//! The TFT API enforces several independent budgets at once: one per
//! method group and one for the application as a whole. Every budget is
//! modeled as a named bucket with a sliding window of recent admissions.
//! Requests queue up in their bucket and are released in FIFO order as soon
//! as the window has room for them.
//!
//! # Architecture
//!
//! - [`BucketName`]: Identifies a budget, e.g. `league` or `match-list`
//! - [`BucketConfig`]: Requests per window and the share of it we use
//! - [`SlidingWindow`]: Admission instants inside the current window
//! - [`RateLimiter`]: Owns every bucket and routes work to them
//! - [`BucketStatus`]: A snapshot of a bucket's occupancy
//! - [`run_batch`]: Bounded, order-preserving fan-out over many keys

mod batch;
mod bucket;
mod config;
mod headers;
mod limiter;
mod window;

pub use batch::run_batch;
pub(crate) use bucket::Bucket;
pub use bucket::{BucketName, BucketStatus, BucketStatusMap};
pub use config::{
    APPLICATION_BUCKET, BucketConfig, BucketConfigs, BucketOverride, BucketOverrides,
    DEFAULT_BUFFER_RATE, LEAGUE_BUCKET, MATCH_DETAIL_BUCKET, MATCH_LIST_BUCKET, SUMMONER_BUCKET,
    default_bucket_configs, is_valid_buffer_rate,
};
pub(crate) use headers::retry_after_hint;
pub use limiter::RateLimiter;
pub use window::SlidingWindow;
