//! `tft-lib` is an async client for the Riot Games TFT API that stays
//! within the API's rate limits.
//!
//! Every request is admitted by a rate limit bucket for its method group,
//! optionally by an application-wide bucket, and retried on transient
//! failures:
//!
//! ```no_run
//! use tft_lib::region::{Region, RegionGroup};
//! use tft_lib::api::MatchListOptions;
//! use tft_lib::{ClientBuilder, Result};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!   let client = ClientBuilder::builder()
//!       .api_key(SecretString::from("RGAPI-...".to_string()))
//!       .build()
//!       .client()?;
//!
//!   let summoner = client.summoner().by_puuid(Region::Jp1, "some-puuid").await?;
//!   let ids = client
//!       .matches()
//!       .ids(RegionGroup::Asia, &summoner.puuid, &MatchListOptions::default())
//!       .await?;
//!   let matches = client.matches().batch_get(RegionGroup::Asia, &ids).await?;
//!   println!("{} matches", matches.len());
//!   Ok(())
//! }
//! ```
//!
//! The rate limiter can also be used on its own to throttle any async work,
//! see [`RateLimiter`].

mod client;
mod types;

pub mod api;
pub mod ratelimit;
pub mod region;
pub mod retry;
#[cfg(test)]
#[macro_use]
pub mod test_utils;

pub use client::{Client, ClientBuilder, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use ratelimit::{BucketConfig, BucketName, BucketStatus, RateLimiter};
pub use region::{Region, RegionGroup};
pub use retry::{RetryConfig, with_retry};
pub use types::*;
