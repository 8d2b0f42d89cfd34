//! Typed access to the TFT endpoints.
//!
//! Each sub-client borrows a [`Client`](crate::Client) and only knows how to
//! build URLs and which bucket an endpoint belongs to. Rate limiting, retries
//! and decoding happen in the client.

mod league;
mod matches;
mod summoner;
pub mod types;

pub use league::LeagueApi;
pub use matches::{MatchApi, MatchListOptions};
pub use summoner::SummonerApi;
