use crate::options::{Config, RIOT_API_KEY_ENV};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tft_lib::ratelimit::DEFAULT_BUFFER_RATE;
use tft_lib::{Client, ClientBuilder};

/// Creates a client according to the command-line config
pub(crate) fn create(cfg: &Config) -> Result<Client> {
    let api_key = cfg.api_key.clone().or_else(|| {
        std::env::var(RIOT_API_KEY_ENV)
            .ok()
            .map(SecretString::from)
    });

    ClientBuilder::builder()
        .api_key(api_key)
        .rate_limits(cfg.rate_limits.clone())
        .app_rate_limit(cfg.app_rate_limit)
        .buffer_rate(cfg.buffer_rate.unwrap_or(DEFAULT_BUFFER_RATE))
        .retry(cfg.retry())
        .timeout(cfg.timeout())
        .base_url(cfg.base_url.clone())
        .user_agent(cfg.user_agent.clone())
        .batch_concurrency(cfg.batch_concurrency)
        .build()
        .client()
        .context("Failed to create API client")
}
