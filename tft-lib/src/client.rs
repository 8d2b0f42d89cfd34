//! Handler of TFT API requests.
//!
//! This module defines two structs, [`Client`] and [`ClientBuilder`].
//! `Client` sends requests through the rate limiter and the retry policy
//! and decodes the responses. `ClientBuilder` exposes a finer level of
//! granularity for building a `Client`.
#![allow(clippy::module_name_repetitions)]

use std::time::Duration;

use http::StatusCode;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use typed_builder::TypedBuilder;
use url::Url;

use crate::api::{LeagueApi, MatchApi, SummonerApi};
use crate::ratelimit::{
    BucketConfig, BucketOverrides, BucketStatus, BucketStatusMap, DEFAULT_BUFFER_RATE,
    RateLimiter, default_bucket_configs, is_valid_buffer_rate, retry_after_hint, run_batch,
};
use crate::region::{Region, RegionGroup};
use crate::retry::{RetryConfig, with_retry};
use crate::{ErrorKind, Result};

/// Default timeout per request, 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default user agent, `tft/<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("tft/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key
const RIOT_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-riot-token");

// Constants currently not configurable by the user.
/// A timeout for only the connect phase of a Client.
const CONNECT_TIMEOUT: u64 = 10;

/// Builder for [`Client`].
///
/// See crate-level documentation for usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
#[builder(builder_method(doc = "
Create a builder for building `ClientBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `ClientBuilder`.
"))]
pub struct ClientBuilder {
    /// Riot API key, sent as `X-Riot-Token` with every request.
    ///
    /// Building a client without one fails.
    api_key: Option<SecretString>,

    /// Per-bucket overrides of the default method limits.
    ///
    /// Every field that is set replaces the default, the rest is kept.
    /// Overrides for bucket names without a default add a new bucket and
    /// have to set both `max_requests` and `window`.
    rate_limits: BucketOverrides,

    /// Application-wide limit that every request passes before its own
    /// method bucket.
    app_rate_limit: Option<BucketConfig>,

    /// Share of every limit we actually use, in `(0, 1]`.
    /// Buckets with their own `buffer_rate` ignore it.
    #[builder(default = DEFAULT_BUFFER_RATE)]
    buffer_rate: f64,

    /// When and how often failed requests are repeated.
    retry: RetryConfig,

    /// Response timeout per request.
    ///
    /// A request that times out still holds its rate limit slot until it
    /// is abandoned.
    #[builder(default = DEFAULT_TIMEOUT)]
    timeout: Duration,

    /// Send every request to this URL instead of the Riot hosts.
    ///
    /// Useful for proxies and tests. Endpoint paths are appended to it.
    base_url: Option<Url>,

    /// User-agent sent with every request.
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)")]
    user_agent: String,

    /// Upper bound of concurrently queued requests in batch calls.
    ///
    /// Defaults to the size of the batch.
    batch_concurrency: Option<usize>,
}

impl Default for ClientBuilder {
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientBuilder {
    /// Instantiates a [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - No API key or an empty one was given.
    /// - The buffer rate is outside of `(0, 1]`.
    /// - A bucket configuration cannot admit any request.
    /// - The API key or user-agent is not a valid header value.
    /// - The base URL cannot have paths appended to it.
    /// - The request client cannot be created.
    ///   See [here](https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#errors).
    pub fn client(self) -> Result<Client> {
        let api_key = match &self.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => key,
            _ => return Err(ErrorKind::MissingApiKey),
        };
        if !is_valid_buffer_rate(self.buffer_rate) {
            return Err(ErrorKind::InvalidBufferRate(self.buffer_rate));
        }
        if let Some(base) = &self.base_url
            && base.cannot_be_a_base()
        {
            return Err(ErrorKind::InvalidBaseUrl(base.to_string()));
        }

        let mut token = HeaderValue::from_str(api_key.expose_secret())?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(RIOT_TOKEN_HEADER, token);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&self.user_agent)?);

        let reqwest_client = reqwest::ClientBuilder::new()
            .gzip(true)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
            .timeout(self.timeout)
            .build()
            .map_err(ErrorKind::BuildRequestClient)?;

        let mut configs = default_bucket_configs();
        for (name, over) in self.rate_limits {
            let base = configs
                .get(&name)
                .copied()
                .unwrap_or_else(|| BucketConfig::new(0, Duration::ZERO));
            configs.insert(name, over.apply(&base));
        }
        let limiter = RateLimiter::new(configs, self.buffer_rate, self.app_rate_limit)?;

        Ok(Client {
            reqwest_client,
            limiter,
            retry: self.retry,
            base_url: self.base_url,
            batch_concurrency: self.batch_concurrency,
        })
    }
}

/// Sends requests to the TFT API within its rate limits.
///
/// Every request is admitted by its method bucket (and the application
/// bucket, if configured) and retried according to the [`RetryConfig`].
/// Each retry is admitted again.
///
/// Cloning a client is cheap. Clones share their rate limit state, so one
/// client per API key is all it takes.
///
/// See [`ClientBuilder`] which contains sane defaults for all configuration options.
#[derive(Debug, Clone)]
pub struct Client {
    /// Underlying `reqwest` client instance that handles the HTTP requests.
    reqwest_client: reqwest::Client,
    /// Admission control for every bucket.
    limiter: RateLimiter,
    /// Retry policy applied to every request.
    retry: RetryConfig,
    /// Replaces the Riot hosts if set.
    base_url: Option<Url>,
    /// Upper bound of concurrently queued requests in batch calls.
    batch_concurrency: Option<usize>,
}

impl Client {
    /// League endpoints, served per platform
    #[must_use]
    pub const fn league(&self) -> LeagueApi<'_> {
        LeagueApi::new(self)
    }

    /// Match endpoints, served per region group
    #[must_use]
    pub const fn matches(&self) -> MatchApi<'_> {
        MatchApi::new(self)
    }

    /// Summoner endpoints, served per platform
    #[must_use]
    pub const fn summoner(&self) -> SummonerApi<'_> {
        SummonerApi::new(self)
    }

    /// Fetch `url` through `bucket` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt if every attempt failed, see
    /// [`ErrorKind`] for the possible failures.
    pub async fn execute_request<T>(&self, bucket: &str, url: Url) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        with_retry(&self.retry, || {
            let http = self.reqwest_client.clone();
            let url = url.clone();
            self.limiter
                .execute(bucket, move || fetch_json::<T>(http, url))
        })
        .await
    }

    /// Fetch one URL per key through `bucket`.
    ///
    /// Results are in the order of `keys`. Every key is retried on its own;
    /// the first key that still fails after that fails the whole batch.
    ///
    /// # Errors
    ///
    /// Returns the first error of any key, or an error from `url_for` if a
    /// URL cannot be built.
    pub async fn execute_batch<K, T, F>(&self, bucket: &str, keys: Vec<K>, url_for: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(&K) -> Result<Url>,
    {
        let url_for = &url_for;
        run_batch(keys, self.batch_concurrency, move |key| async move {
            let url = url_for(&key)?;
            self.execute_request(bucket, url).await
        })
        .await
    }

    /// Snapshot of a single bucket
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownBucket`] if there is no such bucket.
    pub fn status(&self, bucket: &str) -> Result<BucketStatus> {
        self.limiter.status(bucket)
    }

    /// Snapshot of every bucket, ordered by name
    #[must_use]
    pub fn statuses(&self) -> BucketStatusMap {
        self.limiter.all_statuses()
    }

    /// The rate limiter shared by this client and its clones
    #[must_use]
    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Stop accepting requests.
    ///
    /// Queued requests fail with [`ErrorKind::Destroyed`], requests already
    /// sent are left to finish. This affects every clone of this client.
    pub fn destroy(&self) {
        self.limiter.destroy();
    }

    /// URL of a platform endpoint
    pub(crate) fn platform_url(&self, region: Region, segments: &[&str]) -> Result<Url> {
        self.endpoint(&region.host(), segments)
    }

    /// URL of a regional endpoint
    pub(crate) fn regional_url(&self, group: RegionGroup, segments: &[&str]) -> Result<Url> {
        self.endpoint(&group.host(), segments)
    }

    fn endpoint(&self, host: &str, segments: &[&str]) -> Result<Url> {
        let mut url = match &self.base_url {
            Some(base) => base.clone(),
            None => Url::parse(host)?,
        };
        if url.cannot_be_a_base() {
            return Err(ErrorKind::InvalidBaseUrl(url.to_string()));
        }
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

/// A single attempt: send the request and decode the answer
async fn fetch_json<T: DeserializeOwned>(http: reqwest::Client, url: Url) -> Result<T> {
    log::trace!("GET {url}");
    let response = http
        .get(url.clone())
        .send()
        .await
        .map_err(ErrorKind::NetworkRequest)?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = retry_after_hint(response.headers());
        log::warn!("Rate limited on {url} (retry after {retry_after:?})");
        // A body that is not JSON must not hide the throttling
        let body = response.json().await.ok();
        return Err(ErrorKind::RateLimited {
            url: url.into(),
            retry_after,
            body,
        });
    }
    if !status.is_success() {
        log::debug!("{url} answered {status}");
        let body = response.json().await.ok();
        return Err(ErrorKind::Api {
            url: url.into(),
            status,
            body,
        });
    }

    response.json().await.map_err(ErrorKind::NetworkRequest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server;
    use crate::test_utils::{api_key, mock_client};
    use crate::ratelimit::{BucketOverride, LEAGUE_BUCKET, SUMMONER_BUCKET};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    #[test]
    fn test_missing_api_key() {
        assert_eq!(
            ClientBuilder::default().client().unwrap_err(),
            ErrorKind::MissingApiKey
        );
        assert_eq!(
            ClientBuilder::builder()
                .api_key(SecretString::from(String::new()))
                .build()
                .client()
                .unwrap_err(),
            ErrorKind::MissingApiKey
        );
    }

    #[test]
    fn test_buffer_rate_validation() {
        for rate in [0.0, 1.5] {
            let err = ClientBuilder::builder()
                .api_key(api_key())
                .buffer_rate(rate)
                .build()
                .client()
                .unwrap_err();
            assert_eq!(err, ErrorKind::InvalidBufferRate(rate));
            assert!(err.to_string().contains("between 0 (exclusive) and 1 (inclusive)"));
        }

        let client = ClientBuilder::builder()
            .api_key(api_key())
            .buffer_rate(0.5)
            .build()
            .client()
            .unwrap();
        // floor(1600 * 0.5)
        assert_eq!(client.status(SUMMONER_BUCKET).unwrap().available, 800);
    }

    #[test]
    fn test_rate_limit_overrides() {
        let client = ClientBuilder::builder()
            .api_key(api_key())
            .rate_limits(BucketOverrides::from([(
                LEAGUE_BUCKET.into(),
                BucketOverride {
                    max_requests: Some(100),
                    buffer_rate: Some(1.0),
                    ..BucketOverride::default()
                },
            )]))
            .build()
            .client()
            .unwrap();

        assert_eq!(client.status(LEAGUE_BUCKET).unwrap().available, 100);
        // Untouched buckets keep their defaults: floor(250 * 0.9)
        assert_eq!(client.status("match-detail").unwrap().available, 225);
        assert!(client.status("application").is_err());
    }

    #[test]
    fn test_incomplete_new_bucket_is_rejected() {
        let err = ClientBuilder::builder()
            .api_key(api_key())
            .rate_limits(BucketOverrides::from([(
                "custom".into(),
                BucketOverride {
                    max_requests: Some(10),
                    ..BucketOverride::default()
                },
            )]))
            .build()
            .client()
            .unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidBucketConfig { .. }));
    }

    #[test]
    fn test_riot_hosts() {
        let client = ClientBuilder::builder()
            .api_key(api_key())
            .build()
            .client()
            .unwrap();

        assert_eq!(
            client
                .platform_url(Region::Jp1, &["tft", "league", "v1", "challenger"])
                .unwrap()
                .as_str(),
            "https://jp1.api.riotgames.com/tft/league/v1/challenger"
        );
        assert_eq!(
            client
                .regional_url(RegionGroup::Asia, &["tft", "match", "v1", "matches", "KR_1"])
                .unwrap()
                .as_str(),
            "https://asia.api.riotgames.com/tft/match/v1/matches/KR_1"
        );
    }

    #[test]
    fn test_base_url_keeps_prefix() {
        let client = ClientBuilder::builder()
            .api_key(api_key())
            .base_url(Url::parse("http://localhost:8080/riot/").unwrap())
            .build()
            .client()
            .unwrap();

        assert_eq!(
            client
                .platform_url(Region::Na1, &["tft", "summoner"])
                .unwrap()
                .as_str(),
            "http://localhost:8080/riot/tft/summoner"
        );
    }

    #[tokio::test]
    async fn test_sends_key_and_accept_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tft/summoner/v1/summoners/by-puuid/test-puuid"))
            .and(header("X-Riot-Token", "test-key"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "puuid": "test-puuid" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let url = client
            .platform_url(
                Region::Jp1,
                &["tft", "summoner", "v1", "summoners", "by-puuid", "test-puuid"],
            )
            .unwrap();
        let body: Value = client.execute_request(SUMMONER_BUCKET, url).await.unwrap();

        assert_eq!(body, json!({ "puuid": "test-puuid" }));
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let server = mock_server!(
            StatusCode::TOO_MANY_REQUESTS,
            insert_header("Retry-After", "5"),
            set_body_json(json!({ "status": { "status_code": 429 } }))
        );
        let client = mock_client(&server);
        let url = Url::parse(&server.uri()).unwrap();

        let err = client
            .execute_request::<Value>(LEAGUE_BUCKET, url)
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
        assert_eq!(
            err.body(),
            Some(&json!({ "status": { "status_code": 429 } }))
        );
    }

    #[tokio::test]
    async fn test_rate_limited_without_usable_hint() {
        let server = mock_server!(
            StatusCode::TOO_MANY_REQUESTS,
            insert_header("Retry-After", "not-a-number"),
            set_body_string("<html>slow down</html>")
        );
        let client = mock_client(&server);
        let url = Url::parse(&server.uri()).unwrap();

        let err = client
            .execute_request::<Value>(LEAGUE_BUCKET, url)
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), None);
        assert_eq!(err.body(), None);
    }

    #[tokio::test]
    async fn test_rate_limited_with_huge_hint() {
        let server = mock_server!(
            StatusCode::TOO_MANY_REQUESTS,
            insert_header("Retry-After", "1e20")
        );
        let client = mock_client(&server);
        let url = Url::parse(&server.uri()).unwrap();

        let err = client
            .execute_request::<Value>(LEAGUE_BUCKET, url)
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), None);
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClientBuilder::builder()
            .api_key(api_key())
            .base_url(Url::parse(&server.uri()).unwrap())
            .build()
            .client()
            .unwrap();
        let url = Url::parse(&server.uri()).unwrap();

        let err = client
            .execute_request::<Value>(LEAGUE_BUCKET, url)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_api_error_keeps_status_and_body() {
        let server = mock_server!(
            StatusCode::NOT_FOUND,
            set_body_json(json!({ "status": { "message": "Data not found" } }))
        );
        let client = mock_client(&server);
        let url = Url::parse(&server.uri()).unwrap();

        let err = client
            .execute_request::<Value>(LEAGUE_BUCKET, url)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            err.body(),
            Some(&json!({ "status": { "message": "Data not found" } }))
        );
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_retries_throttled_requests() {
        /// Throttles the first request, then answers normally
        struct ThrottleOnce(Arc<AtomicUsize>);

        impl Respond for ThrottleOnce {
            fn respond(&self, _: &Request) -> ResponseTemplate {
                if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(429).insert_header("Retry-After", "0.05")
                } else {
                    ResponseTemplate::new(200).set_body_json(json!(["TFT_1", "TFT_2"]))
                }
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ThrottleOnce(Arc::clone(&calls)))
            .mount(&server)
            .await;

        let client = ClientBuilder::builder()
            .api_key(api_key())
            .base_url(Url::parse(&server.uri()).unwrap())
            .build()
            .client()
            .unwrap();
        let url = Url::parse(&server.uri()).unwrap();

        let ids: Vec<String> = client.execute_request("match-list", url).await.unwrap();

        assert_eq!(ids, ["TFT_1", "TFT_2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_a_network_error() {
        let server = mock_server!(
            StatusCode::OK,
            set_delay(Duration::from_millis(500))
        );
        let client = ClientBuilder::builder()
            .api_key(api_key())
            .timeout(Duration::from_millis(50))
            .retry(RetryConfig::disabled())
            .build()
            .client()
            .unwrap();
        let url = Url::parse(&server.uri()).unwrap();

        let err = client
            .execute_request::<Value>(LEAGUE_BUCKET, url)
            .await
            .unwrap_err();

        assert!(err.reqwest_error().is_some_and(reqwest::Error::is_timeout));
    }

    #[tokio::test]
    async fn test_unknown_bucket() {
        let server = mock_server!(StatusCode::OK);
        let client = mock_client(&server);
        let url = Url::parse(&server.uri()).unwrap();

        let err = client
            .execute_request::<Value>("nonexistent", url)
            .await
            .unwrap_err();
        assert_eq!(err, ErrorKind::UnknownBucket("nonexistent".into()));
    }

    #[tokio::test]
    async fn test_destroy_rejects_requests() {
        let server = mock_server!(StatusCode::OK, set_body_json(json!({})));
        let client = mock_client(&server);
        client.destroy();

        let url = Url::parse(&server.uri()).unwrap();
        let err = client
            .execute_request::<Value>(LEAGUE_BUCKET, url)
            .await
            .unwrap_err();
        assert_eq!(err, ErrorKind::Destroyed);
        assert_eq!(err.to_string(), "RateLimiter destroyed");
    }

    #[tokio::test]
    async fn test_app_rate_limit() {
        let server = mock_server!(StatusCode::OK, set_body_json(json!({ "ok": true })));
        let client = ClientBuilder::builder()
            .api_key(api_key())
            .base_url(Url::parse(&server.uri()).unwrap())
            .app_rate_limit(BucketConfig::new(100, Duration::from_secs(1)))
            .build()
            .client()
            .unwrap();
        assert!(client.limiter().has_application_bucket());

        let url = Url::parse(&server.uri()).unwrap();
        let body: Value = client.execute_request(LEAGUE_BUCKET, url).await.unwrap();
        assert_eq!(body, json!({ "ok": true }));

        let app = client.status("application").unwrap();
        assert_eq!(app.in_flight, 0);
        // floor(100 * 0.9) minus the request just made
        assert_eq!(app.available, 89);
    }

    #[tokio::test]
    async fn test_batch_keeps_key_order() {
        let server = MockServer::start().await;
        for id in ["a", "b", "c"] {
            Mock::given(method("GET"))
                .and(path(format!("/tft/match/v1/matches/{id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
                .mount(&server)
                .await;
        }
        let client = mock_client(&server);

        let bodies: Vec<Value> = client
            .execute_batch("match-detail", vec!["c", "a", "b"], |id| {
                client.regional_url(RegionGroup::Europe, &["tft", "match", "v1", "matches", *id])
            })
            .await
            .unwrap();

        assert_eq!(
            bodies,
            vec![json!({ "id": "c" }), json!({ "id": "a" }), json!({ "id": "b" })]
        );
    }
}
