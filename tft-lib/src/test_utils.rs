use secrecy::SecretString;
use url::Url;
use wiremock::MockServer;

use crate::{Client, ClientBuilder, RetryConfig};

#[macro_export]
/// Creates a mock web server, which responds with a predefined status when
/// handling a matching request
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new(http::StatusCode::from($status));
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method("GET")).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// A placeholder API key
pub(crate) fn api_key() -> SecretString {
    SecretString::from("test-key".to_string())
}

/// A client sending every request to `server`, without retries
///
/// # Panic
///
/// This panics if the client cannot be built, so it should only be used for
/// testing
pub(crate) fn mock_client(server: &MockServer) -> Client {
    ClientBuilder::builder()
        .api_key(api_key())
        .base_url(Url::parse(&server.uri()).expect("Expected valid mock server URI"))
        .retry(RetryConfig::disabled())
        .build()
        .client()
        .expect("Expected valid mock client")
}
