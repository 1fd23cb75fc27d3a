//! Shared HTTP plumbing for vendor clients

use std::time::Duration;

use crowdtest_core::ClientError;
use reqwest::header::HeaderValue;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::traits::VendorConfig;

// ============================================================================
// HTTP Client
// ============================================================================

/// Configuration for the pooled HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Request timeout
    pub request_timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 64,
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(30),
            user_agent: format!("crowdtest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Take the timeouts from a vendor configuration.
    pub fn from_vendor(config: &VendorConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            connect_timeout: config.connect_timeout,
            ..Self::default()
        }
    }

    /// Build the reqwest client.
    pub fn build(&self) -> Result<Client, ClientError> {
        Client::builder()
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))
    }
}

// ============================================================================
// Request / Response Helpers
// ============================================================================

/// Send a prepared request and return the body of a successful response.
pub(crate) async fn send(
    request: RequestBuilder,
    request_timeout: Duration,
) -> Result<String, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|e| map_transport_error(e, request_timeout))?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = parse_retry_after(response.headers().get("retry-after"));
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error body".to_string());
        return Err(map_http_error(status, &body, retry_after));
    }

    response
        .text()
        .await
        .map_err(|e| map_transport_error(e, request_timeout))
}

fn map_transport_error(err: reqwest::Error, request_timeout: Duration) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(request_timeout)
    } else {
        ClientError::Transport(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a non-success status onto a client error.
///
/// Both Anthropic and OpenAI wrap errors as `{"error": {"message": ...}}`;
/// other bodies are passed through verbatim.
pub fn map_http_error(status: StatusCode, body: &str, retry_after: Option<Duration>) -> ClientError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited { retry_after },
        s if s.is_server_error() => ClientError::ServerError {
            status: s.as_u16(),
            message,
        },
        _ => ClientError::InvalidRequest(format!("{}: {message}", status.as_u16())),
    }
}

/// Parse a `retry-after` header given in whole seconds.
pub fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
