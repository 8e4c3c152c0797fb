//! HTTP client with rate limiting and rate-limit recovery
//!
//! Every request goes through the shared [`RateLimiter`] before it is sent.
//! The only automatic recovery is a single reissue after an upstream 429;
//! every other failure is classified into [`Error`] and returned at once.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default Notion API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";

/// Default Notion API version
pub const DEFAULT_API_VERSION: &str = "2022-06-28";

const NOTION_VERSION: HeaderName = HeaderName::from_static("notion-version");

/// Configuration for the HTTP client
#[derive(Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Bearer credential
    pub api_key: String,
    /// Value of the `Notion-Version` header
    pub api_version: String,
    /// Per-call deadline
    pub timeout: Duration,
    /// Rate budget
    pub rate_limit: RateLimiterConfig,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
            rate_limit: RateLimiterConfig::default(),
            user_agent: format!("notion-pacer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

impl std::fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the bearer credential
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API version header value
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config.api_version = version.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the rate budget
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = config;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// HTTP client with rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with its own rate limiter
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit)?);
        Self::with_rate_limiter(config, rate_limiter)
    }

    /// Create a client that draws from an existing, possibly shared, rate limiter
    pub fn with_rate_limiter(
        config: HttpClientConfig,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers(&config)?)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// The client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// The rate limiter every request draws from
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Execute one request and decode its JSON body.
    ///
    /// A 429 response is retried exactly once after backing off; a second 429
    /// is returned as an [`Error::UpstreamStatus`].
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&JsonValue>,
    ) -> Result<JsonValue> {
        let url = self.build_url(endpoint);

        if let Some(warning) = self.rate_limiter.acquire().await {
            warn!("{warning}");
        }

        let mut response = self.send(method, &url, body).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = extract_retry_after(&response);
            self.rate_limiter.handle_rate_limit_error(retry_after).await;
            debug!("Retrying {} {} after rate limit", method, url);
            response = self.send(method, &url, body).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(response).await);
        }

        debug!("Request succeeded: {} {} ({})", method, url, status.as_u16());
        self.decode_body(response).await
    }

    /// Make a GET request
    pub async fn get(&self, endpoint: &str) -> Result<JsonValue> {
        self.execute(Method::GET, endpoint, None).await
    }

    /// Make a POST request
    pub async fn post(&self, endpoint: &str, body: &JsonValue) -> Result<JsonValue> {
        self.execute(Method::POST, endpoint, Some(body)).await
    }

    async fn send(&self, method: Method, url: &str, body: Option<&JsonValue>) -> Result<Response> {
        let mut req = self
            .client
            .request(method.into(), url)
            .timeout(self.config.timeout);

        if let Some(body) = body {
            req = req.json(body);
        }

        req.send().await.map_err(|e| self.classify_transport(&e))
    }

    async fn status_error(&self, response: Response) -> Error {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let detail = extract_error_detail(&text);
        warn!("Notion API returned {}: {}", status, detail);
        Error::upstream_status(status, detail)
    }

    async fn decode_body(&self, response: Response) -> Result<JsonValue> {
        let text = response
            .text()
            .await
            .map_err(|e| self.classify_transport(&e))?;

        if text.trim().is_empty() {
            return Err(Error::empty_response(
                "Received empty response from Notion API",
            ));
        }

        let value: JsonValue = serde_json::from_str(&text).map_err(|e| {
            Error::empty_response(format!("Received invalid JSON response from Notion API: {e}"))
        })?;

        if is_empty_document(&value) {
            return Err(Error::empty_response(
                "Received empty response from Notion API",
            ));
        }

        Ok(value)
    }

    fn classify_transport(&self, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            Error::network(err.to_string())
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

fn default_headers(config: &HttpClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(|_| Error::invalid_value("api_key", "contains characters not allowed in a header"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    let version = HeaderValue::from_str(&config.api_version).map_err(|_| {
        Error::invalid_value("api_version", "contains characters not allowed in a header")
    })?;
    headers.insert(NOTION_VERSION, version);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(headers)
}

/// Extract the retry-after header value in seconds, if present and usable
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after)
}

pub(crate) fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs >= 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Best-effort upstream error detail: JSON `message`, then raw text, then a generic message
pub(crate) fn extract_error_detail(text: &str) -> String {
    serde_json::from_str::<JsonValue>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(JsonValue::as_str).map(str::to_string))
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Whether a decoded document carries nothing a caller could use
pub(crate) fn is_empty_document(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::String(s) => s.is_empty(),
        _ => false,
    }
}
