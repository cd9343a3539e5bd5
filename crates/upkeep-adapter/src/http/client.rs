/*
[INPUT]:  HTTP configuration (base URL, timeouts, credentials)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::http::{Result, UpkeepError};
use crate::types::ApiErrorBody;

/// Default base URL of the maintenance API
pub const DEFAULT_BASE_URL: &str = "https://api.upkeep.local";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Credentials for authenticated requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// HTTP client for the maintenance API
#[derive(Debug, Clone)]
pub struct UpkeepClient {
    http_client: Client,
    base_url: Url,
    timeout: Duration,
    credentials: Option<Credentials>,
}

impl UpkeepClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, DEFAULT_BASE_URL)
    }

    /// Create a new client against an explicit base URL
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: directory_url(base_url)?,
            timeout: config.timeout,
            credentials: None,
        })
    }

    /// Set credentials for authenticated requests
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Drop credentials, subsequent authenticated calls fail with `AuthRequired`
    pub fn clear_credentials(&mut self) {
        self.credentials = None;
    }

    /// Get credentials if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoints resolve below the base URL's path, `/api/x` included.
    fn url(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(endpoint.trim_start_matches('/'))
    }

    /// Build request builder for public endpoints
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Build request builder carrying the bearer token
    pub(crate) fn authed_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let credentials = self.credentials.as_ref().ok_or(UpkeepError::AuthRequired)?;
        let builder = self.request(method, endpoint)?;
        Ok(builder.header(AUTHORIZATION, format!("Bearer {}", credentials.token)))
    }

    /// Send a request and decode a JSON body, mapping non-2xx statuses to errors
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                UpkeepError::Timeout {
                    duration: self.timeout.as_secs(),
                }
            } else {
                UpkeepError::Http(err)
            }
        })?;

        let status = response.status();
        let url = response.url().clone();
        let retry_after = retry_after_secs(response.headers());
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "api response");

        if !status.is_success() {
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(UpkeepError::RateLimit { retry_after });
            }
            return Err(UpkeepError::from_status(status, error_message(&body, status)));
        }

        serde_json::from_str(&body).map_err(UpkeepError::from)
    }
}

/// Parse `base_url` so that relative joins keep its path: `https://host/cmms`
/// and `https://host/cmms/` both resolve `api/x` to `https://host/cmms/api/x`.
fn directory_url(base_url: &str) -> std::result::Result<Url, url::ParseError> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Seconds from a numeric `Retry-After` header, one second otherwise.
fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(1)
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
