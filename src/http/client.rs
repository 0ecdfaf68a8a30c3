//! Feed client
//!
//! One authenticated GET per run. Anything but `200 OK` is a failure; there
//! is no retry.

use crate::config::FeedSettings;
use crate::error::{Error, Result};
use crate::transform::{json_type_name, RawElectionRecord};
use crate::types::JsonValue;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Extra headers sent with every request
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("election-guide-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Client for the election feed
pub struct FeedClient {
    client: Client,
    config: HttpClientConfig,
}

impl FeedClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Fetch the full feed
    ///
    /// The body must be a JSON array of objects; each element is kept
    /// verbatim. An empty array is returned as-is for the caller to judge.
    pub async fn fetch(&self, feed: &FeedSettings) -> Result<Vec<RawElectionRecord>> {
        let mut req = self
            .client
            .get(feed.endpoint.clone())
            .header(AUTHORIZATION, format!("Token {}", feed.token));

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        debug!("GET {}", feed.endpoint);
        let response = req.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        let body = response.text().await?;
        let records = parse_feed(&body)?;
        debug!("Received {} records ({} bytes)", records.len(), body.len());
        Ok(records)
    }
}

/// Decode a feed body into raw records
pub fn parse_feed(body: &str) -> Result<Vec<RawElectionRecord>> {
    let value: JsonValue =
        serde_json::from_str(body).map_err(|e| Error::decode(format!("invalid JSON: {e}")))?;

    let JsonValue::Array(items) = value else {
        return Err(Error::decode(format!(
            "expected a JSON array, got {}",
            json_type_name(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            RawElectionRecord::from_value(item)
                .map_err(|_| Error::decode(format!("element {index} is not an object")))
        })
        .collect()
}
