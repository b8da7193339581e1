//! HTTP transport layer
//!
//! `Transport` is the seam between the stage engine and the network. The
//! reqwest-backed implementation is used by the CLI; tests substitute their
//! own.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;

use crate::common::config::HttpConfig;
use crate::common::{Error, Result};

use super::request::{PreparedRequest, RequestBody};

/// Status and body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Sends exactly one request and reads the whole body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse>;
}

/// Transport backed by a shared reqwest client
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client from the `[http]` configuration
    ///
    /// Configured headers are sent with every request unless a stage
    /// declares the same header.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let default_headers = header_map(config.headers.iter())?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(default_headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            Error::InvalidRequest(format!("invalid HTTP method '{}'", request.method))
        })?;
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| Error::InvalidRequest(format!("invalid URL '{}': {}", request.url, e)))?;

        let mut headers = header_map(request.headers.iter())?;
        if let Some(content_type) = request.body.content_type() {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        let mut builder = self.client.request(method, url).headers(headers);
        if !matches!(request.body, RequestBody::Empty) {
            builder = builder.body(request.body.as_str().to_string());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response body: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}

/// Build a header map; repeated names overwrite earlier ones
fn header_map<'a>(headers: impl Iterator<Item = (&'a String, &'a String)>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidRequest(format!("invalid header name '{}'", name)))?;
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            Error::InvalidRequest(format!("invalid value for header '{}'", name))
        })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
