//! Request construction
//!
//! Turns a hydrated stage request into a wire-ready method, URL, header set
//! and body, without touching the network.

use std::collections::BTreeMap;

use crate::testing::Request;

/// Body of a prepared request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// JSON-encoded object
    Json(String),
    /// `application/x-www-form-urlencoded` pairs
    Form(String),
}

impl RequestBody {
    /// Content type implied by the body, if any
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some("application/json"),
            RequestBody::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RequestBody::Empty => "",
            RequestBody::Json(body) | RequestBody::Form(body) => body,
        }
    }
}

/// A request ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

impl PreparedRequest {
    /// Build the wire form of a hydrated request
    pub fn build(request: &Request) -> Self {
        let method = if request.method.trim().is_empty() {
            "GET".to_string()
        } else {
            request.method.clone()
        };

        Self {
            method,
            url: join_url(&request.url, &request.url_pattern),
            headers: request.headers.clone(),
            body: encode_body(&request.json, &request.data),
        }
    }

    /// Look up a declared header, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Join base URL and path pattern with a single `/`, as written
///
/// Duplicate slashes are kept, so `http://h/` + `/x` gives `http://h///x`.
pub fn join_url(base: &str, pattern: &str) -> String {
    format!("{}/{}", base, pattern)
}

/// JSON wins when non-empty, then form data, else no body
pub fn encode_body(
    json: &serde_json::Map<String, serde_json::Value>,
    data: &BTreeMap<String, String>,
) -> RequestBody {
    if !json.is_empty() {
        RequestBody::Json(serde_json::Value::Object(json.clone()).to_string())
    } else if !data.is_empty() {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(data.iter())
            .finish();
        RequestBody::Form(encoded)
    } else {
        RequestBody::Empty
    }
}
