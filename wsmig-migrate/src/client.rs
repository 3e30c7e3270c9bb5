//! Workspace REST API client.
//!
//! Everything the engine does against a workspace goes through the
//! [`WorkspaceApi`] trait, so pipelines can be driven by the reqwest-backed
//! [`HttpWorkspaceClient`] in production and by an in-memory fake in tests.

use std::fmt;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Maximum number of response body bytes kept in an error message.
const ERROR_BODY_LIMIT: usize = 500;

/// Connection settings for one workspace.
#[derive(Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// Base URL, e.g. `https://adb-123.4.azuredatabricks.net`.
    pub host: String,

    /// Personal access token sent as a bearer token.
    pub token: String,

    /// Request timeout in seconds. The transport default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Endpoint {
    /// Create an endpoint without a timeout.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            timeout_secs: None,
        }
    }

    /// Host without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Authenticated access to one workspace.
#[async_trait::async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Host this client talks to, for log and error messages.
    fn host(&self) -> &str;

    /// Issue a GET and decode the JSON response.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value>;

    /// Issue a POST with a JSON body and decode the JSON response.
    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value>;
}

/// [`WorkspaceApi`] implementation over HTTP.
pub struct HttpWorkspaceClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpWorkspaceClient {
    /// Build a client for an endpoint.
    pub fn new(endpoint: &Endpoint) -> ApiResult<Self> {
        let base_url = endpoint.base_url().to_string();
        let parsed =
            url::Url::parse(&base_url).map_err(|_| ApiError::InvalidHost(endpoint.host.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidHost(endpoint.host.clone()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", endpoint.token))
            .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = endpoint.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::transport(&base_url, e.to_string()))?;

        Ok(Self { base_url, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn describe(e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("timeout - request took too long ({})", e)
        } else if e.is_connect() {
            format!("connection error - check network connectivity and host ({})", e)
        } else {
            e.to_string()
        }
    }

    async fn handle_response(response: reqwest::Response, url: &str) -> ApiResult<Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::transport(url, Self::describe(&e)))?;

        if !status.is_success() {
            return Err(ApiError::status(url, status.as_u16(), truncate(&text)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl WorkspaceApi for HttpWorkspaceClient {
    fn host(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, Self::describe(&e)))?;
        Self::handle_response(response, &url).await
    }

    async fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::transport(&url, Self::describe(&e)))?;
        Self::handle_response(response, &url).await
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= ERROR_BODY_LIMIT {
        return text.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &text[..end])
}
