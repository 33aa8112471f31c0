//! REST client for the Tether chat backend.
//!
//! # Architecture
//!
//! - [`ApiClient`] - Owns the HTTP connection pool, the backend origin and the
//!   credential source. Every call goes through [`ApiClient::send`].
//! - [`ApiRequest`] - Describes one call: method, route, body encoding, auth
//!   policy and the operation's fallback error message.
//! - [`endpoints`] - One typed method per backend route.
//! - [`credentials`] - Where the bearer token comes from.
//!
//! # Routes
//!
//! Routes live under `{origin}/api` ([`ApiVersion::V1`]) or `{origin}/api/v2`
//! ([`ApiVersion::V2`]). Path segments are percent-encoded individually, so
//! conversation identifiers may contain any character.
//!
//! # Error Handling
//!
//! Non-2xx responses become [`ApiError::Server`] carrying the server's
//! `message` field when present, otherwise the operation's default text
//! (e.g. "Failed to mark chat as read"). Requests that require a token fail
//! with [`ApiError::MissingToken`] before touching the network.
//!
//! There is no automatic retry. Each request carries a deadline
//! ([`ApiClientConfig::request_timeout`]) so a hung backend surfaces as
//! [`ApiError::Timeout`] instead of leaving the caller waiting forever.

pub mod credentials;
pub mod endpoints;
mod error;

pub use credentials::{CredentialStore, MemoryCredentialStore, StaticCredentialStore};
pub use endpoints::{MuteState, ReadState, UnreadCount, WaitlistEncoding};
pub use error::ApiError;
pub use tether_types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use tether_types::AccessToken;

/// Backend origin used when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Message attached to [`ApiError::MissingToken`].
pub const MISSING_TOKEN_MESSAGE: &str = "No access token found. Please sign in again.";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 16;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Route prefix under the backend origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V1,
    V2,
}

impl ApiVersion {
    fn segments(self) -> &'static [&'static str] {
        match self {
            ApiVersion::V1 => &["api"],
            ApiVersion::V2 => &["api", "v2"],
        }
    }
}

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Auth {
    /// Never attach a token.
    None,
    /// Attach the token if one is stored; otherwise send unauthenticated and
    /// let the server decide.
    #[default]
    Optional,
    /// Fail with [`ApiError::MissingToken`] if no token is stored.
    Required,
}

/// Body encoding for a request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// `application/json`.
    Json(Value),
    /// `application/x-www-form-urlencoded` key/value pairs.
    Form(Vec<(String, String)>),
    /// A JSON document sent verbatim under a form-urlencoded content type.
    /// Some backend routes parse their body this way.
    JsonAsForm(Value),
}

/// One backend call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    version: ApiVersion,
    path: Vec<String>,
    query: Vec<(String, String)>,
    body: RequestBody,
    auth: Auth,
    operation: &'static str,
}

impl ApiRequest {
    /// `operation` doubles as the default error message when the server
    /// rejects the call without one of its own.
    pub fn new<S: AsRef<str>>(method: Method, path: &[S], operation: &'static str) -> Self {
        Self {
            method,
            version: ApiVersion::V1,
            path: path.iter().map(|s| s.as_ref().to_string()).collect(),
            query: Vec::new(),
            body: RequestBody::Empty,
            auth: Auth::Optional,
            operation,
        }
    }

    pub fn get<S: AsRef<str>>(path: &[S], operation: &'static str) -> Self {
        Self::new(Method::GET, path, operation)
    }

    pub fn post<S: AsRef<str>>(path: &[S], operation: &'static str) -> Self {
        Self::new(Method::POST, path, operation)
    }

    pub fn version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    #[must_use]
    pub fn request_body(&self) -> &RequestBody {
        &self.body
    }
}

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("invalid backend url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ApiClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ApiClientError> {
        let invalid = |reason: String| ApiClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let url = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path".to_string()));
        }
        Ok(Self {
            base_url: url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(concat!("tether/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

/// Authenticated transport to the backend. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: ApiClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiClientError> {
        let http = base_client_builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiClientError::Build)?;
        Ok(Self {
            http,
            base_url: config.base_url,
            credentials,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Absolute URL for a request, including its query string.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(request.version.segments());
            segments.extend(request.path.iter());
        }
        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    fn resolve_token(&self, auth: Auth) -> Result<Option<AccessToken>, ApiError> {
        match auth {
            Auth::None => Ok(None),
            Auth::Optional => Ok(self.credentials.access_token()),
            Auth::Required => self
                .credentials
                .access_token()
                .map(Some)
                .ok_or(ApiError::MissingToken(MISSING_TOKEN_MESSAGE)),
        }
    }

    /// Perform a request and decode its JSON body.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let operation = request.operation;
        let token = self.resolve_token(request.auth)?;
        let url = self.url_for(&request)?;

        tracing::debug!(
            method = %request.method,
            path = url.path(),
            authenticated = token.is_some(),
            "Sending API request"
        );

        let mut builder = self.http.request(request.method, url);
        if let Some(token) = &token {
            builder = builder.header(AUTHORIZATION, token.bearer_header());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                builder.header(CONTENT_TYPE, FORM_URLENCODED).body(encoded)
            }
            RequestBody::JsonAsForm(value) => builder
                .header(CONTENT_TYPE, FORM_URLENCODED)
                .body(value.to_string()),
        };

        let response = builder
            .send()
            .await
            .map_err(|source| transport_error(operation, source))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            let message = extract_error_message(&body).unwrap_or_else(|| operation.to_string());
            tracing::warn!(status = status.as_u16(), operation, "API request rejected");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| transport_error(operation, source))?;
        decode_body(&bytes, operation)
    }
}

fn transport_error(operation: &'static str, source: reqwest::Error) -> ApiError {
    if source.is_timeout() {
        tracing::warn!(operation, "API request timed out");
        return ApiError::Timeout { operation };
    }
    tracing::warn!(operation, error = %source, "API request failed");
    ApiError::Transport { operation, source }
}

/// Decode a 2xx body. An empty body reads as `{}`.
fn decode_body<T: DeserializeOwned>(bytes: &[u8], operation: &'static str) -> Result<T, ApiError> {
    let decoded = if bytes.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Object(serde_json::Map::new()))
    } else {
        serde_json::from_slice(bytes)
    };
    decoded.map_err(|e| ApiError::Decode {
        operation,
        detail: e.to_string(),
    })
}

/// Pull a human-readable message out of an error body.
#[must_use]
pub fn extract_error_message(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body.trim()).ok()?;
    payload
        .pointer("/message")
        .and_then(Value::as_str)
        .or_else(|| payload.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| payload.pointer("/error").and_then(Value::as_str))
        .or_else(|| payload.pointer("/detail").and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}

pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
