//! Thin client for the n8n public REST API.
//!
//! Tool handlers talk to `N8nApi` instead of reqwest directly, so the
//! dispatcher can be tested against an in-memory implementation.

use std::fmt;
use std::future::Future;

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde_json::{json, Value};

use crate::config::{ConfigError, N8nConfig};

/// Header carrying the n8n API key.
pub const API_KEY_HEADER: &str = "x-n8n-api-key";

/// Result type for remote calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of a single call to the n8n API.
///
/// Kinds are not distinguished further; the dispatcher only needs a message
/// and whatever body the server sent back.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Option<Value> },
    #[error("Request failed: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Structured detail for the error envelope: the server body when there
    /// is one, else a description of the raw failure.
    pub fn details(&self) -> Value {
        match self {
            RemoteError::Status {
                body: Some(body), ..
            } => body.clone(),
            RemoteError::Status { status, body: None } => json!({ "status": status }),
            RemoteError::Transport(message) => json!({
                "kind": "transport",
                "message": message,
            }),
        }
    }

    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Transport(_) => None,
        }
    }
}

/// HTTP verbs used against the n8n API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Verbs the tool handlers need. Paths are relative to `/api/v1`.
pub trait N8nApi: Send + Sync + 'static {
    fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = RemoteResult<Value>> + Send;
    fn post(&self, path: &str, body: &Value) -> impl Future<Output = RemoteResult<Value>> + Send;
    fn patch(&self, path: &str, body: &Value)
        -> impl Future<Output = RemoteResult<Value>> + Send;
    fn put(&self, path: &str, body: &Value) -> impl Future<Output = RemoteResult<Value>> + Send;
    fn delete(&self, path: &str) -> impl Future<Output = RemoteResult<Value>> + Send;
}

// ── HttpN8nClient: real implementation backed by reqwest ─────────────────

/// reqwest client bound to one instance and one API key.
#[derive(Debug, Clone)]
pub struct HttpN8nClient {
    client: reqwest::Client,
    api_url: String,
}

impl HttpN8nClient {
    /// Build the client from an already resolved configuration.
    pub fn new(config: &N8nConfig) -> Result<Self, ConfigError> {
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| ConfigError::InvalidApiKey(e.to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> RemoteResult<Value> {
        let url = format!("{}{}", self.api_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.into(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        debug!("{} {} -> {}", method, url, status);

        if status.is_success() {
            Ok(decode_body(&text))
        } else {
            let body = (!text.trim().is_empty()).then(|| decode_body(&text));
            Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl N8nApi for HttpN8nClient {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> RemoteResult<Value> {
        self.request(HttpMethod::Get, path, query, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> RemoteResult<Value> {
        self.request(HttpMethod::Post, path, &[], Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> RemoteResult<Value> {
        self.request(HttpMethod::Patch, path, &[], Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> RemoteResult<Value> {
        self.request(HttpMethod::Put, path, &[], Some(body)).await
    }

    async fn delete(&self, path: &str) -> RemoteResult<Value> {
        self.request(HttpMethod::Delete, path, &[], None).await
    }
}

/// Empty bodies become `null`, non-JSON bodies a JSON string.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

// ── MockN8n for testing ──────────────────────────────────────────────────


// ── Tests ────────────────────────────────────────────────────────────────
