//! Deadline-bound HTTP invoker
//!
//! Performs exactly one outbound call per [`Invoker::invoke`] and enforces the
//! caller's time budget. A response of any status is returned as-is; judging
//! the status is left to the provider adapter. The invoker never logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use thiserror::Error;

/// A fully-built outbound request
#[derive(Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RequestDescriptor {
    /// A JSON `POST` with the content-type header already set
    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Header values carry credentials, so only names are printed.
impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &names)
            .finish()
    }
}

/// Status and body of a response that arrived within the deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why an invocation produced no response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Executes one request under a deadline
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        request: RequestDescriptor,
        timeout: Duration,
    ) -> Result<RawResponse, InvokeError>;
}

/// [`Invoker`] backed by a shared reqwest client
#[derive(Clone)]
pub struct HttpInvoker {
    client: Client,
}

impl Default for HttpInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpInvoker {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("cascade/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(
        &self,
        request: RequestDescriptor,
        timeout: Duration,
    ) -> Result<RawResponse, InvokeError> {
        let body = serde_json::to_vec(&request.body)
            .map_err(|e| InvokeError::Transport(format!("failed to encode body: {e}")))?;

        let mut builder = self.client.request(request.method, &request.url).body(body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        // Both the status line and the full body must land before the deadline.
        // Dropping the future on expiry closes the underlying connection.
        let call = async move {
            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(transport_error)?;
            Ok(RawResponse { status, body })
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(InvokeError::Timeout(timeout)),
        }
    }
}

fn transport_error(err: reqwest::Error) -> InvokeError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    InvokeError::Transport(message)
}
