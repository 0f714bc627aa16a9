//! HTTP transport trait.
//!
//! The bot client talks to the bot API through this trait so tests can
//! swap the network for canned response bodies.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Response body delivered chunk by chunk.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// Server answered with a non-2xx status
    ServerError { status: u16, message: String },
    /// Request was cancelled
    Cancelled,
    /// Body read failed
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            HttpError::Cancelled => write!(f, "Request cancelled"),
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// HTTP operations used by the bot client.
///
/// Implementations: [`crate::adapters::ReqwestHttpClient`] for real
/// traffic and [`crate::adapters::MockHttpClient`] for tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST `body` and buffer the whole response.
    ///
    /// Non-2xx statuses are returned as a [`Response`], not an error.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// POST `body` and return the response body as a chunk stream.
    ///
    /// A non-2xx status is reported as [`HttpError::ServerError`] before
    /// any chunk is read.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<BodyStream, HttpError>;
}
