//! Mock HTTP client for testing.
//!
//! Returns canned responses keyed by URL and records every request so
//! tests can assert on the headers and body the bot client sent.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::{BodyStream, Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Headers,
    pub body: String,
}

impl RecordedRequest {
    /// Parse the recorded body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Buffered response, for `post`
    Success(Response),
    /// Fail the request before any body is read
    Error(HttpError),
    /// Stream these chunks, for `post_stream`
    Stream(Vec<Bytes>),
    /// Stream these chunks, then fail mid-body
    StreamThenError(Vec<Bytes>, HttpError),
}

impl MockResponse {
    /// Stream each frame as its own chunk.
    pub fn frames<S: AsRef<str>>(frames: &[S]) -> Self {
        MockResponse::Stream(
            frames
                .iter()
                .map(|f| Bytes::copy_from_slice(f.as_ref().as_bytes()))
                .collect(),
        )
    }
}

/// Mock HTTP client for testing.
///
/// ```ignore
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.poe.com/bot/Echo",
///     MockResponse::frames(&["event: text\ndata: {\"text\":\"hi\"}\n\n"]),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a URL. Exact matches win over prefix matches.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = lock(&self.responses);

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        let prefix_match = responses
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, response)| response.clone());
        if prefix_match.is_some() {
            return prefix_match;
        }

        lock(&self.default_response).clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request(url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream(_)) | Some(MockResponse::StreamThenError(..)) => Err(
                HttpError::Other("Stream response on non-stream request".to_string()),
            ),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<BodyStream, HttpError> {
        self.record_request(url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Stream(chunks)) => {
                Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
            }
            Some(MockResponse::StreamThenError(chunks, err)) => {
                let items = chunks.into_iter().map(Ok).chain(std::iter::once(Err(err)));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::Success(response)) if !response.is_success() => {
                Err(HttpError::ServerError {
                    status: response.status,
                    message: response.text(),
                })
            }
            Some(MockResponse::Success(_)) => Err(HttpError::Other(
                "Non-stream response on stream request".to_string(),
            )),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
