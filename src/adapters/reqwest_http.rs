//! Reqwest-based HTTP client adapter.

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use crate::traits::{BodyStream, Headers, HttpClient, HttpError, Response};

/// [`HttpClient`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Wrap a preconfigured client (timeouts, proxies, TLS).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert errors raised while reading the body.
    fn convert_body_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else {
            HttpError::Io(err.to_string())
        }
    }

    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        headers
            .iter()
            .fold(builder, |builder, (key, value)| builder.header(key, value))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.post(url).body(body.to_string()), headers);
        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_body_error)?;

        Ok(Response::with_headers(status, response_headers, body))
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<BodyStream, HttpError> {
        let builder = Self::apply_headers(self.client.post(url).body(body.to_string()), headers);
        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            debug!(status = status.as_u16(), url, "Stream request rejected");
            return Err(HttpError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(Self::convert_body_error));

        Ok(Box::pin(stream))
    }
}
