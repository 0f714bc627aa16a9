//! Client for calling other bots.
//!
//! Sends a query to `{api_base}/{bot_name}` and turns the SSE response
//! into a stream of [`BotMessage`]s. Also syncs this bot's settings with
//! the platform.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures_util::StreamExt;
use tracing::{debug, info};

use crate::adapters::ReqwestHttpClient;
use crate::config::{BotConfig, DEFAULT_API_BASE, DEFAULT_SETTINGS_BASE};
use crate::error::{NetworkError, PoeError, PoeResult, StreamError};
use crate::models::{BotMessage, BotRequest, QueryRequest, RequestBody, PROTOCOL_VERSION};
use crate::sse::{decode_stream, ParsedEvent, StreamConfig};
use crate::traits::{Headers, HttpClient};

/// Messages streamed back from another bot.
pub type BotMessageStream = BoxStream<'static, Result<BotMessage, StreamError>>;

/// Map a decoded event to the message handed to callers.
///
/// Only text events carry content; anything else reaching here is a
/// protocol violation.
pub fn message_from_event(event: ParsedEvent) -> Result<BotMessage, StreamError> {
    match event {
        ParsedEvent::Text(payload) => Ok(BotMessage { text: payload.text }),
        other => Err(StreamError::UnexpectedEvent {
            event_type: other.event_type_name().to_string(),
        }),
    }
}

/// Bot API client, generic over the HTTP transport.
#[derive(Debug)]
pub struct PoeClient<C = ReqwestHttpClient> {
    http: Arc<C>,
    access_key: String,
    api_base: String,
    settings_base: String,
    stream_config: StreamConfig,
}

impl<C> Clone for PoeClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            access_key: self.access_key.clone(),
            api_base: self.api_base.clone(),
            settings_base: self.settings_base.clone(),
            stream_config: self.stream_config.clone(),
        }
    }
}

impl PoeClient<ReqwestHttpClient> {
    /// Client using reqwest and the public API endpoints.
    pub fn new(access_key: impl Into<String>) -> Self {
        Self::with_http_client(ReqwestHttpClient::new(), access_key)
    }

    /// Client using reqwest and the endpoints from `config`.
    pub fn from_config(config: &BotConfig) -> PoeResult<Self> {
        let key = config.require_access_key()?;
        Ok(Self::new(key)
            .with_api_base(&config.api_base)
            .with_settings_base(&config.settings_base)
            .with_stream_config(config.stream.clone()))
    }
}

impl<C: HttpClient + 'static> PoeClient<C> {
    pub fn with_http_client(http: C, access_key: impl Into<String>) -> Self {
        Self {
            http: Arc::new(http),
            access_key: access_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            settings_base: DEFAULT_SETTINGS_BASE.to_string(),
            stream_config: StreamConfig::default(),
        }
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_settings_base(mut self, url: impl Into<String>) -> Self {
        self.settings_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_stream_config(mut self, config: StreamConfig) -> Self {
        self.stream_config = config;
        self
    }

    /// The transport, mostly for inspecting a mock in tests.
    pub fn http(&self) -> &C {
        &self.http
    }

    fn query_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.access_key),
        );
        headers.insert("Accept".to_string(), "text/event-stream".to_string());
        headers.insert("Cache-Control".to_string(), "no-cache".to_string());
        headers
    }

    /// Send `request` to `bot_name` and stream its answer.
    ///
    /// Fails before streaming on transport errors or a non-2xx status.
    /// The returned stream ends at the upstream `done` frame or end of
    /// body; errors while streaming are yielded once and end it.
    pub async fn stream_request(
        &self,
        request: &QueryRequest,
        bot_name: &str,
    ) -> PoeResult<BotMessageStream> {
        let url = format!("{}/{}", self.api_base, urlencoding::encode(bot_name));
        let body = serde_json::to_string(&BotRequest::new(RequestBody::Query(request.clone())))?;

        debug!(bot = bot_name, url = %url, "Sending query");
        let body_stream = self
            .http
            .post_stream(&url, &body, &self.query_headers())
            .await
            .map_err(|e| match NetworkError::from(e) {
                NetworkError::ConnectionFailed { message, .. } => NetworkError::ConnectionFailed {
                    url: url.clone(),
                    message,
                },
                other => other,
            })?;

        let messages = decode_stream(body_stream, self.stream_config.clone())
            .map(|item| item.and_then(message_from_event));
        Ok(messages.boxed())
    }

    /// Ask the platform to refetch this bot's settings.
    ///
    /// Returns the response text on success.
    pub async fn sync_bot_settings(&self, bot_name: &str) -> PoeResult<String> {
        let url = format!(
            "{}/{}/{}/{}",
            self.settings_base,
            urlencoding::encode(bot_name),
            urlencoding::encode(&self.access_key),
            PROTOCOL_VERSION
        );

        let response = self.http.post(&url, "", &Headers::new()).await?;
        let text = response.text();
        if !response.is_success() {
            return Err(PoeError::Network(NetworkError::HttpStatus {
                status: response.status,
                message: format!("Error fetching settings for bot {}: {}", bot_name, text),
            }));
        }

        info!(bot = bot_name, response = %text, "Bot settings synced");
        Ok(text)
    }
}
