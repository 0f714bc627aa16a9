//! Proxy bot: answers every query by forwarding it to another bot.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::ready;
use futures::stream::{self, StreamExt};
use tracing::info;

use crate::client::PoeClient;
use crate::error::PoeError;
use crate::models::{
    PartialResponse, QueryRequest, ReportErrorRequest, ReportFeedbackRequest, SettingsRequest,
    SettingsResponse,
};
use crate::traits::{HttpClient, PoeBot, ResponseStream};

/// Forwards queries to `upstream` and relays its text.
pub struct ProxyBot<C> {
    client: PoeClient<C>,
    upstream: String,
}

impl<C: HttpClient + 'static> ProxyBot<C> {
    pub fn new(client: PoeClient<C>, upstream: impl Into<String>) -> Self {
        Self {
            client,
            upstream: upstream.into(),
        }
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }
}

#[async_trait]
impl<C: HttpClient + 'static> PoeBot for ProxyBot<C> {
    fn get_response(&self, request: QueryRequest) -> ResponseStream {
        let client = self.client.clone();
        let upstream = self.upstream.clone();

        stream::once(async move { client.stream_request(&request, &upstream).await })
            .flat_map(|result| match result {
                Ok(messages) => messages
                    .map(|item| {
                        item.map(|message| PartialResponse::text(message.text))
                            .map_err(PoeError::from)
                    })
                    .boxed(),
                Err(e) => stream::once(ready(Err(e))).boxed(),
            })
            .boxed()
    }

    async fn get_settings(&self, _request: SettingsRequest) -> SettingsResponse {
        SettingsResponse {
            server_bot_dependencies: Some(HashMap::from([(self.upstream.clone(), 1)])),
            ..SettingsResponse::default()
        }
    }

    async fn on_feedback(&self, request: ReportFeedbackRequest) {
        info!(
            message_id = %request.message_id,
            feedback = ?request.feedback_type,
            "Received feedback"
        );
    }

    async fn on_error(&self, request: ReportErrorRequest) {
        tracing::warn!(message = %request.message, "Platform reported an error");
    }
}
