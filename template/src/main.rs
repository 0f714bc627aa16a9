use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use poe_bot::client::PoeClient;
use poe_bot::config::BotConfig;
use poe_bot::error::PoeError;
use poe_bot::models::{PartialResponse, QueryRequest, SettingsRequest, SettingsResponse};
use poe_bot::server;
use poe_bot::traits::{PoeBot, ResponseStream};

const BOT_NAME: &str = "poe-bot-template";
const UPSTREAM_BOT: &str = "Claude-3.5-Sonnet";

struct Bot {
    client: PoeClient,
}

#[async_trait]
impl PoeBot for Bot {
    fn get_response(&self, request: QueryRequest) -> ResponseStream {
        let client = self.client.clone();
        futures::stream::once(async move { client.stream_request(&request, UPSTREAM_BOT).await })
            .flat_map(|result| match result {
                Ok(messages) => messages
                    .map(|m| m.map(|m| PartialResponse::text(m.text)).map_err(PoeError::from))
                    .boxed(),
                Err(e) => futures::stream::once(async move { Err(e) }).boxed(),
            })
            .boxed()
    }

    async fn get_settings(&self, _request: SettingsRequest) -> SettingsResponse {
        SettingsResponse {
            server_bot_dependencies: Some(HashMap::from([(UPSTREAM_BOT.to_string(), 1)])),
            ..SettingsResponse::default()
        }
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BotConfig::from_env()?.with_bot_name(BOT_NAME);
    let bot = Bot {
        client: PoeClient::from_config(&config)?,
    };
    server::serve(&config, Arc::new(bot)).await?;
    Ok(())
}
