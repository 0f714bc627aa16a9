//! Bot configuration.
//!
//! Built with `with_*` methods or read from the environment:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ACCESS_KEY` / `POE_ACCESS_KEY` | none |
//! | `POE_BOT_NAME` | `poe-bot` |
//! | `POE_LISTEN_ADDR` | `127.0.0.1:8080` |
//! | `POE_API_BASE` | `https://api.poe.com/bot` |
//! | `POE_SETTINGS_BASE` | `https://api.poe.com/bot/fetch_settings` |
//! | `POE_UPSTREAM_BOT` | `Claude-3.5-Sonnet` |
//! | `POE_STREAM_IDLE_TIMEOUT_SECS` | `120`, `0` disables |

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{PoeError, PoeResult};
use crate::sse::StreamConfig;

pub const DEFAULT_BOT_NAME: &str = "poe-bot";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_API_BASE: &str = "https://api.poe.com/bot";
pub const DEFAULT_SETTINGS_BASE: &str = "https://api.poe.com/bot/fetch_settings";
pub const DEFAULT_UPSTREAM_BOT: &str = "Claude-3.5-Sonnet";

/// Settings shared by the bot server and the bot client.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Key the platform uses to call us and we use to call other bots
    pub access_key: Option<String>,
    pub bot_name: String,
    pub listen_addr: SocketAddr,
    /// Base URL for bot queries; the bot name is appended
    pub api_base: String,
    /// Base URL for settings sync
    pub settings_base: String,
    /// Bot the proxy forwards queries to
    pub upstream_bot: String,
    pub stream: StreamConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            bot_name: DEFAULT_BOT_NAME.to_string(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_base: DEFAULT_API_BASE.to_string(),
            settings_base: DEFAULT_SETTINGS_BASE.to_string(),
            upstream_bot: DEFAULT_UPSTREAM_BOT.to_string(),
            stream: StreamConfig::default(),
        }
    }
}

impl BotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = Some(key.into());
        self
    }

    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn with_settings_base(mut self, url: impl Into<String>) -> Self {
        self.settings_base = url.into();
        self
    }

    pub fn with_upstream_bot(mut self, name: impl Into<String>) -> Self {
        self.upstream_bot = name.into();
        self
    }

    pub fn with_stream_config(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Read the configuration from process environment variables.
    pub fn from_env() -> PoeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, treating empty values as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> PoeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        config.access_key = get("ACCESS_KEY").or_else(|| get("POE_ACCESS_KEY"));
        if let Some(name) = get("POE_BOT_NAME") {
            config.bot_name = name;
        }
        if let Some(addr) = get("POE_LISTEN_ADDR") {
            config.listen_addr = addr.trim().parse().map_err(|e| {
                PoeError::config(format!("POE_LISTEN_ADDR '{}' is invalid: {}", addr, e))
            })?;
        }
        if let Some(url) = get("POE_API_BASE") {
            config.api_base = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get("POE_SETTINGS_BASE") {
            config.settings_base = url.trim_end_matches('/').to_string();
        }
        if let Some(name) = get("POE_UPSTREAM_BOT") {
            config.upstream_bot = name;
        }
        if let Some(secs) = get("POE_STREAM_IDLE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                PoeError::config(format!(
                    "POE_STREAM_IDLE_TIMEOUT_SECS '{}' is invalid: {}",
                    secs, e
                ))
            })?;
            config.stream = if secs == 0 {
                config.stream.without_idle_timeout()
            } else {
                config.stream.with_idle_timeout(Duration::from_secs(secs))
            };
        }

        Ok(config)
    }

    /// The access key, or a configuration error if none was set.
    pub fn require_access_key(&self) -> PoeResult<&str> {
        self.access_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PoeError::config("Access Key is required (set ACCESS_KEY)"))
    }
}
