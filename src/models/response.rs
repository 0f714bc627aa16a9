use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::request::ContentType;

/// One piece of a bot's streamed answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_suggested_reply: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_replace_response: bool,
}

impl PartialResponse {
    /// Plain text fragment appended to the answer
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Replace everything sent so far with `text`
    pub fn replace(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_replace_response: true,
            ..Self::default()
        }
    }

    /// Suggested follow-up reply shown to the user
    pub fn suggested_reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_suggested_reply: true,
            ..Self::default()
        }
    }
}

/// Error reported to the user in place of (or after) the answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<serde_json::Value>,
    #[serde(default)]
    pub allow_retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// First frame of every query response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_replies: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refetch_settings: Option<bool>,
}

impl MetaResponse {
    /// Meta frame announcing markdown content
    pub fn markdown() -> Self {
        Self {
            content_type: Some(ContentType::Markdown),
            ..Self::default()
        }
    }
}

/// Answer to a `settings` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsResponse {
    /// Bots this bot calls, with the number of calls per query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_bot_dependencies: Option<HashMap<String, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_attachments: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_text_attachments: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_image_comprehension: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_author_role_alternation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_multi_bot_chat_prompting: Option<bool>,
}

/// A message received from another bot through the bot client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotMessage {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_response_serializes_compactly() {
        let json = serde_json::to_string(&PartialResponse::text("Hello")).unwrap();
        assert_eq!(json, r#"{"text":"Hello"}"#);

        let json = serde_json::to_string(&PartialResponse::replace("Hi")).unwrap();
        assert_eq!(json, r#"{"text":"Hi","is_replace_response":true}"#);
    }

    #[test]
    fn test_meta_markdown() {
        let json = serde_json::to_string(&MetaResponse::markdown()).unwrap();
        assert_eq!(json, r#"{"content_type":"text/markdown"}"#);
    }

    #[test]
    fn test_settings_response_roundtrip_fields() {
        let mut deps = HashMap::new();
        deps.insert("Claude-3.5-Sonnet".to_string(), 1);
        let settings = SettingsResponse {
            server_bot_dependencies: Some(deps),
            ..SettingsResponse::default()
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["server_bot_dependencies"]["Claude-3.5-Sonnet"], 1);
        assert!(json.get("allow_attachments").is_none());
    }
}
