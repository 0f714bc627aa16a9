use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Protocol version sent with every request and settings sync
pub const PROTOCOL_VERSION: &str = "1.0";

/// Author of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Bot,
}

/// MIME type of message content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    #[serde(rename = "text/markdown")]
    Markdown,
    #[serde(rename = "text/plain")]
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageFeedback {
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub content_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_content: Option<String>,
}

/// One message of the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub content_type: ContentType,
    /// Microseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub feedback: Vec<MessageFeedback>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl ProtocolMessage {
    /// Minimal user message, mostly for tests and forwarding
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            content_type: ContentType::Markdown,
            timestamp: 0,
            message_id: String::new(),
            feedback: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// A query: the conversation so far, to be answered by the bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: Vec<ProtocolMessage>,
    pub user_id: String,
    pub conversation_id: String,
    pub message_id: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_system_prompt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl QueryRequest {
    /// Build a query from conversation history
    pub fn new(
        query: Vec<ProtocolMessage>,
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            query,
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            message_id: message_id.into(),
            access_key: String::new(),
            temperature: None,
            skip_system_prompt: None,
            logit_bias: None,
            stop_sequences: None,
            language_code: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsRequest {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFeedbackRequest {
    pub message_id: String,
    pub user_id: String,
    pub conversation_id: String,
    pub feedback_type: FeedbackType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportErrorRequest {
    pub message: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Body of a request to the bot endpoint, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    Query(QueryRequest),
    Settings(SettingsRequest),
    ReportFeedback(ReportFeedbackRequest),
    ReportError(ReportErrorRequest),
}

impl RequestBody {
    /// Wire name of the request type
    pub fn type_name(&self) -> &'static str {
        match self {
            RequestBody::Query(_) => "query",
            RequestBody::Settings(_) => "settings",
            RequestBody::ReportFeedback(_) => "report_feedback",
            RequestBody::ReportError(_) => "report_error",
        }
    }
}

/// Full request envelope: protocol version plus the typed body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotRequest {
    pub version: String,
    #[serde(flatten)]
    pub body: RequestBody,
}

impl BotRequest {
    pub fn new(body: RequestBody) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_deserialize() {
        let json = r#"{
            "version": "1.0",
            "type": "query",
            "query": [{
                "role": "user",
                "content": "Hello",
                "content_type": "text/markdown",
                "timestamp": 1718000000000000,
                "message_id": "m-1",
                "feedback": [],
                "attachments": []
            }],
            "user_id": "u-1",
            "conversation_id": "c-1",
            "message_id": "m-2",
            "access_key": "",
            "temperature": 0.7
        }"#;

        let request: BotRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.version, "1.0");
        match request.body {
            RequestBody::Query(query) => {
                assert_eq!(query.query.len(), 1);
                assert_eq!(query.query[0].role, Role::User);
                assert_eq!(query.query[0].content, "Hello");
                assert_eq!(query.query[0].content_type, ContentType::Markdown);
                assert_eq!(query.temperature, Some(0.7));
                assert_eq!(query.conversation_id, "c-1");
            }
            other => panic!("Expected query, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_settings_request_deserialize() {
        let request: BotRequest =
            serde_json::from_str(r#"{"version":"1.0","type":"settings"}"#).unwrap();
        assert_eq!(request.body, RequestBody::Settings(SettingsRequest {}));
    }

    #[test]
    fn test_report_feedback_deserialize() {
        let request: BotRequest = serde_json::from_str(
            r#"{"version":"1.0","type":"report_feedback","message_id":"m","user_id":"u","conversation_id":"c","feedback_type":"dislike"}"#,
        )
        .unwrap();
        match request.body {
            RequestBody::ReportFeedback(feedback) => {
                assert_eq!(feedback.feedback_type, FeedbackType::Dislike)
            }
            other => panic!("Expected report_feedback, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_unknown_type_fails() {
        let result = serde_json::from_str::<BotRequest>(r#"{"version":"1.0","type":"bogus"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_envelope() {
        let request = BotRequest::new(RequestBody::Query(QueryRequest::new(
            vec![ProtocolMessage::user("Hi")],
            "u",
            "c",
            "m",
        )));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["type"], "query");
        assert_eq!(json["query"][0]["role"], "user");
        assert!(json.get("temperature").is_none());
    }
}
