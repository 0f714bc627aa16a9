//! SSE event types and definitions
//!
//! Contains the decoder's externally visible event values and its error
//! type.

use serde::{Deserialize, Serialize};

/// Payload of a `text` event.
///
/// Only `text` is required; any other fields the upstream sends are kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TextPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Events produced by the decoder
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// Streamed text fragment
    Text(TextPayload),
    /// Terminal sentinel. The stream adapter never forwards it; it only
    /// surfaces from the sans-io decoder.
    Done,
}

impl ParsedEvent {
    /// Returns the wire event name
    pub fn event_type_name(&self) -> &'static str {
        match self {
            ParsedEvent::Text(_) => "text",
            ParsedEvent::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ParsedEvent::Done)
    }
}

/// Errors that can occur while decoding a recognized frame
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// The frame's delimiters matched but its payload is not a valid
    /// event value
    MalformedPayload {
        event_type: String,
        source: String,
    },
}

impl SseParseError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SseParseError::MalformedPayload { .. } => "E_SSE_PAYLOAD",
        }
    }
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::MalformedPayload { event_type, source } => {
                write!(f, "Malformed payload for event '{}': {}", event_type, source)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
