//! Streaming-related error types.
//!
//! Errors raised while turning a response body into bot events.

use std::fmt;

use crate::sse::SseParseError;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A recognized frame carried a payload that is not a valid event.
    MalformedPayload {
        event_type: String,
        message: String,
    },

    /// An event arrived where the caller cannot accept it.
    UnexpectedEvent {
        event_type: String,
    },

    /// The body stream failed mid-way.
    Transport {
        message: String,
    },

    /// No data received within the idle window.
    Timeout {
        duration_secs: u64,
    },

    /// Buffered bytes exceeded the configured cap without forming a frame.
    BufferOverflow {
        limit: usize,
    },
}

impl StreamError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::Transport { .. } | StreamError::Timeout { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::MalformedPayload { event_type, .. } => {
                format!("The bot sent an invalid '{}' message.", event_type)
            }
            StreamError::UnexpectedEvent { event_type } => {
                format!("The bot sent an unexpected '{}' message.", event_type)
            }
            StreamError::Transport { .. } => {
                "Connection to the bot was lost while streaming.".to_string()
            }
            StreamError::Timeout { duration_secs } => format!(
                "No response from the bot for {} seconds. The connection may have been lost.",
                duration_secs
            ),
            StreamError::BufferOverflow { .. } => {
                "The bot sent data that could not be understood.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::MalformedPayload { .. } => "E_STREAM_PAYLOAD",
            StreamError::UnexpectedEvent { .. } => "E_STREAM_UNEXPECTED",
            StreamError::Transport { .. } => "E_STREAM_TRANSPORT",
            StreamError::Timeout { .. } => "E_STREAM_TIMEOUT",
            StreamError::BufferOverflow { .. } => "E_STREAM_OVERFLOW",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::MalformedPayload {
                event_type,
                message,
            } => write!(f, "Malformed payload for event '{}': {}", event_type, message),
            StreamError::UnexpectedEvent { event_type } => {
                write!(f, "Unexpected event: {}", event_type)
            }
            StreamError::Transport { message } => write!(f, "Stream transport error: {}", message),
            StreamError::Timeout { duration_secs } => {
                write!(f, "Stream timeout after {} seconds", duration_secs)
            }
            StreamError::BufferOverflow { limit } => {
                write!(f, "Stream buffer exceeded {} bytes without a complete frame", limit)
            }
        }
    }
}

impl std::error::Error for StreamError {}

impl From<SseParseError> for StreamError {
    fn from(err: SseParseError) -> Self {
        match err {
            SseParseError::MalformedPayload { event_type, source } => {
                StreamError::MalformedPayload {
                    event_type,
                    message: source,
                }
            }
        }
    }
}
