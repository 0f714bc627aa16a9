//! Unified error type for the bot library.

use std::fmt;

use super::category::ErrorCategory;
use super::network::NetworkError;
use super::stream::StreamError;
use crate::sse::SseParseError;
use crate::traits::HttpError;

/// Unified error type.
///
/// Wraps the domain errors so callers can handle every failure from the
/// client, server, and scaffolding code through one type.
#[derive(Debug)]
pub enum PoeError {
    /// Request could not be sent or was rejected before streaming.
    Network(NetworkError),

    /// Response body could not be decoded.
    Stream(StreamError),

    /// Missing or invalid configuration.
    Config { message: String },

    /// Filesystem errors.
    Io(std::io::Error),
}

impl PoeError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        PoeError::Config {
            message: message.into(),
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PoeError::Network(err) if err.is_unauthorized() => ErrorCategory::Auth,
            PoeError::Network(_) => ErrorCategory::Network,
            PoeError::Stream(err) => match err {
                StreamError::Transport { .. } | StreamError::Timeout { .. } => {
                    ErrorCategory::Network
                }
                StreamError::MalformedPayload { .. }
                | StreamError::UnexpectedEvent { .. }
                | StreamError::BufferOverflow { .. } => ErrorCategory::Server,
            },
            PoeError::Config { .. } => ErrorCategory::Configuration,
            PoeError::Io(_) => ErrorCategory::System,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            PoeError::Network(err) => err.is_retryable(),
            PoeError::Stream(err) => err.is_retryable(),
            PoeError::Config { .. } => false,
            PoeError::Io(_) => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            PoeError::Network(err) => err.user_message(),
            PoeError::Stream(err) => err.user_message(),
            PoeError::Config { message } => format!("Configuration error: {}", message),
            PoeError::Io(err) => format!("File system error: {}", err),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            PoeError::Network(err) => err.error_code(),
            PoeError::Stream(err) => err.error_code(),
            PoeError::Config { .. } => "E_CONFIG",
            PoeError::Io(_) => "E_IO",
        }
    }
}

impl fmt::Display for PoeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoeError::Network(err) => write!(f, "{}", err),
            PoeError::Stream(err) => write!(f, "{}", err),
            PoeError::Config { message } => write!(f, "Configuration error: {}", message),
            PoeError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for PoeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PoeError::Network(err) => Some(err),
            PoeError::Stream(err) => Some(err),
            PoeError::Config { .. } => None,
            PoeError::Io(err) => Some(err),
        }
    }
}

// ============================================================================
// From implementations for automatic error conversion
// ============================================================================

impl From<NetworkError> for PoeError {
    fn from(err: NetworkError) -> Self {
        PoeError::Network(err)
    }
}

impl From<StreamError> for PoeError {
    fn from(err: StreamError) -> Self {
        PoeError::Stream(err)
    }
}

impl From<HttpError> for PoeError {
    fn from(err: HttpError) -> Self {
        PoeError::Network(err.into())
    }
}

impl From<SseParseError> for PoeError {
    fn from(err: SseParseError) -> Self {
        PoeError::Stream(err.into())
    }
}

impl From<std::io::Error> for PoeError {
    fn from(err: std::io::Error) -> Self {
        PoeError::Io(err)
    }
}

impl From<serde_json::Error> for PoeError {
    fn from(err: serde_json::Error) -> Self {
        PoeError::Network(NetworkError::InvalidResponse {
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_auth_category() {
        let err: PoeError = NetworkError::HttpStatus {
            status: 401,
            message: "Unauthorized".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_stream_categories() {
        let err: PoeError = StreamError::Timeout { duration_secs: 1 }.into();
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());

        let err: PoeError = StreamError::UnexpectedEvent {
            event_type: "done".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Server);
    }

    #[test]
    fn test_from_io_error() {
        let err: PoeError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.error_code(), "E_IO");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error() {
        let err = PoeError::config("ACCESS_KEY is not set");
        assert_eq!(err.to_string(), "Configuration error: ACCESS_KEY is not set");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PoeError = json_err.into();
        assert_eq!(err.error_code(), "E_NET_INVALID");
    }
}
