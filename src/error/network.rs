//! Network-related error types.
//!
//! Errors raised before any stream decoding starts: failed connections,
//! non-2xx statuses, and responses without a body.

use std::fmt;

use crate::traits::HttpError;

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed {
        url: String,
        message: String,
    },

    /// Request timed out.
    Timeout {
        operation: String,
    },

    /// HTTP status error (non-2xx response).
    HttpStatus {
        status: u16,
        message: String,
    },

    /// Invalid response format.
    InvalidResponse {
        message: String,
    },

    /// Request was cancelled.
    Cancelled,

    /// Generic network error.
    Other {
        message: String,
    },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::InvalidResponse { .. } => false,
            NetworkError::Cancelled => false,
            NetworkError::Other { .. } => false,
        }
    }

    /// The access key was missing or rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, NetworkError::HttpStatus { status: 401 | 403, .. })
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to reach the bot server. Please check your connection.".to_string()
            }
            NetworkError::Timeout { operation } => {
                format!("The {} operation timed out.", operation)
            }
            NetworkError::HttpStatus { status, .. } => match *status {
                401 | 403 => "The access key was rejected.".to_string(),
                404 => "The bot was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => "The bot server is experiencing issues. Please try again later."
                    .to_string(),
                _ => format!("The bot server returned an error (HTTP {}).", status),
            },
            NetworkError::InvalidResponse { .. } => {
                "Received an invalid response from the bot server.".to_string()
            }
            NetworkError::Cancelled => "The request was cancelled.".to_string(),
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::InvalidResponse { .. } => "E_NET_INVALID",
            NetworkError::Cancelled => "E_NET_CANCEL",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::Timeout { operation } => {
                write!(f, "{} timed out", operation)
            }
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP error! status: {}: {}", status, message)
            }
            NetworkError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            NetworkError::Cancelled => write!(f, "Request cancelled"),
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<HttpError> for NetworkError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ConnectionFailed(message) => NetworkError::ConnectionFailed {
                url: String::new(),
                message,
            },
            HttpError::Timeout(message) => NetworkError::Timeout { operation: message },
            HttpError::ServerError { status, message } => {
                NetworkError::HttpStatus { status, message }
            }
            HttpError::Cancelled => NetworkError::Cancelled,
            HttpError::InvalidUrl(message) => NetworkError::InvalidResponse { message },
            HttpError::Io(message) | HttpError::Other(message) => {
                NetworkError::Other { message }
            }
        }
    }
}
