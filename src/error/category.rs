//! Error category classification.
//!
//! High-level buckets used to decide whether an error is worth retrying
//! and how to describe it.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection failures, timeouts, dropped streams.
    Network,

    /// Missing or rejected access key.
    Auth,

    /// Upstream bot or API misbehaving (HTTP 5xx, bad frames).
    Server,

    /// Programming errors on our side.
    Client,

    /// Filesystem and other OS errors.
    System,

    /// Missing or invalid settings.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::System => "system",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
