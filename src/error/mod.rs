//! Error handling for the bot library.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Domain-specific Errors**: Network and Stream errors
//! - **Unified Error Type**: `PoeError` consolidates them
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout, dropped stream | Yes |
//! | Auth | Rejected access key | No |
//! | Server | Bad frames, 5xx | Yes |
//! | System | Filesystem errors | No |
//! | Configuration | Missing settings | No |

mod category;
mod network;
mod poe_error;
mod stream;

pub use category::ErrorCategory;
pub use network::NetworkError;
pub use poe_error::PoeError;
pub use stream::StreamError;

/// Result type alias using [`PoeError`].
pub type PoeResult<T> = Result<T, PoeError>;
