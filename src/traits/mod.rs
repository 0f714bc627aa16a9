//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - HTTP transport used by the bot client
//! - [`PoeBot`] - Bot behaviour served by the bot server

pub mod bot;
pub mod http;

pub use bot::{PoeBot, ResponseStream};
pub use http::{BodyStream, Headers, HttpClient, HttpError, Response};
