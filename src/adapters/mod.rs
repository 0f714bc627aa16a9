//! Concrete implementations of the traits in `crate::traits`.
//!
//! - [`ReqwestHttpClient`] - HTTP transport using reqwest
//! - [`mock::MockHttpClient`] - Canned responses for tests

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, MockResponse};
pub use reqwest_http::ReqwestHttpClient;
