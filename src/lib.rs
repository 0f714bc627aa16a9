//! Poe bot toolkit
//!
//! Server bots for the Poe bot protocol: an incremental SSE decoder for
//! answers streamed by other bots, a frame encoder and axum server for
//! answering queries, and project scaffolding for the `poe-bot` binary.

pub mod adapters;
pub mod bot;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod sse;
pub mod traits;
