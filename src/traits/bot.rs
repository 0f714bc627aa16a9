//! Bot behaviour trait.
//!
//! The server dispatches each protocol request to a [`PoeBot`]
//! implementation. Only [`PoeBot::get_response`] is required.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::PoeError;
use crate::models::{
    PartialResponse, QueryRequest, ReportErrorRequest, ReportFeedbackRequest, SettingsRequest,
    SettingsResponse,
};

/// Stream of answer fragments produced for one query.
pub type ResponseStream = BoxStream<'static, Result<PartialResponse, PoeError>>;

/// A bot served over the bot protocol.
#[async_trait]
pub trait PoeBot: Send + Sync + 'static {
    /// Answer a query.
    ///
    /// Each item becomes one frame of the response. An `Err` item is sent
    /// to the user as an `error` frame and ends the response.
    fn get_response(&self, request: QueryRequest) -> ResponseStream;

    /// Settings reported to the platform. Defaults to no settings.
    async fn get_settings(&self, _request: SettingsRequest) -> SettingsResponse {
        SettingsResponse::default()
    }

    /// Called when a user likes or dislikes an answer.
    async fn on_feedback(&self, _request: ReportFeedbackRequest) {}

    /// Called when the platform reports an error with this bot.
    async fn on_error(&self, _request: ReportErrorRequest) {}
}
