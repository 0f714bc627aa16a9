//! Bot protocol request and response types.

mod request;
mod response;

pub use request::{
    Attachment, BotRequest, ContentType, FeedbackType, MessageFeedback, ProtocolMessage,
    QueryRequest, ReportErrorRequest, ReportFeedbackRequest, RequestBody, Role, SettingsRequest,
    PROTOCOL_VERSION,
};
pub use response::{
    BotMessage, ErrorResponse, MetaResponse, PartialResponse, SettingsResponse,
};
