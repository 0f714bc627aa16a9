//! SSE frame encoder
//!
//! Serializes server-side protocol events into the wire form the decoder
//! accepts: `event: <kind>\ndata: <json>\n\n`. `serde_json::to_string`
//! writes compact JSON (newlines inside strings are escaped), so every
//! payload fits on one `data:` line.

use serde::Serialize;

use crate::models::{ErrorResponse, MetaResponse, PartialResponse};

/// Events a bot server writes to a query response
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Always the first frame
    Meta(MetaResponse),
    /// Text appended to the answer
    Text(PartialResponse),
    /// Text replacing the answer so far
    ReplaceResponse(PartialResponse),
    /// Suggested follow-up reply
    SuggestedReply(PartialResponse),
    /// Error shown to the user
    Error(ErrorResponse),
    /// Always the last frame
    Done,
}

impl ServerEvent {
    /// Route a partial response to the frame kind its flags ask for
    pub fn from_partial(response: PartialResponse) -> Self {
        if response.is_replace_response {
            ServerEvent::ReplaceResponse(response)
        } else if response.is_suggested_reply {
            ServerEvent::SuggestedReply(response)
        } else {
            ServerEvent::Text(response)
        }
    }

    /// Wire name written after `event:`
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::Meta(_) => "meta",
            ServerEvent::Text(_) => "text",
            ServerEvent::ReplaceResponse(_) => "replace_response",
            ServerEvent::SuggestedReply(_) => "suggested_reply",
            ServerEvent::Error(_) => "error",
            ServerEvent::Done => "done",
        }
    }

    /// Encode this event as one wire frame
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let name = self.event_name();
        match self {
            ServerEvent::Meta(meta) => encode_frame(name, meta),
            ServerEvent::Text(response)
            | ServerEvent::ReplaceResponse(response)
            | ServerEvent::SuggestedReply(response) => encode_frame(name, response),
            ServerEvent::Error(error) => encode_frame(name, error),
            ServerEvent::Done => Ok(done_frame()),
        }
    }
}

/// Encode an arbitrary serializable value as a frame named `event`
pub fn encode_frame<T: Serialize + ?Sized>(
    event: &str,
    data: &T,
) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(data)?;
    Ok(format!("event: {}\ndata: {}\n\n", event, json))
}

/// The terminal frame; its payload is always the empty object
pub fn done_frame() -> String {
    "event: done\ndata: {}\n\n".to_string()
}
