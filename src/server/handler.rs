//! Request handlers for the bot endpoint.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures::future::ready;
use futures::stream::{self, Stream, StreamExt};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::PoeError;
use crate::models::{BotRequest, ErrorResponse, MetaResponse, RequestBody};
use crate::sse::ServerEvent;
use crate::traits::{PoeBot, ResponseStream};

/// Request types the endpoint understands.
const KNOWN_REQUEST_TYPES: [&str; 4] = ["query", "settings", "report_feedback", "report_error"];

/// Shared state for the bot endpoint.
#[derive(Clone)]
pub struct BotState {
    pub bot: Arc<dyn PoeBot>,
    pub access_key: Arc<str>,
}

impl BotState {
    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| token == &*self.access_key)
    }
}

/// Error frame sent when the bot fails mid-answer.
fn error_response(err: &PoeError) -> ErrorResponse {
    ErrorResponse {
        text: err.user_message(),
        raw_response: None,
        allow_retry: err.is_retryable(),
        error_type: Some(err.error_code().to_string()),
    }
}

/// Encoded frames of one query response.
///
/// Always starts with `meta` and ends with `done`. A failed item becomes
/// an `error` frame and stops reading from `responses`.
pub fn query_frames(responses: ResponseStream) -> impl Stream<Item = String> + Send {
    let meta = stream::once(ready(ServerEvent::Meta(MetaResponse::markdown())));

    // Once a failure is encoded the bot stream is never polled again
    let body = stream::unfold((responses, false), |(mut responses, failed)| async move {
        if failed {
            return None;
        }
        let event = match responses.next().await? {
            Ok(partial) => ServerEvent::from_partial(partial),
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Bot failed while answering");
                return Some((ServerEvent::Error(error_response(&e)), (responses, true)));
            }
        };
        Some((event, (responses, false)))
    });

    let done = stream::once(ready(ServerEvent::Done));

    meta.chain(body).chain(done).filter_map(|event| {
        ready(match event.encode() {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!(error = %e, event = event.event_name(), "Dropping unencodable frame");
                None
            }
        })
    })
}

fn query_response(responses: ResponseStream) -> Response {
    let frames = query_frames(responses).map(|frame| Ok::<_, Infallible>(Bytes::from(frame)));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response()
}

/// `POST /`: dispatch a protocol request to the bot.
pub async fn bot_handler(
    State(state): State<BotState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.is_authorized(&headers) {
        warn!("Rejecting request with missing or invalid access key");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Request body is not JSON");
            return (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
                .into_response();
        }
    };

    let request_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();
    if !KNOWN_REQUEST_TYPES.contains(&request_type.as_str()) {
        info!(request_type = %request_type, "Unsupported request type");
        return (StatusCode::NOT_IMPLEMENTED, "501 Not Implemented").into_response();
    }

    let request: BotRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            debug!(
                error = %e,
                request_type = %request_type,
                "Request body does not match its type"
            );
            return (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
                .into_response();
        }
    };

    info!(
        request_type = request.body.type_name(),
        version = %request.version,
        "Handling bot request"
    );

    match request.body {
        RequestBody::Query(query) => query_response(state.bot.get_response(query)),
        RequestBody::Settings(settings) => {
            Json(state.bot.get_settings(settings).await).into_response()
        }
        RequestBody::ReportFeedback(feedback) => {
            state.bot.on_feedback(feedback).await;
            Json(json!({})).into_response()
        }
        RequestBody::ReportError(report) => {
            state.bot.on_error(report).await;
            Json(json!({})).into_response()
        }
    }
}

/// `GET /`: liveness greeting.
pub async fn root_handler() -> impl IntoResponse {
    "Poe bot server is running"
}
