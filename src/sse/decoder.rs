//! Incremental SSE decoder
//!
//! Owns the frame buffer of one inbound stream and turns pushed chunks
//! into ordered [`ParsedEvent`]s. The decoder does no I/O: callers push
//! text with [`SseDecoder::push`] and pull events with
//! [`SseDecoder::next_event`] until it returns `Ok(None)`, then push the
//! next chunk. [`crate::sse::decode_stream`] drives it from a byte stream.

use tracing::{debug, trace, warn};

use crate::sse::buffer::FrameBuffer;
use crate::sse::events::{ParsedEvent, SseParseError, TextPayload};
use crate::sse::tokenizer::{scan_frame, FrameKind, Scan};

/// Decode the JSON payload of a recognized `text` frame
pub fn decode_text_payload(payload: &str) -> Result<TextPayload, SseParseError> {
    serde_json::from_str(payload).map_err(|e| SseParseError::MalformedPayload {
        event_type: "text".to_string(),
        source: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SessionState {
    /// Accepting chunks
    #[default]
    Open,
    /// Upstream has closed; keep-alives may end without a line terminator
    InputClosed,
    /// `done` seen, payload error, or input fully drained
    Terminated,
}

/// Result of draining the decoder at end of input
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Flush {
    /// Events still pending in the buffer when input ended
    pub events: Vec<ParsedEvent>,
    /// Non-whitespace content that never formed a frame. Dropped, only
    /// reported for diagnostics.
    pub trailing: Option<String>,
}

/// Stateful decoder for one SSE session
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: FrameBuffer,
    state: SessionState,
}

impl SseDecoder {
    /// Create a decoder with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of stream text.
    ///
    /// Chunks pushed after the session terminated are ignored.
    pub fn push(&mut self, chunk: &str) {
        match self.state {
            SessionState::Open => self.buffer.append(chunk),
            SessionState::InputClosed | SessionState::Terminated => {
                trace!(len = chunk.len(), "Ignoring chunk pushed after end of session");
            }
        }
    }

    /// Pull the next complete event out of the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(event))` - A frame completed; keep-alives are skipped
    /// - `Ok(None)` - No complete frame buffered, or the session is over
    /// - `Err(error)` - A frame's payload was malformed; the session is
    ///   terminated
    ///
    /// After `ParsedEvent::Done` is returned every further call yields
    /// `Ok(None)` whatever is left in the buffer.
    pub fn next_event(&mut self) -> Result<Option<ParsedEvent>, SseParseError> {
        loop {
            if self.state == SessionState::Terminated {
                return Ok(None);
            }

            self.buffer.trim_leading_whitespace();
            if self.buffer.is_empty() {
                return Ok(None);
            }

            let at_eof = self.state == SessionState::InputClosed;
            let (decoded, consumed) = match scan_frame(self.buffer.as_str(), at_eof) {
                Scan::Frame(frame) => {
                    let decoded = match frame.kind {
                        FrameKind::Text { payload } => {
                            decode_text_payload(payload).map(|p| Some(ParsedEvent::Text(p)))
                        }
                        FrameKind::Done => Ok(Some(ParsedEvent::Done)),
                        FrameKind::PingLine | FrameKind::PingComment => {
                            trace!("Discarding keep-alive frame");
                            Ok(None)
                        }
                    };
                    (decoded, frame.len())
                }
                Scan::Incomplete => return Ok(None),
                Scan::Unrecognized => {
                    debug!(
                        buffered = self.buffer.len(),
                        "Buffer start matches no known frame, waiting for more data"
                    );
                    return Ok(None);
                }
            };

            self.buffer.consume_prefix(consumed);

            match decoded {
                Ok(Some(ParsedEvent::Done)) => {
                    if !self.buffer.is_blank() {
                        debug!(
                            discarded = self.buffer.len(),
                            "Done received, discarding buffered data"
                        );
                    }
                    self.terminate();
                    return Ok(Some(ParsedEvent::Done));
                }
                Ok(Some(event)) => return Ok(Some(event)),
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Aborting SSE session on malformed payload");
                    self.terminate();
                    return Err(e);
                }
            }
        }
    }

    /// Signal end of input and drain whatever can still be decoded.
    ///
    /// Leftover content that never formed a frame is logged, returned in
    /// [`Flush::trailing`] and dropped. The session is terminated
    /// afterwards.
    pub fn finish(&mut self) -> Result<Flush, SseParseError> {
        if self.state == SessionState::Terminated {
            return Ok(Flush::default());
        }
        self.state = SessionState::InputClosed;

        let mut events = Vec::new();
        while let Some(event) = self.next_event()? {
            events.push(event);
        }

        let leftover = self.buffer.take();
        self.state = SessionState::Terminated;

        let trailing = if leftover.trim().is_empty() {
            None
        } else {
            warn!(
                len = leftover.len(),
                data = %leftover,
                "Unprocessed data in buffer at end of stream"
            );
            Some(leftover)
        };

        Ok(Flush { events, trailing })
    }

    /// Whether the session has ended (done, error, or finished)
    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Bytes currently waiting in the buffer
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard all state and start a fresh session
    pub fn reset(&mut self) {
        self.buffer = FrameBuffer::new();
        self.state = SessionState::Open;
    }

    fn terminate(&mut self) {
        self.state = SessionState::Terminated;
        self.buffer.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ParsedEvent {
        ParsedEvent::Text(TextPayload::new(s))
    }

    /// Push every chunk, draining events after each, then finish
    fn decode_all(chunks: &[&str]) -> Vec<ParsedEvent> {
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            decoder.push(chunk);
            while let Some(event) = decoder.next_event().unwrap() {
                events.push(event);
            }
        }
        events.extend(decoder.finish().unwrap().events);
        events
    }

    #[test]
    fn test_decode_text_payload() {
        let payload = decode_text_payload(r#"{"text": "Hello"}"#).unwrap();
        assert_eq!(payload, TextPayload::new("Hello"));
    }

    #[test]
    fn test_decode_text_payload_malformed() {
        let result = decode_text_payload(r#"{"text": hello}"#);
        assert!(matches!(result, Err(SseParseError::MalformedPayload { .. })));

        // Valid JSON but no text field
        let result = decode_text_payload(r#"{"content": "hello"}"#);
        assert!(matches!(result, Err(SseParseError::MalformedPayload { .. })));
    }

    #[test]
    fn test_single_message() {
        let events = decode_all(&["event: text\ndata: {\"text\":\"Hello\"}\n\n"]);
        assert_eq!(events, vec![text("Hello")]);
    }

    #[test]
    fn test_payload_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        decoder.push("event: text\ndata: {\"text\":\n");
        assert_eq!(decoder.next_event().unwrap(), None);
        assert!(!decoder.is_terminated());

        decoder.push("\"Hello\"}\n\n");
        assert_eq!(decoder.next_event().unwrap(), Some(text("Hello")));
        assert_eq!(decoder.next_event().unwrap(), None);
    }

    #[test]
    fn test_done_terminates_session() {
        let mut decoder = SseDecoder::new();
        decoder.push(concat!(
            "event: text\ndata: {\"text\":\"Hello\"}\n\n",
            "event: done\ndata: {}\n\n",
            "event: text\ndata: {\"text\":\"This should not be processed\"}\n\n",
        ));

        assert_eq!(decoder.next_event().unwrap(), Some(text("Hello")));
        assert_eq!(decoder.next_event().unwrap(), Some(ParsedEvent::Done));
        assert!(decoder.is_terminated());
        assert_eq!(decoder.buffered_len(), 0);
        assert_eq!(decoder.next_event().unwrap(), None);

        // Later pushes are ignored
        decoder.push("event: text\ndata: {\"text\":\"late\"}\n\n");
        assert_eq!(decoder.next_event().unwrap(), None);
        assert_eq!(decoder.finish().unwrap(), Flush::default());
    }

    #[test]
    fn test_keepalives_produce_nothing() {
        let events = decode_all(&[
            "ping\n",
            "event: text\ndata: {\"text\":\"a\"}\n\n",
            ": ping\r\n\r\n",
            "ping\r\n",
            "event: text\ndata: {\"text\":\"b\"}\n\n",
            "ping",
        ]);
        assert_eq!(events, vec![text("a"), text("b")]);
    }

    #[test]
    fn test_malformed_payload_aborts() {
        let mut decoder = SseDecoder::new();
        decoder.push("event: text\ndata: {\"text\": nope}\n\nevent: text\ndata: {\"text\":\"x\"}\n\n");

        let result = decoder.next_event();
        assert!(matches!(result, Err(SseParseError::MalformedPayload { .. })));
        assert!(decoder.is_terminated());
        assert_eq!(decoder.next_event().unwrap(), None);
    }

    #[test]
    fn test_finish_reports_trailing_data() {
        let mut decoder = SseDecoder::new();
        decoder.push("event: text\ndata: {\"text\":\"Hello\"}\n\nevent: text\ndata: {\"text\":");
        assert_eq!(decoder.next_event().unwrap(), Some(text("Hello")));
        assert_eq!(decoder.next_event().unwrap(), None);

        let flush = decoder.finish().unwrap();
        assert!(flush.events.is_empty());
        assert_eq!(
            flush.trailing.as_deref(),
            Some("event: text\ndata: {\"text\":")
        );
        assert!(decoder.is_terminated());
    }

    #[test]
    fn test_finish_on_whitespace_only_buffer() {
        let mut decoder = SseDecoder::new();
        decoder.push("\n\r\n  \n");
        assert_eq!(decoder.next_event().unwrap(), None);
        assert_eq!(decoder.finish().unwrap(), Flush::default());
    }

    #[test]
    fn test_finish_drains_pending_events() {
        let mut decoder = SseDecoder::new();
        decoder.push("event: text\ndata: {\"text\":\"x\"}\n\n: ping");

        // Not pulled before finish
        let flush = decoder.finish().unwrap();
        assert_eq!(flush.events, vec![text("x")]);
        assert_eq!(flush.trailing, None);
    }

    #[test]
    fn test_unknown_event_stalls() {
        let mut decoder = SseDecoder::new();
        decoder.push("event: meta\ndata: {}\n\nevent: text\ndata: {\"text\":\"x\"}\n\n");
        assert_eq!(decoder.next_event().unwrap(), None);

        let flush = decoder.finish().unwrap();
        assert!(flush.events.is_empty());
        assert!(flush.trailing.unwrap().starts_with("event: meta"));
    }

    #[test]
    fn test_reset() {
        let mut decoder = SseDecoder::new();
        decoder.push("event: done\ndata: {}");
        assert_eq!(decoder.next_event().unwrap(), Some(ParsedEvent::Done));

        decoder.reset();
        assert!(!decoder.is_terminated());
        decoder.push("event: text\ndata: {\"text\":\"again\"}");
        assert_eq!(decoder.next_event().unwrap(), Some(text("again")));
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let input = concat!(
            "event: text\r\ndata: {\"text\":\"\"}\r\n\r\n",
            "ping\n",
            "event: text\ndata: {\"text\": \"Hé}llo\", \"data\": {\"n\": 1}}\n\n",
            ": ping\r\n\r\n",
            "event: text\ndata: {\"text\":\n\"🌍\"}",
            "event: done\ndata: {}\n\n",
            "event: text\ndata: {\"text\":\"ignored\"}\n\n",
        );
        let expected = decode_all(&[input]);
        assert_eq!(expected.len(), 4);
        assert_eq!(expected[3], ParsedEvent::Done);

        let boundaries: Vec<usize> = input.char_indices().map(|(i, _)| i).collect();
        // Every two-way split
        for &split in &boundaries {
            let (a, b) = input.split_at(split);
            assert_eq!(decode_all(&[a, b]), expected, "split at {}", split);
        }
        // Char-by-char
        let chars: Vec<String> = input.chars().map(|c| c.to_string()).collect();
        let pieces: Vec<&str> = chars.iter().map(String::as_str).collect();
        assert_eq!(decode_all(&pieces), expected);
    }
}
