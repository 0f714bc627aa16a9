//! Async adapter over a byte stream
//!
//! Drives an [`SseDecoder`] from any `Stream<Item = Result<Bytes, E>>`,
//! such as a reqwest response body, and yields text payloads until the
//! `done` frame or end of input. Only `ParsedEvent::Text` is ever
//! yielded; `done` ends the stream instead of surfacing.

use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::sse::decoder::SseDecoder;
use crate::sse::events::ParsedEvent;

/// Default time to wait for the next chunk before giving up
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Default cap on bytes buffered without completing a frame
pub const DEFAULT_MAX_BUFFERED_BYTES: usize = 1024 * 1024;

/// Limits applied while reading a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Fail when no chunk arrives for this long. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Fail when the unconsumed buffer grows past this many bytes.
    /// `None` disables the cap.
    pub max_buffered_bytes: Option<usize>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            max_buffered_bytes: Some(DEFAULT_MAX_BUFFERED_BYTES),
        }
    }
}

impl StreamConfig {
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    pub fn without_idle_timeout(mut self) -> Self {
        self.idle_timeout = None;
        self
    }

    pub fn with_max_buffered_bytes(mut self, limit: usize) -> Self {
        self.max_buffered_bytes = Some(limit);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.max_buffered_bytes = None;
        self
    }
}

/// Incremental UTF-8 decoder for byte chunks.
///
/// A multi-byte character split across two chunks is held back until the
/// rest arrives. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` (plus any held-back bytes) as possible
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Truncated sequence at the end; wait for more bytes
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush held-back bytes at end of input
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Bytes waiting for the rest of a character
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    utf8: Utf8ChunkDecoder,
    ready: VecDeque<ParsedEvent>,
    config: StreamConfig,
    finished: bool,
}

enum Pull {
    Chunk(Bytes),
    End,
    Failed(StreamError),
}

/// Seconds reported for a timeout, rounded up so sub-second limits never read as zero
fn whole_secs(limit: Duration) -> u64 {
    limit.as_secs() + u64::from(limit.subsec_nanos() > 0)
}

impl<S, E> DecodeState<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    async fn pull(&mut self) -> Pull {
        let next = match self.config.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.body.next()).await {
                Ok(next) => next,
                Err(_) => {
                    return Pull::Failed(StreamError::Timeout {
                        duration_secs: whole_secs(limit),
                    })
                }
            },
            None => self.body.next().await,
        };

        match next {
            Some(Ok(chunk)) => Pull::Chunk(chunk),
            Some(Err(e)) => Pull::Failed(StreamError::Transport {
                message: e.to_string(),
            }),
            None => Pull::End,
        }
    }

    /// Drain the decoder once the body has ended
    fn close(&mut self) -> Result<(), StreamError> {
        self.finished = true;
        if let Some(rest) = self.utf8.finish() {
            self.decoder.push(&rest);
        }
        let flush = self.decoder.finish()?;
        self.ready
            .extend(flush.events.into_iter().take_while(|event| !event.is_done()));
        Ok(())
    }

    async fn next_item(&mut self) -> Option<Result<ParsedEvent, StreamError>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            match self.decoder.next_event() {
                Ok(Some(ParsedEvent::Done)) => {
                    debug!("Stream finished with done event");
                    self.finished = true;
                    return None;
                }
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }

            if let Some(limit) = self.config.max_buffered_bytes {
                if self.decoder.buffered_len() > limit {
                    warn!(
                        buffered = self.decoder.buffered_len(),
                        limit, "Stream buffer limit exceeded"
                    );
                    self.finished = true;
                    return Some(Err(StreamError::BufferOverflow { limit }));
                }
            }

            match self.pull().await {
                Pull::Chunk(chunk) => {
                    let text = self.utf8.decode(&chunk);
                    self.decoder.push(&text);
                }
                Pull::End => {
                    if let Err(e) = self.close() {
                        return Some(Err(e));
                    }
                }
                Pull::Failed(e) => {
                    warn!(error = %e, "Stream read failed");
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Decode a byte stream into events.
///
/// The returned stream ends after the `done` frame or when the body ends.
/// Any error is yielded once and ends the stream. Dropping the returned
/// stream drops `body`.
pub fn decode_stream<S, E>(
    body: S,
    config: StreamConfig,
) -> impl Stream<Item = Result<ParsedEvent, StreamError>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        utf8: Utf8ChunkDecoder::new(),
        ready: VecDeque::new(),
        config,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        let item = state.next_item().await?;
        Some((item, state))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, String>> + Unpin {
        let items: Vec<Result<Bytes, String>> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect();
        stream::iter(items)
    }

    fn collect(
        stream: impl Stream<Item = Result<ParsedEvent, StreamError>>,
    ) -> Vec<Result<String, StreamError>> {
        block_on(stream.map(|item| item.map(text_of)).collect::<Vec<_>>())
    }

    fn text_of(event: ParsedEvent) -> String {
        match event {
            ParsedEvent::Text(payload) => payload.text,
            ParsedEvent::Done => panic!("done must not be yielded"),
        }
    }

    fn no_timeout() -> StreamConfig {
        StreamConfig::default().without_idle_timeout()
    }

    #[test]
    fn test_utf8_split_multibyte() {
        let bytes = "é🌍".as_bytes();
        let mut decoder = Utf8ChunkDecoder::new();

        assert_eq!(decoder.decode(&bytes[..1]), "");
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.decode(&bytes[1..4]), "é");
        assert_eq!(decoder.decode(&bytes[4..]), "🌍");
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_utf8_invalid_bytes_replaced() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_utf8_truncated_at_end() {
        let mut decoder = Utf8ChunkDecoder::new();
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), Some("\u{FFFD}".to_string()));
    }

    #[test]
    fn test_stream_yields_text_and_stops_at_done() {
        let body = chunks(&[
            "event: text\ndata: {\"text\":\"Hel",
            "lo\"}\n\nevent: done\ndata: {}\n\n",
            "event: text\ndata: {\"text\":\"ignored\"}\n\n",
        ]);
        let out = collect(decode_stream(body, no_timeout()));
        assert_eq!(out, vec![Ok("Hello".to_string())]);
    }

    #[test]
    fn test_stream_without_done_ends_at_eof() {
        let body = chunks(&["ping\n", "event: text\ndata: {\"text\":\"a\"}"]);
        let out = collect(decode_stream(body, no_timeout()));
        assert_eq!(out, vec![Ok("a".to_string())]);
    }

    #[test]
    fn test_stream_malformed_payload_is_fatal() {
        let body = chunks(&[
            "event: text\ndata: {\"nope\":1}\n\n",
            "event: text\ndata: {\"text\":\"after\"}\n\n",
        ]);
        let out = collect(decode_stream(body, no_timeout()));
        assert_eq!(out.len(), 1);
        assert!(matches!(
            out[0],
            Err(StreamError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_stream_transport_error() {
        let items: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"event: text\ndata: {\"text\":\"a\"}\n\n")),
            Err("connection reset".to_string()),
        ];
        let out = collect(decode_stream(stream::iter(items), no_timeout()));
        assert_eq!(out[0], Ok("a".to_string()));
        assert_eq!(
            out[1],
            Err(StreamError::Transport {
                message: "connection reset".to_string()
            })
        );
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_stream_buffer_overflow() {
        let body = chunks(&["event: text\ndata: {\"text\":\"", "aaaaaaaaaaaaaaaaaaaa"]);
        let config = no_timeout().with_max_buffered_bytes(16);
        let out = collect(decode_stream(body, config));
        assert_eq!(out, vec![Err(StreamError::BufferOverflow { limit: 16 })]);
    }

    #[test]
    fn test_stream_utf8_split_between_chunks() {
        let frame = "event: text\ndata: {\"text\":\"🌍\"}\n\n".as_bytes();
        let split = frame.len() - 6;
        let items: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::copy_from_slice(&frame[..split])),
            Ok(Bytes::copy_from_slice(&frame[split..])),
        ];
        let out = collect(decode_stream(stream::iter(items), no_timeout()));
        assert_eq!(out, vec![Ok("🌍".to_string())]);
    }

    #[test]
    fn test_timeout_seconds_round_up() {
        assert_eq!(whole_secs(Duration::from_millis(20)), 1);
        assert_eq!(whole_secs(Duration::from_millis(1500)), 2);
        assert_eq!(whole_secs(Duration::from_secs(120)), 120);
    }

    #[tokio::test]
    async fn test_stream_idle_timeout() {
        let body = chunks(&["event: text\ndata: {\"text\":\"a\"}\n\n"]).chain(stream::pending());
        let config = StreamConfig::default().with_idle_timeout(Duration::from_millis(20));
        let out: Vec<_> = decode_stream(body, config)
            .map(|item| item.map(text_of))
            .collect()
            .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Ok("a".to_string()));
        assert_eq!(out[1], Err(StreamError::Timeout { duration_secs: 1 }));
    }
}
