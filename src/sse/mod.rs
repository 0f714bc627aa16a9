//! SSE (Server-Sent Events) framing for the bot protocol
//!
//! Frames on the wire:
//! - `event: text` / `data: {"text": ...}` - streamed text
//! - `event: done` / `data: {}` - end of the response
//! - `ping` or `: ping` - keep-alives, discarded
//!
//! # Module structure
//! - `buffer` - Pending text of one stream
//! - `tokenizer` - Recognizes one complete frame at the buffer start
//! - `events` - Decoded event values and `SseParseError`
//! - `decoder` - Sans-io session state (`SseDecoder`)
//! - `stream` - Async adapter over byte streams
//! - `encoder` - Server-side frame writer

mod buffer;
mod decoder;
mod encoder;
mod events;
mod stream;
mod tokenizer;

// Re-export public types
pub use buffer::FrameBuffer;
pub use decoder::{decode_text_payload, Flush, SseDecoder};
pub use encoder::{done_frame, encode_frame, ServerEvent};
pub use events::{ParsedEvent, SseParseError, TextPayload};
pub use stream::{
    decode_stream, StreamConfig, Utf8ChunkDecoder, DEFAULT_IDLE_TIMEOUT,
    DEFAULT_MAX_BUFFERED_BYTES,
};
pub use tokenizer::{scan_frame, Frame, FrameKind, Scan};
