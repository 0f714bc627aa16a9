//! Frame tokenizer
//!
//! Recognizes one complete wire frame at the start of the buffer. The
//! accepted grammar is:
//!
//! ```text
//! event-frame   := "event:" SP event-name EOL "data:" SP json-object
//! event-name    := "text" | "done"
//! ping-line     := "ping" EOL
//! ping-comment  := ":" SP "ping" EOL
//! EOL           := "\n" | "\r\n"
//! ```
//!
//! An event frame ends at the closing brace of its JSON object. The blank
//! line that normally follows is left in the buffer and trimmed as leading
//! whitespace before the next scan, so upstreams that glue the next
//! `event:` line straight after the `}` still tokenize.
//!
//! Matching is attempted in priority order (text, done, ping line, ping
//! comment). Nothing is consumed unless a whole frame is present.

/// Kind of a recognized frame, borrowing the payload from the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind<'a> {
    /// `event: text` with its complete JSON object payload
    Text { payload: &'a str },
    /// `event: done` with `data: {}`
    Done,
    /// Bare `ping` keep-alive line
    PingLine,
    /// `: ping` SSE comment keep-alive
    PingComment,
}

/// A recognized frame and the exact text it spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub kind: FrameKind<'a>,
    pub raw: &'a str,
}

impl<'a> Frame<'a> {
    /// Number of bytes the frame occupies at the start of the buffer
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Keep-alive frames are consumed without producing an event
    pub fn is_keepalive(&self) -> bool {
        matches!(self.kind, FrameKind::PingLine | FrameKind::PingComment)
    }
}

/// Outcome of scanning the buffer start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan<'a> {
    /// A complete frame sits at the buffer start
    Frame(Frame<'a>),
    /// The buffer is a proper prefix of some frame; wait for more data
    Incomplete,
    /// No frame form can ever match the buffer start. The decoder still
    /// stalls on this (unknown bytes are never skipped); the variant only
    /// exists for diagnostics.
    Unrecognized,
}

/// Result of one matching step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step<T> {
    Matched(T),
    Incomplete,
    Mismatch,
}

/// Unwrap a `Step::Matched` or return the non-matching step from the
/// enclosing matcher.
macro_rules! step {
    ($e:expr) => {
        match $e {
            Step::Matched(v) => v,
            Step::Incomplete => return Step::Incomplete,
            Step::Mismatch => return Step::Mismatch,
        }
    };
}

/// Scan for one complete frame at the start of `input`.
///
/// `input` is expected to have its leading whitespace trimmed already.
/// When `at_eof` is set no more data will arrive, so a keep-alive line
/// missing its final line terminator still counts.
pub fn scan_frame(input: &str, at_eof: bool) -> Scan<'_> {
    let matchers: [fn(&str, bool) -> Step<Matched<'_>>; 4] =
        [match_text_event, match_done_event, match_ping_line, match_ping_comment];

    let mut incomplete = false;
    for matcher in matchers {
        match matcher(input, at_eof) {
            Step::Matched((kind, rest)) => {
                // `rest` is always a suffix of `input`
                let raw = &input[..input.len() - rest.len()];
                return Scan::Frame(Frame { kind, raw });
            }
            Step::Incomplete => incomplete = true,
            Step::Mismatch => {}
        }
    }

    if incomplete {
        Scan::Incomplete
    } else {
        Scan::Unrecognized
    }
}

// Every matcher returns the frame kind and the input remaining after it.
type Matched<'a> = (FrameKind<'a>, &'a str);

fn match_text_event(input: &str, _at_eof: bool) -> Step<Matched<'_>> {
    let rest = step!(event_line(input, "text"));
    let rest = step!(data_field(rest));
    let after = step!(scan_object(rest));
    let payload = &rest[..rest.len() - after.len()];
    Step::Matched((FrameKind::Text { payload }, after))
}

fn match_done_event(input: &str, _at_eof: bool) -> Step<Matched<'_>> {
    let rest = step!(event_line(input, "done"));
    let rest = step!(data_field(rest));
    let after = step!(literal(rest, "{}"));
    Step::Matched((FrameKind::Done, after))
}

fn match_ping_line(input: &str, at_eof: bool) -> Step<Matched<'_>> {
    let rest = step!(literal(input, "ping"));
    let after = step!(eol(rest, at_eof));
    Step::Matched((FrameKind::PingLine, after))
}

fn match_ping_comment(input: &str, at_eof: bool) -> Step<Matched<'_>> {
    let rest = step!(literal(input, ": ping"));
    let after = step!(eol(rest, at_eof));
    Step::Matched((FrameKind::PingComment, after))
}

/// `event:` SP name EOL
fn event_line<'a>(input: &'a str, name: &str) -> Step<&'a str> {
    let rest = step!(field_name(input, "event"));
    let rest = step!(literal(rest, name));
    eol(rest, false)
}

/// `data:` SP, stopping at the first character of the value
fn data_field(input: &str) -> Step<&str> {
    field_name(input, "data")
}

/// Field name, colon and any spaces before the value.
///
/// A buffer that ends inside the spaces is incomplete: the value has not
/// arrived yet.
fn field_name<'a>(input: &'a str, name: &str) -> Step<&'a str> {
    let rest = step!(literal(input, name));
    let rest = step!(literal(rest, ":"));
    let value = rest.trim_start_matches(' ');
    if value.is_empty() {
        Step::Incomplete
    } else {
        Step::Matched(value)
    }
}

fn literal<'a>(input: &'a str, expected: &str) -> Step<&'a str> {
    match input.strip_prefix(expected) {
        Some(rest) => Step::Matched(rest),
        None if expected.starts_with(input) => Step::Incomplete,
        None => Step::Mismatch,
    }
}

fn eol(input: &str, at_eof: bool) -> Step<&str> {
    if let Some(rest) = input.strip_prefix("\r\n") {
        return Step::Matched(rest);
    }
    if let Some(rest) = input.strip_prefix('\n') {
        return Step::Matched(rest);
    }
    match input {
        "" | "\r" if at_eof => Step::Matched(""),
        "" | "\r" => Step::Incomplete,
        _ => Step::Mismatch,
    }
}

/// Scan one balanced JSON object and return what follows it.
///
/// Braces inside string literals (including escaped quotes) are ignored,
/// so `{"text":"}"}` is a single object. Whether the object is valid JSON
/// is left to the event decoder.
fn scan_object(input: &str) -> Step<&str> {
    let bytes = input.as_bytes();
    match bytes.first() {
        Some(b'{') => {}
        Some(_) => return Step::Mismatch,
        None => return Step::Incomplete,
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Step::Matched(&input[i + 1..]);
                }
            }
            _ => {}
        }
    }

    Step::Incomplete
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(input: &str) -> Frame<'_> {
        match scan_frame(input, false) {
            Scan::Frame(frame) => frame,
            other => panic!("Expected a frame for {:?}, got {:?}", input, other),
        }
    }

    #[test]
    fn test_text_event_lf() {
        let input = "event: text\ndata: {\"text\":\"Hello\"}\n\n";
        let frame = frame(input);
        assert_eq!(
            frame.kind,
            FrameKind::Text {
                payload: "{\"text\":\"Hello\"}"
            }
        );
        assert_eq!(frame.raw, "event: text\ndata: {\"text\":\"Hello\"}");
    }

    #[test]
    fn test_text_event_crlf() {
        let input = "event: text\r\ndata: {\"text\": \"Hello\"}\r\n\r\n";
        let frame = frame(input);
        assert_eq!(
            frame.kind,
            FrameKind::Text {
                payload: "{\"text\": \"Hello\"}"
            }
        );
    }

    #[test]
    fn test_text_event_without_trailing_blank_line() {
        // The next frame is glued directly after the closing brace
        let input = "event: text\ndata: {\"text\":\"a\"}event: text\ndata: {\"text\":\"b\"}";
        let frame = frame(input);
        assert_eq!(frame.raw, "event: text\ndata: {\"text\":\"a\"}");
    }

    #[test]
    fn test_payload_split_mid_json_is_incomplete() {
        assert_eq!(
            scan_frame("event: text\ndata: {\"text\":\n", false),
            Scan::Incomplete
        );
        assert_eq!(
            scan_frame("event: text\ndata: {\"text\":\"Hel", false),
            Scan::Incomplete
        );
    }

    #[test]
    fn test_newline_inside_payload_is_allowed() {
        let frame = frame("event: text\ndata: {\"text\":\n\"Hello\"}\n\n");
        assert_eq!(
            frame.kind,
            FrameKind::Text {
                payload: "{\"text\":\n\"Hello\"}"
            }
        );
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let frame = frame(r#"event: text
data: {"text":"} { \"}\" {"}
"#);
        assert_eq!(
            frame.kind,
            FrameKind::Text {
                payload: r#"{"text":"} { \"}\" {"}"#
            }
        );
    }

    #[test]
    fn test_nested_object_payload() {
        let frame = frame("event: text\ndata: {\"text\":\"x\",\"data\":{\"a\":{}}}\n\n");
        assert_eq!(
            frame.kind,
            FrameKind::Text {
                payload: "{\"text\":\"x\",\"data\":{\"a\":{}}}"
            }
        );
    }

    #[test]
    fn test_partial_header_is_incomplete() {
        for input in ["e", "event", "event:", "event: ", "event: te", "event: text", "event: text\r"] {
            assert_eq!(scan_frame(input, false), Scan::Incomplete, "input {:?}", input);
        }
        assert_eq!(scan_frame("event: text\ndata", false), Scan::Incomplete);
        assert_eq!(scan_frame("event: text\ndata: ", false), Scan::Incomplete);
    }

    #[test]
    fn test_done_event() {
        let frame = frame("event: done\ndata: {}\n\nevent: text\ndata: {\"text\":\"x\"}");
        assert_eq!(frame.kind, FrameKind::Done);
        assert_eq!(frame.raw, "event: done\ndata: {}");
    }

    #[test]
    fn test_done_event_requires_empty_object() {
        assert_eq!(scan_frame("event: done\ndata: {", false), Scan::Incomplete);
        assert_eq!(
            scan_frame("event: done\ndata: {\"x\":1}\n\n", false),
            Scan::Unrecognized
        );
    }

    #[test]
    fn test_ping_line() {
        let frame = frame("ping\nevent: text");
        assert_eq!(frame.kind, FrameKind::PingLine);
        assert_eq!(frame.raw, "ping\n");
        assert!(frame.is_keepalive());
    }

    #[test]
    fn test_ping_comment() {
        let frame = frame(": ping\r\n\r\n");
        assert_eq!(frame.kind, FrameKind::PingComment);
        assert_eq!(frame.raw, ": ping\r\n");
    }

    #[test]
    fn test_ping_without_eol_waits_until_eof() {
        assert_eq!(scan_frame("ping", false), Scan::Incomplete);
        assert_eq!(scan_frame(": ping", false), Scan::Incomplete);

        match scan_frame("ping", true) {
            Scan::Frame(frame) => assert_eq!(frame.kind, FrameKind::PingLine),
            other => panic!("Expected ping frame, got {:?}", other),
        }
        match scan_frame(": ping", true) {
            Scan::Frame(frame) => assert_eq!(frame.kind, FrameKind::PingComment),
            other => panic!("Expected ping comment frame, got {:?}", other),
        }
    }

    #[test]
    fn test_pinging_is_not_a_ping() {
        assert_eq!(scan_frame("pinging\n", false), Scan::Unrecognized);
    }

    #[test]
    fn test_unknown_event_is_unrecognized() {
        assert_eq!(
            scan_frame("event: meta\ndata: {\"content_type\":\"text/markdown\"}\n\n", false),
            Scan::Unrecognized
        );
        assert_eq!(scan_frame("garbage", false), Scan::Unrecognized);
    }

    #[test]
    fn test_empty_input_is_incomplete() {
        assert_eq!(scan_frame("", false), Scan::Incomplete);
    }

    #[test]
    fn test_multibyte_payload() {
        let frame = frame("event: text\ndata: {\"text\":\"héllo 🌍\"}\n\n");
        assert_eq!(
            frame.kind,
            FrameKind::Text {
                payload: "{\"text\":\"héllo 🌍\"}"
            }
        );
    }
}
