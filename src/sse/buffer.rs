//! Frame buffer
//!
//! Owned text accumulator for a single decode session. Chunks are appended
//! at the tail; recognized frames are removed from the head.

/// Growable buffer of not-yet-consumed stream text.
#[derive(Debug, Default, Clone)]
pub struct FrameBuffer {
    text: String,
}

impl FrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the tail of the buffer
    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    /// Remove and discard the first `n` bytes.
    ///
    /// `n` must fall on a char boundary; the tokenizer only ever reports
    /// lengths ending on ASCII delimiters, so this always holds for its
    /// output. Values past the end clear the buffer.
    pub fn consume_prefix(&mut self, n: usize) {
        if n >= self.text.len() {
            self.text.clear();
        } else {
            self.text.drain(..n);
        }
    }

    /// Drop leading whitespace and blank lines, returning how many bytes went
    pub fn trim_leading_whitespace(&mut self) -> usize {
        let trimmed = self.text.len() - self.text.trim_start().len();
        if trimmed > 0 {
            self.consume_prefix(trimmed);
        }
        trimmed
    }

    /// Current unconsumed content
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when nothing but whitespace is buffered
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Take the whole remaining content, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_consume() {
        let mut buffer = FrameBuffer::new();
        buffer.append("event: text\n");
        buffer.append("data: {}");
        assert_eq!(buffer.as_str(), "event: text\ndata: {}");

        buffer.consume_prefix(12);
        assert_eq!(buffer.as_str(), "data: {}");
    }

    #[test]
    fn test_consume_past_end_clears() {
        let mut buffer = FrameBuffer::new();
        buffer.append("ping");
        buffer.consume_prefix(100);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_trim_leading_whitespace() {
        let mut buffer = FrameBuffer::new();
        buffer.append("\r\n\n  \tping\n");
        assert_eq!(buffer.trim_leading_whitespace(), 6);
        assert_eq!(buffer.as_str(), "ping\n");

        // Nothing to trim
        assert_eq!(buffer.trim_leading_whitespace(), 0);
    }

    #[test]
    fn test_is_blank() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.is_blank());
        buffer.append("\n\n ");
        assert!(buffer.is_blank());
        buffer.append("x");
        assert!(!buffer.is_blank());
    }

    #[test]
    fn test_take() {
        let mut buffer = FrameBuffer::new();
        buffer.append("leftover");
        assert_eq!(buffer.take(), "leftover");
        assert!(buffer.is_empty());
    }
}
