//! Reassembling messages from a byte stream.
//!
//! WebSocket frames already delimit messages, but an RFCOMM serial link is a
//! plain byte stream: a single read may hold several commands, half of one,
//! or half of a multi-byte character.  [`LineDecoder`] buffers raw bytes and
//! yields a message for every `\n`:
//!
//! ```text
//! "left\nright\n"          → ["left", "right"]
//! "forw" + "ard\n"         → ["forward"]
//! "\n"                     → [""]
//! "init" + <end of stream> → ["init"]
//! ```
//!
//! Bytes are decoded as UTF-8 (lossily) only once a whole line is available.

/// Longest unterminated line kept before it is handed out anyway.
pub const MAX_LINE_LEN: usize = 1024;

/// Incremental newline framing over arbitrary byte chunks.
#[derive(Debug, Default)]
pub struct LineDecoder {
    partial: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every message they complete, in order.
    ///
    /// A line that grows past [`MAX_LINE_LEN`] without a newline is returned
    /// as it stands so a misbehaving peer cannot grow the buffer without bound.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(bytes);

        let mut messages = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            messages.push(decode(&line[..pos]));
        }
        if self.partial.len() >= MAX_LINE_LEN {
            let line = std::mem::take(&mut self.partial);
            messages.push(decode(&line));
        }
        messages
    }

    /// Called at end of stream: returns the unterminated tail, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.partial);
        Some(decode(&tail))
    }

    /// Bytes held back waiting for a newline.
    pub fn buffered(&self) -> usize {
        self.partial.len()
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_chunk_with_two_lines() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.push(b"left\nright\n"), vec!["left", "right"]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_command_split_across_reads_is_reassembled() {
        // Arrange
        let mut decoder = LineDecoder::new();

        // Act
        let first = decoder.push(b"forw");
        let second = decoder.push(b"ard\nba");

        // Assert
        assert!(first.is_empty());
        assert_eq!(second, vec!["forward"]);
        assert_eq!(decoder.buffered(), 2);
    }

    #[test]
    fn test_multibyte_character_split_across_reads_is_kept_whole() {
        // "é" is 0xC3 0xA9
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&[b'l', 0xC3]).is_empty());
        assert_eq!(decoder.push(&[0xA9, b'\n']), vec!["lé"]);
    }

    #[test]
    fn test_lone_newline_is_one_empty_message() {
        assert_eq!(LineDecoder::new().push(b"\n"), vec![""]);
    }

    #[test]
    fn test_blank_line_in_middle_is_kept() {
        assert_eq!(LineDecoder::new().push(b"init\n\nleft\n"), vec!["init", "", "left"]);
    }

    #[test]
    fn test_carriage_return_is_left_for_canonicalization() {
        assert_eq!(LineDecoder::new().push(b"init\r\n"), vec!["init\r"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        assert_eq!(LineDecoder::new().push(&[0x66, 0xff, b'\n']), vec!["f\u{fffd}"]);
    }

    #[test]
    fn test_finish_returns_unterminated_tail_once() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"init");

        assert_eq!(decoder.finish().as_deref(), Some("init"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_finish_on_empty_buffer_yields_nothing() {
        assert_eq!(LineDecoder::new().finish(), None);
    }

    #[test]
    fn test_overlong_line_is_flushed() {
        let mut decoder = LineDecoder::new();
        let long = vec![b'x'; MAX_LINE_LEN];

        let messages = decoder.push(&long);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].len(), MAX_LINE_LEN);
        assert_eq!(decoder.buffered(), 0);
    }
}
