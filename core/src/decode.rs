//! Incremental UTF-8 Decoding
//!
//! Reply bodies arrive as raw bytes with arbitrary chunk boundaries, so a
//! multi-byte scalar can be split across two chunks. The decoder carries the
//! incomplete tail of each chunk into the next call instead of mangling it,
//! and substitutes U+FFFD for byte sequences that can never become valid.

/// Stateful decoder turning byte chunks into text fragments
///
/// `feed` never fails: well-formed input decodes as-is, malformed interior
/// sequences become U+FFFD. A trailing incomplete scalar is held back until
/// the next `feed` completes it, or until `finish` gives up on it.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Undecoded tail of the previous chunk (at most 3 bytes)
    carry: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Create a decoder with no carried state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning the text that is complete so far
    pub fn feed(&mut self, input: &[u8]) -> String {
        let joined: Vec<u8>;
        let mut rest: &[u8] = if self.carry.is_empty() {
            input
        } else {
            let mut buf = std::mem::take(&mut self.carry);
            buf.extend_from_slice(input);
            joined = buf;
            &joined
        };

        let mut out = String::with_capacity(rest.len());
        while !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            // Invalid sequence that no future bytes can fix.
                            out.push('\u{FFFD}');
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete scalar at the end of the chunk.
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush the decoder at end of stream
    ///
    /// A dangling partial scalar decodes to a single U+FFFD rather than
    /// raising.
    pub fn finish(&mut self) -> String {
        if self.carry.is_empty() {
            String::new()
        } else {
            self.carry.clear();
            '\u{FFFD}'.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.feed(b"hello"), "hello");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        // U+00E9 (e-acute) is 0xC3 0xA9; split it between two feeds.
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.feed(&[0x63, 0x61, 0x66, 0xC3]), "caf");
        assert_eq!(decoder.feed(&[0xA9]), "\u{00E9}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_four_byte_scalar_split_three_ways() {
        // U+1F600 is F0 9F 98 80.
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.feed(&[0xF0]), "");
        assert_eq!(decoder.feed(&[0x9F, 0x98]), "");
        assert_eq!(decoder.feed(&[0x80]), "\u{1F600}");
    }

    #[test]
    fn test_invalid_interior_byte_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.feed(&[0x61, 0xFF, 0x62]), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_replaced_at_finish() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.feed(&[0x68, 0x69, 0xE2, 0x82]), "hi");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        // Finish drains the carry; a second flush yields nothing.
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_carry_then_invalid_continuation() {
        // 0xC3 expects a continuation byte; 0x21 ('!') is not one, so the
        // carried byte is reported as one bad sequence and '!' survives.
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.feed(&[0xC3]), "");
        assert_eq!(decoder.feed(&[0x21]), "\u{FFFD}!");
    }

    #[test]
    fn test_empty_chunks_are_harmless() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.feed(&[]), "");
        assert_eq!(decoder.feed(&[0xE2, 0x82]), "");
        assert_eq!(decoder.feed(&[]), "");
        assert_eq!(decoder.feed(&[0xAC]), "\u{20AC}");
    }
}
