//! Incremental UTF-8 decoding of a chunked byte stream.

use std::char::REPLACEMENT_CHARACTER;
use std::error::Error;
use std::fmt::{self, Display};
use std::str;

/// How invalid bytes in the stream are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// Each maximal invalid subsequence becomes U+FFFD, the way a
    /// non-fatal streaming text decoder does.
    #[default]
    Lossy,
    /// Invalid bytes, or a character cut off by the end of the stream,
    /// fail the decoding.
    Strict,
}

/// The stream was not valid UTF-8.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DecodeError {
    valid_prefix: String,
    bytes: Vec<u8>,
    truncated: bool,
}

impl DecodeError {
    /// Returns the text decoded before the offending bytes.
    ///
    /// It belongs to the output just like a successful decode, so the result
    /// doesn't depend on where the chunks were split.
    #[inline]
    pub fn valid_prefix(&self) -> &str {
        &self.valid_prefix
    }

    /// Returns the offending bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns `true` if the stream ended in the middle of a character.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.truncated {
            write!(f, "stream ended inside a UTF-8 sequence {:02X?}", self.bytes)
        } else {
            write!(f, "invalid UTF-8 sequence {:02X?}", self.bytes)
        }
    }
}

impl Error for DecodeError {}

/// Decodes a byte stream that arrives in arbitrary chunks.
///
/// The output is the same as decoding the concatenation of all chunks at
/// once. A character split across chunk boundaries is held back until its
/// remaining bytes arrive.
#[derive(Clone, Debug, Default)]
pub struct Utf8Decoder {
    mode: DecodeMode,
    // Never longer than 3 bytes.
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates a decoder with nothing held back.
    #[inline]
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            mode,
            pending: Vec::new(),
        }
    }

    /// Returns how invalid bytes are treated.
    #[inline]
    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Returns `true` if the bytes of an incomplete character are held back.
    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Decodes the next chunk, returning the text that is complete so far.
    ///
    /// The returned string may be empty, for example when the chunk only
    /// holds the first bytes of a character.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        let joined;
        let bytes = if self.pending.is_empty() {
            chunk
        } else {
            let mut buf = std::mem::take(&mut self.pending);
            buf.extend_from_slice(chunk);
            joined = buf;
            &joined[..]
        };

        let mut out = String::with_capacity(bytes.len());
        let mut utf8_chunks = bytes.utf8_chunks().peekable();
        while let Some(utf8_chunk) = utf8_chunks.next() {
            out.push_str(utf8_chunk.valid());

            let invalid = utf8_chunk.invalid();
            if invalid.is_empty() {
                continue;
            }
            if utf8_chunks.peek().is_none() && is_incomplete(invalid) {
                self.pending.extend_from_slice(invalid);
                break;
            }
            match self.mode {
                DecodeMode::Strict => {
                    return Err(DecodeError {
                        valid_prefix: out,
                        bytes: invalid.to_vec(),
                        truncated: false,
                    });
                }
                DecodeMode::Lossy => out.push(REPLACEMENT_CHARACTER),
            }
        }
        Ok(out)
    }

    /// Flushes the decoder at the end of the stream.
    pub fn finish(&mut self) -> Result<String, DecodeError> {
        if self.pending.is_empty() {
            return Ok(String::new());
        }
        let bytes = std::mem::take(&mut self.pending);
        match self.mode {
            DecodeMode::Strict => Err(DecodeError {
                valid_prefix: String::new(),
                bytes,
                truncated: true,
            }),
            DecodeMode::Lossy => Ok(REPLACEMENT_CHARACTER.to_string()),
        }
    }

    /// Drops any held back bytes.
    #[inline]
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}

/// Whether `bytes` is the beginning of a character that more bytes could
/// complete.
#[inline]
fn is_incomplete(bytes: &[u8]) -> bool {
    matches!(str::from_utf8(bytes), Err(err) if err.error_len().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(
        decoder: &mut Utf8Decoder,
        chunks: &[&[u8]],
    ) -> Result<String, DecodeError> {
        let mut out = String::new();
        for chunk in chunks {
            out.push_str(&decoder.decode(chunk)?);
        }
        out.push_str(&decoder.finish()?);
        Ok(out)
    }

    #[test]
    fn test_ascii_chunks() {
        let mut decoder = Utf8Decoder::default();
        let text = decode_all(&mut decoder, &[b"He", b"llo", b" world"]);
        assert_eq!(text.unwrap(), "Hello world");
    }

    #[test]
    fn test_split_character() {
        // U+1F44B split after every byte.
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"hi \xF0").unwrap(), "hi ");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(b"\x9F").unwrap(), "");
        assert_eq!(decoder.decode(b"\x91").unwrap(), "");
        assert_eq!(decoder.decode(b"\x8B!").unwrap(), "👋!");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish().unwrap(), "");
    }

    #[test]
    fn test_split_at_every_offset() {
        let text = "Grüße, 世界 👋";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let (head, tail) = bytes.split_at(split);
            let mut decoder = Utf8Decoder::default();
            assert_eq!(decode_all(&mut decoder, &[head, tail]).unwrap(), text);
        }
    }

    #[test]
    fn test_strict_invalid() {
        let mut decoder = Utf8Decoder::new(DecodeMode::Strict);
        let err = decoder.decode(b"ok\xFFok").unwrap_err();
        assert_eq!(err.valid_prefix(), "ok");
        assert_eq!(err.bytes(), b"\xFF");
        assert!(!err.is_truncated());
    }

    #[test]
    fn test_strict_truncated() {
        let mut decoder = Utf8Decoder::new(DecodeMode::Strict);
        assert_eq!(decoder.decode(b"caf\xC3").unwrap(), "caf");
        let err = decoder.finish().unwrap_err();
        assert_eq!(err.valid_prefix(), "");
        assert_eq!(err.bytes(), b"\xC3");
        assert!(err.is_truncated());
    }

    #[test]
    fn test_strict_keeps_text_before_invalid_bytes() {
        // The held back bytes complete a character before the invalid byte.
        let mut decoder = Utf8Decoder::new(DecodeMode::Strict);
        assert_eq!(decoder.decode(b"caf\xC3").unwrap(), "caf");
        let err = decoder.decode(b"\xA9!\xFE").unwrap_err();
        assert_eq!(err.valid_prefix(), "\u{e9}!");
        assert_eq!(err.bytes(), b"\xFE");
    }

    #[test]
    fn test_default_is_lossy() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.mode(), DecodeMode::Lossy);
        assert_eq!(decoder.decode(b"a\xFFb").unwrap(), "a\u{FFFD}b");
    }

    #[test]
    fn test_lossy() {
        let mut decoder = Utf8Decoder::new(DecodeMode::Lossy);
        assert_eq!(decoder.decode(b"a\xFFb\xE4\xB8").unwrap(), "a\u{FFFD}b");
        // An invalid continuation ends the held back sequence.
        assert_eq!(decoder.decode(b"c").unwrap(), "\u{FFFD}c");
        assert_eq!(decoder.decode(b"\xF0\x9F").unwrap(), "");
        assert_eq!(decoder.finish().unwrap(), "\u{FFFD}");
    }

    #[test]
    fn test_reset() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"\xE4\xB8").unwrap(), "");
        decoder.reset();
        assert_eq!(decoder.decode(b"ok").unwrap(), "ok");
        assert_eq!(decoder.finish().unwrap(), "");
    }
}
