//! Byte-to-text decoding of entry contents.

use crate::error::DecodeError;

/// Converts raw entry bytes into text.
pub trait ContentDecoder: Send + Sync {
    /// Decodes `bytes` into a string.
    ///
    /// An `Err` marks the entry as failed; the run continues.
    fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError>;
}

/// Strict UTF-8 with a Latin-1 fallback.
///
/// Never fails: any byte sequence that is not valid UTF-8 is reinterpreted
/// byte-for-byte as Latin-1 (every byte maps to the code point of the same
/// value).
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Decoder;

impl ContentDecoder for Utf8Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(_) => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}
