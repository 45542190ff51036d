//! File content encoding
//!
//! The contents API takes file content as base64. Input arrives as a string
//! whose characters are either raw bytes (binary payloads read
//! byte-per-character) or ordinary text. The primary path encodes every
//! character as a single byte, which keeps binary payloads byte-exact; text
//! containing code points above U+00FF cannot be represented that way and
//! falls back to its UTF-8 bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode file content as base64.
///
/// Characters at or below U+00FF encode as single bytes (Latin-1). Anything
/// wider falls back to the UTF-8 byte encoding, which the server decodes
/// UTF-8-exact.
pub fn encode(text: &str) -> String {
    match latin1_bytes(text) {
        Some(bytes) => STANDARD.encode(bytes),
        None => STANDARD.encode(text.as_bytes()),
    }
}

/// The Latin-1 byte rendering of `text`, or None if any character is above
/// U+00FF.
fn latin1_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

/// Present raw bytes as a byte-per-character string, so binary payloads take
/// the primary encoding path unchanged.
pub fn binary_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
