//! Best-effort transfer-encoding recovery for header and body text.
//!
//! Archived messages arrive with quoted-printable escapes, base64 blocks
//! and mixed charsets. Everything here recovers what it can and passes the
//! input through untouched when it cannot. Decoding never fails.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

/// Decode bytes as UTF-8, falling back to Latin-1 (every byte maps to a
/// code point, so this cannot fail) when the bytes are not valid UTF-8.
pub fn bytes_to_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

/// Decode MIME quoted-printable data: `=XX` hex escapes and `=`-terminated
/// soft line breaks. Escapes that do not parse are kept verbatim.
pub fn decode_quoted_printable(input: &str) -> String {
    bytes_to_string(decode_quoted_printable_bytes(input.as_bytes()))
}

/// Byte-level quoted-printable decoding; the caller picks the charset.
pub fn decode_quoted_printable_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            // soft line break: "=\n" or "=\r\n"
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                i += 3;
                continue;
            }
            if let (Some(&hi), Some(&lo)) = (bytes.get(i + 1), bytes.get(i + 2)) {
                if let Some(byte) = hex_pair(hi, lo) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Minimum size before a body is even considered base64: short texts like
/// "Hello" are valid base64 by accident far too often.
const BASE64_MIN_LEN: usize = 24;

/// Decode a body that looks like one big base64 block, or return the input
/// unchanged. A block qualifies when, after stripping whitespace, it is
/// non-trivially long, uses only alphabet characters and decodes cleanly.
pub fn decode_base64_if_necessary(input: &str) -> String {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < BASE64_MIN_LEN || compact.len() % 4 != 0 {
        return input.to_string();
    }
    if !compact
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'-' | b'_' | b'='))
    {
        return input.to_string();
    }

    let decoded = STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| URL_SAFE.decode(compact.as_bytes()));
    match decoded {
        Ok(bytes) => bytes_to_string(bytes),
        Err(_) => input.to_string(),
    }
}

/// Decode a base64 atom (used by RFC 2047 `?B?` encoded words).
pub fn decode_base64_atom(input: &str) -> Option<Vec<u8>> {
    STANDARD.decode(input.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_printable_escapes() {
        assert_eq!(decode_quoted_printable("caf=C3=A9"), "café");
        assert_eq!(decode_quoted_printable("1=2B1"), "1+1");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        assert_eq!(decode_quoted_printable("long=\nline"), "longline");
        assert_eq!(decode_quoted_printable("long=\r\nline"), "longline");
    }

    #[test]
    fn test_quoted_printable_invalid_escape_kept() {
        assert_eq!(decode_quoted_printable("50=ZZoff"), "50=ZZoff");
        assert_eq!(decode_quoted_printable("trailing="), "trailing=");
    }

    #[test]
    fn test_base64_round_trip_detected() {
        // "this is a base64 encoded body" encoded
        let encoded = "dGhpcyBpcyBhIGJhc2U2NCBlbmNvZGVkIGJvZHk=";
        assert_eq!(decode_base64_if_necessary(encoded), "this is a base64 encoded body");
    }

    #[test]
    fn test_plain_text_left_alone() {
        assert_eq!(decode_base64_if_necessary("hello there"), "hello there");
        // alphabet-only but not a multiple of 4
        assert_eq!(decode_base64_if_necessary("abcdefghijklmnopqrstuvwxy"), "abcdefghijklmnopqrstuvwxy");
    }

    #[test]
    fn test_latin1_fallback() {
        // 0xE9 is é in Latin-1 and invalid on its own in UTF-8
        assert_eq!(bytes_to_string(vec![b'c', 0xE9]), "cé");
    }

    #[test]
    fn test_byte_level_decode_leaves_charset_to_caller() {
        // 0xE9 stays a lone byte here; the caller decides Latin-1 vs UTF-8
        assert_eq!(decode_quoted_printable_bytes(b"caf=E9"), vec![b'c', b'a', b'f', 0xE9]);
    }
}
