//! Header value decoding and address parsing.
//!
//! Headers are modeled uniformly as lower-cased name → list of decoded
//! string values; single-value headers are one-element lists. The address
//! helpers pull display names and bare emails out of `from`/`to`/`cc`
//! values without attempting full RFC 5322 conformance.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::decode::{bytes_to_string, decode_base64_atom, decode_quoted_printable_bytes};

lazy_static! {
    /// RFC 2047 encoded word: `=?charset?B|Q?payload?=`
    static ref ENCODED_WORD: Regex =
        Regex::new(r"=\?([^?\s]+)\?([bBqQ])\?([^?\s]*)\?=").unwrap();
}

/// A parsed address: optional display name plus the bare email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub email: String,
}

/// Decode RFC 2047 encoded words inside a raw header value.
///
/// Unknown charsets and undecodable payloads are left in place; a garbled
/// header is a per-item concern, never an error.
pub fn decode_header_value(raw: &str) -> String {
    ENCODED_WORD
        .replace_all(raw, |caps: &Captures<'_>| {
            decode_encoded_word(&caps[1], &caps[2], &caps[3])
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_encoded_word(charset: &str, encoding: &str, payload: &str) -> Option<String> {
    let bytes = match encoding {
        "B" | "b" => decode_base64_atom(payload)?,
        // Q encoding is quoted-printable with '_' standing in for space
        "Q" | "q" => decode_quoted_printable_bytes(payload.replace('_', " ").as_bytes()),
        _ => return None,
    };

    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "us-ascii" => Some(String::from_utf8_lossy(&bytes).into_owned()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Some(bytes.iter().map(|&b| b as char).collect())
        }
        // best effort for anything else
        _ => Some(bytes_to_string(bytes)),
    }
}

/// Parse a single address value into display name and bare email.
///
/// Accepts `Display Name <user@host>`, `"Quoted, Name" <user@host>` and
/// bare `user@host` forms. Returns `None` when no plausible email is
/// present.
pub fn parse_address(value: &str) -> Option<Mailbox> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let (Some(open), Some(close)) = (value.rfind('<'), value.rfind('>')) {
        if open < close {
            let email = value[open + 1..close].trim();
            if email.is_empty() {
                return None;
            }
            let name = value[..open].trim().trim_matches('"').trim();
            return Some(Mailbox {
                name: (!name.is_empty()).then(|| name.to_string()),
                email: email.to_string(),
            });
        }
    }

    value.contains('@').then(|| Mailbox {
        name: None,
        email: value.trim_matches('"').to_string(),
    })
}

/// Parse a comma-joined address list into bare emails, discarding display
/// names. Commas inside quoted names or angle brackets do not split.
pub fn parse_address_list(value: &str) -> Vec<String> {
    split_addresses(value)
        .into_iter()
        .filter_map(parse_address)
        .map(|mb| mb.email)
        .collect()
}

fn split_addresses(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut in_angle = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '<' if !in_quotes => in_angle = true,
            '>' if !in_quotes => in_angle = false,
            ',' if !in_quotes && !in_angle => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);

    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}
