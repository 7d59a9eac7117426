//! Mail records as read from a source or the store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lower-cased header name → one-or-more decoded values.
///
/// Single-value headers are one-element vectors, so callers never branch on
/// "is this a string or a list".
pub type Headers = HashMap<String, Vec<String>>;

/// One archived message: opaque id, decoded headers, raw body text.
///
/// Immutable once read; owned by exactly one worker while being processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailRecord {
    pub id: String,
    pub headers: Headers,
    pub body: String,
}

impl MailRecord {
    pub fn new(id: impl Into<String>, headers: Headers, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            headers,
            body: body.into(),
        }
    }

    /// First value of a header, if present.
    pub fn header_first(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values of a header (empty slice when absent).
    pub fn header_all(&self, name: &str) -> &[String] {
        self.headers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Gmail exports mix Hangouts/chat transcripts into the mailbox and
    /// label them `Chat`; those are not email and get skipped at the source.
    pub fn is_chat(&self) -> bool {
        self.header_all("x-gmail-labels")
            .iter()
            .flat_map(|value| value.split(','))
            .any(|label| label.trim() == "Chat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(name: &str, value: &str) -> MailRecord {
        let mut headers = Headers::new();
        headers.insert(name.to_string(), vec![value.to_string()]);
        MailRecord::new("id-1", headers, "body")
    }

    #[test]
    fn test_header_first_and_all() {
        let mut headers = Headers::new();
        headers.insert("to".into(), vec!["a@x.com".into(), "b@y.com".into()]);
        let record = MailRecord::new("id-1", headers, "");

        assert_eq!(record.header_first("to"), Some("a@x.com"));
        assert_eq!(record.header_all("to").len(), 2);
        assert_eq!(record.header_first("cc"), None);
        assert!(record.header_all("cc").is_empty());
    }

    #[test]
    fn test_chat_label_detection() {
        assert!(record_with("x-gmail-labels", "Inbox,Chat,Archived").is_chat());
        assert!(record_with("x-gmail-labels", "Chat").is_chat());
        assert!(!record_with("x-gmail-labels", "Inbox,Archived").is_chat());
        // label match is exact, not substring
        assert!(!record_with("x-gmail-labels", "Chatter").is_chat());
        assert!(!record_with("subject", "Chat").is_chat());
    }
}
