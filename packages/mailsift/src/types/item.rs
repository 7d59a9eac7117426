//! The processed form of a record, as handed to sinks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::headers::{parse_address, parse_address_list};
use crate::types::record::MailRecord;

/// Address metadata plus the token stream extracted from one record.
///
/// Built once by a worker and handed to every configured sink; never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedItem {
    /// Id of the record this item was extracted from
    pub source_id: String,

    /// Sender display name, when the `from` header carried one
    pub from_name: Option<String>,

    /// Sender email
    pub from_email: Option<String>,

    /// Bare recipient emails (display names discarded)
    pub to_emails: Vec<String>,

    /// Bare cc emails (display names discarded)
    pub cc_emails: Vec<String>,

    /// Normalized body tokens, in original order
    pub body_tokens: Vec<String>,

    /// When the worker produced this item
    pub processed_at: DateTime<Utc>,
}

impl ProcessedItem {
    /// Assemble an item from a record and its extracted tokens.
    ///
    /// Header problems degrade to empty address fields: a record with a
    /// mangled `from` still flows through with its tokens.
    pub fn from_record(record: &MailRecord, body_tokens: Vec<String>) -> Self {
        let from = record.header_first("from").and_then(parse_address);
        let (from_name, from_email) = match from {
            Some(mb) => (mb.name, Some(mb.email)),
            None => (None, None),
        };

        Self {
            source_id: record.id.clone(),
            from_name,
            from_email,
            to_emails: collect_addresses(record.header_all("to")),
            cc_emails: collect_addresses(record.header_all("cc")),
            body_tokens,
            processed_at: Utc::now(),
        }
    }
}

fn collect_addresses(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| parse_address_list(value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::Headers;

    fn record() -> MailRecord {
        let mut headers = Headers::new();
        headers.insert("from".into(), vec!["Alice <alice@example.com>".into()]);
        headers.insert("to".into(), vec!["A <a@x.com>, B <b@y.com>".into()]);
        headers.insert("cc".into(), vec!["c@z.com".into()]);
        MailRecord::new("msg-1", headers, "ignored")
    }

    #[test]
    fn test_from_record_extracts_addresses() {
        let item = ProcessedItem::from_record(&record(), vec!["hello".into()]);
        assert_eq!(item.source_id, "msg-1");
        assert_eq!(item.from_name.as_deref(), Some("Alice"));
        assert_eq!(item.from_email.as_deref(), Some("alice@example.com"));
        assert_eq!(item.to_emails, vec!["a@x.com", "b@y.com"]);
        assert_eq!(item.cc_emails, vec!["c@z.com"]);
        assert_eq!(item.body_tokens, vec!["hello"]);
    }

    #[test]
    fn test_missing_headers_degrade_to_empty() {
        let record = MailRecord::new("msg-2", Headers::new(), "");
        let item = ProcessedItem::from_record(&record, Vec::new());
        assert_eq!(item.from_email, None);
        assert!(item.to_emails.is_empty());
        assert!(item.cc_emails.is_empty());
    }
}
