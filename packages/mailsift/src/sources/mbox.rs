//! Unix mbox reader.
//!
//! Line-based framing only: messages are delimited by `From ` separator
//! lines, headers are unfolded and decoded, and the flat body gets
//! best-effort transfer-decoding. Full MIME multipart parsing is
//! deliberately out of scope; the body is treated as one text blob, the
//! way the rest of the pipeline expects it.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use tracing::{debug, warn};

use crate::decode::{bytes_to_string, decode_base64_if_necessary, decode_quoted_printable};
use crate::error::{SourceError, SourceResult};
use crate::headers::decode_header_value;
use crate::traits::source::RecordSource;
use crate::types::{record::Headers, MailRecord};

/// A mailbox file as a lazy stream of [`MailRecord`]s.
///
/// Chat transcripts (Gmail `Chat` label) are skipped, and messages without
/// a `message-id` get a synthetic id so nothing is dropped for want of a
/// key.
pub struct MboxSource<R> {
    reader: R,
    /// a `From ` separator was already consumed while framing the
    /// previous message
    pending_separator: bool,
    chats_skipped: usize,
    ids_synthesized: usize,
}

impl MboxSource<BufReader<File>> {
    /// Open a mailbox file.
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<'a> MboxSource<Cursor<&'a [u8]>> {
    /// Read mbox data from a byte slice (tests, small tools).
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: BufRead> MboxSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            pending_separator: false,
            chats_skipped: 0,
            ids_synthesized: 0,
        }
    }

    /// Number of chat-labeled messages skipped so far.
    pub fn chats_skipped(&self) -> usize {
        self.chats_skipped
    }

    /// Number of records that needed a synthetic id so far.
    pub fn ids_synthesized(&self) -> usize {
        self.ids_synthesized
    }

    /// Read one line without assuming UTF-8; undecodable bytes degrade via
    /// Latin-1 instead of poisoning the whole source.
    fn read_line(&mut self) -> SourceResult<Option<String>> {
        let mut buf = Vec::new();
        let n = self.reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        let mut line = bytes_to_string(buf);
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Frame the next message: everything between two `From ` separators.
    fn next_message_lines(&mut self) -> SourceResult<Option<Vec<String>>> {
        if !self.pending_separator {
            loop {
                match self.read_line()? {
                    None => return Ok(None),
                    Some(line) if line.starts_with("From ") => break,
                    // preamble before the first separator
                    Some(_) => {}
                }
            }
        }
        self.pending_separator = false;

        let mut lines = Vec::new();
        loop {
            match self.read_line()? {
                None => break,
                Some(line) if line.starts_with("From ") => {
                    self.pending_separator = true;
                    break;
                }
                Some(line) => lines.push(line),
            }
        }
        Ok(Some(lines))
    }

    fn parse_message(&mut self, lines: Vec<String>) -> MailRecord {
        let split = lines.iter().position(|l| l.is_empty()).unwrap_or(lines.len());
        let (header_lines, rest) = lines.split_at(split);

        // drop the blank separator and any trailing blank lines
        let mut body_lines = rest.get(1..).unwrap_or(&[]);
        while let [head @ .., last] = body_lines {
            if !last.is_empty() {
                break;
            }
            body_lines = head;
        }

        let headers = parse_headers(header_lines);
        let body = decode_body(&headers, body_lines);

        let id = match headers.get("message-id").and_then(|v| v.first()) {
            Some(mid) if !mid.trim().is_empty() => mid.trim().to_string(),
            _ => {
                let id = synthesize_id(&headers);
                warn!("message has no message-id, using {id:?}");
                self.ids_synthesized += 1;
                id
            }
        };

        MailRecord { id, headers, body }
    }
}

impl<R: BufRead + Send> RecordSource for MboxSource<R> {
    fn next_record(&mut self) -> SourceResult<Option<MailRecord>> {
        loop {
            let Some(lines) = self.next_message_lines()? else {
                return Ok(None);
            };
            let record = self.parse_message(lines);
            if record.is_chat() {
                debug!(id = %record.id, "skipping chat message");
                self.chats_skipped += 1;
                continue;
            }
            return Ok(Some(record));
        }
    }
}

/// Unfold continuation lines, lower-case names, decode RFC 2047 words.
fn parse_headers(lines: &[String]) -> Headers {
    let mut unfolded: Vec<String> = Vec::new();
    for line in lines {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(prev) = unfolded.last_mut() {
                prev.push(' ');
                prev.push_str(line.trim_start());
                continue;
            }
        }
        unfolded.push(line.clone());
    }

    let mut headers = Headers::new();
    for line in unfolded {
        let Some((name, value)) = line.split_once(':') else {
            // not a header line; tolerate and move on
            continue;
        };
        headers
            .entry(name.trim().to_lowercase())
            .or_default()
            .push(decode_header_value(value.trim()));
    }
    headers
}

/// Undo `>From ` quoting, join lines, apply the declared transfer encoding
/// (or the base64 sniff when none is declared).
fn decode_body(headers: &Headers, lines: &[String]) -> String {
    let unquoted: Vec<&str> = lines
        .iter()
        .map(|line| {
            let stripped = line.trim_start_matches('>');
            if stripped.starts_with("From ") {
                &line[1..]
            } else {
                line.as_str()
            }
        })
        .collect();
    let body = unquoted.join("\n");

    let encoding = headers
        .get("content-transfer-encoding")
        .and_then(|v| v.first())
        .map(|v| v.to_lowercase());

    match encoding.as_deref() {
        Some(enc) if enc.contains("quoted-printable") => decode_quoted_printable(&body),
        Some(enc) if enc.contains("base64") => decode_base64_if_necessary(&body),
        Some(_) => body,
        // no declared encoding: the sniff only fires on bodies that are one
        // clean base64 block, so plain text passes through
        None => decode_base64_if_necessary(&body),
    }
}

fn synthesize_id(headers: &Headers) -> String {
    let part = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
            .unwrap_or("")
            .to_string()
    };
    format!("{}-{}-{}", part("from"), part("to"), part("subject"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = b"From alice@example.com Thu Jan  1 00:00:00 2024\n\
Message-ID: <one@example.com>\n\
From: Alice <alice@example.com>\n\
To: bob@example.com\n\
Subject: Hi\n\
\n\
Hello Bob\n\
>From the archives\n\
From bob@example.com Thu Jan  2 00:00:00 2024\n\
Message-ID: <two@example.com>\n\
From: Bob <bob@example.com>\n\
\n\
Second body\n";

    #[test]
    fn test_frames_two_messages() {
        let mut source = MboxSource::from_bytes(SIMPLE);
        let first = source.next_record().unwrap().unwrap();
        let second = source.next_record().unwrap().unwrap();
        assert!(source.next_record().unwrap().is_none());

        assert_eq!(first.id, "<one@example.com>");
        assert_eq!(second.id, "<two@example.com>");
        assert_eq!(second.body, "Second body");
    }

    #[test]
    fn test_body_unquotes_from_lines() {
        let mut source = MboxSource::from_bytes(SIMPLE);
        let first = source.next_record().unwrap().unwrap();
        assert!(first.body.contains("From the archives"));
        assert!(!first.body.contains(">From the archives"));
    }

    #[test]
    fn test_headers_lowercased_and_unfolded() {
        let data = b"From x Thu Jan  1 00:00:00 2024\n\
Message-ID: <a@b>\n\
Subject: a very\n\
 long subject\n\
\n\
body\n";
        let mut source = MboxSource::from_bytes(data);
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(record.header_first("subject"), Some("a very long subject"));
    }

    #[test]
    fn test_repeated_headers_accumulate() {
        let data = b"From x Thu Jan  1 00:00:00 2024\n\
Message-ID: <a@b>\n\
Received: from relay1\n\
Received: from relay2\n\
\n\
body\n";
        let mut source = MboxSource::from_bytes(data);
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(record.header_all("received").len(), 2);
    }

    #[test]
    fn test_chat_messages_skipped() {
        let data = b"From x Thu Jan  1 00:00:00 2024\n\
Message-ID: <chat@b>\n\
X-Gmail-Labels: Inbox,Chat\n\
\n\
ping\n\
From y Thu Jan  2 00:00:00 2024\n\
Message-ID: <mail@b>\n\
\n\
real mail\n";
        let mut source = MboxSource::from_bytes(data);
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(record.id, "<mail@b>");
        assert!(source.next_record().unwrap().is_none());
        assert_eq!(source.chats_skipped(), 1);
    }

    #[test]
    fn test_missing_message_id_synthesized() {
        let data = b"From x Thu Jan  1 00:00:00 2024\n\
From: a@x.com\n\
To: b@y.com\n\
Subject: hey\n\
\n\
body\n";
        let mut source = MboxSource::from_bytes(data);
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(record.id, "a@x.com-b@y.com-hey");
        assert_eq!(source.ids_synthesized(), 1);
    }

    #[test]
    fn test_quoted_printable_body_decoded() {
        let data = b"From x Thu Jan  1 00:00:00 2024\n\
Message-ID: <qp@b>\n\
Content-Transfer-Encoding: quoted-printable\n\
\n\
caf=C3=A9 time\n";
        let mut source = MboxSource::from_bytes(data);
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(record.body, "café time");
    }

    #[test]
    fn test_encoded_subject_decoded() {
        let data = b"From x Thu Jan  1 00:00:00 2024\n\
Message-ID: <ew@b>\n\
Subject: =?UTF-8?B?aGVsbG8=?=\n\
\n\
body\n";
        let mut source = MboxSource::from_bytes(data);
        let record = source.next_record().unwrap().unwrap();
        assert_eq!(record.header_first("subject"), Some("hello"));
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let mut source = MboxSource::from_bytes(b"");
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_preamble_without_separator_yields_nothing() {
        let mut source = MboxSource::from_bytes(b"not a mailbox\njust text\n");
        assert!(source.next_record().unwrap().is_none());
    }
}
