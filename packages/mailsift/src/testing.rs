//! Testing utilities including mock sources, stores and writers.
//!
//! These are useful for exercising the pipeline without a mailbox file or
//! a database: a scriptable source, a connector whose store rejects every
//! write, and an in-memory `Write` target for the printer sink.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use crate::error::{SourceError, SourceResult, StoreError, StoreResult};
use crate::traits::source::RecordSource;
use crate::traits::store::{MailStore, StoreConnector};
use crate::types::{MailRecord, ProcessedItem};

/// A scriptable record source: serves queued records, then optionally one
/// injected error.
#[derive(Debug, Default)]
pub struct MockSource {
    records: VecDeque<MailRecord>,
    fail_at_end: bool,
}

impl MockSource {
    pub fn new(records: impl IntoIterator<Item = MailRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
            fail_at_end: false,
        }
    }

    /// Report an I/O error after the queued records run out, instead of a
    /// clean end-of-source.
    pub fn with_failure_at_end(mut self) -> Self {
        self.fail_at_end = true;
        self
    }
}

impl RecordSource for MockSource {
    fn next_record(&mut self) -> SourceResult<Option<MailRecord>> {
        match self.records.pop_front() {
            Some(record) => Ok(Some(record)),
            None if self.fail_at_end => {
                self.fail_at_end = false;
                Err(SourceError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected source failure",
                )))
            }
            None => Ok(None),
        }
    }
}

/// Store that accepts connections but rejects every operation the way a
/// down database would: lookups fail fatally, inserts fail per item.
#[derive(Debug, Clone, Default)]
pub struct RejectingStore {
    ids: Vec<String>,
}

impl RejectingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids the scan should report (the lookups for them will still fail).
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }
}

#[async_trait]
impl MailStore for RejectingStore {
    async fn find_one(&self, id: &str) -> StoreResult<Option<MailRecord>> {
        let _ = id;
        Err(StoreError::Connection(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "connection lost",
        ))))
    }

    async fn all_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.ids.clone())
    }

    async fn insert_record(&self, _record: &MailRecord) -> StoreResult<String> {
        Err(StoreError::Insert(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "insert rejected",
        ))))
    }

    async fn insert_item(&self, _item: &ProcessedItem) -> StoreResult<String> {
        Err(StoreError::Insert(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "insert rejected",
        ))))
    }
}

/// Connector handing out [`RejectingStore`] handles.
#[derive(Debug, Clone, Default)]
pub struct RejectingConnector {
    store: RejectingStore,
}

impl RejectingConnector {
    pub fn new(store: RejectingStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreConnector for RejectingConnector {
    async fn connect(&self) -> StoreResult<Box<dyn MailStore>> {
        Ok(Box::new(self.store.clone()))
    }
}

/// Connector that cannot connect at all (worker-fatal path).
#[derive(Debug, Clone, Default)]
pub struct BrokenConnector;

#[async_trait]
impl StoreConnector for BrokenConnector {
    async fn connect(&self) -> StoreResult<Box<dyn MailStore>> {
        Err(StoreError::Connection(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "store unreachable",
        ))))
    }
}

/// Cloneable in-memory `Write` target; every clone appends to the same
/// buffer, so a test can keep one and hand another to the printer sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }

    /// Non-empty lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// `Write` target that fails every write (printer-sink failure path).
#[derive(Debug, Clone, Default)]
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "writer is closed",
        ))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Shorthand for building records in tests.
pub fn record(id: &str, body: &str) -> MailRecord {
    MailRecord::new(id, crate::types::record::Headers::new(), body)
}
