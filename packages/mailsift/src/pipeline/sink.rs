//! Sink workers: drain processed items until their own `Stop` arrives.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::pipeline::worker::WorkItem;
use crate::traits::store::StoreConnector;
use crate::types::ProcessedItem;

/// A downstream consumer of processed items.
pub enum SinkConfig {
    /// Emit every token, one per line, to the given stream.
    Printer(Box<dyn Write + Send>),
    /// Insert every item into the store (at-most-once, no retry).
    Store(Arc<dyn StoreConnector>),
}

impl SinkConfig {
    /// Printer sink over stdout.
    pub fn stdout() -> Self {
        SinkConfig::Printer(Box::new(std::io::stdout()))
    }
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkConfig::Printer(_) => f.write_str("SinkConfig::Printer"),
            SinkConfig::Store(_) => f.write_str("SinkConfig::Store"),
        }
    }
}

/// Per-sink counters, returned through the join handle.
#[derive(Debug, Clone)]
pub struct SinkReport {
    pub kind: &'static str,
    /// Items fully handled
    pub delivered: usize,
    /// Write or insert failures (the sink kept going)
    pub failures: usize,
}

impl SinkReport {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            delivered: 0,
            failures: 0,
        }
    }
}

/// Print each item's tokens, one per line. A failed write skips that token
/// with a warning; the sink never stops early.
pub(crate) async fn printer_sink(
    mut rx: mpsc::Receiver<WorkItem<ProcessedItem>>,
    mut out: Box<dyn Write + Send>,
) -> SinkReport {
    let mut report = SinkReport::new("printer");

    while let Some(item) = rx.recv().await {
        let item = match item {
            WorkItem::Stop => break,
            WorkItem::Data(item) => item,
        };
        let mut wrote_all = true;
        for token in &item.body_tokens {
            if let Err(e) = writeln!(out, "{token}") {
                warn!(id = %item.source_id, "failed to write token: {e}");
                wrote_all = false;
            }
        }
        if wrote_all {
            report.delivered += 1;
        } else {
            report.failures += 1;
        }
    }

    if let Err(e) = out.flush() {
        warn!("output flush failed: {e}");
    }
    report
}

/// Insert each item into the store. Failures are logged with the item's
/// source id and counted; there is no retry.
pub(crate) async fn store_sink(
    mut rx: mpsc::Receiver<WorkItem<ProcessedItem>>,
    connector: Arc<dyn StoreConnector>,
) -> SinkReport {
    let mut report = SinkReport::new("store");

    // own handle, acquired inside the task; when the store is down we keep
    // draining so the pipeline still shuts down cleanly
    let store = match connector.connect().await {
        Ok(store) => Some(store),
        Err(e) => {
            error!("store sink could not connect: {e}");
            None
        }
    };

    while let Some(item) = rx.recv().await {
        let item = match item {
            WorkItem::Stop => break,
            WorkItem::Data(item) => item,
        };
        match &store {
            Some(store) => match store.insert_item(&item).await {
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    warn!(id = %item.source_id, "insert failed, item dropped: {e}");
                    report.failures += 1;
                }
            },
            None => report.failures += 1,
        }
    }

    report
}
