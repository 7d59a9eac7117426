//! Pool workers: drain the work queue, transform records, feed the sinks.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::dedup::{DedupDecision, Deduplicator};
use crate::error::StoreError;
use crate::normalize::{normalize, tokens};
use crate::traits::store::{MailStore, StoreConnector};
use crate::types::{MailRecord, ProcessedItem};

/// A queue value: either a payload or the end-of-work marker.
///
/// Exactly one `Stop` is enqueued per consumer of a queue; consumers match
/// on the variant instead of comparing against a magic payload.
#[derive(Debug)]
pub enum WorkItem<T> {
    Data(T),
    Stop,
}

/// What the work queue carries: a full record, or just an id the worker
/// resolves through its own store handle.
#[derive(Debug)]
pub enum Dispatch {
    Record(MailRecord),
    Id(String),
}

/// Per-worker counters, returned through the join handle.
#[derive(Debug)]
pub struct WorkerReport {
    pub worker: usize,
    /// Items transformed and forwarded to the sinks
    pub processed: usize,
    /// Dropped duplicates as (record id, id that first claimed the body)
    pub duplicates: Vec<(String, String)>,
    /// Records skipped because of per-item errors
    pub failures: usize,
    /// Set when the worker exited early on an unrecoverable error
    pub fatal: Option<String>,
}

impl WorkerReport {
    fn new(worker: usize) -> Self {
        Self {
            worker,
            processed: 0,
            duplicates: Vec::new(),
            failures: 0,
            fatal: None,
        }
    }
}

/// One pool worker: drain the shared queue until our `Stop` arrives.
///
/// The store handle (when id resolution is configured) is acquired inside
/// the task, before the first dequeue, never inherited from the
/// coordinator.
pub(crate) async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<WorkItem<Dispatch>>>>,
    sinks: Vec<mpsc::Sender<WorkItem<ProcessedItem>>>,
    dedup: Option<Arc<Deduplicator>>,
    connector: Option<Arc<dyn StoreConnector>>,
) -> WorkerReport {
    let mut report = WorkerReport::new(worker_id);

    let store = match &connector {
        Some(connector) => match connector.connect().await {
            Ok(store) => Some(store),
            Err(e) => {
                error!(worker = worker_id, "store connection failed: {e}");
                report.fatal = Some(e.to_string());
                return report;
            }
        },
        None => None,
    };

    loop {
        let item = {
            let mut queue = queue.lock().await;
            queue.recv().await
        };
        // a closed channel means the coordinator is gone; drain out
        let Some(item) = item else { break };
        let dispatch = match item {
            WorkItem::Stop => break,
            WorkItem::Data(dispatch) => dispatch,
        };

        let record = match resolve(dispatch, store.as_deref()).await {
            Ok(record) => record,
            Err(ResolveFailure::Missing(id)) => {
                warn!(worker = worker_id, id = %id, "record not found, skipping");
                report.failures += 1;
                continue;
            }
            Err(ResolveFailure::Transient { id, error }) => {
                warn!(worker = worker_id, id = %id, "lookup failed, skipping: {error}");
                report.failures += 1;
                continue;
            }
            Err(ResolveFailure::Fatal(error)) => {
                error!(worker = worker_id, "store handle lost: {error}");
                report.fatal = Some(error.to_string());
                return report;
            }
        };

        let normalized = normalize(&record.body);
        if let Some(dedup) = &dedup {
            if let DedupDecision::Duplicate { first_seen } = dedup.accept(&normalized, &record.id)
            {
                debug!(id = %record.id, first_seen = %first_seen, "duplicate body dropped");
                report.duplicates.push((record.id.clone(), first_seen));
                continue;
            }
        }

        let body_tokens: Vec<String> = tokens(&normalized).map(str::to_owned).collect();
        let item = ProcessedItem::from_record(&record, body_tokens);

        for tx in &sinks {
            if tx.send(WorkItem::Data(item.clone())).await.is_err() {
                warn!(worker = worker_id, id = %item.source_id, "sink queue closed, item dropped");
            }
        }
        report.processed += 1;
    }

    report
}

enum ResolveFailure {
    Missing(String),
    Transient { id: String, error: StoreError },
    Fatal(StoreError),
}

async fn resolve(
    dispatch: Dispatch,
    store: Option<&dyn MailStore>,
) -> Result<MailRecord, ResolveFailure> {
    match dispatch {
        Dispatch::Record(record) => Ok(record),
        Dispatch::Id(id) => {
            let Some(store) = store else {
                // id dispatch without a lookup handle is a wiring mistake,
                // but one bad item never stops the pool
                return Err(ResolveFailure::Missing(id));
            };
            match store.find_one(&id).await {
                Ok(Some(record)) => Ok(record),
                Ok(None) => Err(ResolveFailure::Missing(id)),
                Err(error) if error.is_fatal() => Err(ResolveFailure::Fatal(error)),
                Err(error) => Err(ResolveFailure::Transient { id, error }),
            }
        }
    }
}
