//! Pipeline coordinator: create queues, start everything, feed work,
//! shut down in order, fold the reports.
//!
//! States: Idle → Starting → Dispatching → Draining → Stopped. The one
//! invariant everything hangs on: a `Stop` goes onto a queue only after
//! every producer for that queue has stopped writing: N worker `Stop`s
//! after the source is exhausted, then join the pool, then one `Stop` per
//! sink, then join the sinks.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::dedup::Deduplicator;
use crate::error::{Result, SourceResult};
use crate::pipeline::sink::{printer_sink, store_sink, SinkConfig, SinkReport};
use crate::pipeline::worker::{worker_loop, Dispatch, WorkItem, WorkerReport};
use crate::traits::source::RecordSource;
use crate::traits::store::StoreConnector;
use crate::types::PipelineConfig;

/// Final counters for one pipeline run.
///
/// Per-item problems never fail the run; they end up in here. A run is
/// *degraded* (not failed) when workers exited early; the pipeline still
/// drained and joined everything it started.
#[derive(Debug, Default)]
pub struct PipelineSummary {
    /// Records put on the work queue
    pub dispatched: usize,
    /// Items transformed and forwarded by the pool
    pub processed: usize,
    /// Dropped duplicates as (record id, id that first claimed the body)
    pub duplicates: Vec<(String, String)>,
    /// Records skipped on per-item errors
    pub item_failures: usize,
    /// Workers that exited before their `Stop` arrived
    pub workers_failed: usize,
    /// Source iteration errors (dispatch stopped early)
    pub source_errors: usize,
    /// One report per configured sink, in configuration order
    pub sinks: Vec<SinkReport>,
}

impl PipelineSummary {
    /// Number of records dropped as duplicates.
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates.len()
    }

    /// True when every worker survived and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.workers_failed == 0
            && self.item_failures == 0
            && self.source_errors == 0
            && self.sinks.iter().all(|s| s.failures == 0)
    }

    fn absorb_worker(&mut self, report: WorkerReport) {
        self.processed += report.processed;
        self.item_failures += report.failures;
        self.duplicates.extend(report.duplicates);
        if report.fatal.is_some() {
            self.workers_failed += 1;
        }
    }
}

/// Run the pipeline over a record source (mailbox ingestion).
///
/// The source is driven lazily on the coordinator task; workers receive
/// full records. Early stop is possible by handing in a source that
/// reports exhaustion; there is no other cancellation path.
pub async fn run_mailbox<S: RecordSource>(
    mut source: S,
    config: &PipelineConfig,
    sinks: Vec<SinkConfig>,
) -> Result<PipelineSummary> {
    run_pipeline(config, sinks, None, move || {
        source.next_record().map(|r| r.map(Dispatch::Record))
    })
    .await
}

/// Run the pipeline over everything already in the store: scan ids, let
/// each worker resolve its records through its own handle.
pub async fn run_store(
    connector: Arc<dyn StoreConnector>,
    config: &PipelineConfig,
    sinks: Vec<SinkConfig>,
) -> Result<PipelineSummary> {
    // the scan itself uses the coordinator's own short-lived handle
    let ids = connector.connect().await?.all_ids().await?;
    info!("store scan found {} records", ids.len());

    let mut ids = ids.into_iter();
    run_pipeline(config, sinks, Some(connector), move || {
        Ok(ids.next().map(Dispatch::Id))
    })
    .await
}

async fn run_pipeline(
    config: &PipelineConfig,
    sinks: Vec<SinkConfig>,
    lookup: Option<Arc<dyn StoreConnector>>,
    mut next_dispatch: impl FnMut() -> SourceResult<Option<Dispatch>>,
) -> Result<PipelineSummary> {
    config.validate()?;

    // ── Starting: queues first, then sinks, then the pool ────────────────
    let (work_tx, work_rx) = mpsc::channel::<WorkItem<Dispatch>>(config.queue_capacity);
    let work_rx = Arc::new(Mutex::new(work_rx));

    let mut sink_txs = Vec::with_capacity(sinks.len());
    let mut sink_handles = Vec::with_capacity(sinks.len());
    for sink in sinks {
        let (tx, rx) = mpsc::channel::<WorkItem<_>>(config.queue_capacity);
        let handle = match sink {
            SinkConfig::Printer(out) => tokio::spawn(printer_sink(rx, out)),
            SinkConfig::Store(connector) => tokio::spawn(store_sink(rx, connector)),
        };
        sink_txs.push(tx);
        sink_handles.push(handle);
    }

    let dedup = config.dedup.then(|| Arc::new(Deduplicator::new()));

    let mut worker_handles = Vec::with_capacity(config.workers);
    for worker_id in 0..config.workers {
        worker_handles.push(tokio::spawn(worker_loop(
            worker_id,
            Arc::clone(&work_rx),
            sink_txs.clone(),
            dedup.clone(),
            lookup.clone(),
        )));
    }
    // the coordinator keeps no claim on the work queue's receiving side
    drop(work_rx);

    let mut summary = PipelineSummary::default();

    // ── Dispatching ──────────────────────────────────────────────────────
    loop {
        match next_dispatch() {
            Ok(Some(dispatch)) => {
                if work_tx.send(WorkItem::Data(dispatch)).await.is_err() {
                    // only possible when every worker is already gone
                    error!("all workers exited early, stopping dispatch");
                    break;
                }
                summary.dispatched += 1;
            }
            Ok(None) => break,
            Err(e) => {
                error!("source failed after {} records: {e}", summary.dispatched);
                summary.source_errors += 1;
                break;
            }
        }
    }

    // ── Draining: one Stop per worker, then join the pool ────────────────
    for _ in 0..config.workers {
        // send failure just means the pool already died; join still works
        let _ = work_tx.send(WorkItem::Stop).await;
    }
    drop(work_tx);

    for handle in worker_handles {
        match handle.await {
            Ok(report) => summary.absorb_worker(report),
            Err(e) => {
                error!("worker task lost: {e}");
                summary.workers_failed += 1;
            }
        }
    }

    // ── Stopped: workers are done, so the sinks can be told to finish ────
    for tx in &sink_txs {
        let _ = tx.send(WorkItem::Stop).await;
    }
    drop(sink_txs);

    for handle in sink_handles {
        match handle.await {
            Ok(report) => summary.sinks.push(report),
            Err(e) => error!("sink task lost: {e}"),
        }
    }

    info!(
        dispatched = summary.dispatched,
        processed = summary.processed,
        duplicates = summary.duplicates_dropped(),
        failures = summary.item_failures,
        "pipeline complete"
    );
    if summary.workers_failed > 0 {
        warn!(
            workers_failed = summary.workers_failed,
            "pipeline completed degraded: some workers exited early"
        );
    }

    Ok(summary)
}
