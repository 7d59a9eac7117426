//! The concurrent extraction pipeline.
//!
//! Topology: coordinator → work queue → worker pool → sink queue(s) → sink
//! workers. Shutdown flows the same direction: one [`WorkItem::Stop`] per
//! consumer of a queue, and no queue gets a `Stop` until every producer
//! that could still write to it has been joined.

pub mod coordinator;
pub mod sink;
pub mod worker;

pub use coordinator::{run_mailbox, run_store, PipelineSummary};
pub use sink::{SinkConfig, SinkReport};
pub use worker::{Dispatch, WorkItem, WorkerReport};
