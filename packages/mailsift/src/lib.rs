//! Concurrent extraction pipeline for archived email.
//!
//! Reads messages out of a mailbox or a record store, normalizes their
//! bodies into clean text, extracts a token stream plus address metadata,
//! and fans the results out to downstream sinks (console printer, record
//! store) through a fixed pool of workers with deterministic, leak-free
//! shutdown.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mailsift::{run_mailbox, MboxSource, PipelineConfig, SinkConfig};
//!
//! let source = MboxSource::open("archive.mbox")?;
//! let config = PipelineConfig::new().with_workers(4);
//! let summary = run_mailbox(source, &config, vec![SinkConfig::stdout()]).await?;
//! println!("{} items, {} duplicates dropped", summary.processed, summary.duplicates_dropped());
//! ```
//!
//! # Modules
//!
//! - [`pipeline`] - queue topology, worker pool, sinks, coordinator
//! - [`normalize`] - body normalization and tokenization
//! - [`dedup`] - concurrent-safe content deduplication
//! - [`sources`] - mailbox reader
//! - [`stores`] - storage implementations (memory, postgres)
//! - [`traits`] - source/store seams
//! - [`testing`] - mocks for tests and development

pub mod archive;
pub mod decode;
pub mod dedup;
pub mod error;
pub mod headers;
pub mod normalize;
pub mod pipeline;
pub mod sources;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use archive::{archive, ArchiveSummary};
pub use dedup::{fingerprint, DedupDecision, Deduplicator, Fingerprint};
pub use error::{PipelineError, Result, SourceError, StoreError};
pub use headers::{parse_address, parse_address_list, Mailbox};
pub use normalize::{html_to_text, normalize, tokens};
pub use pipeline::{
    run_mailbox, run_store, Dispatch, PipelineSummary, SinkConfig, SinkReport, WorkItem,
};
pub use sources::MboxSource;
pub use stores::{MemoryConnector, MemoryStore};
pub use traits::{MailStore, RecordSource, StoreConnector};
pub use types::{Headers, MailRecord, PipelineConfig, ProcessedItem};

#[cfg(feature = "postgres")]
pub use stores::{PostgresConnector, PostgresStore};
