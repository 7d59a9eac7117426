//! Typed errors for the mailsift library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur while running the extraction pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading from the record source failed
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Storage operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid pipeline configuration
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },
}

/// Errors that can occur while reading records from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Source file could not be opened
    #[error("cannot open source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while reading the source
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    /// A single record could not be framed or decoded
    #[error("malformed record near offset {offset}: {reason}")]
    MalformedRecord { offset: u64, reason: String },
}

/// Errors that can occur against the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not establish a store handle
    #[error("connection failed: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Insert was rejected by the store
    #[error("insert failed: {0}")]
    Insert(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Point lookup failed (not the same as a clean not-found)
    #[error("lookup failed for {id}: {source}")]
    Lookup {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Record payload could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid collection name or store configuration
    #[error("invalid store config: {reason}")]
    InvalidConfig { reason: String },
}

impl StoreError {
    /// Whether this error indicates the handle itself is unusable, as
    /// opposed to a single operation failing. Workers treat these as
    /// fatal and exit instead of retrying item after item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
