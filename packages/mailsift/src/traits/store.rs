//! Storage seam: the document store consumed and produced by the pipeline.
//!
//! The store is treated as an opaque record store: point lookup, insert
//! and a linear id scan. Query capabilities beyond that are out of scope.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::{MailRecord, ProcessedItem};

/// Handle to a record store.
#[async_trait]
pub trait MailStore: Send + Sync {
    /// Point lookup of a raw record by id.
    async fn find_one(&self, id: &str) -> StoreResult<Option<MailRecord>>;

    /// Linear scan over the ids of all raw records, in insertion order.
    async fn all_ids(&self) -> StoreResult<Vec<String>>;

    /// Insert one raw record; returns the stored id.
    async fn insert_record(&self, record: &MailRecord) -> StoreResult<String>;

    /// Insert one processed item; returns the store-generated id.
    async fn insert_item(&self, item: &ProcessedItem) -> StoreResult<String>;
}

/// Factory for store handles.
///
/// Workers and sinks acquire their own handle through this seam as their
/// first action inside the task; handles are never created by the
/// coordinator and passed in, so nothing connection-shaped is ever shared
/// or inherited across tasks.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> StoreResult<Box<dyn MailStore>>;
}
