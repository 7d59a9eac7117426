//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::traits::store::{MailStore, StoreConnector};
use crate::types::{MailRecord, ProcessedItem};

/// In-memory store for records and processed items.
///
/// Useful for testing and development; data is lost on drop. Cloning is
/// cheap and every clone shares the same underlying maps, which is what
/// lets the connector hand an independent handle to each task.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, MailRecord>>>,
    record_order: Arc<RwLock<Vec<String>>>,
    items: Arc<RwLock<Vec<(String, ProcessedItem)>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of raw records stored.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Number of processed items stored.
    pub fn item_count(&self) -> usize {
        self.items.read().unwrap().len()
    }

    /// Snapshot of the stored processed items.
    pub fn items(&self) -> Vec<ProcessedItem> {
        self.items
            .read()
            .unwrap()
            .iter()
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
        self.record_order.write().unwrap().clear();
        self.items.write().unwrap().clear();
    }
}

#[async_trait]
impl MailStore for MemoryStore {
    async fn find_one(&self, id: &str) -> StoreResult<Option<MailRecord>> {
        Ok(self.records.read().unwrap().get(id).cloned())
    }

    async fn all_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.record_order.read().unwrap().clone())
    }

    async fn insert_record(&self, record: &MailRecord) -> StoreResult<String> {
        let mut records = self.records.write().unwrap();
        if records.insert(record.id.clone(), record.clone()).is_none() {
            self.record_order.write().unwrap().push(record.id.clone());
        }
        Ok(record.id.clone())
    }

    async fn insert_item(&self, item: &ProcessedItem) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.items.write().unwrap().push((id.clone(), item.clone()));
        Ok(id)
    }
}

/// Connector handing out handles to one shared [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self) -> StoreResult<Box<dyn MailStore>> {
        Ok(Box::new(self.store.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::Headers;

    fn record(id: &str) -> MailRecord {
        MailRecord::new(id, Headers::new(), format!("body of {id}"))
    }

    #[tokio::test]
    async fn test_record_round_trip() {
        let store = MemoryStore::new();
        store.insert_record(&record("m1")).await.unwrap();
        store.insert_record(&record("m2")).await.unwrap();

        assert_eq!(store.record_count(), 2);
        assert_eq!(store.all_ids().await.unwrap(), vec!["m1", "m2"]);

        let found = store.find_one("m1").await.unwrap().unwrap();
        assert_eq!(found.body, "body of m1");
        assert!(store.find_one("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reinsert_keeps_scan_order_stable() {
        let store = MemoryStore::new();
        store.insert_record(&record("m1")).await.unwrap();
        store.insert_record(&record("m1")).await.unwrap();
        assert_eq!(store.all_ids().await.unwrap(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_item_inserts_get_distinct_ids() {
        let store = MemoryStore::new();
        let item = ProcessedItem::from_record(&record("m1"), vec!["tok".into()]);
        let a = store.insert_item(&item).await.unwrap();
        let b = store.insert_item(&item).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.item_count(), 2);
    }

    #[tokio::test]
    async fn test_connector_handles_share_state() {
        let store = MemoryStore::new();
        let connector = MemoryConnector::new(store.clone());

        let handle = connector.connect().await.unwrap();
        handle.insert_record(&record("m1")).await.unwrap();

        assert_eq!(store.record_count(), 1);
    }
}
