//! Raw archiving: copy a mailbox into the store without processing.
//!
//! This is the ingestion counterpart of the extraction pipeline: it keeps
//! headers and body exactly as read, so later store-driven runs can
//! normalize and tokenize them. Sequential by design; the heavy lifting
//! lives in the pipeline, not here.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::Result;
use crate::traits::source::RecordSource;
use crate::traits::store::StoreConnector;

/// Counters for one archive run.
#[derive(Debug, Default)]
pub struct ArchiveSummary {
    /// Records written to the store
    pub archived: usize,
    /// Records the store rejected
    pub failures: usize,
    /// Source iteration errors (the run stopped early)
    pub source_errors: usize,
}

impl ArchiveSummary {
    pub fn is_clean(&self) -> bool {
        self.failures == 0 && self.source_errors == 0
    }
}

/// Copy every record from `source` into the store as-is.
///
/// Per-record insert failures are logged with the record id and counted;
/// the run continues to the end of the source.
pub async fn archive<S: RecordSource>(
    mut source: S,
    connector: Arc<dyn StoreConnector>,
) -> Result<ArchiveSummary> {
    let store = connector.connect().await?;
    let mut summary = ArchiveSummary::default();

    loop {
        match source.next_record() {
            Ok(Some(record)) => match store.insert_record(&record).await {
                Ok(_) => summary.archived += 1,
                Err(e) => {
                    warn!(id = %record.id, "failed to archive record: {e}");
                    summary.failures += 1;
                }
            },
            Ok(None) => break,
            Err(e) => {
                error!("source failed after {} records: {e}", summary.archived);
                summary.source_errors += 1;
                break;
            }
        }
    }

    info!(
        archived = summary.archived,
        failures = summary.failures,
        "archive complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::{MemoryConnector, MemoryStore};
    use crate::traits::store::MailStore;
    use crate::traits::source::VecSource;
    use crate::types::{record::Headers, MailRecord};

    #[tokio::test]
    async fn test_archive_copies_everything() {
        let store = MemoryStore::new();
        let source = VecSource::new(vec![
            MailRecord::new("m1", Headers::new(), "one"),
            MailRecord::new("m2", Headers::new(), "two"),
        ]);

        let summary = archive(source, Arc::new(MemoryConnector::new(store.clone())))
            .await
            .unwrap();

        assert_eq!(summary.archived, 2);
        assert!(summary.is_clean());
        assert_eq!(store.record_count(), 2);
        assert_eq!(store.all_ids().await.unwrap(), vec!["m1", "m2"]);
    }
}
