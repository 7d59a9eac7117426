//! Content deduplication for normalized bodies.
//!
//! The deduplicator is the only state shared by every pipeline worker, so
//! the check-and-insert is a single critical section: two workers racing on
//! the same fingerprint can never both pass.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

/// A fixed-size digest of normalized body text, used as the dedup key.
///
/// Equal normalized text always produces an equal fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hex representation of the digest.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calculate the SHA-256 fingerprint of normalized text.
pub fn fingerprint(text: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    Fingerprint(format!("{:x}", hasher.finalize()))
}

/// Result of a deduplication check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// First time this content was seen; emit it.
    Fresh,
    /// Content already claimed by an earlier record; do not emit.
    Duplicate {
        /// Id of the record that first produced this fingerprint.
        first_seen: String,
    },
}

impl DedupDecision {
    /// True when the caller should forward the item downstream.
    pub fn is_fresh(&self) -> bool {
        matches!(self, DedupDecision::Fresh)
    }
}

/// Tracks fingerprints already emitted and decides accept/reject.
///
/// Explicitly constructed and passed to the pipeline; there is no
/// process-wide dedup state. Safe to share across workers behind an `Arc`.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: Mutex<HashMap<Fingerprint, String>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check-and-record the fingerprint of `normalized`.
    ///
    /// Returns [`DedupDecision::Fresh`] exactly once per distinct
    /// fingerprint, no matter how many workers call concurrently; every
    /// later call gets the id of the record that was first.
    pub fn accept(&self, normalized: &str, source_id: &str) -> DedupDecision {
        let fp = fingerprint(normalized);
        let mut seen = self.seen.lock().unwrap();
        match seen.entry(fp) {
            std::collections::hash_map::Entry::Occupied(e) => DedupDecision::Duplicate {
                first_seen: e.get().clone(),
            },
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(source_id.to_string());
                DedupDecision::Fresh
            }
        }
    }

    /// Number of distinct fingerprints recorded so far.
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_equal_text_equal_fingerprint() {
        assert_eq!(fingerprint("hello world"), fingerprint("hello world"));
        assert_ne!(fingerprint("hello world"), fingerprint("hello worlds"));
    }

    #[test]
    fn test_first_accept_is_fresh_rest_are_duplicates() {
        let dedup = Deduplicator::new();
        assert_eq!(dedup.accept("same text", "msg-1"), DedupDecision::Fresh);
        assert_eq!(
            dedup.accept("same text", "msg-2"),
            DedupDecision::Duplicate { first_seen: "msg-1".into() }
        );
        assert_eq!(
            dedup.accept("same text", "msg-3"),
            DedupDecision::Duplicate { first_seen: "msg-1".into() }
        );
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_distinct_texts_all_fresh() {
        let dedup = Deduplicator::new();
        assert!(dedup.accept("one", "a").is_fresh());
        assert!(dedup.accept("two", "b").is_fresh());
        assert_eq!(dedup.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_exactly_one_winner_under_contention() {
        let dedup = Arc::new(Deduplicator::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let dedup = Arc::clone(&dedup);
            handles.push(tokio::spawn(async move {
                dedup.accept("contended body", &format!("msg-{i}")).is_fresh()
            }));
        }

        let mut fresh = 0;
        for handle in handles {
            if handle.await.unwrap() {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
        assert_eq!(dedup.len(), 1);
    }
}
