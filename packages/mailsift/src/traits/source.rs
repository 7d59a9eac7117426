//! Source seam: anything that can yield an ordered stream of mail records.

use crate::error::SourceResult;
use crate::types::MailRecord;

/// A lazy, finite, forward-only source of records.
///
/// The pipeline coordinator pulls records one at a time during dispatch;
/// `Ok(None)` marks exhaustion and is the normal termination trigger, not
/// an error. Sources are consumed by a single caller; there is no rewind.
pub trait RecordSource: Send {
    /// Pull the next record, or `None` when the source is exhausted.
    fn next_record(&mut self) -> SourceResult<Option<MailRecord>>;
}

/// A pre-loaded in-memory source, mostly useful in tests and small tools.
#[derive(Debug, Default)]
pub struct VecSource {
    records: std::collections::VecDeque<MailRecord>,
}

impl VecSource {
    pub fn new(records: impl IntoIterator<Item = MailRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }
}

impl RecordSource for VecSource {
    fn next_record(&mut self) -> SourceResult<Option<MailRecord>> {
        Ok(self.records.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::Headers;

    #[test]
    fn test_vec_source_preserves_order_and_exhausts() {
        let mut source = VecSource::new(vec![
            MailRecord::new("a", Headers::new(), ""),
            MailRecord::new("b", Headers::new(), ""),
        ]);
        assert_eq!(source.next_record().unwrap().unwrap().id, "a");
        assert_eq!(source.next_record().unwrap().unwrap().id, "b");
        assert!(source.next_record().unwrap().is_none());
        assert!(source.next_record().unwrap().is_none());
    }
}
