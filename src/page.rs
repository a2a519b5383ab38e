//! `PrioritizedPageCursor`: one page decoder tagged with the version key
//! and seq/unseq provenance it needs to participate in the priority merge.

use crate::direction::Direction;
use crate::error::Result;
use crate::external::PageDecoder;
use crate::model::{Batch, Statistics, ValueFilter, VersionKey};

/// Wraps one `PageDecoder` with the metadata the pipeline and merge reader
/// need without re-deriving it from the chunk every time. `emit` is
/// single-use: once a page has produced its batch it is discarded.
#[derive(Debug)]
pub struct PrioritizedPageCursor {
    decoder: Box<dyn PageDecoder>,
    version: VersionKey,
    is_seq: bool,
    statistics: Statistics,
}

impl PrioritizedPageCursor {
    pub fn new(decoder: Box<dyn PageDecoder>, version: VersionKey, is_seq: bool) -> Self {
        let statistics = decoder.statistics();
        Self {
            decoder,
            version,
            is_seq,
            statistics,
        }
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn version(&self) -> VersionKey {
        self.version
    }

    pub fn is_seq(&self) -> bool {
        self.is_seq
    }

    pub fn is_modified(&self) -> bool {
        self.decoder.is_modified()
    }

    /// Fully realize the page, honoring `direction` and an optional
    /// pushed-down value filter.
    pub fn emit(mut self, direction: Direction, filter: ValueFilter) -> Result<Batch> {
        self.decoder.set_filter(filter);
        self.decoder.all_satisfied_data(direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataType;
    use crate::testutil::FakePage;

    #[test]
    fn emit_is_single_use_and_honors_direction() {
        let decoder = FakePage::new(vec![(1, 10), (2, 20), (3, 30)], DataType::I64);
        let cursor = PrioritizedPageCursor::new(Box::new(decoder), VersionKey::new(1, 0), true);
        assert_eq!(cursor.statistics().start_time, 1);
        assert_eq!(cursor.statistics().end_time, 3);

        let batch = cursor.emit(Direction::Asc, ValueFilter::None).unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.is_monotone());
    }
}
