//! `LazyFileCursor`: lazy materialization of per-series metadata from the
//! sequential and unsequential file populations.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use crate::direction::Direction;
use crate::error::Result;
use crate::external::{FileResource, MetadataSource, SeriesMetadata};
use crate::model::{QueryContext, SeriesId, TimeFilter};

/// An unseq file candidate ordered by `orderTime`, smallest first
/// regardless of `Direction` — the cursor re-derives direction-aware
/// consumption when popping, the heap itself just needs a stable total
/// order over `order_time`.
struct UnseqCandidate<R> {
    order_time: i64,
    file: R,
}

impl<R> PartialEq for UnseqCandidate<R> {
    fn eq(&self, other: &Self) -> bool {
        self.order_time == other.order_time
    }
}
impl<R> Eq for UnseqCandidate<R> {}
impl<R> PartialOrd for UnseqCandidate<R> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<R> Ord for UnseqCandidate<R> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order_time.cmp(&other.order_time)
    }
}

/// Holds the two file lists for one series read. Sequential files are
/// consumed from the direction-appropriate end of a deque; unsequential
/// files are a min-heap on `orderTime` (wrapped in `Reverse` so the
/// smallest `order_time` is always the candidate, independent of
/// direction — `Direction::order_time` already encodes which timestamp
/// that is).
pub struct LazyFileCursor<R> {
    direction: Direction,
    seq_files: VecDeque<R>,
    unseq_files: BinaryHeap<Reverse<UnseqCandidate<R>>>,
}

impl<R: FileResource> LazyFileCursor<R> {
    pub fn new(direction: Direction, seq_files: impl IntoIterator<Item = R>, unseq_files: impl IntoIterator<Item = R>, series: &SeriesId) -> Self {
        let mut seq_files: VecDeque<R> = seq_files.into_iter().collect();
        // Sequential files arrive already globally ordered; under DESC the
        // consuming end is the back, so no reordering is needed here —
        // `Direction::pop_seq`/`peek_seq` pick the correct end.
        let mut heap = BinaryHeap::new();
        for file in unseq_files {
            if let Some((start, end)) = file.series_time_range(series) {
                let stats = crate::model::Statistics::new(start, end, 0);
                let order_time = direction.order_time(&stats);
                heap.push(Reverse(UnseqCandidate { order_time, file }));
            }
        }
        // Seq files with no data for this series are dropped up front too.
        seq_files.retain(|f| f.series_time_range(series).is_some());
        Self {
            direction,
            seq_files,
            unseq_files: heap,
        }
    }

    pub fn peek_front_seq(&self) -> Option<&R> {
        self.direction.peek_seq(&self.seq_files)
    }

    pub fn peek_front_unseq(&self) -> Option<&R> {
        self.unseq_files.peek().map(|Reverse(c)| &c.file)
    }

    pub fn is_empty(&self) -> bool {
        self.seq_files.is_empty() && self.unseq_files.is_empty()
    }

    /// Pop and load the front file's per-series metadata. If the series is
    /// absent from the file (should not normally happen, since candidates
    /// without data were filtered at construction, but a file's content
    /// may have been pruned since), the file is dropped silently and
    /// `Ok(None)` is returned so the caller retries.
    pub fn load_front<S: MetadataSource<R>>(
        &mut self,
        is_seq: bool,
        source: &S,
        series: &SeriesId,
        ctx: &QueryContext,
        any_filter: Option<&TimeFilter>,
        all_siblings: &[SeriesId],
    ) -> Result<Option<SeriesMetadata>> {
        let file = if is_seq {
            self.direction.pop_seq(&mut self.seq_files)
        } else {
            self.unseq_files.pop().map(|Reverse(c)| c.file)
        };
        let Some(file) = file else { return Ok(None) };

        let loaded = source.load_series_metadata(&file, series, ctx, any_filter, all_siblings)?;
        Ok(loaded.map(|mut meta| {
            meta.is_seq = is_seq;
            if !is_seq {
                // Unseq data is conservatively treated as potentially
                // mutated, forcing point-level merging downstream even
                // with no actual deletion (spec's own design note).
                meta.modified = true;
            }
            meta
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeStore, StructuredFile};

    #[test]
    fn drops_files_with_no_data_for_series() {
        let series = SeriesId::from("s1");
        let with_data = StructuredFile::new(1, true).with_chunk("s1", vec![vec![(1, 1)]]);
        let without_data = StructuredFile::new(2, true);
        let cursor = LazyFileCursor::new(Direction::Asc, vec![with_data, without_data], vec![], &series);
        assert_eq!(cursor.seq_files.len(), 1);
    }

    #[test]
    fn unseq_is_ordered_by_order_time() {
        let series = SeriesId::from("s1");
        let a = StructuredFile::new(1, false).with_chunk("s1", vec![vec![(10, 1)]]);
        let b = StructuredFile::new(2, false).with_chunk("s1", vec![vec![(5, 1)]]);
        let mut cursor = LazyFileCursor::new(Direction::Asc, vec![], vec![a, b], &series);
        assert_eq!(cursor.peek_front_unseq().unwrap().file_version(), 2);

        let store = FakeStore::new(series.clone(), crate::model::DataType::I64, vec![]);
        let ctx = QueryContext::new(1);
        let meta = cursor
            .load_front(false, &store, &series, &ctx, None, &[])
            .unwrap()
            .unwrap();
        assert!(meta.modified);
        assert_eq!(meta.file_version, 2);
    }
}
