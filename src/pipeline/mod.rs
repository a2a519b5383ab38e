//! `OverlapPipeline`: the four-level driver that advances the file, chunk,
//! and page tiers on demand and cascades overlap unpacking between them.
//!
//! The tier API (`has_next_*`, `current_*_statistics`, `skip_current_*`,
//! `is_*_overlapped`, `next_page`) lives here; the mechanics behind each
//! tier are split into sibling modules the way the cascade itself is
//! layered: `cascade` (the three reentrant unpacking rules shared by every
//! tier), `file_tier`, `chunk_tier`, `page_tier`, and `overlap_batch` (the
//! priority-merge-driven batch construction at the bottom of the stack).

mod cascade;
mod chunk_tier;
mod file_tier;
mod overlap_batch;
mod page_tier;

use std::collections::{BinaryHeap, VecDeque};

use crate::cancel::CancelToken;
use crate::direction::{Direction, DirectedEntry};
use crate::error::Result;
use crate::external::{ChunkMetadata, FileResource, MetadataSource, SeriesMetadata};
use crate::file_cursor::LazyFileCursor;
use crate::merge::PriorityMergeReader;
use crate::model::{Batch, DataType, QueryContext, SeriesId, Statistics, TimeFilter, ValueFilter};
use crate::page::PrioritizedPageCursor;
use crate::telemetry::Telemetry;

type PageIter = std::vec::IntoIter<crate::model::TimeValuePair>;

/// Everything the pipeline needs at construction. Mirrors the
/// configuration surface a `SeriesReader` accepts, minus `direction` and
/// `data_type`, which are threaded in separately since `OverlapPipeline`
/// also needs them for tier bookkeeping independent of batch assembly.
pub struct PipelineConfig<R, S> {
    pub direction: Direction,
    pub data_type: DataType,
    pub source: S,
    pub seq_files: Vec<R>,
    pub unseq_files: Vec<R>,
    pub series: SeriesId,
    pub query_context: QueryContext,
    pub time_filter: TimeFilter,
    pub value_filter: ValueFilter,
    pub all_siblings: Vec<SeriesId>,
    pub cancel: CancelToken,
    pub telemetry: Telemetry,
}

pub struct OverlapPipeline<R, S> {
    direction: Direction,
    data_type: DataType,
    source: S,
    cursor: LazyFileCursor<R>,
    series: SeriesId,
    query_context: QueryContext,
    time_filter: TimeFilter,
    value_filter: ValueFilter,
    all_siblings: Vec<SeriesId>,
    cancel: CancelToken,
    telemetry: Telemetry,

    // File tier.
    first_file: Option<SeriesMetadata>,
    seq_meta: VecDeque<SeriesMetadata>,
    unseq_meta: BinaryHeap<DirectedEntry<SeriesMetadata>>,

    // Chunk tier.
    first_chunk: Option<ChunkMetadata>,
    chunk_pool: BinaryHeap<DirectedEntry<ChunkMetadata>>,

    // Page tier.
    first_page: Option<PrioritizedPageCursor>,
    seq_pages: VecDeque<PrioritizedPageCursor>,
    unseq_pages: BinaryHeap<DirectedEntry<PrioritizedPageCursor>>,
    merge_reader: PriorityMergeReader<PageIter>,
    cached_batch: Option<Batch>,
}

impl<R: FileResource, S: MetadataSource<R>> OverlapPipeline<R, S> {
    pub fn new(config: PipelineConfig<R, S>) -> Self {
        let cursor = LazyFileCursor::new(config.direction, config.seq_files, config.unseq_files, &config.series);
        Self {
            direction: config.direction,
            data_type: config.data_type,
            source: config.source,
            cursor,
            series: config.series,
            query_context: config.query_context,
            time_filter: config.time_filter,
            value_filter: config.value_filter,
            all_siblings: config.all_siblings,
            cancel: config.cancel,
            telemetry: config.telemetry,
            first_file: None,
            seq_meta: VecDeque::new(),
            unseq_meta: BinaryHeap::new(),
            first_chunk: None,
            chunk_pool: BinaryHeap::new(),
            first_page: None,
            seq_pages: VecDeque::new(),
            unseq_pages: BinaryHeap::new(),
            merge_reader: PriorityMergeReader::new(config.direction),
            cached_batch: None,
        }
    }

    pub fn is_empty(&mut self) -> bool {
        self.first_file.is_none()
            && self.seq_meta.is_empty()
            && self.unseq_meta.is_empty()
            && self.cursor.is_empty()
            && self.first_chunk.is_none()
            && self.chunk_pool.is_empty()
            && self.page_buffers_empty()
    }

    // --- Tier-agnostic statistics/skip accessors ---

    pub fn current_file_statistics(&self) -> Option<&Statistics> {
        self.first_file.as_ref().map(|m| &m.statistics)
    }

    pub fn current_file_modified(&self) -> Option<bool> {
        self.first_file.as_ref().map(|m| m.modified)
    }

    pub fn skip_current_file(&mut self) {
        self.first_file = None;
    }

    pub fn current_chunk_statistics(&self) -> Option<&Statistics> {
        self.first_chunk.as_ref().map(|c| &c.statistics)
    }

    pub fn current_chunk_modified(&self) -> Option<bool> {
        self.first_chunk.as_ref().map(|c| c.modified)
    }

    pub fn skip_current_chunk(&mut self) {
        self.first_chunk = None;
    }

    pub fn current_page_statistics(&self) -> Option<&Statistics> {
        self.first_page.as_ref().map(|p| p.statistics())
    }

    pub fn current_page_modified(&self) -> Option<bool> {
        self.first_page.as_ref().map(|p| p.is_modified())
    }

    pub fn skip_current_page(&mut self) {
        self.first_page = None;
    }

    // --- Shared small helpers used by the tier submodules ---

    fn page_buffers_empty(&mut self) -> bool {
        self.first_page.is_none()
            && self.seq_pages.is_empty()
            && self.unseq_pages.is_empty()
            && self.cached_batch.is_none()
            && self.merge_reader.is_empty()
    }

    fn chunk_tier_and_below_empty(&mut self) -> bool {
        self.first_chunk.is_none() && self.chunk_pool.is_empty() && self.page_buffers_empty()
    }

    fn peek_unseq_meta(&self) -> Option<&SeriesMetadata> {
        self.unseq_meta.peek().map(|e| &e.value)
    }

    fn push_unseq_meta(&mut self, meta: SeriesMetadata) {
        let key = self.direction.order_time(&meta.statistics);
        self.unseq_meta.push(DirectedEntry::new(key, self.direction, meta));
    }

    fn pop_chunk_pool_front(&mut self) -> Option<ChunkMetadata> {
        self.chunk_pool.pop().map(|e| e.value)
    }

    fn peek_seq_page_front(&self) -> Option<&PrioritizedPageCursor> {
        self.direction.peek_seq(&self.seq_pages)
    }

    fn pop_seq_page_front(&mut self) -> Option<PrioritizedPageCursor> {
        self.direction.pop_seq(&mut self.seq_pages)
    }

    fn peek_unseq_page_front(&self) -> Option<&PrioritizedPageCursor> {
        self.unseq_pages.peek().map(|e| &e.value)
    }

    fn pop_unseq_page_front(&mut self) -> Option<PrioritizedPageCursor> {
        self.unseq_pages.pop().map(|e| e.value)
    }

    fn push_unseq_page(&mut self, page: PrioritizedPageCursor) {
        let key = self.direction.order_time(page.statistics());
        self.unseq_pages.push(DirectedEntry::new(key, self.direction, page));
    }

    fn select_first_page(&mut self) -> Option<PrioritizedPageCursor> {
        match (self.peek_seq_page_front(), self.peek_unseq_page_front()) {
            (Some(seq), Some(unseq)) => {
                if self.direction.prefer_seq(seq.statistics(), unseq.statistics()) {
                    self.pop_seq_page_front()
                } else {
                    self.pop_unseq_page_front()
                }
            }
            (Some(_), None) => self.pop_seq_page_front(),
            (None, Some(_)) => self.pop_unseq_page_front(),
            (None, None) => None,
        }
    }

    /// Fully realize a page and feed it into the merge reader, keyed by
    /// its version and trailing frontier. Used whenever a page cursor
    /// becomes a participant in overlap resolution rather than being
    /// emitted directly via `next_page`.
    fn push_page_into_merge(&mut self, page: PrioritizedPageCursor) -> Result<()> {
        let version = page.version();
        let end_frontier = self.direction.overlap_check_time(page.statistics());
        let batch = page.emit(self.direction, ValueFilter::None)?;
        self.merge_reader.add_reader(batch.into_points().into_iter(), version, end_frontier);
        Ok(())
    }

    fn push_overlapping_unseq_into_merge(&mut self, boundary: i64) -> Result<()> {
        loop {
            let overlaps = match self.peek_unseq_page_front() {
                Some(p) => self.direction.is_overlapped_time(boundary, p.statistics()),
                None => false,
            };
            if !overlaps {
                return Ok(());
            }
            let page = self.pop_unseq_page_front().expect("checked Some above");
            self.push_page_into_merge(page)?;
        }
    }
}
