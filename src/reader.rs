//! `SeriesReader`: the construction/configuration facade the distilled
//! spec describes only implicitly (it names `OverlapPipeline`'s stateful
//! surface but never the object a caller actually owns).
//!
//! Pure composition over `OverlapPipeline` — no new invariants here, just
//! bundling the construction inputs and driving `hasNextPage`/`nextPage`
//! to completion for callers that just want batches.

use crate::cancel::CancelToken;
use crate::direction::Direction;
use crate::error::Result;
use crate::external::{FileResource, MetadataSource};
use crate::model::{Batch, DataType, QueryContext, SeriesId, Statistics, TimeFilter, ValueFilter};
use crate::pipeline::{OverlapPipeline, PipelineConfig};
use crate::telemetry::Telemetry;

/// The full "Configuration inputs at construction" list: series identity,
/// sibling set (so one metadata load can populate many series on the same
/// device), declared type, query context, the two file populations, the
/// time filter pushed down everywhere, the value filter pushed down only
/// to non-overlapped pages, and direction.
pub struct ReaderConfig<R> {
    pub series_path: SeriesId,
    pub all_siblings: Vec<SeriesId>,
    pub data_type: DataType,
    pub query_context: QueryContext,
    pub seq_files: Vec<R>,
    pub unseq_files: Vec<R>,
    pub time_filter: TimeFilter,
    pub value_filter: ValueFilter,
    pub direction: Direction,
    pub cancel: CancelToken,
}

/// Owns one `OverlapPipeline` and drives it to produce whole batches. The
/// tier-inspection methods are re-exposed unchanged for callers that want
/// to answer aggregation queries from statistics alone.
pub struct SeriesReader<R, S> {
    pipeline: OverlapPipeline<R, S>,
}

impl<R: FileResource, S: MetadataSource<R>> SeriesReader<R, S> {
    pub fn new(config: ReaderConfig<R>, source: S) -> Self {
        let telemetry = Telemetry::new(config.query_context.query_id);
        let pipeline = OverlapPipeline::new(PipelineConfig {
            direction: config.direction,
            data_type: config.data_type,
            source,
            seq_files: config.seq_files,
            unseq_files: config.unseq_files,
            series: config.series_path,
            query_context: config.query_context,
            time_filter: config.time_filter,
            value_filter: config.value_filter,
            all_siblings: config.all_siblings,
            cancel: config.cancel,
            telemetry,
        });
        Self { pipeline }
    }

    /// True once every tier buffer and pool is drained. Referenced by
    /// spec §7's recovery discipline: a reader that has stopped producing
    /// data must satisfy this.
    pub fn is_empty(&mut self) -> bool {
        self.pipeline.is_empty()
    }

    // --- Tier iteration, re-exposed unchanged ---

    pub fn has_next_file(&mut self) -> Result<bool> {
        self.pipeline.has_next_file()
    }

    pub fn current_file_statistics(&self) -> Option<&Statistics> {
        self.pipeline.current_file_statistics()
    }

    pub fn current_file_modified(&self) -> Option<bool> {
        self.pipeline.current_file_modified()
    }

    pub fn is_file_overlapped(&self) -> bool {
        self.pipeline.is_file_overlapped()
    }

    pub fn skip_current_file(&mut self) {
        self.pipeline.skip_current_file()
    }

    pub fn has_next_chunk(&mut self) -> Result<bool> {
        self.pipeline.has_next_chunk()
    }

    pub fn current_chunk_statistics(&self) -> Option<&Statistics> {
        self.pipeline.current_chunk_statistics()
    }

    pub fn current_chunk_modified(&self) -> Option<bool> {
        self.pipeline.current_chunk_modified()
    }

    pub fn is_chunk_overlapped(&self) -> bool {
        self.pipeline.is_chunk_overlapped()
    }

    pub fn skip_current_chunk(&mut self) {
        self.pipeline.skip_current_chunk()
    }

    pub fn has_next_page(&mut self) -> Result<bool> {
        self.pipeline.has_next_page()
    }

    pub fn current_page_statistics(&self) -> Option<&Statistics> {
        self.pipeline.current_page_statistics()
    }

    pub fn current_page_modified(&self) -> Option<bool> {
        self.pipeline.current_page_modified()
    }

    pub fn is_page_overlapped(&mut self) -> Result<bool> {
        self.pipeline.is_page_overlapped()
    }

    pub fn skip_current_page(&mut self) {
        self.pipeline.skip_current_page()
    }

    pub fn next_page(&mut self) -> Result<Batch> {
        self.pipeline.next_page()
    }

    /// Drive the file/chunk/page tiers down to the next ready batch,
    /// cascading through whichever tiers are currently empty. Returns
    /// `None` once the reader is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Batch>> {
        loop {
            if self.pipeline.has_next_page()? {
                return Ok(Some(self.pipeline.next_page()?));
            }
            if !self.pipeline.has_next_chunk()? {
                if !self.pipeline.has_next_file()? {
                    return Ok(None);
                }
                continue;
            }
        }
    }
}
