//! Page tier: `hasNextPage` / `isPageOverlapped` / `nextPage`.
//!
//! This is where the pipeline meets the `PriorityMergeReader`: a page
//! found to overlap its neighbors is never emitted directly, it is
//! realized and fed into the merger, and `hasNextPage` instead surfaces
//! whatever the merger's overlap-batch construction (`overlap_batch.rs`)
//! produces.

use super::OverlapPipeline;
use crate::error::{Error, Result};
use crate::external::{FileResource, MetadataSource};
use crate::model::Batch;

impl<R: FileResource, S: MetadataSource<R>> OverlapPipeline<R, S> {
    pub fn has_next_page(&mut self) -> Result<bool> {
        self.cancel.check()?;
        if self.cached_batch.is_some() {
            return Ok(true);
        }

        if !self.merge_reader.is_empty() {
            if let Some(batch) = self.drain_overlap_batch()? {
                if !batch.is_empty() {
                    self.cached_batch = Some(batch);
                    return Ok(true);
                }
            }
        }

        if self.first_page.is_some() {
            return Ok(true);
        }

        loop {
            if self.first_page.is_none() {
                if self.first_chunk.is_some() {
                    let frontier = self.direction.overlap_check_time(&self.first_chunk.as_ref().expect("checked Some above").statistics);
                    self.cascade_chunks_to_pages(frontier)?;
                    self.first_page = self.select_first_page();
                } else if let Some(page) = self.select_first_page() {
                    self.first_page = Some(page);
                    let frontier = self.direction.overlap_check_time(self.first_page.as_ref().expect("just set").statistics());
                    self.cascade_files_to_metadata(frontier)?;
                    self.cascade_metadata_to_chunks(frontier)?;
                    self.cascade_chunks_to_pages(frontier)?;
                } else {
                    return Ok(false);
                }
            }

            if self.first_page.is_none() {
                // The cascade from firstChunk produced no page candidate
                // and the pools are still empty: nothing left to read.
                return Ok(false);
            }

            if self.first_page_overlapped() {
                self.seed_overlap_batch()?;
                if let Some(batch) = self.drain_overlap_batch()? {
                    if !batch.is_empty() {
                        self.cached_batch = Some(batch);
                        return Ok(true);
                    }
                }
                if self.first_page.is_some() {
                    // Construction made no progress with firstPage still
                    // pending: emit it directly rather than spin.
                    return Ok(true);
                }
                if self.pools_and_chunk_tier_empty() {
                    return Ok(false);
                }
                continue;
            }

            return Ok(true);
        }
    }

    fn pools_and_chunk_tier_empty(&self) -> bool {
        self.seq_pages.is_empty() && self.unseq_pages.is_empty() && self.first_chunk.is_none() && self.chunk_pool.is_empty()
    }

    pub fn is_page_overlapped(&mut self) -> Result<bool> {
        if self.cached_batch.is_some() {
            return Ok(true);
        }
        let Some(stats) = self.first_page.as_ref().map(|p| p.statistics().clone()) else {
            return Ok(false);
        };
        if let Some(pending) = self.merge_reader.current_time_value_pair() {
            if self.direction.is_overlapped_time(pending.timestamp, &stats) {
                return Err(Error::ProtocolMisuse("merge reader holds unconsumed data inside firstPage's range"));
            }
        }
        Ok(self.peek_unseq_page_front().is_some_and(|p| self.direction.is_overlapped(&stats, p.statistics())))
    }

    pub fn next_page(&mut self) -> Result<Batch> {
        self.cancel.check()?;
        if let Some(batch) = self.cached_batch.take() {
            return Ok(batch);
        }
        let Some(page) = self.first_page.take() else {
            return Err(Error::ProtocolMisuse("nextPage called with no ready batch"));
        };
        let filter = self.value_filter.clone();
        let batch = page.emit(self.direction, filter)?;
        self.telemetry.record_points(batch.len() as u64);
        Ok(batch)
    }

    /// True if `firstPage` overlaps the next seq page, the next unseq
    /// page, or the merge reader's current head. The merge-reader branch
    /// intentionally compares against `start_time` with a plain `>`
    /// rather than `Direction::excess` — replicated as specified even
    /// though it is not symmetric across directions.
    pub(super) fn first_page_overlapped(&mut self) -> bool {
        let Some(stats) = self.first_page.as_ref().map(|p| p.statistics().clone()) else {
            return false;
        };
        let seq_overlap = self.peek_seq_page_front().is_some_and(|p| self.direction.is_overlapped(&stats, p.statistics()));
        let unseq_overlap = self.peek_unseq_page_front().is_some_and(|p| self.direction.is_overlapped(&stats, p.statistics()));
        let merge_overlap = self.merge_reader.current_time_value_pair().is_some_and(|p| p.timestamp > stats.start_time);
        seq_overlap || unseq_overlap || merge_overlap
    }
}
