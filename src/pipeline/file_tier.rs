//! File tier: `hasNextFile` / `isFileOverlapped`.

use super::OverlapPipeline;
use crate::error::{Error, Result};
use crate::external::{FileResource, MetadataSource};

impl<R: FileResource, S: MetadataSource<R>> OverlapPipeline<R, S> {
    pub fn has_next_file(&mut self) -> Result<bool> {
        self.cancel.check()?;
        if !self.chunk_tier_and_below_empty() {
            return Err(Error::ProtocolMisuse("hasNextFile called with residual chunk/page data"));
        }
        if self.first_file.is_some() {
            return Ok(true);
        }

        self.fill_file_candidates()?;

        let frontier = match (self.direction.peek_seq(&self.seq_meta), self.peek_unseq_meta()) {
            (Some(seq), Some(unseq)) => self.direction.frontier_of_two(&seq.statistics, &unseq.statistics),
            (Some(seq), None) => self.direction.overlap_check_time(&seq.statistics),
            (None, Some(unseq)) => self.direction.overlap_check_time(&unseq.statistics),
            (None, None) => return Ok(false),
        };

        self.cascade_files_to_metadata(frontier)?;
        self.select_first_file();
        Ok(self.first_file.is_some())
    }

    pub fn is_file_overlapped(&self) -> bool {
        let Some(first) = &self.first_file else { return false };
        let seq_overlap = self
            .direction
            .peek_seq(&self.seq_meta)
            .is_some_and(|o| self.direction.is_overlapped(&first.statistics, &o.statistics));
        let unseq_overlap = self
            .peek_unseq_meta()
            .is_some_and(|o| self.direction.is_overlapped(&first.statistics, &o.statistics));
        seq_overlap || unseq_overlap
    }

    pub(super) fn select_first_file(&mut self) {
        let pick_seq = match (self.direction.peek_seq(&self.seq_meta), self.peek_unseq_meta()) {
            (Some(seq), Some(unseq)) => self.direction.prefer_seq(&seq.statistics, &unseq.statistics),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return,
        };
        self.first_file = if pick_seq {
            self.direction.pop_seq(&mut self.seq_meta)
        } else {
            self.unseq_meta.pop().map(|e| e.value)
        };
    }
}
