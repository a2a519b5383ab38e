//! Chunk tier: `hasNextChunk` / `isChunkOverlapped`.

use super::OverlapPipeline;
use crate::error::{Error, Result};
use crate::external::{FileResource, MetadataSource};

impl<R: FileResource, S: MetadataSource<R>> OverlapPipeline<R, S> {
    pub fn has_next_chunk(&mut self) -> Result<bool> {
        self.cancel.check()?;
        if !self.page_buffers_empty() {
            return Err(Error::ProtocolMisuse("hasNextChunk called with residual page data"));
        }
        if self.first_chunk.is_some() {
            return Ok(true);
        }

        if self.first_file.is_some() {
            // Initial descent from the file tier: firstFile's own trailing
            // frontier trivially overlaps itself, so the metadata→chunks
            // cascade explodes it along with anything else that overlaps.
            let frontier = self.direction.overlap_check_time(&self.first_file.as_ref().expect("checked Some above").statistics);
            self.cascade_files_to_metadata(frontier)?;
            self.cascade_metadata_to_chunks(frontier)?;
            self.first_chunk = self.pop_chunk_pool_front();
        } else if let Some(chunk) = self.pop_chunk_pool_front() {
            self.first_chunk = Some(chunk);
            let frontier = self.direction.overlap_check_time(&self.first_chunk.as_ref().expect("just set").statistics);
            self.cascade_files_to_metadata(frontier)?;
            self.cascade_metadata_to_chunks(frontier)?;
        }

        Ok(self.first_chunk.is_some())
    }

    pub fn is_chunk_overlapped(&self) -> bool {
        let Some(first) = &self.first_chunk else { return false };
        self.chunk_pool
            .peek()
            .is_some_and(|o| self.direction.is_overlapped(&first.statistics, &o.value.statistics))
    }
}
