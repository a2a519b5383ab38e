//! The three reentrant cascade rules (files → metadata → chunks → pages)
//! applied, in that fixed order, at a given frontier time. Downstream
//! overlap discovery (e.g. an unseq page found mid-merge) re-enters these
//! same functions at a new frontier, so none of them assume they are only
//! ever called once per tier transition.

use super::OverlapPipeline;
use crate::direction::DirectedEntry;
use crate::error::Result;
use crate::external::{FileResource, MetadataSource, SeriesMetadata};
use crate::page::PrioritizedPageCursor;

impl<R: FileResource, S: MetadataSource<R>> OverlapPipeline<R, S> {
    /// Keep trying files from the unsequential list until one yields
    /// metadata for this series, or the list is exhausted.
    fn pull_one_unseq(&mut self) -> Result<Option<SeriesMetadata>> {
        loop {
            if self.cursor.peek_front_unseq().is_none() {
                return Ok(None);
            }
            if let Some(meta) = self.load_front(false)? {
                return Ok(Some(meta));
            }
        }
    }

    fn pull_one_seq(&mut self) -> Result<Option<SeriesMetadata>> {
        loop {
            if self.cursor.peek_front_seq().is_none() {
                return Ok(None);
            }
            if let Some(meta) = self.load_front(true)? {
                return Ok(Some(meta));
            }
        }
    }

    fn load_front(&mut self, is_seq: bool) -> Result<Option<SeriesMetadata>> {
        self.cursor.load_front(
            is_seq,
            &self.source,
            &self.series,
            &self.query_context,
            Some(&self.time_filter),
            &self.all_siblings,
        )
    }

    /// Pull one candidate into each of the seq/unseq metadata buffers if
    /// empty, without regard to overlap — used once, to seed the file
    /// tier before a frontier can even be computed.
    pub(super) fn fill_file_candidates(&mut self) -> Result<()> {
        if self.seq_meta.is_empty() {
            if let Some(meta) = self.pull_one_seq()? {
                self.direction.push_seq(&mut self.seq_meta, meta);
            }
        }
        if self.peek_unseq_meta().is_none() {
            if let Some(meta) = self.pull_one_unseq()? {
                self.push_unseq_meta(meta);
            }
        }
        Ok(())
    }

    /// files → metadata: pull every remaining file whose range intersects
    /// `frontier` into the corresponding metadata buffer.
    pub(super) fn cascade_files_to_metadata(&mut self, frontier: i64) -> Result<()> {
        let mut pulled_seq = 0u32;
        let mut pulled_unseq = 0u32;
        loop {
            let mut progressed = false;

            while let Some(file) = self.cursor.peek_front_unseq() {
                let Some((start, end)) = file.series_time_range(&self.series) else { break };
                let stats = crate::model::Statistics::new(start, end, 0);
                if !self.direction.is_overlapped_time(frontier, &stats) {
                    break;
                }
                match self.pull_one_unseq()? {
                    Some(meta) => {
                        self.push_unseq_meta(meta);
                        pulled_unseq += 1;
                        progressed = true;
                    }
                    None => break,
                }
            }

            while let Some(file) = self.cursor.peek_front_seq() {
                let Some((start, end)) = file.series_time_range(&self.series) else { break };
                let stats = crate::model::Statistics::new(start, end, 0);
                if !self.direction.is_overlapped_time(frontier, &stats) {
                    break;
                }
                match self.pull_one_seq()? {
                    Some(meta) => {
                        self.direction.push_seq(&mut self.seq_meta, meta);
                        pulled_seq += 1;
                        progressed = true;
                    }
                    None => break,
                }
            }

            if !progressed {
                if pulled_seq > 0 || pulled_unseq > 0 {
                    log::trace!(
                        "cascade files->metadata at frontier {}: pulled {} seq, {} unseq",
                        frontier,
                        pulled_seq,
                        pulled_unseq
                    );
                }
                return Ok(());
            }
        }
    }

    fn explode_metadata_to_chunks(&mut self, meta: SeriesMetadata) -> Result<usize> {
        let chunks = self.source.load_chunk_list(&meta)?;
        let count = chunks.len();
        for mut chunk in chunks {
            chunk.is_seq = meta.is_seq;
            let key = self.direction.order_time(&chunk.statistics);
            self.telemetry.record_chunk();
            self.chunk_pool.push(DirectedEntry::new(key, self.direction, chunk));
        }
        Ok(count)
    }

    /// metadata → chunks: explode every metadata entry (seq front, unseq
    /// head, and `firstFile` itself) that overlaps `frontier`.
    pub(super) fn cascade_metadata_to_chunks(&mut self, frontier: i64) -> Result<()> {
        let mut exploded_meta = 0u32;
        let mut chunks_found = 0usize;
        loop {
            let mut progressed = false;

            while let Some(meta) = self.direction.peek_seq(&self.seq_meta) {
                if !self.direction.is_overlapped_time(frontier, &meta.statistics) {
                    break;
                }
                let meta = self.direction.pop_seq(&mut self.seq_meta).expect("checked Some above");
                chunks_found += self.explode_metadata_to_chunks(meta)?;
                exploded_meta += 1;
                progressed = true;
            }

            while let Some(meta) = self.peek_unseq_meta() {
                if !self.direction.is_overlapped_time(frontier, &meta.statistics) {
                    break;
                }
                let meta = self.unseq_meta.pop().expect("checked Some above").value;
                chunks_found += self.explode_metadata_to_chunks(meta)?;
                exploded_meta += 1;
                progressed = true;
            }

            if let Some(overlaps) = self.first_file.as_ref().map(|f| self.direction.is_overlapped_time(frontier, &f.statistics)) {
                if overlaps {
                    let first = self.first_file.take().expect("checked Some above");
                    chunks_found += self.explode_metadata_to_chunks(first)?;
                    exploded_meta += 1;
                    progressed = true;
                }
            }

            if !progressed {
                if exploded_meta > 0 {
                    log::trace!(
                        "cascade metadata->chunks at frontier {}: exploded {} metadata entries into {} chunks",
                        frontier,
                        exploded_meta,
                        chunks_found
                    );
                }
                return Ok(());
            }
        }
    }

    /// Points are counted once they are actually emitted (`next_page`/
    /// `push_page_into_merge`), not here — a chunk can be unpacked into
    /// pages that are later skipped, and double-counting at both unpack
    /// and emit time would make `point_count()` neither "read" nor
    /// "emitted".
    fn explode_chunk_to_pages(&mut self, chunk: crate::external::ChunkMetadata) -> Result<usize> {
        let decoders = self.source.load_page_list(&chunk, &self.time_filter)?;
        let count = decoders.len();
        for decoder in decoders {
            let cursor = PrioritizedPageCursor::new(decoder, chunk.version, chunk.is_seq);
            if chunk.is_seq {
                self.direction.push_seq(&mut self.seq_pages, cursor);
            } else {
                self.push_unseq_page(cursor);
            }
        }
        Ok(count)
    }

    /// chunks → pages: explode every chunk pool entry and `firstChunk`
    /// itself that overlaps `frontier`.
    pub(super) fn cascade_chunks_to_pages(&mut self, frontier: i64) -> Result<()> {
        let mut exploded_chunks = 0u32;
        let mut pages_found = 0usize;
        loop {
            let mut progressed = false;

            while let Some(entry) = self.chunk_pool.peek() {
                if !self.direction.is_overlapped_time(frontier, &entry.value.statistics) {
                    break;
                }
                let chunk = self.chunk_pool.pop().expect("checked Some above").value;
                pages_found += self.explode_chunk_to_pages(chunk)?;
                exploded_chunks += 1;
                progressed = true;
            }

            if let Some(overlaps) = self.first_chunk.as_ref().map(|c| self.direction.is_overlapped_time(frontier, &c.statistics)) {
                if overlaps {
                    let first = self.first_chunk.take().expect("checked Some above");
                    pages_found += self.explode_chunk_to_pages(first)?;
                    exploded_chunks += 1;
                    progressed = true;
                }
            }

            if !progressed {
                if exploded_chunks > 0 {
                    log::trace!(
                        "cascade chunks->pages at frontier {}: exploded {} chunks into {} pages",
                        frontier,
                        exploded_chunks,
                        pages_found
                    );
                }
                return Ok(());
            }
        }
    }
}
