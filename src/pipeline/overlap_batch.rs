//! Overlap-batch construction: the procedure that drains the priority
//! merge reader into a `Batch`, cascading in new overlapping data as the
//! frontier advances and yielding control back to `firstPage`/the
//! sequential page list whenever they can no longer be deferred.

use super::OverlapPipeline;
use crate::assembler::BatchAssembler;
use crate::error::Result;
use crate::external::{FileResource, MetadataSource};
use crate::model::Batch;

impl<R: FileResource, S: MetadataSource<R>> OverlapPipeline<R, S> {
    /// Push everything currently known to overlap `firstPage` into the
    /// merge reader: the unsequential pages that overlap its trailing
    /// frontier, and `firstPage` itself if it is unseq and overlaps that
    /// same frontier. Called once, when overlap construction first picks
    /// up `firstPage`; later rounds re-enter via `drain_overlap_batch`
    /// alone, since cascading (step c) pushes newly discovered overlaps
    /// as it goes.
    pub(super) fn seed_overlap_batch(&mut self) -> Result<()> {
        let Some(boundary) = self.first_page.as_ref().map(|p| self.direction.overlap_check_time(p.statistics())) else {
            return Ok(());
        };
        self.push_overlapping_unseq_into_merge(boundary)?;
        if let Some(page) = &self.first_page {
            if !page.is_seq() && self.direction.is_overlapped_time(boundary, page.statistics()) {
                let page = self.first_page.take().expect("checked Some above");
                self.push_page_into_merge(page)?;
            }
        }
        Ok(())
    }

    /// Spec §4.5.5 step 2: drain the merge reader into a batch, cascading
    /// in new overlaps and folding `firstPage`/the seq page list into the
    /// merger as the frontier reaches them. Returns `None` only once the
    /// merger is fully exhausted with nothing ever produced; an `Ok(Some)`
    /// batch may still be empty if steps d/e had to bail before consuming
    /// anything, which the caller treats the same as "nothing ready yet".
    pub(super) fn drain_overlap_batch(&mut self) -> Result<Option<Batch>> {
        loop {
            let mut assembler = BatchAssembler::new(self.data_type, self.direction);

            loop {
                let t = 'find_t: loop {
                    let Some(mut page_end) = self.merge_reader.current_read_stop_time() else {
                        break 'find_t None;
                    };
                    if let Some(p) = &self.first_page {
                        page_end = self.direction.clamp_frontier(page_end, p.statistics());
                    }
                    if let Some(p) = self.peek_seq_page_front() {
                        page_end = self.direction.clamp_frontier(page_end, p.statistics());
                    }
                    let Some(pending) = self.merge_reader.current_time_value_pair() else {
                        break 'find_t None;
                    };
                    let t = pending.timestamp;
                    if self.direction.excess(t, page_end) {
                        let downstream = !assembler.is_empty() || self.first_page.is_some() || self.peek_seq_page_front().is_some();
                        if !downstream {
                            continue;
                        }
                    }
                    break 'find_t Some(t);
                };
                let Some(t) = t else { break };

                self.cascade_files_to_metadata(t)?;
                self.cascade_metadata_to_chunks(t)?;
                self.cascade_chunks_to_pages(t)?;
                self.push_overlapping_unseq_into_merge(t)?;

                if let Some(p) = &self.first_page {
                    if self.direction.excess(t, self.direction.overlap_check_time(p.statistics())) {
                        self.telemetry.record_points(assembler.len() as u64);
                        return Ok(Some(assembler.finish()));
                    }
                    let page = self.first_page.take().expect("checked Some above");
                    self.push_page_into_merge(page)?;
                }

                if let Some(p) = self.peek_seq_page_front() {
                    let seq_frontier = self.direction.overlap_check_time(p.statistics());
                    if self.direction.excess(t, seq_frontier) {
                        self.telemetry.record_points(assembler.len() as u64);
                        return Ok(Some(assembler.finish()));
                    }
                    let page = self.pop_seq_page_front().expect("checked Some above");
                    self.push_page_into_merge(page)?;
                }

                match self.merge_reader.next_time_value_pair() {
                    Some(pair) => {
                        assembler.push_filtered(pair, &self.value_filter);
                    }
                    None => break,
                }
            }

            if !assembler.is_empty() {
                self.telemetry.record_points(assembler.len() as u64);
                return Ok(Some(assembler.finish()));
            }
            if self.merge_reader.is_empty() {
                return Ok(None);
            }
        }
    }
}
