//! External collaborator interfaces (spec §6, inbound).
//!
//! The reader never opens a file, decodes a chunk, or evaluates a filter
//! expression itself — it asks one of these three things to do it. Real
//! implementations live in the surrounding query engine; tests satisfy
//! them with in-memory fakes (see `crate::testutil`).

use crate::direction::Direction;
use crate::error::Result;
use crate::model::{Batch, QueryContext, SeriesId, Statistics, TimeFilter, ValueFilter, VersionKey};

/// The cheap, pre-metadata surface of a file handle: just enough to order
/// candidates in `LazyFileCursor`'s unsequential priority queue before
/// paying for a full metadata load. Ownership is borrowed for the query's
/// lifetime from an external resource manager; the core never opens or
/// closes the underlying file.
pub trait FileResource: std::fmt::Debug {
    /// `[startTime, endTime]` for the given series in this file, or `None`
    /// if the file has no data for that series.
    fn series_time_range(&self, series: &SeriesId) -> Option<(i64, i64)>;

    /// Whether deletions may apply to this series within this file.
    fn modified(&self, series: &SeriesId) -> bool;

    /// The file's version, used as the first component of every
    /// `VersionKey` minted for chunks loaded from it. Unique per file.
    fn file_version(&self) -> u64;
}

/// Per-series summary within one file.
#[derive(Debug, Clone)]
pub struct SeriesMetadata {
    pub statistics: Statistics,
    pub is_seq: bool,
    pub modified: bool,
    pub file_version: u64,
}

/// Per-chunk summary within one series.
#[derive(Debug, Clone)]
pub struct ChunkMetadata {
    pub statistics: Statistics,
    pub is_seq: bool,
    pub modified: bool,
    pub version: VersionKey,
}

/// A lazy producer of a decoded batch for one page.
pub trait PageDecoder: std::fmt::Debug {
    fn statistics(&self) -> Statistics;

    /// Fully realize the page as a batch honoring `direction` and any
    /// value filter pushed down with `set_filter`. Called at most once
    /// per page; the page is discarded afterward.
    fn all_satisfied_data(&mut self, direction: Direction) -> Result<Batch>;

    /// Push a value filter down to the page, to be applied when it is
    /// eventually realized. Only used for non-overlapped pages — the
    /// overlap-merge path resolves conflicts by version, not by value.
    fn set_filter(&mut self, filter: ValueFilter);

    /// Whether deletions apply to this page.
    fn is_modified(&self) -> bool;
}

/// The three inbound load operations, generic over the file-resource type
/// the surrounding engine uses.
pub trait MetadataSource<R: FileResource> {
    fn load_series_metadata(
        &self,
        file: &R,
        series: &SeriesId,
        ctx: &QueryContext,
        any_filter: Option<&TimeFilter>,
        all_siblings: &[SeriesId],
    ) -> Result<Option<SeriesMetadata>>;

    fn load_chunk_list(&self, series: &SeriesMetadata) -> Result<Vec<ChunkMetadata>>;

    fn load_page_list(
        &self,
        chunk: &ChunkMetadata,
        time_filter: &TimeFilter,
    ) -> Result<Vec<Box<dyn PageDecoder>>>;
}
