//! In-memory fakes for the three external-collaborator traits.
//!
//! Not part of the crate's real-world surface — this exists purely so the
//! reader can be exercised without a real columnar store behind it, here
//! and from the integration tests under `tests/`. Enabled for unit tests
//! automatically, and for integration tests via the `testing` feature
//! (see the `dev-dependencies` self-reference in `Cargo.toml`).

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::direction::Direction;
use crate::error::Result;
use crate::external::{ChunkMetadata, FileResource, MetadataSource, PageDecoder, SeriesMetadata};
use crate::model::{Batch, DataType, QueryContext, SeriesId, Statistics, TimeFilter, Value, ValueFilter, VersionKey};

/// A page backed by an in-memory vector of `(timestamp, i64 value)` pairs.
/// Counts how many times it was fully realized, for the P4 "no PageDecoder
/// is ever realized during a pure-statistics traversal" property.
#[derive(Debug, Clone)]
pub struct FakePage {
    points: Vec<(i64, i64)>,
    data_type: DataType,
    filter: Arc<Cell<bool>>,
    modified: bool,
    realized: Rc<AtomicUsize>,
}

impl FakePage {
    pub fn new(points: Vec<(i64, i64)>, data_type: DataType) -> Self {
        Self {
            points,
            data_type,
            filter: Arc::new(Cell::new(false)),
            modified: false,
            realized: Rc::new(AtomicUsize::new(0)),
        }
    }

    pub fn modified(mut self, modified: bool) -> Self {
        self.modified = modified;
        self
    }

    pub fn realized_count(&self) -> Rc<AtomicUsize> {
        Rc::clone(&self.realized)
    }

    /// Share a counter with another `FakePage` (or a store-wide total),
    /// replacing the one created by `new`.
    pub fn with_counter(mut self, counter: Rc<AtomicUsize>) -> Self {
        self.realized = counter;
        self
    }
}

impl PageDecoder for FakePage {
    fn statistics(&self) -> Statistics {
        let start = self.points.iter().map(|(t, _)| *t).min().unwrap_or(0);
        let end = self.points.iter().map(|(t, _)| *t).max().unwrap_or(0);
        Statistics::new(start, end, self.points.len() as u64)
    }

    fn all_satisfied_data(&mut self, direction: Direction) -> Result<Batch> {
        self.realized.fetch_add(1, AtomicOrdering::SeqCst);
        let mut points = self.points.clone();
        points.sort_by_key(|(t, _)| *t);
        if !direction.is_asc() {
            points.reverse();
        }
        let mut batch = Batch::new(self.data_type, direction);
        for (t, v) in points {
            batch.push(crate::model::TimeValuePair::new(t, Value::I64(v)));
        }
        Ok(batch)
    }

    fn set_filter(&mut self, _filter: ValueFilter) {
        self.filter.set(true);
    }

    fn is_modified(&self) -> bool {
        self.modified
    }
}

/// A fake file that keeps chunk/page structure explicit: series -> chunks
/// -> pages -> points. `version` becomes every chunk's `VersionKey`
/// file-version component.
#[derive(Debug, Clone, Default)]
pub struct StructuredFile {
    pub version: u64,
    pub is_seq: bool,
    pub modified: bool,
    /// series -> chunks -> pages -> points
    pub series: HashMap<SeriesId, Vec<Vec<Vec<(i64, i64)>>>>,
}

impl StructuredFile {
    pub fn new(version: u64, is_seq: bool) -> Self {
        Self {
            version,
            is_seq,
            modified: false,
            series: HashMap::new(),
        }
    }

    pub fn modified(mut self, modified: bool) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_chunk(mut self, series: impl Into<SeriesId>, pages: Vec<Vec<(i64, i64)>>) -> Self {
        self.series.entry(series.into()).or_default().push(pages);
        self
    }
}

impl FileResource for StructuredFile {
    fn series_time_range(&self, series: &SeriesId) -> Option<(i64, i64)> {
        let chunks = self.series.get(series)?;
        let all: Vec<i64> = chunks
            .iter()
            .flatten()
            .flatten()
            .map(|(t, _)| *t)
            .collect();
        if all.is_empty() {
            return None;
        }
        Some((*all.iter().min().unwrap(), *all.iter().max().unwrap()))
    }

    fn modified(&self, _series: &SeriesId) -> bool {
        self.modified
    }

    fn file_version(&self) -> u64 {
        self.version
    }
}

/// `MetadataSource` over a fixed collection of `StructuredFile`s, scoped to
/// one series (mirroring how a real `ChunkMetadata`/ `SeriesMetadata`
/// handle carries enough context to load its own children without the
/// series identity being threaded back through `load_chunk_list`/
/// `load_page_list`). Built once per test from the full file population,
/// so `hasNextFile`/`hasNextChunk`/`hasNextPage` exercise the real
/// cascade logic end to end rather than bypassing it.
#[derive(Debug, Clone)]
pub struct FakeStore {
    series: SeriesId,
    data_type: DataType,
    files_by_version: HashMap<u64, StructuredFile>,
    pages_by_chunk: HashMap<(u64, u64), Vec<Vec<(i64, i64)>>>,
    realized: Rc<AtomicUsize>,
}

impl FakeStore {
    pub fn new(series: impl Into<SeriesId>, data_type: DataType, files: Vec<StructuredFile>) -> Self {
        let series = series.into();
        let mut files_by_version = HashMap::new();
        let mut pages_by_chunk = HashMap::new();
        for file in files {
            if let Some(chunks) = file.series.get(&series) {
                for (offset, pages) in chunks.iter().enumerate() {
                    pages_by_chunk.insert((file.version, offset as u64), pages.clone());
                }
            }
            files_by_version.insert(file.version, file);
        }
        Self {
            series,
            data_type,
            files_by_version,
            pages_by_chunk,
            realized: Rc::new(AtomicUsize::new(0)),
        }
    }

    /// Total number of pages this store has fully realized across every
    /// `FakePage` it has ever handed out, for the P4 property (no decoder
    /// realized during a pure-statistics traversal).
    pub fn realized_count(&self) -> usize {
        self.realized.load(AtomicOrdering::SeqCst)
    }
}

impl MetadataSource<StructuredFile> for FakeStore {
    fn load_series_metadata(
        &self,
        file: &StructuredFile,
        series: &SeriesId,
        _ctx: &QueryContext,
        _any_filter: Option<&TimeFilter>,
        _all_siblings: &[SeriesId],
    ) -> Result<Option<SeriesMetadata>> {
        let Some((start, end)) = file.series_time_range(series) else {
            return Ok(None);
        };
        let count: u64 = file
            .series
            .get(series)
            .map(|chunks| chunks.iter().flatten().flatten().count() as u64)
            .unwrap_or(0);
        Ok(Some(SeriesMetadata {
            statistics: Statistics::new(start, end, count),
            is_seq: file.is_seq,
            // Unseq metadata is conservatively treated as potentially
            // modified unconditionally (spec §4.4, §9 open question),
            // bypassing statistic-only shortcuts even with no deletion.
            modified: if file.is_seq { file.modified } else { true },
            file_version: file.version,
        }))
    }

    fn load_chunk_list(&self, series: &SeriesMetadata) -> Result<Vec<ChunkMetadata>> {
        let Some(file) = self.files_by_version.get(&series.file_version) else {
            return Ok(Vec::new());
        };
        let Some(chunks) = file.series.get(&self.series) else {
            return Ok(Vec::new());
        };
        Ok(chunks
            .iter()
            .enumerate()
            .map(|(offset, pages)| {
                let all: Vec<i64> = pages.iter().flatten().map(|(t, _)| *t).collect();
                let start = *all.iter().min().unwrap();
                let end = *all.iter().max().unwrap();
                ChunkMetadata {
                    statistics: Statistics::new(start, end, all.len() as u64),
                    is_seq: file.is_seq,
                    modified: if file.is_seq { file.modified } else { true },
                    version: VersionKey::new(file.version, offset as u64),
                }
            })
            .collect())
    }

    fn load_page_list(&self, chunk: &ChunkMetadata, _time_filter: &TimeFilter) -> Result<Vec<Box<dyn PageDecoder>>> {
        let key = (chunk.version.file_version, chunk.version.chunk_offset);
        let Some(pages) = self.pages_by_chunk.get(&key) else {
            return Ok(Vec::new());
        };
        Ok(pages
            .iter()
            .map(|p| {
                Box::new(
                    FakePage::new(p.clone(), self.data_type)
                        .modified(chunk.modified)
                        .with_counter(Rc::clone(&self.realized)),
                ) as Box<dyn PageDecoder>
            })
            .collect())
    }
}
