//! Hierarchical, order-preserving merge reader for a single time series.
//!
//! The crate implements a four-tier lazy unpacking pipeline (file → chunk
//! → page → point) over a sequential/unsequential file population, with
//! overlap-triggered descent and a priority-merging point reader that
//! resolves same-timestamp conflicts by version precedence. See
//! `reader::SeriesReader` for the entry point and `pipeline::OverlapPipeline`
//! for the tier-driving state machine underneath it.

pub mod assembler;
pub mod cancel;
pub mod direction;
pub mod error;
pub mod external;
pub mod file_cursor;
pub mod merge;
pub mod model;
pub mod page;
pub mod pipeline;
pub mod reader;
pub mod telemetry;

#[cfg(any(test, feature = "testing"))]
pub mod testutil;

pub use direction::Direction;
pub use error::{Error, Result};
pub use external::{ChunkMetadata, FileResource, MetadataSource, PageDecoder, SeriesMetadata};
pub use model::{Batch, DataType, QueryContext, SeriesId, Statistics, TimeFilter, TimeValuePair, Value, ValueFilter, VersionKey};
pub use pipeline::{OverlapPipeline, PipelineConfig};
pub use reader::{ReaderConfig, SeriesReader};
