//! Optional per-query chunk/point counters.
//!
//! Gated behind a global tracing flag so the common case pays nothing: the
//! pipeline always calls `Telemetry::record_chunk`/`record_point`, but
//! those are no-ops unless tracing was enabled for the process.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static TRACING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable or disable chunk/point counting process-wide. Typically set once
/// at startup from configuration.
pub fn set_tracing_enabled(enabled: bool) {
    TRACING_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn tracing_enabled() -> bool {
    TRACING_ENABLED.load(Ordering::Relaxed)
}

/// Per-query accumulators, keyed implicitly by whoever owns the instance
/// (typically one `SeriesReader`, tagged by `query_id` for downstream
/// aggregation by the caller).
#[derive(Debug, Default)]
pub struct Telemetry {
    query_id: u64,
    chunks: AtomicU64,
    points: AtomicU64,
}

impl Telemetry {
    pub fn new(query_id: u64) -> Self {
        Self {
            query_id,
            chunks: AtomicU64::new(0),
            points: AtomicU64::new(0),
        }
    }

    pub fn query_id(&self) -> u64 {
        self.query_id
    }

    pub fn record_chunk(&self) {
        if tracing_enabled() {
            self.chunks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_points(&self, count: u64) {
        if tracing_enabled() {
            self.points.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn chunk_count(&self) -> u64 {
        self.chunks.load(Ordering::Relaxed)
    }

    pub fn point_count(&self) -> u64 {
        self.points.load(Ordering::Relaxed)
    }
}
