use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use seriesmerge::cancel::CancelToken;
use seriesmerge::direction::Direction;
use seriesmerge::model::{DataType, QueryContext, SeriesId, TimeFilter, ValueFilter};
use seriesmerge::pipeline::{OverlapPipeline, PipelineConfig};
use seriesmerge::telemetry::Telemetry;
use seriesmerge::testutil::{FakeStore, StructuredFile};

const SERIES: &str = "bench.series";

fn build_files(seq_chunks: usize, unseq_files: usize, points_per_chunk: i64) -> Vec<StructuredFile> {
    let mut files = Vec::new();
    let mut cursor = 0i64;
    for v in 0..seq_chunks {
        let pages: Vec<(i64, i64)> = (0..points_per_chunk).map(|p| (cursor + p, p)).collect();
        files.push(StructuredFile::new(v as u64, true).with_chunk(SERIES, vec![pages]));
        cursor += points_per_chunk;
    }
    // Unseq files overlap the tail half of the seq range with a newer version.
    let overlap_start = cursor / 2;
    for u in 0..unseq_files {
        let version = (seq_chunks + u) as u64;
        let pages: Vec<(i64, i64)> = (0..points_per_chunk)
            .map(|p| (overlap_start + p, 1_000 + p))
            .collect();
        files.push(StructuredFile::new(version, false).with_chunk(SERIES, vec![pages]));
    }
    files
}

fn drain(seq_chunks: usize, unseq_files: usize) -> usize {
    let series = SeriesId::from(SERIES);
    let files = build_files(seq_chunks, unseq_files, 64);
    let (seq, unseq): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| f.is_seq);
    let store = {
        let mut all = seq.clone();
        all.extend(unseq.clone());
        FakeStore::new(series.clone(), DataType::I64, all)
    };

    let mut pipeline = OverlapPipeline::new(PipelineConfig {
        direction: Direction::Asc,
        data_type: DataType::I64,
        source: store,
        seq_files: seq,
        unseq_files: unseq,
        series,
        query_context: QueryContext::new(1),
        time_filter: TimeFilter::none(),
        value_filter: ValueFilter::None,
        all_siblings: Vec::new(),
        cancel: CancelToken::new(),
        telemetry: Telemetry::new(1),
    });

    let mut points = 0usize;
    loop {
        if pipeline.has_next_page().expect("has_next_page") {
            let batch = pipeline.next_page().expect("next_page");
            points += batch.len();
            continue;
        }
        if pipeline.has_next_chunk().expect("has_next_chunk") {
            continue;
        }
        if pipeline.has_next_file().expect("has_next_file") {
            continue;
        }
        break;
    }
    points
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap_pipeline");
    for unseq_files in [0usize, 2, 8] {
        group.bench_with_input(BenchmarkId::new("drain_with_unseq", unseq_files), &unseq_files, |b, &unseq_files| {
            b.iter(|| drain(8, unseq_files))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
