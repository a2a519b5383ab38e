//! The testable properties of spec §8 (P1–P6), driven against the
//! in-memory fakes in `seriesmerge::testutil`.

use seriesmerge::cancel::CancelToken;
use seriesmerge::direction::Direction;
use seriesmerge::model::{DataType, QueryContext, SeriesId, TimeFilter, Value, ValueFilter};
use seriesmerge::pipeline::{OverlapPipeline, PipelineConfig};
use seriesmerge::telemetry::Telemetry;
use seriesmerge::testutil::{FakeStore, StructuredFile};
use seriesmerge::Batch;

fn build_pipeline(
    direction: Direction,
    seq: Vec<StructuredFile>,
    unseq: Vec<StructuredFile>,
    series: &str,
) -> (OverlapPipeline<StructuredFile, FakeStore>, FakeStore) {
    let series = SeriesId::from(series);
    let mut all = seq.clone();
    all.extend(unseq.clone());
    let store = FakeStore::new(series.clone(), DataType::I64, all);
    let probe = store.clone();
    let pipeline = OverlapPipeline::new(PipelineConfig {
        direction,
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
    (pipeline, probe)
}

fn as_i64_points(batch: &Batch) -> Vec<(i64, i64)> {
    batch
        .iter()
        .map(|p| match p.value {
            Value::I64(v) => (p.timestamp, v),
            _ => unreachable!("properties only use I64 points"),
        })
        .collect()
}

fn drain_points(pipeline: &mut OverlapPipeline<StructuredFile, FakeStore>) -> Vec<(i64, i64)> {
    let mut out = Vec::new();
    loop {
        if pipeline.has_next_page().expect("has_next_page") {
            out.extend(as_i64_points(&pipeline.next_page().expect("next_page")));
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
    out
}

fn mixed_layout(series: &str) -> (Vec<StructuredFile>, Vec<StructuredFile>) {
    let seq = vec![
        StructuredFile::new(1, true).with_chunk(series, vec![vec![(1, 10), (2, 20), (3, 30)]]),
        StructuredFile::new(2, true).with_chunk(series, vec![vec![(4, 40), (5, 50), (6, 60)]]),
        StructuredFile::new(3, true).with_chunk(series, vec![vec![(9, 90), (10, 100)]]),
    ];
    let unseq = vec![
        StructuredFile::new(4, false).with_chunk(series, vec![vec![(2, 200), (3, 300)]]),
        StructuredFile::new(5, false).with_chunk(series, vec![vec![(7, 70), (8, 80)]]),
    ];
    (seq, unseq)
}

#[test]
fn p1_output_is_monotone_in_direction() {
    let series = "p1";
    let (seq, unseq) = mixed_layout(series);
    let (mut asc, _) = build_pipeline(Direction::Asc, seq.clone(), unseq.clone(), series);
    let asc_points = drain_points(&mut asc);
    assert!(asc_points.windows(2).all(|w| w[0].0 < w[1].0));

    let (mut desc, _) = build_pipeline(Direction::Desc, seq, unseq, series);
    let desc_points = drain_points(&mut desc);
    assert!(desc_points.windows(2).all(|w| w[0].0 > w[1].0));
}

#[test]
fn p2_tied_timestamp_keeps_larger_version_key() {
    let series = "p2";
    // Three writers touch timestamp 5: seq v1, unseq v2, unseq v3 — the
    // largest version key (3) must win regardless of arrival order.
    let seq = vec![StructuredFile::new(1, true).with_chunk(series, vec![vec![(5, 1)]])];
    let unseq = vec![
        StructuredFile::new(3, false).with_chunk(series, vec![vec![(5, 3)]]),
        StructuredFile::new(2, false).with_chunk(series, vec![vec![(5, 2)]]),
    ];
    let (mut pipeline, _) = build_pipeline(Direction::Asc, seq, unseq, series);
    assert_eq!(drain_points(&mut pipeline), vec![(5, 3)]);
}

#[test]
fn p3_current_tier_pointers_are_mutually_exclusive() {
    let series = "p3";
    let (seq, unseq) = mixed_layout(series);
    let (mut pipeline, _) = build_pipeline(Direction::Asc, seq, unseq, series);

    loop {
        let file_set = pipeline.current_file_statistics().is_some();
        let chunk_set = pipeline.current_chunk_statistics().is_some();
        let page_set = pipeline.current_page_statistics().is_some();
        // firstFile is only ever populated before its metadata has been
        // exploded into chunks, at which point firstChunk takes over; and
        // firstChunk is cleared the moment it is exploded into pages.
        assert!(!(file_set && chunk_set), "firstFile and firstChunk set simultaneously");
        assert!(!(chunk_set && page_set), "firstChunk and firstPage set simultaneously");

        if pipeline.has_next_page().unwrap() {
            pipeline.next_page().unwrap();
            continue;
        }
        if pipeline.has_next_chunk().unwrap() {
            continue;
        }
        if pipeline.has_next_file().unwrap() {
            continue;
        }
        break;
    }

    assert!(pipeline.is_empty());
}

#[test]
fn p4_no_page_realized_during_pure_statistics_traversal() {
    let series = "p4";
    let seq = vec![
        StructuredFile::new(1, true).with_chunk(series, vec![vec![(1, 1), (2, 2)]]),
        StructuredFile::new(2, true).with_chunk(series, vec![vec![(3, 3), (4, 4)]]),
    ];
    let (mut pipeline, probe) = build_pipeline(Direction::Asc, seq, vec![], series);

    while pipeline.has_next_file().unwrap() {
        while pipeline.has_next_chunk().unwrap() {
            while pipeline.has_next_page().unwrap() {
                // Inspect statistics only; never call next_page.
                let _ = pipeline.current_page_statistics();
                pipeline.skip_current_page();
            }
        }
    }

    assert_eq!(probe.realized_count(), 0);
}

#[test]
fn p5_round_trip_asc_then_desc_yields_same_shadowed_points() {
    let series = "p5";
    let (seq, unseq) = mixed_layout(series);

    let (mut asc, _) = build_pipeline(Direction::Asc, seq.clone(), unseq.clone(), series);
    let mut asc_points = drain_points(&mut asc);

    let (mut desc, _) = build_pipeline(Direction::Desc, seq, unseq, series);
    let desc_points = drain_points(&mut desc);

    assert_eq!(asc_points.len(), desc_points.len());
    asc_points.reverse();
    assert_eq!(asc_points, desc_points);

    // Every original timestamp must survive exactly once: 1..6 from seq,
    // 7,8 from unseq (no seq collision), 9,10 from seq, with 2 and 3
    // shadowed by the unseq version.
    let timestamps: Vec<i64> = desc_points.iter().rev().map(|(t, _)| *t).collect();
    assert_eq!(timestamps, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
}

#[test]
fn p6_cascading_twice_at_the_same_frontier_is_a_no_op() {
    let series = "p6";
    let (seq, unseq) = mixed_layout(series);
    let (mut pipeline, _) = build_pipeline(Direction::Asc, seq, unseq, series);

    assert!(pipeline.has_next_file().unwrap());
    // Calling hasNextFile again with firstFile already set must not pull
    // in any more candidates or duplicate state.
    assert!(pipeline.has_next_file().unwrap());
    assert!(pipeline.has_next_file().unwrap());

    assert!(pipeline.has_next_chunk().unwrap());
    assert!(pipeline.has_next_chunk().unwrap());

    let points = drain_points(&mut pipeline);
    let timestamps: Vec<i64> = points.iter().map(|(t, _)| *t).collect();
    assert_eq!(timestamps, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
}
