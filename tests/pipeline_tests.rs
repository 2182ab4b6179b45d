use chrono::DateTime;
use traffic_chart::data_types::{IngestOptions, PipelineConfig, RawRecord};
use traffic_chart::pipeline::{ingest, PipelineState, RetentionMode};
use traffic_chart::PipelineError;

// 2023-11-14 21:53:00 UTC, minute aligned.
const T: i64 = 1_699_999_980_000;
const SIZES: [u64; 5] = [150, 200, 90, 260, 130];

fn five_packets() -> Vec<RawRecord> {
    SIZES
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            RawRecord::new(T + i as i64 * 60_000, size)
                .with_flow(format!("192.168.0.{}", i + 1), format!("192.168.0.{}", i + 2))
        })
        .collect()
}

fn state(max_retained: usize) -> PipelineState {
    PipelineState::new(PipelineConfig::default().with_max_retained(max_retained)).unwrap()
}

fn keys(state: &PipelineState) -> Vec<i64> {
    state.retained().iter().map(|r| r.key()).collect()
}

#[test]
fn test_end_to_end_raw() {
    let (state, update) = ingest(state(200), &five_packets(), IngestOptions::raw());

    assert_eq!(state.len(), 5);
    assert_eq!(
        keys(&state),
        vec![T, T + 60_000, T + 120_000, T + 180_000, T + 240_000]
    );
    let sizes: Vec<f64> = state.retained().iter().map(|r| r.size).collect();
    assert_eq!(sizes, vec![150.0, 200.0, 90.0, 260.0, 130.0]);

    assert!((update.domain.value_max - 286.0).abs() < 1e-9);
    assert_eq!(update.domain.value_min, 0.0);
    assert_eq!(update.domain.time_min.timestamp_millis(), T);
    assert_eq!(update.domain.time_max.timestamp_millis(), T + 240_000);

    assert_eq!(update.diff.entering.len(), 5);
    assert!(update.diff.updating.is_empty());
    assert!(update.diff.exiting.is_empty());
    assert_eq!(update.report.accepted, 5);
}

#[test]
fn test_second_pass_updates() {
    let (state, _) = ingest(state(200), &five_packets(), IngestOptions::raw());
    let (state, update) = ingest(
        state,
        &[RawRecord::new(T + 300_000, 10)],
        IngestOptions::raw(),
    );
    assert_eq!(state.len(), 6);
    assert_eq!(update.diff.entering_keys(), vec![T + 300_000]);
    assert_eq!(update.diff.updating.len(), 5);
    assert!(update.diff.modified.is_empty());
}

#[test]
fn test_window_eviction_single_batch() {
    let (state, update) = ingest(state(3), &five_packets(), IngestOptions::raw());
    assert_eq!(keys(&state), vec![T + 120_000, T + 180_000, T + 240_000]);
    assert_eq!(update.report.evicted, 2);
    assert!((update.domain.value_max - 286.0).abs() < 1e-9);
}

#[test]
fn test_window_eviction_reports_exiting() {
    let mut state = state(3);
    let mut exits = Vec::new();
    for packet in five_packets() {
        let (next, update) = ingest(state, &[packet], IngestOptions::raw());
        state = next;
        assert!(state.len() <= 3);
        exits.push(update.diff.exiting_keys());
    }
    assert!(exits[..3].iter().all(|e| e.is_empty()));
    assert_eq!(exits[3], vec![T]);
    assert_eq!(exits[4], vec![T + 60_000]);
    assert_eq!(keys(&state), vec![T + 120_000, T + 180_000, T + 240_000]);
}

#[test]
fn test_empty_first_ingest() {
    let now = DateTime::from_timestamp_millis(T).unwrap();
    let mut state = state(200);
    let update = state.apply_at(&[], IngestOptions::raw(), now);
    assert!(update.domain.value_max >= 1.0);
    assert_eq!(update.domain.time_min, now);
    assert_eq!(update.domain.time_max, now);
    assert!(update.diff.is_empty());
    assert!(state.is_empty());
}

#[test]
fn test_invalid_records_degrade_batch() {
    let mut batch = five_packets();
    batch.push(RawRecord::new("garbage", 10));
    batch.push(RawRecord::new(T, -5));
    batch.push(RawRecord::default());
    let (state, update) = ingest(state(200), &batch, IngestOptions::raw());
    assert_eq!(state.len(), 5);
    assert_eq!(update.report.rejected, 3);
    assert_eq!(update.report.accepted, 5);
}

#[test]
fn test_out_of_order_batch_is_sorted() {
    let mut batch = five_packets();
    batch.reverse();
    let (state, _) = ingest(state(200), &batch, IngestOptions::raw());
    let k = keys(&state);
    assert!(k.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_aggregation_merges_into_existing_bucket() {
    let first = vec![
        RawRecord::new(T + 1_000, 10),
        RawRecord::new(T + 2_000, 20),
        RawRecord::new(T + 61_000, 5),
    ];
    let (state, update) = ingest(state(200), &first, IngestOptions::aggregated());
    assert_eq!(state.mode(), RetentionMode::Aggregated);
    assert_eq!(keys(&state), vec![T, T + 60_000]);
    assert_eq!(update.diff.entering.len(), 2);

    // Late packet for the first minute, bucket still retained.
    let (state, update) = ingest(
        state,
        &[RawRecord::new(T + 30_000, 7)],
        IngestOptions::aggregated(),
    );
    assert_eq!(keys(&state), vec![T, T + 60_000]);
    let bucket = &state.retained()[0];
    assert_eq!(bucket.size, 37.0);
    assert_eq!(bucket.packet_count, 3);
    assert!(bucket.source.is_none());
    assert_eq!(update.report.merged, 1);
    assert!(update.diff.entering.is_empty());
    assert_eq!(update.diff.modified, vec![T]);
}

#[test]
fn test_late_record_for_evicted_bucket_is_stale() {
    let mut state = state(2);
    for minute in 0..3 {
        let (next, _) = ingest(
            state,
            &[RawRecord::new(T + minute * 60_000 + 5_000, 10)],
            IngestOptions::aggregated(),
        );
        state = next;
    }
    assert_eq!(keys(&state), vec![T + 60_000, T + 120_000]);
    assert_eq!(state.watermark(), Some(T));

    let (state, update) = ingest(
        state,
        &[RawRecord::new(T + 45_000, 99)],
        IngestOptions::aggregated(),
    );
    assert_eq!(update.report.stale, 1);
    assert_eq!(keys(&state), vec![T + 60_000, T + 120_000]);
    assert!(update.diff.entering.is_empty());
}

#[test]
fn test_late_raw_record_behind_watermark_is_stale() {
    let (state, _) = ingest(state(3), &five_packets(), IngestOptions::raw());
    let (state, update) = ingest(state, &[RawRecord::new(T + 1, 1)], IngestOptions::raw());
    assert_eq!(update.report.stale, 1);
    assert_eq!(state.len(), 3);
}

#[test]
fn test_switching_to_aggregation_folds_retained() {
    let raw = vec![
        RawRecord::new(T + 1_000, 1),
        RawRecord::new(T + 2_000, 2),
        RawRecord::new(T + 70_000, 4),
    ];
    let (state, _) = ingest(state(200), &raw, IngestOptions::raw());
    assert_eq!(state.len(), 3);

    let (state, update) = ingest(
        state,
        &[RawRecord::new(T + 3_000, 8)],
        IngestOptions::aggregated(),
    );
    assert_eq!(keys(&state), vec![T, T + 60_000]);
    assert_eq!(state.retained()[0].size, 11.0);
    assert_eq!(state.retained()[0].packet_count, 3);
    assert_eq!(update.diff.entering_keys(), vec![T, T + 60_000]);
    assert_eq!(update.diff.exiting_keys(), vec![T + 1_000, T + 2_000, T + 70_000]);
}

#[test]
fn test_switch_merges_into_bucket_straddling_watermark() {
    let raw = vec![
        RawRecord::new(T + 10_000, 1),
        RawRecord::new(T + 20_000, 2),
        RawRecord::new(T + 30_000, 4),
    ];
    let (state, update) = ingest(state(2), &raw, IngestOptions::raw());
    assert_eq!(update.report.evicted, 1);
    assert_eq!(state.watermark(), Some(T + 10_000));

    // The folded minute starts at T, behind the watermark, but is still retained.
    let (state, update) = ingest(
        state,
        &[RawRecord::new(T + 40_000, 8)],
        IngestOptions::aggregated(),
    );
    assert_eq!(keys(&state), vec![T]);
    let bucket = &state.retained()[0];
    assert_eq!(bucket.size, 14.0);
    assert_eq!(bucket.packet_count, 3);
    assert_eq!(update.report.stale, 0);
    assert_eq!(update.report.merged, 1);
    assert_eq!(update.diff.entering_keys(), vec![T]);

    // A minute that was never retained stays refused.
    let (state, update) = ingest(
        state,
        &[RawRecord::new(T - 30_000, 5)],
        IngestOptions::aggregated(),
    );
    assert_eq!(update.report.stale, 1);
    assert_eq!(keys(&state), vec![T]);
}

#[test]
fn test_hover_lookup() {
    let (state, _) = ingest(state(200), &five_packets(), IngestOptions::raw());
    let q = |ms: i64| DateTime::from_timestamp_millis(ms).unwrap();

    assert_eq!(state.nearest(q(T + 40_000)).map(|r| r.key()), Some(T + 60_000));
    assert_eq!(state.nearest(q(T + 30_000)).map(|r| r.key()), Some(T));
    assert!(state.nearest_within(q(T + 30_000), 1_000).is_none());

    let detail = state.detail_at(q(T + 239_000)).unwrap();
    assert_eq!(detail.size_label, "130 bytes");
    assert_eq!(detail.flow_label, "192.168.0.5 → 192.168.0.6");
    assert_eq!(state.details().len(), 5);
}

#[test]
fn test_invalid_configuration() {
    let zero = PipelineState::new(PipelineConfig::default().with_max_retained(0));
    assert!(matches!(zero, Err(PipelineError::InvalidConfiguration(_))));

    let width = PipelineState::new(PipelineConfig::default().with_bucket_width_ms(0));
    assert!(matches!(width, Err(PipelineError::InvalidConfiguration(_))));
}
