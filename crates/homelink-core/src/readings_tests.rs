use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::readings::{HourlyAggregate, ReadingStore, MAX_AGGREGATES};

fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 15, hour, min, sec)
        .single()
        .expect("valid date")
}

#[test]
fn rollup_is_arithmetic_mean_of_window() {
    // Arrange
    let mut store = ReadingStore::new();
    let now = at(10, 30, 0);
    for value in [70.0, 72.0, 71.0] {
        store.record_raw(value, now);
    }

    // Act
    let aggregate = store.rollup_hour(now).expect("non-empty window");

    // Assert
    assert_eq!(aggregate.value, 71.0);
    assert_eq!(aggregate.ts, now);
}

#[test]
fn rollup_truncates_instead_of_rounding() {
    let mut store = ReadingStore::new();
    let now = at(10, 30, 0);
    // Mean is 70.97; rounding would give 71.0.
    store.record_raw(70.95, now);
    store.record_raw(70.99, now);

    let aggregate = store.rollup_hour(now).expect("non-empty window");

    assert_eq!(aggregate.value, 70.9);
}

#[test]
fn rollup_of_empty_window_is_none() {
    let store = ReadingStore::new();

    assert!(store.rollup_hour(at(10, 59, 0)).is_none());
}

#[test]
fn identical_samples_are_both_retained() {
    let mut store = ReadingStore::new();
    let now = at(10, 30, 0);
    store.record_raw(71.0, now);
    let before = store.raw_len();

    store.record_raw(71.0, now);
    store.record_raw(71.0, now);

    assert_eq!(store.raw_len(), before + 2);
}

#[test]
fn horizon_tracks_minute_of_hour() {
    let mut store = ReadingStore::new();
    let now = at(10, 30, 0);
    store.record_raw(70.0, now - Duration::minutes(31));
    store.record_raw(71.0, now - Duration::minutes(29));

    store.record_raw(72.0, now);

    // At minute 30 the window reaches back exactly 30 minutes.
    assert_eq!(store.raw_len(), 2);
    assert_eq!(store.current_raw().expect("sample").value, 72.0);
}

#[test]
fn horizon_collapses_at_top_of_hour() {
    let mut store = ReadingStore::new();
    store.record_raw(70.0, at(10, 59, 59));

    store.record_raw(71.0, at(11, 0, 0));

    // Minute 0: everything older than "now" is purged.
    assert_eq!(store.raw_len(), 1);
    assert_eq!(store.current_raw().expect("sample").value, 71.0);
}

#[test]
fn aggregates_prune_to_most_recent_24() {
    // Arrange
    let mut store = ReadingStore::new();
    let base = at(0, 59, 0);
    for hour in 0..30 {
        store.insert_aggregate(HourlyAggregate {
            value: 70.0 + hour as f64,
            ts: base + Duration::hours(hour),
        });
    }

    // Act
    store.prune_aggregates();

    // Assert
    let aggregates = store.all_aggregates();
    assert_eq!(aggregates.len(), MAX_AGGREGATES);
    // Newest first; the oldest six are gone.
    assert_eq!(aggregates[0].value, 99.0);
    assert_eq!(aggregates[MAX_AGGREGATES - 1].value, 76.0);
}

#[test]
fn startup_sweep_clears_stale_state() {
    let mut store = ReadingStore::new();
    store.record_raw(70.0, at(9, 15, 0));
    for hour in 0..26 {
        store.insert_aggregate(HourlyAggregate {
            value: 70.0,
            ts: at(0, 59, 0) + Duration::hours(hour),
        });
    }

    store.startup_sweep(at(10, 5, 0));

    assert_eq!(store.raw_len(), 0);
    assert_eq!(store.all_aggregates().len(), MAX_AGGREGATES);
}
