use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::data_types::{Record, RecordKey};

/// One minute, the bucket width used by the live chart.
pub const MINUTE_MS: i64 = 60_000;

/// Truncates a key to the start of its bucket. Floors toward negative infinity,
/// so pre-epoch instants land in the bucket that contains them.
pub fn bucket_key(key: RecordKey, bucket_width_ms: i64) -> RecordKey {
    let width = bucket_width_ms.max(1);
    key.div_euclid(width) * width
}

/// Start of the bucket containing `timestamp`.
pub fn bucket_start(timestamp: DateTime<Utc>, bucket_width_ms: i64) -> DateTime<Utc> {
    let key = bucket_key(timestamp.timestamp_millis(), bucket_width_ms);
    DateTime::from_timestamp_millis(key).unwrap_or(timestamp)
}

/// Folds `record` into `bucket`. Flow identity is lost once packets are merged.
pub fn fold_into(bucket: &mut Record, record: &Record) {
    bucket.size += record.size;
    bucket.packet_count += record.packet_count;
}

fn empty_bucket(timestamp: DateTime<Utc>) -> Record {
    Record {
        timestamp,
        source: None,
        destination: None,
        size: 0.0,
        packet_count: 0,
    }
}

/// Collapses records into fixed-width time buckets.
///
/// Single left-to-right pass: sizes and packet counts accumulate by summation.
/// One bucket per distinct key, in ascending key order; minutes without traffic
/// produce nothing. Folding buckets again yields the same buckets.
pub fn aggregate(records: &[Record], bucket_width_ms: i64) -> Vec<Record> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut buckets: BTreeMap<RecordKey, Record> = BTreeMap::new();
    for record in records {
        let start = bucket_start(record.timestamp, bucket_width_ms);
        let bucket = buckets
            .entry(start.timestamp_millis())
            .or_insert_with(|| empty_bucket(start));
        fold_into(bucket, record);
    }

    buckets.into_values().collect()
}

/// Aggregates into one-minute buckets.
pub fn aggregate_by_minute(records: &[Record]) -> Vec<Record> {
    aggregate(records, MINUTE_MS)
}
