use chrono::{DateTime, Utc};

use crate::data_types::{Record, RecordKey};

/// Core nearest-key search over `n` ascending keys.
/// Generic over how we retrieve the key for a given index.
///
/// Binary search for the insertion point, then compare the two neighbours.
/// On a tie the earlier one wins.
pub fn nearest_index_generic<F>(n: usize, get_key_at: F, query: RecordKey) -> Option<usize>
where
    F: Fn(usize) -> RecordKey,
{
    if n == 0 {
        return None;
    }

    let mut left = 0;
    let mut right = n;
    while left < right {
        let mid = left + (right - left) / 2;
        if get_key_at(mid) < query {
            left = mid + 1;
        } else {
            right = mid;
        }
    }

    if left == 0 {
        return Some(0);
    }
    if left == n {
        return Some(n - 1);
    }

    let before = query.abs_diff(get_key_at(left - 1));
    let after = get_key_at(left).abs_diff(query);
    if before <= after {
        // First of a run of equal keys.
        let key = get_key_at(left - 1);
        let (mut lo, mut hi) = (0, left - 1);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if get_key_at(mid) < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Some(lo)
    } else {
        Some(left)
    }
}

/// The record whose timestamp is closest to `query_time`.
pub fn nearest(records: &[Record], query_time: DateTime<Utc>) -> Option<&Record> {
    let query = query_time.timestamp_millis();
    nearest_index_generic(records.len(), |i| records[i].key(), query).map(|i| &records[i])
}

/// Key column of the retained set, rebuilt after every ingest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProximityIndex {
    keys: Vec<RecordKey>,
}

impl ProximityIndex {
    pub fn build<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        Self {
            keys: records.into_iter().map(Record::key).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn nearest_index(&self, query: RecordKey) -> Option<usize> {
        nearest_index_generic(self.keys.len(), |i| self.keys[i], query)
    }

    /// Like `nearest_index`, but only within `max_distance_ms` of the query.
    pub fn nearest_within(&self, query: RecordKey, max_distance_ms: u64) -> Option<usize> {
        self.nearest_index(query)
            .filter(|&i| self.keys[i].abs_diff(query) <= max_distance_ms)
    }
}
