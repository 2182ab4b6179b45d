use std::collections::VecDeque;

use tracing::debug;

use crate::aggregation::fold_into;
use crate::data_types::{Record, RecordKey};

/// Keeps the most recent `max_retained` records of an ascending sequence.
pub fn apply_window(mut records: Vec<Record>, max_retained: usize) -> Vec<Record> {
    if records.len() > max_retained {
        let excess = records.len() - max_retained;
        records.drain(..excess);
    }
    records
}

/// Outcome of offering a record to the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Inserted,
    /// Folded into an existing bucket with the same key.
    Merged,
    /// Behind the eviction watermark; not retained.
    Stale,
}

/// Bounded, time-ordered retained set backed by a ring buffer.
///
/// Appending in time order and evicting from the front are O(1). The window
/// remembers the key of the newest record it ever evicted (the watermark) and
/// refuses records that would land behind it, so the retained set stays sorted
/// even when late records show up for data that is already gone.
///
/// Every mutating method leaves the buffer contiguous, so `as_slice` always
/// covers the whole retained set.
#[derive(Clone, Debug)]
pub struct RetainedWindow {
    data: VecDeque<Record>,
    capacity: usize,
    watermark: Option<RecordKey>,
}

impl RetainedWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity + 1),
            capacity,
            watermark: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn watermark(&self) -> Option<RecordKey> {
        self.watermark
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.data.iter()
    }

    pub fn front(&self) -> Option<&Record> {
        self.data.front()
    }

    pub fn back(&self) -> Option<&Record> {
        self.data.back()
    }

    fn settle(&mut self) {
        self.data.make_contiguous();
    }

    fn is_stale(&self, key: RecordKey, merging: bool) -> bool {
        match self.watermark {
            Some(w) if merging => key <= w,
            Some(w) => key < w,
            None => false,
        }
    }

    /// Position after every record with a timestamp <= `record`'s.
    fn upper_bound(&self, record: &Record) -> usize {
        self.data.partition_point(|r| r.timestamp <= record.timestamp)
    }

    /// Inserts a raw record after any record sharing its timestamp.
    pub fn insert(&mut self, record: Record) -> Admission {
        if self.is_stale(record.key(), false) {
            debug!(key = record.key(), "record behind eviction watermark");
            return Admission::Stale;
        }
        let pos = self.upper_bound(&record);
        if pos == self.data.len() {
            self.data.push_back(record);
        } else {
            self.data.insert(pos, record);
        }
        self.settle();
        Admission::Inserted
    }

    /// Inserts a bucket, folding it into a retained bucket with the same key.
    ///
    /// A retained bucket always absorbs its key, even when folding raw records
    /// left it at or behind the watermark.
    pub fn upsert_bucket(&mut self, bucket: Record) -> Admission {
        let pos = self.upper_bound(&bucket);
        if pos > 0 && self.data[pos - 1].timestamp == bucket.timestamp {
            fold_into(&mut self.data[pos - 1], &bucket);
            return Admission::Merged;
        }
        if self.is_stale(bucket.key(), true) {
            debug!(key = bucket.key(), "bucket already evicted");
            return Admission::Stale;
        }
        if pos == self.data.len() {
            self.data.push_back(bucket);
        } else {
            self.data.insert(pos, bucket);
        }
        self.settle();
        Admission::Inserted
    }

    /// Pops the oldest records until the window fits its capacity.
    pub fn evict_overflow(&mut self) -> Vec<Record> {
        let excess = self.data.len().saturating_sub(self.capacity);
        let mut evicted = Vec::with_capacity(excess);
        for _ in 0..excess {
            if let Some(record) = self.data.pop_front() {
                let key = record.key();
                self.watermark = Some(self.watermark.map_or(key, |w| w.max(key)));
                evicted.push(record);
            }
        }
        self.settle();
        evicted
    }

    /// Swaps the retained records for `records`, which must be sorted.
    /// The watermark is kept.
    pub fn replace(&mut self, records: Vec<Record>) {
        self.data = VecDeque::from(records);
    }

    /// The retained records, ascending.
    pub fn as_slice(&self) -> &[Record] {
        let (head, tail) = self.data.as_slices();
        debug_assert!(tail.is_empty());
        head
    }

    pub fn to_vec(&self) -> Vec<Record> {
        self.data.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64, size: f64) -> Record {
        Record::at_millis(ms, size).unwrap()
    }

    #[test]
    fn test_apply_window_drops_prefix() {
        let records: Vec<Record> = (0..5).map(|i| at(i * 1000, i as f64)).collect();
        let kept = apply_window(records.clone(), 3);
        assert_eq!(kept, records[2..].to_vec());
        assert_eq!(apply_window(records.clone(), 10), records);
    }

    #[test]
    fn test_insert_keeps_order_and_arrival() {
        let mut window = RetainedWindow::new(10);
        window.insert(at(2000, 1.0));
        window.insert(at(1000, 2.0));
        window.insert(at(2000, 3.0));
        let sizes: Vec<f64> = window.iter().map(|r| r.size).collect();
        assert_eq!(sizes, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_evict_and_watermark() {
        let mut window = RetainedWindow::new(2);
        for i in 0..4 {
            window.insert(at(i * 1000, 1.0));
        }
        let evicted = window.evict_overflow();
        assert_eq!(evicted.len(), 2);
        assert_eq!(window.len(), 2);
        assert_eq!(window.watermark(), Some(1000));
        assert_eq!(window.insert(at(500, 1.0)), Admission::Stale);
        assert_eq!(window.insert(at(1000, 1.0)), Admission::Inserted);
        assert_eq!(window.front().map(Record::key), Some(1000));
    }

    #[test]
    fn test_upsert_bucket_merges() {
        let mut window = RetainedWindow::new(4);
        assert_eq!(window.upsert_bucket(at(60_000, 10.0)), Admission::Inserted);
        assert_eq!(window.upsert_bucket(at(60_000, 5.0)), Admission::Merged);
        assert_eq!(window.len(), 1);
        assert_eq!(window.front().map(|r| (r.size, r.packet_count)), Some((15.0, 2)));
    }

    #[test]
    fn test_evicted_bucket_is_stale() {
        let mut window = RetainedWindow::new(1);
        window.upsert_bucket(at(0, 1.0));
        window.upsert_bucket(at(60_000, 1.0));
        window.evict_overflow();
        assert_eq!(window.upsert_bucket(at(0, 1.0)), Admission::Stale);
        assert_eq!(window.len(), 1);
    }
}
