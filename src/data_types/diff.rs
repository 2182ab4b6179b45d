use std::collections::BTreeMap;

use serde::Serialize;

use super::record::{Record, RecordKey};

/// Enter/update/exit classification handed to a renderer after each ingest.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderDiff {
    /// Records whose key was not rendered by the previous pass.
    pub entering: Vec<Record>,
    /// Records whose key was already rendered.
    pub updating: Vec<Record>,
    /// Previously rendered records whose key has vanished, by ascending key.
    pub exiting: Vec<Record>,
    /// Keys of `updating` whose value differs from what was rendered before.
    pub modified: Vec<RecordKey>,
}

impl RenderDiff {
    pub fn is_empty(&self) -> bool {
        self.entering.is_empty() && self.updating.is_empty() && self.exiting.is_empty()
    }

    /// True when marks have to be created or removed.
    pub fn has_structural_changes(&self) -> bool {
        !self.entering.is_empty() || !self.exiting.is_empty()
    }

    pub fn entering_keys(&self) -> Vec<RecordKey> {
        self.entering.iter().map(Record::key).collect()
    }

    pub fn updating_keys(&self) -> Vec<RecordKey> {
        self.updating.iter().map(Record::key).collect()
    }

    pub fn exiting_keys(&self) -> Vec<RecordKey> {
        self.exiting.iter().map(Record::key).collect()
    }
}

/// What the renderer currently shows, keyed by record key.
///
/// Holds its own copy of every rendered value. When several rendered records
/// share a key, the last one in render order is kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedKeys {
    rendered: BTreeMap<RecordKey, Record>,
}

impl RenderedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let rendered = records.into_iter().map(|r| (r.key(), r.clone())).collect();
        Self { rendered }
    }

    pub fn contains(&self, key: RecordKey) -> bool {
        self.rendered.contains_key(&key)
    }

    pub fn get(&self, key: RecordKey) -> Option<&Record> {
        self.rendered.get(&key)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = RecordKey> + '_ {
        self.rendered.keys().copied()
    }

    /// Rendered records in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.rendered.values()
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}
