//! Keyed reconciliation between what was rendered and the current data.

use std::collections::HashSet;

use crate::data_types::{Record, RecordKey, RenderDiff, RenderedKeys};

/// Classifies `current` against the previous render pass.
///
/// `entering` and `updating` keep the order of `current`; `exiting` lists the
/// vanished records by ascending key. Classification is per key, so records
/// sharing a key always land in the same sequence.
pub fn reconcile(previous: &RenderedKeys, current: &[Record]) -> RenderDiff {
    let mut diff = RenderDiff::default();
    let mut current_keys: HashSet<RecordKey> = HashSet::with_capacity(current.len());

    for record in current {
        let key = record.key();
        current_keys.insert(key);
        match previous.get(key) {
            Some(rendered) => {
                if rendered != record && diff.modified.last() != Some(&key) {
                    diff.modified.push(key);
                }
                diff.updating.push(record.clone());
            }
            None => diff.entering.push(record.clone()),
        }
    }

    diff.exiting = previous
        .iter()
        .filter(|r| !current_keys.contains(&r.key()))
        .cloned()
        .collect();

    diff
}
