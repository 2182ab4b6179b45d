//! Pipeline controller: runs every stage once per ingest and keeps the only
//! state that survives between calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregation::aggregate;
use crate::data_types::{
    Domain, IngestOptions, PipelineConfig, RawRecord, Record, RenderDiff, RenderedKeys,
};
use crate::detail::PointDetail;
use crate::domain::compute_domain;
use crate::error::Result;
use crate::normalize::normalize_partitioned;
use crate::proximity::ProximityIndex;
use crate::reconcile::reconcile;
use crate::window::{Admission, RetainedWindow};

/// How the retained set was last filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum RetentionMode {
    #[default]
    Raw,
    Aggregated,
}

/// What happened to one ingested batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Raw records that passed validation.
    pub accepted: usize,
    /// Raw records dropped as invalid.
    pub rejected: usize,
    /// Records or buckets refused because they fall behind evicted data.
    pub stale: usize,
    /// Buckets folded into an already retained bucket.
    pub merged: usize,
    /// Retained entries evicted to honour the window bound.
    pub evicted: usize,
}

/// Output of one ingest, handed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Update {
    pub diff: RenderDiff,
    pub domain: Domain,
    pub report: IngestReport,
}

/// Everything the pipeline carries from one ingest to the next.
#[derive(Clone, Debug)]
pub struct PipelineState {
    config: PipelineConfig,
    window: RetainedWindow,
    rendered: RenderedKeys,
    index: ProximityIndex,
    mode: RetentionMode,
    domain: Option<Domain>,
}

impl PipelineState {
    /// Validates `config` and builds an empty state.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: RetainedWindow::new(config.max_retained),
            config,
            rendered: RenderedKeys::new(),
            index: ProximityIndex::default(),
            mode: RetentionMode::Raw,
            domain: None,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mode(&self) -> RetentionMode {
        self.mode
    }

    /// The retained set, ascending by timestamp.
    pub fn retained(&self) -> &[Record] {
        self.window.as_slice()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Domain computed by the last ingest.
    pub fn domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    pub fn rendered(&self) -> &RenderedKeys {
        &self.rendered
    }

    /// Key of the newest evicted record, if anything was evicted yet.
    pub fn watermark(&self) -> Option<i64> {
        self.window.watermark()
    }

    /// Retained record closest in time to `query_time`; ties go to the earlier one.
    pub fn nearest(&self, query_time: DateTime<Utc>) -> Option<&Record> {
        self.index
            .nearest_index(query_time.timestamp_millis())
            .and_then(|i| self.retained().get(i))
    }

    /// Like `nearest`, but ignores records further than `max_distance_ms` away.
    pub fn nearest_within(&self, query_time: DateTime<Utc>, max_distance_ms: u64) -> Option<&Record> {
        self.index
            .nearest_within(query_time.timestamp_millis(), max_distance_ms)
            .and_then(|i| self.retained().get(i))
    }

    /// Tooltip data for the record nearest to `query_time`.
    pub fn detail_at(&self, query_time: DateTime<Utc>) -> Option<PointDetail> {
        self.nearest(query_time)
            .map(|r| PointDetail::from_record(r, self.config.timezone))
    }

    /// Packet list entries for the whole retained set.
    pub fn details(&self) -> Vec<PointDetail> {
        self.retained()
            .iter()
            .map(|r| PointDetail::from_record(r, self.config.timezone))
            .collect()
    }

    /// Ingests a batch using the wall clock for the empty-state domain.
    pub fn apply(&mut self, raw: &[RawRecord], options: IngestOptions) -> Update {
        self.apply_at(raw, options, Utc::now())
    }

    /// Ingests a batch. `now` is only used for the empty-state domain.
    ///
    /// Normalize, aggregate (if requested), window, then domain and diff
    /// against the previous pass, then rebuild the proximity index.
    pub fn apply_at(&mut self, raw: &[RawRecord], options: IngestOptions, now: DateTime<Utc>) -> Update {
        let (records, rejected) = normalize_partitioned(raw);
        let mut report = IngestReport {
            accepted: records.len(),
            rejected: rejected.len(),
            ..Default::default()
        };
        if report.rejected > 0 {
            warn!(rejected = report.rejected, "dropped invalid records from batch");
        }

        let incoming = if options.aggregate {
            if self.mode == RetentionMode::Raw && !self.window.is_empty() {
                debug!(retained = self.window.len(), "folding retained records into buckets");
                let folded = aggregate(&self.window.to_vec(), self.config.bucket_width_ms);
                self.window.replace(folded);
            }
            self.mode = RetentionMode::Aggregated;
            aggregate(&records, self.config.bucket_width_ms)
        } else {
            self.mode = RetentionMode::Raw;
            records
        };

        for record in incoming {
            let admission = if options.aggregate {
                self.window.upsert_bucket(record)
            } else {
                self.window.insert(record)
            };
            match admission {
                Admission::Inserted => {}
                Admission::Merged => report.merged += 1,
                Admission::Stale => report.stale += 1,
            }
        }

        let evicted = self.window.evict_overflow();
        report.evicted = evicted.len();
        if let Some(last) = evicted.last() {
            debug!(count = evicted.len(), through = last.key(), "evicted oldest records");
        }

        let current = self.window.as_slice();
        let diff = reconcile(&self.rendered, current);
        let domain = compute_domain(current).unwrap_or_else(|_| Domain::fallback(now));
        self.rendered = RenderedKeys::from_records(current);
        self.index = ProximityIndex::build(current);
        self.domain = Some(domain.clone());

        debug!(
            retained = self.window.len(),
            entering = diff.entering.len(),
            updating = diff.updating.len(),
            exiting = diff.exiting.len(),
            "ingest complete"
        );

        Update {
            diff,
            domain,
            report,
        }
    }
}

/// Functional entry point: consumes the state and hands back the next one.
pub fn ingest(
    mut state: PipelineState,
    raw: &[RawRecord],
    options: IngestOptions,
) -> (PipelineState, Update) {
    let update = state.apply(raw, options);
    (state, update)
}

/// A pipeline shared between a scheduler and a renderer.
///
/// The lock is held for the whole ingest, so ticks that fire while a previous
/// one is still running wait for it instead of interleaving.
#[derive(Clone)]
pub struct SharedPipeline {
    state: Arc<Mutex<PipelineState>>,
}

impl SharedPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self::from_state(PipelineState::new(config)?))
    }

    pub fn from_state(state: PipelineState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn ingest(&self, raw: &[RawRecord], options: IngestOptions) -> Update {
        self.state.lock().apply(raw, options)
    }

    pub fn nearest(&self, query_time: DateTime<Utc>) -> Option<Record> {
        self.state.lock().nearest(query_time).cloned()
    }

    pub fn detail_at(&self, query_time: DateTime<Utc>) -> Option<PointDetail> {
        self.state.lock().detail_at(query_time)
    }

    pub fn snapshot(&self) -> Vec<Record> {
        self.state.lock().retained().to_vec()
    }

    pub fn domain(&self) -> Option<Domain> {
        self.state.lock().domain().cloned()
    }

    /// Runs `f` with the state locked.
    pub fn with_state<R>(&self, f: impl FnOnce(&PipelineState) -> R) -> R {
        f(&self.state.lock())
    }
}
