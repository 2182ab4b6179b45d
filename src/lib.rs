//! traffic_chart crate: streaming packet time-series for live charts

pub mod aggregation;
pub mod data_types;
pub mod detail;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod pipeline;
#[cfg(feature = "polars")]
pub mod polars_source;
pub mod proximity;
pub mod reconcile;
pub mod utils;
pub mod window;

pub use aggregation::aggregate;
pub use data_types::{Domain, IngestOptions, PipelineConfig, RawRecord, Record, RenderDiff};
pub use detail::PointDetail;
pub use domain::compute_domain;
pub use error::{PipelineError, Result};
pub use normalize::normalize;
pub use pipeline::{ingest, PipelineState, SharedPipeline, Update};
pub use proximity::nearest;
pub use reconcile::reconcile;
pub use window::apply_window;
