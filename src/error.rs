use thiserror::Error;

/// Errors surfaced by the traffic pipeline.
///
/// `InvalidRecord` and `EmptyDataset` are recovered locally by the pipeline;
/// only `InvalidConfiguration` ever reaches the caller of `PipelineState::new`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("no records to derive a domain from")]
    EmptyDataset,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
