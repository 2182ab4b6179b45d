use std::path::Path;

use chrono_tz::Tz;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Pipeline configuration, validated once when a pipeline is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on the retained set.
    pub max_retained: usize,
    /// Width of an aggregation bucket in milliseconds.
    pub bucket_width_ms: i64,
    /// Timezone used for time labels.
    pub timezone: Tz,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retained: 200,
            bucket_width_ms: 60_000,
            timezone: Tz::UTC,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_retained(mut self, max_retained: usize) -> Self {
        self.max_retained = max_retained;
        self
    }

    pub fn with_bucket_width_ms(mut self, bucket_width_ms: i64) -> Self {
        self.bucket_width_ms = bucket_width_ms;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retained == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "max_retained must be greater than zero".into(),
            ));
        }
        if self.bucket_width_ms <= 0 {
            return Err(PipelineError::InvalidConfiguration(format!(
                "bucket_width_ms must be positive, got {}",
                self.bucket_width_ms
            )));
        }
        Ok(())
    }

    /// Parses and validates a JSON document. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .wrap_err_with(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

/// Per-call ingest options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Fold records into time buckets before retaining them.
    pub aggregate: bool,
}

impl IngestOptions {
    pub fn raw() -> Self {
        Self { aggregate: false }
    }

    pub fn aggregated() -> Self {
        Self { aggregate: true }
    }
}
