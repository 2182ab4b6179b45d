//! Record normalization: raw, loosely typed input into ordered `Record`s.

use chrono::{DateTime, NaiveDateTime, Utc};
use rayon::prelude::*;
use serde_json::Value;
use tracing::debug;

use crate::data_types::{RawRecord, Record};
use crate::error::{PipelineError, Result};

/// Batches at least this large are parsed on the rayon pool.
const PARALLEL_THRESHOLD: usize = 4096;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalizes a batch, dropping invalid records.
pub fn normalize(raw: &[RawRecord]) -> Vec<Record> {
    normalize_partitioned(raw).0
}

/// Normalizes a batch and also returns the rejection for every dropped record.
///
/// The accepted records are stably sorted by timestamp, so records sharing a
/// timestamp keep their input order.
pub fn normalize_partitioned(raw: &[RawRecord]) -> (Vec<Record>, Vec<PipelineError>) {
    let parsed: Vec<Result<Record>> = if raw.len() >= PARALLEL_THRESHOLD {
        raw.par_iter().map(normalize_record).collect()
    } else {
        raw.iter().map(normalize_record).collect()
    };

    let mut records = Vec::with_capacity(parsed.len());
    let mut rejected = Vec::new();
    for (idx, item) in parsed.into_iter().enumerate() {
        match item {
            Ok(record) => records.push(record),
            Err(err) => {
                debug!(index = idx, error = %err, "dropping raw record");
                rejected.push(err);
            }
        }
    }

    records.sort_by_key(|r| r.timestamp);
    (records, rejected)
}

/// Validates a single raw record.
pub fn normalize_record(raw: &RawRecord) -> Result<Record> {
    let timestamp = parse_timestamp(&raw.timestamp)?;
    let size = parse_size(&raw.size)?;
    Ok(Record {
        timestamp,
        source: parse_identifier(&raw.source),
        destination: parse_identifier(&raw.destination),
        size,
        packet_count: 1,
    })
}

/// Accepts epoch milliseconds (number or numeric string), RFC 3339, or a naive
/// `YYYY-MM-DD HH:MM:SS` string read as UTC.
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    let invalid = || PipelineError::InvalidRecord(format!("unparsable timestamp {value}"));
    match value {
        Value::Number(n) => {
            let ms = match n.as_i64() {
                Some(ms) => ms,
                None => float_millis(n.as_f64()).ok_or_else(invalid)?,
            };
            DateTime::from_timestamp_millis(ms).ok_or_else(invalid)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(ms) = s.parse::<i64>() {
                return DateTime::from_timestamp_millis(ms).ok_or_else(invalid);
            }
            if let Some(ms) = float_millis(s.parse::<f64>().ok()) {
                return DateTime::from_timestamp_millis(ms).ok_or_else(invalid);
            }
            NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn float_millis(ms: Option<f64>) -> Option<i64> {
    ms.filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
        .map(|v| v.floor() as i64)
}

pub fn parse_size(value: &Value) -> Result<f64> {
    let size = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match size {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(PipelineError::InvalidRecord(format!("invalid size {value}"))),
    }
}

fn parse_identifier(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
