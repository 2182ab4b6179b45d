#![cfg(feature = "polars")]

use eyre::{eyre, Result, WrapErr};
use polars::prelude::*;
use serde_json::Value;

use crate::data_types::RawRecord;

/// Reads packet rows out of a polars `DataFrame`.
///
/// Timestamps may be epoch milliseconds (any numeric dtype), a `Datetime`
/// column of any unit, or strings; the normalizer validates each row.
pub struct PolarsRecordSource {
    df: DataFrame,
    timestamp_col: String,
    size_col: String,
    source_col: Option<String>,
    destination_col: Option<String>,
}

impl PolarsRecordSource {
    pub fn new(mut df: DataFrame, timestamp_col: &str, size_col: &str) -> Self {
        df.rechunk_mut();
        Self {
            df,
            timestamp_col: timestamp_col.to_string(),
            size_col: size_col.to_string(),
            source_col: None,
            destination_col: None,
        }
    }

    pub fn with_flow(mut self, source_col: &str, destination_col: &str) -> Self {
        self.source_col = Some(source_col.to_string());
        self.destination_col = Some(destination_col.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .wrap_err_with(|| format!("missing column {name}"))?
            .as_series()
            .ok_or_else(|| eyre!("column {name} is not a materialized series"))
    }

    fn timestamp_values(&self) -> Result<Vec<Value>> {
        let s = self.series(&self.timestamp_col)?;
        match s.dtype() {
            DataType::String => Ok(s
                .str()?
                .iter()
                .map(|v| v.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null))
                .collect()),
            DataType::Datetime(unit, _) => {
                let per_ms = match unit {
                    TimeUnit::Milliseconds => 1,
                    TimeUnit::Microseconds => 1_000,
                    TimeUnit::Nanoseconds => 1_000_000,
                };
                let ints = s.cast(&DataType::Int64)?;
                Ok(ints
                    .i64()?
                    .iter()
                    .map(|v| v.map(|t| Value::from(t.div_euclid(per_ms))).unwrap_or(Value::Null))
                    .collect())
            }
            DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32 => {
                let ints = s.cast(&DataType::Int64)?;
                Ok(ints
                    .i64()?
                    .iter()
                    .map(|v| v.map(Value::from).unwrap_or(Value::Null))
                    .collect())
            }
            _ => float_values(s),
        }
    }

    fn identifier_values(&self, name: Option<&str>) -> Result<Vec<Value>> {
        let Some(name) = name else {
            return Ok(vec![Value::Null; self.df.height()]);
        };
        let strings = self.series(name)?.cast(&DataType::String)?;
        Ok(strings
            .str()?
            .iter()
            .map(|v| v.map(|s| Value::String(s.to_string())).unwrap_or(Value::Null))
            .collect())
    }

    /// Converts every row into a raw record, in row order.
    pub fn raw_records(&self) -> Result<Vec<RawRecord>> {
        let timestamps = self.timestamp_values()?;
        let sizes = float_values(self.series(&self.size_col)?)?;
        let sources = self.identifier_values(self.source_col.as_deref())?;
        let destinations = self.identifier_values(self.destination_col.as_deref())?;

        Ok(timestamps
            .into_iter()
            .zip(sizes)
            .zip(sources)
            .zip(destinations)
            .map(|(((timestamp, size), source), destination)| RawRecord {
                timestamp,
                source,
                destination,
                size,
            })
            .collect())
    }
}

fn float_values(s: &Series) -> Result<Vec<Value>> {
    let floats = s.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .iter()
        .map(|v| v.map(Value::from).unwrap_or(Value::Null))
        .collect())
}
