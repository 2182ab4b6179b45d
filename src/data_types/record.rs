use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identity of a record across reconciliation passes: epoch milliseconds.
pub type RecordKey = i64;

/// A single traffic observation, either one packet or a bucket of packets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub destination: Option<String>,
    /// Bytes carried by the packet (or summed over the bucket).
    pub size: f64,
    /// Number of packets this record stands for. Always 1 for raw packets.
    pub packet_count: u64,
}

impl Record {
    pub fn new(timestamp: DateTime<Utc>, size: f64) -> Self {
        Self {
            timestamp,
            source: None,
            destination: None,
            size,
            packet_count: 1,
        }
    }

    /// Builds a record from epoch milliseconds. `None` if the instant is out of range.
    pub fn at_millis(ms: i64, size: f64) -> Option<Self> {
        DateTime::from_timestamp_millis(ms).map(|ts| Self::new(ts, size))
    }

    pub fn with_flow(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.destination = Some(destination.into());
        self
    }

    pub fn key(&self) -> RecordKey {
        self.timestamp.timestamp_millis()
    }
}

/// A loosely typed input record, as handed over by a data source.
///
/// Every field is kept as a raw JSON value so that any object deserializes;
/// validation is the normalizer's job.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub source: Value,
    #[serde(default)]
    pub destination: Value,
    #[serde(default)]
    pub size: Value,
}

impl RawRecord {
    pub fn new(timestamp: impl Into<Value>, size: impl Into<Value>) -> Self {
        Self {
            timestamp: timestamp.into(),
            size: size.into(),
            ..Default::default()
        }
    }

    pub fn with_flow(mut self, source: impl Into<Value>, destination: impl Into<Value>) -> Self {
        self.source = source.into();
        self.destination = destination.into();
        self
    }
}

impl From<&Record> for RawRecord {
    fn from(record: &Record) -> Self {
        let opt = |v: &Option<String>| v.clone().map(Value::String).unwrap_or(Value::Null);
        Self {
            timestamp: Value::from(record.key()),
            source: opt(&record.source),
            destination: opt(&record.destination),
            size: Value::from(record.size),
        }
    }
}
