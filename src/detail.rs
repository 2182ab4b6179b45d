use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::data_types::{Record, RecordKey};
use crate::utils::date_formatter::{format_timestamp, SmartDateFormat};

/// What a hover tooltip or a packet list entry shows for one record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointDetail {
    pub key: RecordKey,
    pub timestamp: DateTime<Utc>,
    pub size: f64,
    pub packet_count: u64,
    /// Full date and time, e.g. `2024-01-12 10:30:15`.
    pub time_label: String,
    /// Time of day, e.g. `10:30:15`.
    pub clock_label: String,
    /// `source → destination`, blank sides for unknown endpoints.
    pub flow_label: String,
    pub size_label: String,
}

impl PointDetail {
    pub fn from_record(record: &Record, tz: Tz) -> Self {
        Self {
            key: record.key(),
            timestamp: record.timestamp,
            size: record.size,
            packet_count: record.packet_count,
            time_label: format_timestamp(record.timestamp, SmartDateFormat::Full, tz),
            clock_label: format_timestamp(record.timestamp, SmartDateFormat::HourMinSec, tz),
            flow_label: flow_label(record),
            size_label: format!("{} bytes", record.size),
        }
    }

    /// One line of the packet list: `10:30:15: a → b, 150 bytes`.
    pub fn list_entry(&self) -> String {
        format!("{}: {}, {}", self.clock_label, self.flow_label, self.size_label)
    }
}

pub fn flow_label(record: &Record) -> String {
    format!(
        "{} → {}",
        record.source.as_deref().unwrap_or(""),
        record.destination.as_deref().unwrap_or("")
    )
}
