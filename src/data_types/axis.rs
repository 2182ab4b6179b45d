use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::date_formatter::{determine_date_format, SmartDateFormat};

/// Headroom applied above the tallest point so it is not clipped by the axis.
pub const VALUE_HEADROOM: f64 = 1.1;

/// Smallest upper bound for the value axis.
pub const MIN_VALUE_MAX: f64 = 1.0;

/// Axis bounds derived from the retained set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub value_min: f64,
    pub value_max: f64,
}

impl Domain {
    /// Degenerate domain used when there is nothing to show: `[now, now] x [0, 1]`.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            time_min: now,
            time_max: now,
            value_min: 0.0,
            value_max: MIN_VALUE_MAX,
        }
    }

    /// Time span in milliseconds.
    pub fn width(&self) -> i64 {
        (self.time_max - self.time_min).num_milliseconds()
    }

    pub fn height(&self) -> f64 {
        self.value_max - self.value_min
    }

    pub fn is_degenerate(&self) -> bool {
        self.time_min == self.time_max
    }

    /// Label format suited to the visible time span.
    pub fn label_format(&self) -> SmartDateFormat {
        determine_date_format(self.width() as f64 / 1000.0)
    }
}
