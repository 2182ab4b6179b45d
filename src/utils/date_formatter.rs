use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmartDateFormat {
    Year,       // 2024
    MonthYear,  // Jan 2024
    DayMonth,   // 12 Jan
    HourMin,    // 10:30
    HourMinSec, // 10:30:15
    Full,       // 2024-01-12 10:30:15
}

impl SmartDateFormat {
    pub fn pattern(&self) -> &'static str {
        match self {
            SmartDateFormat::Year => "%Y",
            SmartDateFormat::MonthYear => "%b %Y",
            SmartDateFormat::DayMonth => "%d %b",
            SmartDateFormat::HourMin => "%H:%M",
            SmartDateFormat::HourMinSec => "%H:%M:%S",
            SmartDateFormat::Full => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// Determines the best date format based on the visible time range (in seconds).
pub fn determine_date_format(visible_range_sec: f64) -> SmartDateFormat {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 3600.0;
    const DAY: f64 = 24.0 * HOUR;
    const MONTH: f64 = 30.0 * DAY;
    const YEAR: f64 = 365.0 * DAY;

    if visible_range_sec > YEAR * 2.0 {
        SmartDateFormat::Year
    } else if visible_range_sec > MONTH * 2.0 {
        SmartDateFormat::MonthYear
    } else if visible_range_sec > DAY * 1.5 {
        SmartDateFormat::DayMonth
    } else if visible_range_sec > MINUTE * 5.0 {
        SmartDateFormat::HourMin
    } else {
        SmartDateFormat::HourMinSec
    }
}

/// Formats an instant in the given timezone.
pub fn format_timestamp(value: DateTime<Utc>, format: SmartDateFormat, tz: Tz) -> String {
    value.with_timezone(&tz).format(format.pattern()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_spans_use_seconds() {
        assert_eq!(determine_date_format(0.0), SmartDateFormat::HourMinSec);
        assert_eq!(determine_date_format(240.0), SmartDateFormat::HourMinSec);
        assert_eq!(determine_date_format(3600.0), SmartDateFormat::HourMin);
        assert_eq!(determine_date_format(86_400.0 * 3.0), SmartDateFormat::DayMonth);
    }

    #[test]
    fn test_format_in_timezone() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        assert_eq!(
            format_timestamp(ts, SmartDateFormat::HourMinSec, Tz::UTC),
            "22:13:20"
        );
        assert_eq!(
            format_timestamp(ts, SmartDateFormat::HourMinSec, chrono_tz::Europe::Paris),
            "23:13:20"
        );
    }
}
