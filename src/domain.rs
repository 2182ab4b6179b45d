use tracing::warn;

use crate::data_types::{Domain, Record, MIN_VALUE_MAX, VALUE_HEADROOM};
use crate::error::{PipelineError, Result};

/// Derives axis bounds from an ascending slice of records.
///
/// The time range comes from the first and last record. The value axis starts
/// at zero and leaves 10% headroom above the largest size; a set made only of
/// empty packets still gets a positive upper bound.
pub fn compute_domain(records: &[Record]) -> Result<Domain> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(PipelineError::EmptyDataset);
    };

    let max_size = records
        .iter()
        .map(|r| r.size)
        .fold(f64::NEG_INFINITY, f64::max);

    let value_max = if max_size.is_infinite() && max_size > 0.0 {
        warn!("record size overflowed, clamping value axis");
        f64::MAX
    } else {
        let scaled = max_size * VALUE_HEADROOM;
        if scaled.is_infinite() && scaled > 0.0 {
            f64::MAX
        } else if scaled.is_finite() && scaled > 0.0 {
            scaled
        } else {
            MIN_VALUE_MAX
        }
    };

    Ok(Domain {
        time_min: first.timestamp,
        time_max: last.timestamp,
        value_min: 0.0,
        value_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dataset() {
        assert_eq!(compute_domain(&[]), Err(PipelineError::EmptyDataset));
    }

    #[test]
    fn test_zero_sizes_fall_back() {
        let records = vec![Record::at_millis(0, 0.0).unwrap()];
        let domain = compute_domain(&records).unwrap();
        assert_eq!(domain.value_max, 1.0);
        assert!(domain.is_degenerate());
    }

    #[test]
    fn test_overflowing_size_clamps_instead_of_collapsing() {
        let records = vec![
            Record::at_millis(0, 10.0).unwrap(),
            Record::at_millis(1000, f64::INFINITY).unwrap(),
        ];
        let domain = compute_domain(&records).unwrap();
        assert_eq!(domain.value_max, f64::MAX);

        let near_max = vec![Record::at_millis(0, f64::MAX * 0.95).unwrap()];
        assert_eq!(compute_domain(&near_max).unwrap().value_max, f64::MAX);
    }

    #[test]
    fn test_headroom() {
        let records = vec![
            Record::at_millis(0, 100.0).unwrap(),
            Record::at_millis(1000, 50.0).unwrap(),
        ];
        let domain = compute_domain(&records).unwrap();
        assert!((domain.value_max - 110.0).abs() < 1e-9);
        assert_eq!(domain.width(), 1000);
    }
}
