//! Normalization of a raw series into a [`TrafficSample`].

use crate::series::RawSeries;
use chrono::{DateTime, Duration, Utc};
use netwatch_core::types::{TrafficSample, TrafficStatus};

/// Baseline used when the window is too short to compute one.
const DEFAULT_BASELINE: f64 = 100.0;

/// Number of leading entries averaged into the baseline.
const BASELINE_LEN: usize = 12;

/// Build a sample from extracted values, normalized to percent of the
/// window maximum.
///
/// `now` anchors synthesized timestamps when the upstream response had
/// none (or a mismatched count): entries are assumed hourly, ending now.
/// Returns `None` for an empty series.
#[must_use]
pub fn build_sample(series: &RawSeries, now: DateTime<Utc>) -> Option<TrafficSample> {
    if series.values.is_empty() {
        return None;
    }

    // Guard the divisor so an all-zero window normalizes to zero, not NaN.
    let max = series.values.iter().copied().fold(1.0f64, f64::max);
    let trend: Vec<f64> = series.values.iter().map(|v| v / max * 100.0).collect();

    let current_level = *trend.last().expect("non-empty");
    let baseline_percent = if trend.len() > BASELINE_LEN {
        trend[..BASELINE_LEN].iter().sum::<f64>() / BASELINE_LEN as f64
    } else {
        DEFAULT_BASELINE
    };
    let change_percent = (current_level - baseline_percent) / baseline_percent * 100.0;
    let status = TrafficStatus::classify(current_level, baseline_percent);

    let timestamps = if series.timestamps.len() == trend.len() {
        series.timestamps.clone()
    } else {
        synthesize_hourly(trend.len(), now)
    };

    Some(TrafficSample {
        current_level,
        trend,
        timestamps,
        baseline_percent,
        change_percent,
        status,
        fetched_at: now,
    })
}

/// Hourly timestamps ending at `now`.
fn synthesize_hourly(len: usize, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    (0..len)
        .map(|i| now - Duration::hours((len - 1 - i) as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: Vec<f64>) -> RawSeries {
        RawSeries {
            timestamps: Vec::new(),
            values,
        }
    }

    #[test]
    fn flat_window_is_normal() {
        let sample = build_sample(&series(vec![100.0; 24]), Utc::now()).unwrap();
        assert!((sample.current_level - 100.0).abs() < f64::EPSILON);
        assert!((sample.baseline_percent - 100.0).abs() < f64::EPSILON);
        assert!((sample.change_percent).abs() < f64::EPSILON);
        assert_eq!(sample.status, TrafficStatus::Normal);
        assert_eq!(sample.trend.len(), 24);
        assert_eq!(sample.timestamps.len(), 24);
    }

    #[test]
    fn trend_values_bounded() {
        let sample = build_sample(&series(vec![5.0, 80.0, 40.0, 0.0, 160.0]), Utc::now()).unwrap();
        for v in &sample.trend {
            assert!((0.0..=100.0).contains(v), "trend value {v} out of range");
        }
        assert!((sample.trend[4] - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn single_value_uses_default_baseline() {
        let sample = build_sample(&series(vec![50.0]), Utc::now()).unwrap();
        assert!((sample.baseline_percent - 100.0).abs() < f64::EPSILON);
        assert!(sample.change_percent.is_finite());
        assert_eq!(sample.trend.len(), 1);
        assert_eq!(sample.timestamps.len(), 1);
    }

    #[test]
    fn twelve_or_fewer_entries_use_default_baseline() {
        let sample = build_sample(&series(vec![10.0; 12]), Utc::now()).unwrap();
        assert!((sample.baseline_percent - 100.0).abs() < f64::EPSILON);

        let sample = build_sample(&series(vec![10.0; 13]), Utc::now()).unwrap();
        assert!((sample.baseline_percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn collapse_classifies_shutdown() {
        // High early window, near-zero tail.
        let mut values = vec![100.0; 12];
        values.extend(vec![2.0; 12]);
        let sample = build_sample(&series(values), Utc::now()).unwrap();
        assert_eq!(sample.status, TrafficStatus::Shutdown);
        assert!(sample.change_percent < -90.0);
    }

    #[test]
    fn all_zero_window_does_not_produce_nan() {
        let sample = build_sample(&series(vec![0.0; 24]), Utc::now()).unwrap();
        assert!(sample.current_level.abs() < f64::EPSILON);
        assert!(sample.change_percent.is_finite());
    }

    #[test]
    fn upstream_timestamps_preserved_when_parallel() {
        let now = Utc::now();
        let ts: Vec<_> = (0..3).map(|i| now - Duration::hours(2 - i)).collect();
        let raw = RawSeries {
            timestamps: ts.clone(),
            values: vec![1.0, 2.0, 3.0],
        };
        let sample = build_sample(&raw, now).unwrap();
        assert_eq!(sample.timestamps, ts);
    }

    #[test]
    fn mismatched_timestamps_synthesized_hourly() {
        let now = Utc::now();
        let raw = RawSeries {
            timestamps: vec![now],
            values: vec![1.0, 2.0, 3.0],
        };
        let sample = build_sample(&raw, now).unwrap();
        assert_eq!(sample.timestamps.len(), 3);
        assert_eq!(sample.timestamps[2], now);
        assert_eq!(sample.timestamps[0], now - Duration::hours(2));
    }

    #[test]
    fn empty_series_is_none() {
        assert!(build_sample(&series(Vec::new()), Utc::now()).is_none());
    }
}
