use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{Result, StationsError};
use crate::model::AttendanceSample;

/// Last valid hour of the day.
pub const LAST_HOUR: u8 = 23;

/// Attendance summary for one station over the fetched period.
///
/// Every field is zero when the station reported no samples.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    pub total_attendance: u64,
    pub days_count: u32,

    // peak and trough, summed across days
    pub max_load_hour: u8,
    pub max_load_hour_attendance: u64,
    pub min_load_hour: u8,
    pub min_load_hour_attendance: u64,

    pub avg_load_by_hour: u64,
}

impl AttendanceStats {
    /// Computes the summary for `samples` recorded within `[opens_at_hour, closes_at_hour)`.
    ///
    /// Samples are grouped by hour in ascending order, so when several hours
    /// share the peak (or trough) value the earliest one is reported. Samples
    /// with an hour past [`LAST_HOUR`] are dropped before grouping.
    ///
    /// # Errors
    ///
    /// [`StationsError::InvalidWindow`] if the station does not open before it
    /// closes, and [`StationsError::DivisionUndefined`] if there are samples but
    /// fewer than one full day of them.
    pub fn compute(samples: &[AttendanceSample], opens_at_hour: u8, closes_at_hour: u8) -> Result<Self> {
        if closes_at_hour <= opens_at_hour {
            return Err(StationsError::InvalidWindow {
                opens: opens_at_hour,
                closes: closes_at_hour,
            });
        }

        let samples: Vec<AttendanceSample> = samples
            .iter()
            .copied()
            .filter(|s| {
                if s.hour > LAST_HOUR {
                    warn!(hour = s.hour, attendance = s.attendance, "Dropping sample with out-of-range hour");
                    return false;
                }
                true
            })
            .collect();

        if samples.is_empty() {
            return Ok(Self::default());
        }

        let hours_per_day = closes_at_hour - opens_at_hour;
        let days_count = samples.len() / hours_per_day as usize;

        let mut per_hour: BTreeMap<u8, u64> = BTreeMap::new();
        for s in &samples {
            *per_hour.entry(s.hour).or_default() += s.attendance;
        }

        let mut stats = AttendanceStats {
            days_count: days_count as u32,
            ..Default::default()
        };
        let mut max: Option<(u8, u64)> = None;
        let mut min: Option<(u8, u64)> = None;

        for (&hour, &sum) in &per_hour {
            if max.is_none_or(|(_, m)| sum > m) {
                max = Some((hour, sum));
            }
            if min.is_none_or(|(_, m)| sum < m) {
                min = Some((hour, sum));
            }
            stats.total_attendance += sum;
        }

        if let Some((hour, sum)) = max {
            stats.max_load_hour = hour;
            stats.max_load_hour_attendance = sum;
        }
        if let Some((hour, sum)) = min {
            stats.min_load_hour = hour;
            stats.min_load_hour_attendance = sum;
        }

        if days_count == 0 {
            return Err(StationsError::DivisionUndefined {
                samples: samples.len(),
                hours_per_day,
            });
        }

        // Gap hours still count towards the denominator.
        stats.avg_load_by_hour = stats.total_attendance / (days_count as u64 * hours_per_day as u64);

        Ok(stats)
    }

    pub fn is_empty(&self) -> bool {
        self.days_count == 0 && self.total_attendance == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(pairs: &[(u8, u64)]) -> Vec<AttendanceSample> {
        pairs.iter().map(|&(h, a)| AttendanceSample::new(h, a)).collect()
    }

    #[test]
    fn test_single_day_summary() {
        let stats = AttendanceStats::compute(&samples(&[(8, 100), (9, 200), (10, 50)]), 8, 11).unwrap();

        assert_eq!(stats.days_count, 1);
        assert_eq!(stats.total_attendance, 350);
        assert_eq!(stats.max_load_hour, 9);
        assert_eq!(stats.max_load_hour_attendance, 200);
        assert_eq!(stats.min_load_hour, 10);
        assert_eq!(stats.min_load_hour_attendance, 50);
        assert_eq!(stats.avg_load_by_hour, 116);
    }

    #[test]
    fn test_empty_samples_are_zeroed() {
        let stats = AttendanceStats::compute(&[], 8, 20).unwrap();

        assert_eq!(stats, AttendanceStats::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_invalid_window() {
        let err = AttendanceStats::compute(&samples(&[(8, 1)]), 20, 8).unwrap_err();
        assert!(matches!(err, StationsError::InvalidWindow { opens: 20, closes: 8 }));

        let err = AttendanceStats::compute(&[], 8, 8).unwrap_err();
        assert!(matches!(err, StationsError::InvalidWindow { .. }));
    }

    #[test]
    fn test_ties_pick_lowest_hour() {
        // listed out of order on purpose
        let stats = AttendanceStats::compute(&samples(&[(10, 5), (9, 10), (8, 10)]), 8, 11).unwrap();

        assert_eq!(stats.max_load_hour, 8);
        assert_eq!(stats.max_load_hour_attendance, 10);
        assert_eq!(stats.min_load_hour, 10);

        let flat = AttendanceStats::compute(&samples(&[(8, 7), (9, 7), (10, 7)]), 8, 11).unwrap();
        assert_eq!(flat.max_load_hour, 8);
        assert_eq!(flat.min_load_hour, 8);
    }

    #[test]
    fn test_hours_summed_across_days() {
        let data = samples(&[(8, 10), (9, 30), (8, 50), (9, 5)]);
        let stats = AttendanceStats::compute(&data, 8, 10).unwrap();

        assert_eq!(stats.days_count, 2);
        assert_eq!(stats.max_load_hour, 8);
        assert_eq!(stats.max_load_hour_attendance, 60);
        assert_eq!(stats.min_load_hour, 9);
        assert_eq!(stats.min_load_hour_attendance, 35);
        assert_eq!(stats.total_attendance, 95);
        assert_eq!(stats.avg_load_by_hour, 95 / 4);
    }

    #[test]
    fn test_total_matches_sample_sum() {
        let data: Vec<_> = (0..3)
            .flat_map(|day| (8..20).map(move |h| AttendanceSample::new(h, (day * 7 + h as u64 * 3) % 41)))
            .collect();
        let stats = AttendanceStats::compute(&data, 8, 20).unwrap();

        let expected: u64 = data.iter().map(|s| s.attendance).sum();
        assert_eq!(stats.total_attendance, expected);
        assert_eq!(stats.days_count, 3);
        assert_eq!(stats.avg_load_by_hour, expected / 36);
    }

    #[test]
    fn test_partial_day_is_division_fault() {
        let err = AttendanceStats::compute(&samples(&[(8, 1), (9, 2)]), 8, 11).unwrap_err();
        assert!(matches!(
            err,
            StationsError::DivisionUndefined { samples: 2, hours_per_day: 3 }
        ));
    }

    #[test]
    fn test_out_of_range_hours_are_dropped() {
        let stats = AttendanceStats::compute(&samples(&[(8, 10), (9, 20), (99, 500), (10, 30)]), 8, 11).unwrap();

        assert_eq!(stats.max_load_hour, 10);
        assert_eq!(stats.max_load_hour_attendance, 30);
        assert_eq!(stats.total_attendance, 60);
        assert_eq!(stats.days_count, 1);

        let only_bad = AttendanceStats::compute(&samples(&[(24, 5)]), 8, 11).unwrap();
        assert!(only_bad.is_empty());
    }

    #[test]
    fn test_gap_hours_stay_in_denominator() {
        // one day of a 3-hour window, hour 9 missing, plus a stray extra sample
        let stats = AttendanceStats::compute(&samples(&[(8, 30), (10, 30), (10, 0)]), 8, 11).unwrap();

        assert_eq!(stats.days_count, 1);
        assert_eq!(stats.total_attendance, 60);
        assert_eq!(stats.avg_load_by_hour, 20);
    }
}
