//! Time types for availability queries.
//!
//! This module provides [`SlotGranularity`] (the quantum the availability
//! grid is cut into), [`round_to_slot`] for aligning arbitrary timestamps to
//! that quantum, and [`TimeWindow`] for the half-open range being queried.
//!
//! All timestamps are wall-clock values in the timezone the remote service is
//! asked to answer in, so they are carried as [`NaiveDateTime`].

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AvailabilityError, AvailabilityResult};

/// Length of one availability slot, in whole minutes.
///
/// Only lengths that tile an hour exactly are accepted (5, 6, 10, 12, 15, 20,
/// 30 or 60 minutes), so truncating the minute field is the same as aligning
/// to a multiple of the slot length from midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SlotGranularity(u32);

impl SlotGranularity {
    /// Smallest slot the remote service will produce.
    pub const MIN_MINUTES: u32 = 5;

    /// Largest slot that still divides an hour.
    pub const MAX_MINUTES: u32 = 60;

    /// Default slot length used when none is configured.
    pub const DEFAULT_MINUTES: u32 = 30;

    /// Creates a granularity of `minutes`, rejecting lengths that do not tile
    /// an hour.
    pub fn new(minutes: u32) -> AvailabilityResult<Self> {
        if !(Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(&minutes) || 60 % minutes != 0 {
            return Err(AvailabilityError::invalid_query(format!(
                "slot length must divide 60 and be between {} and {} minutes, got {}",
                Self::MIN_MINUTES,
                Self::MAX_MINUTES,
                minutes
            )));
        }
        Ok(Self(minutes))
    }

    /// Returns the slot length in minutes.
    pub fn minutes(self) -> u32 {
        self.0
    }

    /// Returns the slot length as a duration.
    pub fn as_duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

impl Default for SlotGranularity {
    fn default() -> Self {
        Self(Self::DEFAULT_MINUTES)
    }
}

impl TryFrom<u32> for SlotGranularity {
    type Error = AvailabilityError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<SlotGranularity> for u32 {
    fn from(granularity: SlotGranularity) -> Self {
        granularity.0
    }
}

impl fmt::Display for SlotGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// Truncates `timestamp` down to the start of the slot containing it.
///
/// Date and hour are preserved, the minute is floored to a multiple of the
/// slot length and seconds are discarded.
pub fn round_to_slot(timestamp: NaiveDateTime, granularity: SlotGranularity) -> NaiveDateTime {
    let step = granularity.minutes();
    let minute = (timestamp.minute() / step) * step;
    let time = NaiveTime::from_hms_opt(timestamp.hour(), minute, 0)
        .expect("hour and truncated minute are in range");
    timestamp.date().and_time(time)
}

/// A half-open `[start, end)` range of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: NaiveDateTime,
    /// End of the window (exclusive).
    pub end: NaiveDateTime,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = AvailabilityError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Creates a new time window, rejecting empty or inverted ranges.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> AvailabilityResult<Self> {
        if start >= end {
            return Err(AvailabilityError::invalid_query(format!(
                "window start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a window from a start time and a positive duration.
    pub fn from_duration(start: NaiveDateTime, duration: Duration) -> AvailabilityResult<Self> {
        Self::new(start, start + duration)
    }

    /// Returns this window with both ends rounded down to slot boundaries.
    ///
    /// Fails if rounding collapses the window (for example `09:10-09:20`
    /// with 30 minute slots).
    pub fn rounded(&self, granularity: SlotGranularity) -> AvailabilityResult<Self> {
        let start = round_to_slot(self.start, granularity);
        let end = round_to_slot(self.end, granularity);
        Self::new(start, end).map_err(|_| {
            AvailabilityError::invalid_query(format!(
                "window {} - {} is shorter than one {} slot once aligned",
                self.start, self.end, granularity
            ))
        })
    }

    /// Returns true if both ends sit on slot boundaries.
    pub fn is_aligned(&self, granularity: SlotGranularity) -> bool {
        round_to_slot(self.start, granularity) == self.start
            && round_to_slot(self.end, granularity) == self.end
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Number of whole slots in the window.
    pub fn slot_count(&self, granularity: SlotGranularity) -> usize {
        let minutes = self.duration().num_minutes();
        usize::try_from(minutes / i64::from(granularity.minutes())).unwrap_or(0)
    }

    /// Start of the slot at `index`, counted from the window start.
    pub fn slot_start(&self, index: usize, granularity: SlotGranularity) -> NaiveDateTime {
        self.start + Duration::minutes(index as i64 * i64::from(granularity.minutes()))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn slot(minutes: u32) -> SlotGranularity {
        SlotGranularity::new(minutes).unwrap()
    }

    mod granularity {
        use super::*;

        #[test]
        fn accepts_divisors_of_an_hour() {
            for minutes in [5, 6, 10, 12, 15, 20, 30, 60] {
                assert_eq!(slot(minutes).minutes(), minutes);
            }
        }

        #[test]
        fn rejects_other_lengths() {
            for minutes in [0, 1, 4, 7, 25, 45, 90, 1440] {
                assert!(matches!(
                    SlotGranularity::new(minutes),
                    Err(AvailabilityError::InvalidQuery { .. })
                ));
            }
        }

        #[test]
        fn serde_uses_plain_minutes() {
            let json = serde_json::to_string(&slot(15)).unwrap();
            assert_eq!(json, "15");
            let parsed: SlotGranularity = serde_json::from_str("30").unwrap();
            assert_eq!(parsed, slot(30));
            assert!(serde_json::from_str::<SlotGranularity>("7").is_err());
        }
    }

    mod rounding {
        use super::*;

        #[test]
        fn truncates_minutes_and_seconds() {
            assert_eq!(round_to_slot(at(9, 47, 31), slot(30)), at(9, 30, 0));
            assert_eq!(round_to_slot(at(9, 47, 31), slot(5)), at(9, 45, 0));
            assert_eq!(round_to_slot(at(9, 47, 31), slot(60)), at(9, 0, 0));
        }

        #[test]
        fn aligned_values_are_unchanged() {
            assert_eq!(round_to_slot(at(14, 30, 0), slot(30)), at(14, 30, 0));
            assert_eq!(round_to_slot(at(0, 0, 0), slot(15)), at(0, 0, 0));
        }

        #[test]
        fn drops_subsecond_precision() {
            let precise = at(11, 5, 0) + Duration::milliseconds(250);
            assert_eq!(round_to_slot(precise, slot(5)), at(11, 5, 0));
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn creation() {
            let window = TimeWindow::new(at(9, 0, 0), at(17, 0, 0)).unwrap();
            assert_eq!(window.duration(), Duration::hours(8));
            assert_eq!(window.slot_count(slot(30)), 16);
        }

        #[test]
        fn rejects_inverted_and_empty_ranges() {
            assert!(TimeWindow::new(at(17, 0, 0), at(9, 0, 0)).is_err());
            assert!(TimeWindow::new(at(9, 0, 0), at(9, 0, 0)).is_err());
        }

        #[test]
        fn rounded_aligns_both_ends() {
            let window = TimeWindow::new(at(9, 10, 12), at(10, 59, 59)).unwrap();
            let rounded = window.rounded(slot(30)).unwrap();
            assert_eq!(rounded.start, at(9, 0, 0));
            assert_eq!(rounded.end, at(10, 30, 0));
            assert!(rounded.is_aligned(slot(30)));
            assert!(!window.is_aligned(slot(30)));
            assert_eq!(rounded.slot_count(slot(30)), 3);
        }

        #[test]
        fn rounding_can_collapse_a_short_window() {
            let window = TimeWindow::new(at(9, 10, 0), at(9, 20, 0)).unwrap();
            assert!(matches!(
                window.rounded(slot(30)),
                Err(AvailabilityError::InvalidQuery { .. })
            ));
        }

        #[test]
        fn deserializing_checks_the_order() {
            let window: TimeWindow = serde_json::from_str(
                r#"{"start":"2025-02-05T09:00:00","end":"2025-02-05T10:00:00"}"#,
            )
            .unwrap();
            assert_eq!(window.start, at(9, 0, 0));
            assert!(
                serde_json::from_str::<TimeWindow>(
                    r#"{"start":"2025-02-05T10:00:00","end":"2025-02-05T09:00:00"}"#
                )
                .is_err()
            );
        }

        #[test]
        fn slot_starts_step_by_granularity() {
            let window = TimeWindow::new(at(9, 0, 0), at(10, 0, 0)).unwrap();
            assert_eq!(window.slot_start(0, slot(15)), at(9, 0, 0));
            assert_eq!(window.slot_start(3, slot(15)), at(9, 45, 0));
            assert_eq!(window.slot_start(4, slot(15)), window.end);
        }

        #[test]
        fn spans_midnight() {
            let start = at(23, 0, 0);
            let window = TimeWindow::from_duration(start, Duration::hours(2)).unwrap();
            assert_eq!(window.slot_count(slot(60)), 2);
            assert_eq!(window.slot_start(1, slot(60)).date(), start.date().succ_opt().unwrap());
        }
    }
}
