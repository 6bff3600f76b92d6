//! Per-attendee availability grids and free-interval merging.
//!
//! The remote service reports each attendee's schedule as one status code per
//! slot. [`AvailabilityGrid`] holds those sequences side by side, and
//! [`merge_free_intervals`] reduces them to the maximal runs of slots in which
//! every attendee is free.
//!
//! ```text
//! slot      09:00 09:30 10:00 10:30
//! alice       0     2     0     0
//! bob         0     0     1     0
//! empty?      ✓     ✗     ✗     ✓
//! result   [09:00-09:30)       [10:30-11:00)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AvailabilityError, AvailabilityResult};
use crate::time::{SlotGranularity, TimeWindow};

/// Status of one attendee during one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotStatus {
    /// Nothing scheduled.
    Free,
    /// A tentatively accepted meeting.
    Tentative,
    /// A confirmed meeting.
    Busy,
    /// The attendee is away.
    OutOfOffice,
    /// The attendee is working from another location.
    WorkingElsewhere,
    /// The service did not say.
    Unknown,
}

impl SlotStatus {
    /// Decodes one character of an availability view string.
    pub fn from_code(code: char) -> Self {
        match code {
            '0' => Self::Free,
            '1' => Self::Tentative,
            '2' => Self::Busy,
            '3' => Self::OutOfOffice,
            '4' => Self::WorkingElsewhere,
            _ => Self::Unknown,
        }
    }

    /// Returns the availability view character for this status.
    pub fn code(self) -> char {
        match self {
            Self::Free => '0',
            Self::Tentative => '1',
            Self::Busy => '2',
            Self::OutOfOffice => '3',
            Self::WorkingElsewhere => '4',
            Self::Unknown => '?',
        }
    }

    /// Only an explicit `Free` leaves the slot open; tentative and unknown
    /// slots count as occupied.
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }
}

/// Decodes a whole availability view string, one status per character.
pub fn decode_view(view: &str) -> Vec<SlotStatus> {
    view.chars().map(SlotStatus::from_code).collect()
}

/// Slot statuses for every attendee of one query, keyed by attendee address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityGrid {
    rows: BTreeMap<String, Vec<SlotStatus>>,
}

impl AvailabilityGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a grid from `(attendee, availability view)` pairs, checking that
    /// every view covers exactly `expected_slots` slots.
    pub fn from_views<I, K, V>(views: I, expected_slots: usize) -> AvailabilityResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut grid = Self::new();
        for (attendee, view) in views {
            grid.insert(attendee, decode_view(view.as_ref()));
        }
        grid.check_slot_count(expected_slots)?;
        Ok(grid)
    }

    /// Inserts or replaces an attendee's row.
    pub fn insert(&mut self, attendee: impl Into<String>, statuses: Vec<SlotStatus>) {
        self.rows.insert(attendee.into(), statuses);
    }

    /// Returns the status row for `attendee`, if present.
    pub fn statuses(&self, attendee: &str) -> Option<&[SlotStatus]> {
        self.rows.get(attendee).map(Vec::as_slice)
    }

    /// Iterates attendee addresses in sorted order.
    pub fn attendees(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of attendees in the grid.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the grid has no attendees.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fails with `MalformedResponse` unless every row has `expected` slots.
    pub fn check_slot_count(&self, expected: usize) -> AvailabilityResult<()> {
        for (attendee, row) in &self.rows {
            if row.len() != expected {
                return Err(AvailabilityError::malformed(format!(
                    "availability for {} covers {} slots, expected {}",
                    attendee,
                    row.len(),
                    expected
                )));
            }
        }
        Ok(())
    }

    /// True when every attendee is free at `index`.
    fn slot_is_empty(&self, index: usize) -> bool {
        self.rows
            .values()
            .all(|row| row.get(index).is_some_and(|status| status.is_free()))
    }
}

/// A maximal run of slots in which every attendee is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreeInterval {
    /// First free instant (inclusive, slot aligned).
    pub from: NaiveDateTime,
    /// End of the run (exclusive, slot aligned).
    pub to: NaiveDateTime,
}

impl FreeInterval {
    /// Length of the interval.
    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

impl fmt::Display for FreeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.from, self.to)
    }
}

/// Reduces `grid` to the ordered list of intervals in which all attendees are
/// free.
///
/// The window must already be aligned to `granularity` and every row must
/// cover exactly the window's slots. An empty grid is rejected: occupancy
/// cannot be decided without at least one attendee.
pub fn merge_free_intervals(
    grid: &AvailabilityGrid,
    window: &TimeWindow,
    granularity: SlotGranularity,
) -> AvailabilityResult<Vec<FreeInterval>> {
    if grid.is_empty() {
        return Err(AvailabilityError::invalid_query(
            "at least one attendee is required to merge availability",
        ));
    }
    if !window.is_aligned(granularity) {
        return Err(AvailabilityError::invalid_query(format!(
            "window {} is not aligned to {} slots",
            window, granularity
        )));
    }

    let slots = window.slot_count(granularity);
    grid.check_slot_count(slots)?;

    let mut intervals = Vec::new();
    let mut run_start: Option<usize> = None;

    for index in 0..slots {
        match (grid.slot_is_empty(index), run_start) {
            (true, None) => run_start = Some(index),
            (false, Some(start)) => {
                intervals.push(FreeInterval {
                    from: window.slot_start(start, granularity),
                    to: window.slot_start(index, granularity),
                });
                run_start = None;
            }
            _ => {}
        }
    }

    if let Some(start) = run_start {
        intervals.push(FreeInterval {
            from: window.slot_start(start, granularity),
            to: window.end,
        });
    }

    debug!(
        attendees = grid.len(),
        slots,
        intervals = intervals.len(),
        "merged availability grid"
    );
    Ok(intervals)
}
