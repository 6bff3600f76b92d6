//! The `getSchedule` availability request and its response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use freetime_core::{AvailabilityGrid, SlotGranularity, TimeWindow, is_me, resolve_attendees};

use crate::error::{GraphError, GraphResult};

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One availability request: who, when, and at what resolution.
///
/// Attendees are resolved to full addresses and the window is rounded to the
/// slot length at construction, so every grid this query parses lines up
/// slot for slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    attendees: Vec<String>,
    window: TimeWindow,
    granularity: SlotGranularity,
}

impl AvailabilityQuery {
    /// Resolves `attendees` against `default_domain` and rounds `window`.
    ///
    /// Fails with `InvalidQuery` before any request is made if the attendee
    /// list is empty, a bare name cannot be qualified, or the window collapses
    /// once rounded.
    pub fn new<'a, I>(
        attendees: I,
        window: TimeWindow,
        granularity: SlotGranularity,
        default_domain: Option<&str>,
    ) -> GraphResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let attendees = resolve_attendees(attendees, default_domain)?;
        let window = window.rounded(granularity)?;
        Ok(Self {
            attendees,
            window,
            granularity,
        })
    }

    /// Resolved attendee addresses, in request order.
    pub fn attendees(&self) -> &[String] {
        &self.attendees
    }

    /// The rounded window.
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn granularity(&self) -> SlotGranularity {
        self.granularity
    }

    /// Slots every availability view must cover.
    pub fn slot_count(&self) -> usize {
        self.window.slot_count(self.granularity)
    }

    /// Request body, with times expressed in `timezone`.
    pub fn body(&self, timezone: &str) -> ScheduleRequest {
        ScheduleRequest {
            schedules: self.attendees.clone(),
            start_time: ApiDateTimeZone {
                date_time: self.window.start.format(DATE_TIME_FORMAT).to_string(),
                time_zone: timezone.to_string(),
            },
            end_time: ApiDateTimeZone {
                date_time: self.window.end.format(DATE_TIME_FORMAT).to_string(),
                time_zone: timezone.to_string(),
            },
            availability_view_interval: self.granularity.minutes(),
        }
    }

    /// Decodes a `getSchedule` answer into a grid keyed by schedule id.
    ///
    /// Every requested attendee must come back with a view of exactly
    /// [`slot_count`](Self::slot_count) characters. The `me` sentinel comes
    /// back under the signed-in user's address, so only its count is checked.
    pub fn parse(&self, value: Value) -> GraphResult<AvailabilityGrid> {
        let response: ApiScheduleResponse = serde_json::from_value(value)
            .map_err(|e| GraphError::malformed(format!("invalid schedule response: {}", e)))?;

        if response.value.len() != self.attendees.len() {
            return Err(GraphError::malformed(format!(
                "schedule response has {} entries for {} attendees",
                response.value.len(),
                self.attendees.len()
            )));
        }

        for attendee in self.attendees.iter().filter(|a| !is_me(a)) {
            let present = response
                .value
                .iter()
                .any(|item| item.schedule_id.eq_ignore_ascii_case(attendee));
            if !present {
                return Err(GraphError::malformed(format!(
                    "schedule response has no entry for {}",
                    attendee
                )));
            }
        }

        let mut views = Vec::with_capacity(response.value.len());
        for item in response.value {
            match (item.availability_view, item.error) {
                (Some(view), _) => views.push((item.schedule_id, view)),
                (None, Some(error)) => {
                    warn!(attendee = %item.schedule_id, "schedule lookup failed");
                    return Err(GraphError::malformed(format!(
                        "schedule for {} failed: {}",
                        item.schedule_id,
                        error.message.unwrap_or_else(|| "unknown error".to_string())
                    )));
                }
                (None, None) => {
                    return Err(GraphError::malformed(format!(
                        "schedule for {} has no availability view",
                        item.schedule_id
                    )));
                }
            }
        }

        let grid = AvailabilityGrid::from_views(views, self.slot_count())?;
        debug!(
            attendees = grid.len(),
            slots = self.slot_count(),
            "parsed schedule response"
        );
        Ok(grid)
    }
}

/// Body of `POST {subject}/calendar/getSchedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub schedules: Vec<String>,
    pub start_time: ApiDateTimeZone,
    pub end_time: ApiDateTimeZone,
    pub availability_view_interval: u32,
}

/// Graph `dateTimeTimeZone` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDateTimeZone {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: String,
}

#[derive(Debug, Deserialize)]
struct ApiScheduleResponse {
    value: Vec<ApiScheduleItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScheduleItem {
    schedule_id: String,
    #[serde(default)]
    availability_view: Option<String>,
    #[serde(default)]
    error: Option<ApiScheduleError>,
}

#[derive(Debug, Deserialize)]
struct ApiScheduleError {
    #[serde(default)]
    message: Option<String>,
}
