//! Command-line timestamps.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use freetime_core::TimeWindow;

use crate::error::{ClientError, ClientResult};

/// Format used for display and preferred for input.
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

const ACCEPTED_FORMATS: [&str; 5] = [
    TIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const ACCEPTED_DATES: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// Parses `YYYY/MM/DD HH:MM`, an ISO-8601 local timestamp or a bare date
/// (midnight).
pub fn parse_timestamp(raw: &str) -> ClientResult<NaiveDateTime> {
    let raw = raw.trim();
    for format in ACCEPTED_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    for format in ACCEPTED_DATES {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err(ClientError::InvalidArgument(format!(
        "cannot parse '{}' as a timestamp, expected YYYY/MM/DD HH:MM",
        raw
    )))
}

/// Builds the query window. A missing start defaults to `today` 00:00 and a
/// missing end to the following midnight.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> ClientResult<TimeWindow> {
    let start = match start {
        Some(raw) => parse_timestamp(raw)?,
        None => today.and_time(NaiveTime::MIN),
    };
    let end = match end {
        Some(raw) => parse_timestamp(raw)?,
        None => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| ClientError::InvalidArgument("date out of range".to_string()))?
            .and_time(NaiveTime::MIN),
    };
    Ok(TimeWindow::new(start, end)?)
}
