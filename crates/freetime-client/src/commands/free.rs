//! The `free` command: intervals in which every attendee is free.

use chrono::Local;
use tracing::debug;

use freetime_core::{SlotGranularity, parse_attendees};
use freetime_graph::{FreeTime, GraphContext};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::render::{OutputFormat, intervals_table};
use crate::timestamp::resolve_window;

/// Arguments of `freetime free`, unresolved.
#[derive(Debug, Clone, Default)]
pub struct FreeArgs {
    pub attendees: Vec<String>,
    pub organizer: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub slot: Option<u32>,
}

/// Renders the answer, telling "no data" apart from "no free time".
pub fn render(free: &FreeTime, format: OutputFormat) -> String {
    match free {
        FreeTime::NoData => "No availability data found.".to_string(),
        FreeTime::Intervals(intervals) if intervals.is_empty() => {
            "No free time found.".to_string()
        }
        FreeTime::Intervals(intervals) => intervals_table(intervals).render(format),
    }
}

/// Resolves the arguments against `config` and runs the availability query.
pub async fn find(
    context: &GraphContext,
    config: &ClientConfig,
    args: FreeArgs,
) -> ClientResult<FreeTime> {
    let attendees = parse_attendees(&args.attendees.join(","));
    if attendees.is_empty() {
        return Err(ClientError::InvalidArgument(
            "at least one attendee is required".to_string(),
        ));
    }
    let organizer = args
        .organizer
        .unwrap_or_else(|| config.schedule.organizer.clone());
    let granularity = match args.slot {
        Some(minutes) => SlotGranularity::new(minutes)?,
        None => config.slot().map_err(ClientError::Config)?,
    };
    let window = resolve_window(
        args.start.as_deref(),
        args.end.as_deref(),
        Local::now().date_naive(),
    )?;
    debug!(%organizer, attendees = attendees.len(), %window, "looking for free time");

    Ok(context
        .find_free_intervals(&organizer, &attendees, window, granularity)
        .await?)
}

/// Runs `freetime free` and prints the result.
pub async fn run(
    context: &GraphContext,
    config: &ClientConfig,
    args: FreeArgs,
    format: OutputFormat,
) -> ClientResult<()> {
    let free = find(context, config, args).await?;
    println!("{}", render(&free, format));
    Ok(())
}
