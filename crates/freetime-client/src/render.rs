//! Markdown and CSV tables for command output.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use freetime_core::FreeInterval;
use freetime_graph::{CalendarEvent, Person, UserProfile};

use crate::timestamp::TIME_FORMAT;

/// Table output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Pipe table.
    #[default]
    Markdown,
    /// Comma-separated values with a header row.
    Csv,
}

/// A header row and data rows of equal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push(&mut self, row: Vec<String>) {
        let mut row = row;
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Markdown => self.to_markdown(),
            OutputFormat::Csv => self.to_csv(),
        }
    }

    fn to_markdown(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| cell(&r[i]).chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(3)
            })
            .collect();

        let line = |cells: Vec<String>| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect();
            format!("| {} |", padded.join(" | "))
        };

        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(line(self.headers.clone()));
        out.push(format!(
            "|{}|",
            widths
                .iter()
                .map(|w| "-".repeat(w + 2))
                .collect::<Vec<_>>()
                .join("|")
        ));
        for row in &self.rows {
            out.push(line(row.iter().map(|c| cell(c)).collect()));
        }
        out.join("\n")
    }

    fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.headers).chain(&self.rows) {
            let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

/// Markdown cells cannot hold pipes or line breaks.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Free intervals with their length in minutes.
pub fn intervals_table(intervals: &[FreeInterval]) -> Table {
    let mut table = Table::new(["from", "to", "minutes"]);
    for interval in intervals {
        table.push(vec![
            interval.from.format(TIME_FORMAT).to_string(),
            interval.to.format(TIME_FORMAT).to_string(),
            interval.duration().num_minutes().to_string(),
        ]);
    }
    table
}

/// One field per row, like a transposed record.
pub fn profile_table(profile: &UserProfile) -> Table {
    let mut table = Table::new(["field", "value"]);
    let fields = [
        ("id", Some(profile.id.clone())),
        ("displayName", profile.display_name.clone()),
        ("mail", profile.mail.clone()),
        ("mobilePhone", profile.mobile_phone.clone()),
        ("officeLocation", profile.office_location.clone()),
        ("jobTitle", profile.job_title.clone()),
    ];
    for (name, value) in fields {
        table.push(vec![name.to_string(), value.unwrap_or_default()]);
    }
    table
}

pub fn people_table(people: &[Person]) -> Table {
    let mut table = Table::new(["id", "displayName", "userPrincipalName", "companyName"]);
    for person in people {
        table.push(vec![
            person.id.clone(),
            opt(&person.display_name),
            opt(&person.user_principal_name),
            opt(&person.company_name),
        ]);
    }
    table
}

/// Summary columns, or every column with `detail`.
pub fn events_table(events: &[CalendarEvent], detail: bool) -> Table {
    let mut headers = vec!["subject", "locations", "start", "end"];
    if detail {
        headers.extend([
            "isAllDay",
            "isCancelled",
            "isOrganizer",
            "organizer",
            "attendees",
            "webLink",
            "onlineMeetingUrl",
        ]);
    }
    let mut table = Table::new(headers);
    for event in events {
        let mut row = vec![
            event.subject.clone(),
            event.locations.join("; "),
            event.start.format(TIME_FORMAT).to_string(),
            event.end.format(TIME_FORMAT).to_string(),
        ];
        if detail {
            row.extend([
                event.is_all_day.to_string(),
                event.is_cancelled.to_string(),
                event.is_organizer.to_string(),
                opt(&event.organizer),
                event.attendees.join("; "),
                opt(&event.web_link),
                opt(&event.online_meeting_url),
            ]);
        }
        table.push(row);
    }
    table
}
