//! Every Graph resource freetime reads, as one tagged enum.
//!
//! Each [`QueryKind`] variant knows its endpoint, how to build the request
//! and how to turn the answer into a typed [`QueryOutput`]. A 404 from the
//! service maps to the variant's empty output.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use freetime_core::{AvailabilityGrid, ME, TimeWindow, is_me};

use crate::error::{GraphError, GraphResult};
use crate::request::{FetchResponse, RequestSpec};
use crate::schedule::{ApiDateTimeZone, AvailabilityQuery};

const QUERY_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Path prefix for the organizer: `me`, or `users/{id}` percent-encoded.
pub fn subject_path(organizer: &str) -> GraphResult<String> {
    let organizer = organizer.trim();
    if organizer.is_empty() {
        return Err(GraphError::invalid_query("organizer identifier is empty"));
    }
    if is_me(organizer) {
        return Ok(ME.to_string());
    }
    Ok(format!("users/{}", urlencoding::encode(organizer)))
}

/// A remote resource and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// `GET {subject}`
    Profile,
    /// `GET {subject}/people`
    People { top: u32 },
    /// `GET {subject}/calendarView`
    CalendarView { window: TimeWindow, top: u32 },
    /// `POST {subject}/calendar/getSchedule`
    Schedule(AvailabilityQuery),
}

/// Typed result of a [`QueryKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Profile(Option<UserProfile>),
    People(Vec<Person>),
    Events(Vec<CalendarEvent>),
    Schedule(AvailabilityGrid),
}

impl QueryKind {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::People { .. } => "people",
            Self::CalendarView { .. } => "calendar_view",
            Self::Schedule(_) => "schedule",
        }
    }

    /// Builds the request for `organizer`, answered in `timezone`.
    pub fn request(&self, organizer: &str, timezone: &str) -> GraphResult<RequestSpec> {
        let subject = subject_path(organizer)?;
        let spec = match self {
            Self::Profile => RequestSpec::get(subject, timezone),
            Self::People { top } => RequestSpec::get(format!("{}/people", subject), timezone)
                .with_query("$top", top.to_string()),
            Self::CalendarView { window, top } => {
                RequestSpec::get(format!("{}/calendarView", subject), timezone)
                    .with_query(
                        "startDateTime",
                        window.start.format(QUERY_DATE_TIME_FORMAT).to_string(),
                    )
                    .with_query(
                        "endDateTime",
                        window.end.format(QUERY_DATE_TIME_FORMAT).to_string(),
                    )
                    .with_query("$top", top.to_string())
            }
            Self::Schedule(query) => {
                let body = serde_json::to_value(query.body(timezone)).map_err(|e| {
                    GraphError::invalid_query(format!("failed to encode schedule request: {}", e))
                })?;
                RequestSpec::post(format!("{}/calendar/getSchedule", subject), body, timezone)
            }
        };
        Ok(spec)
    }

    /// Output used when the service reports the resource as absent.
    pub fn empty_output(&self) -> QueryOutput {
        match self {
            Self::Profile => QueryOutput::Profile(None),
            Self::People { .. } => QueryOutput::People(Vec::new()),
            Self::CalendarView { .. } => QueryOutput::Events(Vec::new()),
            Self::Schedule(_) => QueryOutput::Schedule(AvailabilityGrid::new()),
        }
    }

    /// Turns a fetch result into this kind's output.
    pub fn parse(&self, response: FetchResponse) -> GraphResult<QueryOutput> {
        let value = match response {
            FetchResponse::NotFound => {
                debug!(query = self.name(), "resource not found, returning empty output");
                return Ok(self.empty_output());
            }
            FetchResponse::Found(value) => value,
        };

        match self {
            Self::Profile => {
                let user: ApiUser = decode(value, self.name())?;
                Ok(QueryOutput::Profile(Some(user.into())))
            }
            Self::People { .. } => {
                let list: ApiList<ApiPerson> = decode(value, self.name())?;
                let mut people: Vec<Person> = list.value.into_iter().map(Person::from).collect();
                people.sort_by(|a, b| {
                    (a.surname.is_none(), &a.surname).cmp(&(b.surname.is_none(), &b.surname))
                });
                Ok(QueryOutput::People(people))
            }
            Self::CalendarView { .. } => {
                let list: ApiList<ApiEvent> = decode(value, self.name())?;
                let mut events = list
                    .value
                    .into_iter()
                    .map(CalendarEvent::try_from)
                    .collect::<GraphResult<Vec<_>>>()?;
                events.sort_by_key(|e| e.start);
                Ok(QueryOutput::Events(events))
            }
            Self::Schedule(query) => Ok(QueryOutput::Schedule(query.parse(value)?)),
        }
    }
}

impl QueryOutput {
    pub fn into_profile(self) -> Option<Option<UserProfile>> {
        match self {
            Self::Profile(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn into_people(self) -> Option<Vec<Person>> {
        match self {
            Self::People(people) => Some(people),
            _ => None,
        }
    }

    pub fn into_events(self) -> Option<Vec<CalendarEvent>> {
        match self {
            Self::Events(events) => Some(events),
            _ => None,
        }
    }

    pub fn into_schedule(self) -> Option<AvailabilityGrid> {
        match self {
            Self::Schedule(grid) => Some(grid),
            _ => None,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, query: &str) -> GraphResult<T> {
    serde_json::from_value(value)
        .map_err(|e| GraphError::malformed(format!("invalid {} response: {}", query, e)))
}

/// The signed-in user or a looked-up user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub mail: Option<String>,
    pub mobile_phone: Option<String>,
    pub office_location: Option<String>,
    pub job_title: Option<String>,
}

/// A person relevant to the subject, from the people API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: String,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub user_principal_name: Option<String>,
    pub company_name: Option<String>,
}

/// A calendar entry from the calendar view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub subject: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_all_day: bool,
    pub is_cancelled: bool,
    pub is_organizer: bool,
    pub locations: Vec<String>,
    pub attendees: Vec<String>,
    pub organizer: Option<String>,
    pub web_link: Option<String>,
    pub online_meeting_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiList<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUser {
    #[serde(default)]
    id: String,
    display_name: Option<String>,
    mail: Option<String>,
    mobile_phone: Option<String>,
    office_location: Option<String>,
    job_title: Option<String>,
}

impl From<ApiUser> for UserProfile {
    fn from(user: ApiUser) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            mail: user.mail,
            mobile_phone: user.mobile_phone,
            office_location: user.office_location,
            job_title: user.job_title,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPerson {
    #[serde(default)]
    id: String,
    display_name: Option<String>,
    given_name: Option<String>,
    surname: Option<String>,
    user_principal_name: Option<String>,
    company_name: Option<String>,
}

impl From<ApiPerson> for Person {
    fn from(person: ApiPerson) -> Self {
        Self {
            id: person.id,
            display_name: person.display_name,
            given_name: person.given_name,
            surname: person.surname,
            user_principal_name: person.user_principal_name,
            company_name: person.company_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    subject: Option<String>,
    start: ApiDateTimeZone,
    end: ApiDateTimeZone,
    #[serde(default)]
    is_all_day: bool,
    #[serde(default)]
    is_cancelled: bool,
    #[serde(default)]
    is_organizer: bool,
    #[serde(default)]
    locations: Vec<ApiLocation>,
    #[serde(default)]
    attendees: Vec<ApiRecipient>,
    organizer: Option<ApiRecipient>,
    web_link: Option<String>,
    online_meeting_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLocation {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRecipient {
    email_address: ApiEmailAddress,
}

#[derive(Debug, Deserialize)]
struct ApiEmailAddress {
    name: Option<String>,
    address: Option<String>,
}

impl ApiRecipient {
    fn label(self) -> Option<String> {
        self.email_address.name.or(self.email_address.address)
    }
}

impl TryFrom<ApiEvent> for CalendarEvent {
    type Error = GraphError;

    fn try_from(event: ApiEvent) -> GraphResult<Self> {
        Ok(Self {
            subject: event.subject.unwrap_or_default(),
            start: parse_date_time(&event.start.date_time)?,
            end: parse_date_time(&event.end.date_time)?,
            is_all_day: event.is_all_day,
            is_cancelled: event.is_cancelled,
            is_organizer: event.is_organizer,
            locations: event
                .locations
                .into_iter()
                .filter_map(|l| l.display_name)
                .filter(|l| !l.is_empty())
                .collect(),
            attendees: event
                .attendees
                .into_iter()
                .filter_map(ApiRecipient::label)
                .collect(),
            organizer: event.organizer.and_then(ApiRecipient::label),
            web_link: event.web_link,
            online_meeting_url: event.online_meeting_url,
        })
    }
}

/// Graph sends up to seven fractional digits (`2025-02-05T09:00:00.0000000`).
fn parse_date_time(raw: &str) -> GraphResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| GraphError::malformed(format!("invalid dateTime '{}': {}", raw, e)))
}
