//! The explicit context every Graph operation runs against.

use tracing::{debug, info};

use freetime_core::{
    AvailabilityGrid, FreeInterval, SlotGranularity, TimeWindow, merge_free_intervals,
};

use crate::config::GraphConfig;
use crate::credential::CredentialStore;
use crate::error::{GraphError, GraphResult};
use crate::fetcher::ResilientFetcher;
use crate::oauth::OAuthClient;
use crate::query::{CalendarEvent, Person, QueryKind, QueryOutput, UserProfile};
use crate::schedule::AvailabilityQuery;

/// Settings, HTTP client and credential store, built once at startup.
#[derive(Debug, Clone)]
pub struct GraphContext {
    config: GraphConfig,
    fetcher: ResilientFetcher,
}

impl GraphContext {
    /// Validates `config` and builds the HTTP plumbing.
    pub fn new(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("freetime/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GraphError::configuration("failed to create HTTP client").with_source(e))?;

        let oauth = OAuthClient::new(http.clone(), config.token_url()?, config.scope_string());
        let store = CredentialStore::new(config.credential_path.clone(), oauth);
        let fetcher = ResilientFetcher::new(http, config.graph_root_url()?, store);

        debug!(
            graph_root = %config.graph_root,
            timezone = %config.timezone,
            credential = %config.credential_path.display(),
            "graph context ready"
        );
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// The credential store, for writing a fresh record.
    pub fn credentials(&self) -> &CredentialStore {
        self.fetcher.store()
    }

    /// Runs one query for `organizer`.
    pub async fn run(&self, organizer: &str, kind: &QueryKind) -> GraphResult<QueryOutput> {
        let spec = kind.request(organizer, &self.config.timezone)?;
        let response = self.fetcher.fetch(&spec).await?;
        kind.parse(response)
    }

    /// Profile of `organizer`, or `None` if the user does not exist.
    pub async fn profile(&self, organizer: &str) -> GraphResult<Option<UserProfile>> {
        let kind = QueryKind::Profile;
        let output = self.run(organizer, &kind).await?;
        output.into_profile().ok_or_else(|| unexpected(&kind))
    }

    /// People related to `organizer`, sorted by surname.
    pub async fn people(&self, organizer: &str) -> GraphResult<Vec<Person>> {
        let kind = QueryKind::People {
            top: self.config.page_size,
        };
        let output = self.run(organizer, &kind).await?;
        output.into_people().ok_or_else(|| unexpected(&kind))
    }

    /// Events of `organizer` overlapping `window`, sorted by start.
    pub async fn calendar_view(
        &self,
        organizer: &str,
        window: TimeWindow,
    ) -> GraphResult<Vec<CalendarEvent>> {
        let kind = QueryKind::CalendarView {
            window,
            top: self.config.page_size,
        };
        let output = self.run(organizer, &kind).await?;
        output.into_events().ok_or_else(|| unexpected(&kind))
    }

    /// Availability grid of `attendees` over `window`.
    ///
    /// Returns the grid together with the rounded window it covers. The grid
    /// is empty when the service reports the schedule as not found.
    pub async fn query_availability(
        &self,
        organizer: &str,
        attendees: &[String],
        window: TimeWindow,
        granularity: SlotGranularity,
    ) -> GraphResult<(AvailabilityGrid, TimeWindow)> {
        let query = AvailabilityQuery::new(
            attendees.iter().map(String::as_str),
            window,
            granularity,
            self.config.default_domain.as_deref(),
        )?;
        let rounded = *query.window();
        let kind = QueryKind::Schedule(query);
        let output = self.run(organizer, &kind).await?;
        let grid = output.into_schedule().ok_or_else(|| unexpected(&kind))?;
        Ok((grid, rounded))
    }

    /// Intervals in which every attendee is free, or [`FreeTime::NoData`]
    /// when the service has no schedule for the query.
    pub async fn find_free_intervals(
        &self,
        organizer: &str,
        attendees: &[String],
        window: TimeWindow,
        granularity: SlotGranularity,
    ) -> GraphResult<FreeTime> {
        let (grid, rounded) = self
            .query_availability(organizer, attendees, window, granularity)
            .await?;
        if grid.is_empty() {
            info!("no availability data found");
            return Ok(FreeTime::NoData);
        }
        let intervals = merge_free_intervals(&grid, &rounded, granularity)?;
        info!(
            attendees = grid.len(),
            intervals = intervals.len(),
            window = %rounded,
            "computed free intervals"
        );
        Ok(FreeTime::Intervals(intervals))
    }
}

/// Answer of [`GraphContext::find_free_intervals`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreeTime {
    /// The schedule was not found.
    NoData,
    /// Free intervals in start order, possibly none.
    Intervals(Vec<FreeInterval>),
}

impl FreeTime {
    /// The intervals, empty for [`FreeTime::NoData`].
    pub fn intervals(&self) -> &[FreeInterval] {
        match self {
            Self::NoData => &[],
            Self::Intervals(intervals) => intervals,
        }
    }
}

fn unexpected(kind: &QueryKind) -> GraphError {
    GraphError::malformed(format!("{} query produced a different output kind", kind.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use crate::error::GraphErrorCode;
    use chrono::{NaiveDate, NaiveDateTime};
    use mockito::Matcher;
    use tempfile::TempDir;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn context(server: &mockito::Server, dir: &TempDir) -> GraphContext {
        let config = GraphConfig::new()
            .with_authority(server.url())
            .with_graph_root(format!("{}/v1.0/", server.url()))
            .with_credential_path(dir.path().join("credential.json"))
            .with_default_domain("example.com")
            .with_timezone("Asia/Tokyo");
        let context = GraphContext::new(config).unwrap();
        context
            .credentials()
            .save(&Credential::new("token").with_refresh_token("r").with_client("id", "s"))
            .unwrap();
        context
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GraphConfig::new().with_scopes(vec![]);
        let err = GraphContext::new(config).unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn free_intervals_for_two_attendees() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let ctx = context(&server, &dir);
        let mock = server
            .mock("POST", "/v1.0/me/calendar/getSchedule")
            .match_header("prefer", r#"outlook.timezone="Asia/Tokyo""#)
            .match_body(Matcher::PartialJsonString(
                r#"{"schedules":["a@example.com","b@example.com"],"availabilityViewInterval":30}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(
                r#"{"value":[
                    {"scheduleId":"a@example.com","availabilityView":"02"},
                    {"scheduleId":"b@example.com","availabilityView":"00"}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let free = ctx
            .find_free_intervals(
                "me",
                &["a".to_string(), "b@example.com".to_string()],
                TimeWindow::new(at(9, 12), at(10, 5)).unwrap(),
                SlotGranularity::new(30).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            free,
            FreeTime::Intervals(vec![FreeInterval {
                from: at(9, 0),
                to: at(9, 30)
            }])
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_schedule_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let ctx = context(&server, &dir);
        let _mock = server
            .mock("POST", "/v1.0/users/boss%40example.com/calendar/getSchedule")
            .with_status(404)
            .create_async()
            .await;

        let free = ctx
            .find_free_intervals(
                "boss@example.com",
                &["a".to_string()],
                TimeWindow::new(at(9, 0), at(10, 0)).unwrap(),
                SlotGranularity::new(30).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(free, FreeTime::NoData);
        assert!(free.intervals().is_empty());
    }

    #[tokio::test]
    async fn invalid_query_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let ctx = context(&server, &dir);
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = ctx
            .find_free_intervals(
                "me",
                &[],
                TimeWindow::new(at(9, 0), at(10, 0)).unwrap(),
                SlotGranularity::new(30).unwrap(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), GraphErrorCode::InvalidQuery);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn people_uses_page_size() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let ctx = context(&server, &dir);
        let _mock = server
            .mock("GET", "/v1.0/me/people")
            .match_query(Matcher::UrlEncoded("$top".into(), "1500".into()))
            .with_status(200)
            .with_body(r#"{"value":[{"id":"1","surname":"B"},{"id":"2","surname":"A"}]}"#)
            .create_async()
            .await;

        let people = ctx.people("me").await.unwrap();
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].id, "2");
    }

    #[tokio::test]
    async fn missing_user_profile_is_none() {
        let mut server = mockito::Server::new_async().await;
        let dir = TempDir::new().unwrap();
        let ctx = context(&server, &dir);
        let _mock = server
            .mock("GET", "/v1.0/users/ghost%40example.com")
            .with_status(404)
            .create_async()
            .await;

        assert!(ctx.profile("ghost@example.com").await.unwrap().is_none());
    }
}
