//! End-to-end: an expired token, one refresh, a schedule query and the merge.

use chrono::{NaiveDate, NaiveDateTime};
use freetime_core::{FreeInterval, SlotGranularity, TimeWindow};
use freetime_graph::{Credential, FreeTime, GraphConfig, GraphContext, GraphErrorCode};
use mockito::Matcher;
use serde_json::{Value, json};
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
        .with_graph_root(format!("{}/v1.0", server.url()))
        .with_credential_path(dir.path().join("credential.json"))
        .with_default_domain("example.com");
    let context = GraphContext::new(config).unwrap();
    context
        .credentials()
        .save(
            &Credential::new("expired")
                .with_refresh_token("refresh-1")
                .with_client("client", "secret"),
        )
        .unwrap();
    context
}

fn attendees(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn expired_token_is_refreshed_and_free_time_computed() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let ctx = context(&server, &dir);

    let token = server
        .mock("POST", "/common/oauth2/v2.0/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"fresh","refresh_token":"refresh-2","expires_in":3599}"#)
        .expect(1)
        .create_async()
        .await;
    let rejected = server
        .mock("POST", "/v1.0/me/calendar/getSchedule")
        .match_header("authorization", "Bearer expired")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", "/v1.0/me/calendar/getSchedule")
        .match_header("authorization", "Bearer fresh")
        .match_body(Matcher::PartialJson(json!({
            "schedules": ["alice@example.com", "bob@other.org"],
            "startTime": {"dateTime": "2025-02-05T09:00:00", "timeZone": "UTC"},
            "endTime": {"dateTime": "2025-02-05T11:00:00", "timeZone": "UTC"},
            "availabilityViewInterval": 30
        })))
        .with_status(200)
        .with_body(
            json!({
                "value": [
                    {"scheduleId": "alice@example.com", "availabilityView": "0120"},
                    {"scheduleId": "bob@other.org", "availabilityView": "0000"}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let free = ctx
        .find_free_intervals(
            "me",
            &attendees(&["alice", "bob@other.org"]),
            TimeWindow::new(at(9, 14), at(11, 0)).unwrap(),
            SlotGranularity::new(30).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        free,
        FreeTime::Intervals(vec![
            FreeInterval {
                from: at(9, 0),
                to: at(9, 30)
            },
            FreeInterval {
                from: at(10, 30),
                to: at(11, 0)
            },
        ])
    );
    token.assert_async().await;
    rejected.assert_async().await;
    accepted.assert_async().await;

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("credential.json")).unwrap())
            .unwrap();
    assert_eq!(raw["access_token"], "fresh");
    assert_eq!(raw["refresh_token"], "refresh-2");
    assert_eq!(raw["client_id"], "client");
    assert_eq!(raw["expires_in"], 3599);
}

#[tokio::test]
async fn persistent_rejection_surfaces_after_one_refresh() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let ctx = context(&server, &dir);

    let token = server
        .mock("POST", "/common/oauth2/v2.0/token")
        .with_status(200)
        .with_body(r#"{"access_token":"still-bad"}"#)
        .expect(1)
        .create_async()
        .await;
    let schedule = server
        .mock("POST", "/v1.0/me/calendar/getSchedule")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;

    let err = ctx
        .find_free_intervals(
            "me",
            &attendees(&["alice"]),
            TimeWindow::new(at(9, 0), at(10, 0)).unwrap(),
            SlotGranularity::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), GraphErrorCode::RemoteRequestError);
    assert_eq!(err.status(), Some(401));
    assert!(!err.to_string().contains("still-bad"));
    token.assert_async().await;
    schedule.assert_async().await;
}

#[tokio::test]
async fn everyone_busy_yields_no_intervals() {
    let mut server = mockito::Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let ctx = context(&server, &dir);

    let _schedule = server
        .mock("POST", "/v1.0/me/calendar/getSchedule")
        .with_status(200)
        .with_body(
            json!({
                "value": [
                    {"scheduleId": "alice@example.com", "availabilityView": "2222"},
                    {"scheduleId": "bob@example.com", "availabilityView": "0000"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let intervals = ctx
        .find_free_intervals(
            "me",
            &attendees(&["alice", "bob"]),
            TimeWindow::new(at(9, 0), at(10, 0)).unwrap(),
            SlotGranularity::new(15).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(intervals, FreeTime::Intervals(Vec::new()));
}
