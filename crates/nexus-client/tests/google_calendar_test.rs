//! Google Calendar client against a mock server.

use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use nexus_client::{AuthorizedUser, GoogleCalendarClient, RetryPolicy};
use nexus_core::config::GoogleCalendarConfig;
use nexus_core::error::ErrorCode;
use nexus_core::traits::CalendarSource;
use nexus_core::types::TimeWindow;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, token_file: &Path) -> GoogleCalendarClient {
    let config = GoogleCalendarConfig {
        token_file: token_file.to_path_buf(),
        calendar_id: "primary".to_string(),
        endpoint: server.uri(),
        max_results: 25,
        ..Default::default()
    };
    GoogleCalendarClient::new(config)
        .unwrap()
        .with_retry(RetryPolicy::none())
}

fn write_token(path: &Path, value: serde_json::Value) {
    std::fs::write(path, value.to_string()).unwrap();
}

#[tokio::test]
async fn test_fetch_events_with_valid_token() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    write_token(
        &token_file,
        json!({"token": "access-1", "expiry": (Utc::now() + Duration::hours(1)).to_rfc3339()}),
    );

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer access-1"))
        .and(query_param("timeMin", "2024-03-01T00:00:00Z"))
        .and(query_param("timeMax", "2024-03-31T00:00:00Z"))
        .and(query_param("maxResults", "25"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "e1", "summary": "Standup",
                 "start": {"dateTime": "2024-03-05T09:00:00Z"},
                 "end": {"dateTime": "2024-03-05T09:15:00Z"}},
                {"id": "e2", "summary": "Offsite", "start": {"date": "2024-03-10"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &token_file);
    assert!(!client.is_connected());
    assert!(client.authenticate().await);
    assert!(client.is_connected());

    let window = TimeWindow {
        start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
    };
    let events = client.fetch_events(window).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].start.as_ref().unwrap().date.as_deref(), Some("2024-03-10"));
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_saved() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    write_token(
        &token_file,
        json!({
            "token": "stale",
            "refresh_token": "refresh-1",
            "client_id": "cid",
            "client_secret": "csecret",
            "token_uri": format!("{}/token", server.uri()),
            "expiry": (Utc::now() - Duration::hours(1)).to_rfc3339(),
            "scopes": ["https://www.googleapis.com/auth/calendar.readonly"]
        }),
    );

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &token_file);
    assert!(client.authenticate().await);
    assert!(client.fetch_upcoming(7).await.unwrap().is_empty());

    let saved: AuthorizedUser =
        serde_json::from_str(&std::fs::read_to_string(&token_file).unwrap()).unwrap();
    assert_eq!(saved.token.as_deref(), Some("fresh"));
    assert!(saved.expiry.unwrap() > Utc::now());
    assert!(saved.extra.contains_key("scopes"));
}

#[tokio::test]
async fn test_missing_token_file_fails_authentication() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = client(&server, &dir.path().join("absent.json"));

    assert!(!client.authenticate().await);
    assert!(!client.is_connected());
    let err = client.fetch_upcoming(7).await.unwrap_err();
    assert!(err.to_string().contains("google_calendar"));
}

fn refreshable_token(server: &MockServer, token: &str, expires_in: Duration) -> serde_json::Value {
    json!({
        "token": token,
        "refresh_token": "refresh-1",
        "client_id": "cid",
        "client_secret": "csecret",
        "token_uri": format!("{}/token", server.uri()),
        "expiry": (Utc::now() + expires_in).to_rfc3339()
    })
}

async fn mount_refresh(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "expires_in": 3600
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_entering_expiry_margin_is_refreshed_before_fetch() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    // Valid at startup, inside the 60 s refresh margin a few seconds later.
    write_token(
        &token_file,
        refreshable_token(&server, "access-1", Duration::seconds(63)),
    );

    mount_refresh(&server, "access-2").await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &token_file);
    assert!(client.authenticate().await);

    tokio::time::sleep(std::time::Duration::from_secs(4)).await;
    assert!(client.fetch_upcoming(7).await.unwrap().is_empty());

    let saved: AuthorizedUser =
        serde_json::from_str(&std::fs::read_to_string(&token_file).unwrap()).unwrap();
    assert_eq!(saved.token.as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once_and_retried() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    write_token(
        &token_file,
        refreshable_token(&server, "revoked", Duration::hours(1)),
    );

    mount_refresh(&server, "fresh").await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "e1", "summary": "Review", "start": {"date": "2024-03-10"}}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server, &token_file);
    assert!(client.authenticate().await);
    assert_eq!(client.fetch_upcoming(7).await.unwrap().len(), 1);
    // The refreshed token is kept for later cycles.
    assert_eq!(client.fetch_upcoming(7).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_token_without_refresh_grant() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("token.json");
    write_token(
        &token_file,
        json!({"token": "revoked", "expiry": (Utc::now() + Duration::hours(1)).to_rfc3339()}),
    );

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &token_file);
    assert!(client.authenticate().await);
    let err = client.fetch_upcoming(7).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::AuthExpiredToken);
}
