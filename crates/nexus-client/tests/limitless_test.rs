//! Limitless client against a mock server.

use std::time::Duration;

use chrono::NaiveDate;

use nexus_client::{LimitlessClient, RetryPolicy};
use nexus_core::config::LimitlessConfig;
use nexus_core::traits::TranscriptSource;
use nexus_core::types::TranscriptQuery;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> LimitlessClient {
    let config = LimitlessConfig {
        api_key: Some("lim-key".to_string()),
        endpoint: server.uri(),
        ..Default::default()
    };
    LimitlessClient::new(&config).unwrap().with_retry(RetryPolicy {
        max_retries: 2,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    })
}

#[tokio::test]
async fn test_fetch_lifelogs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lifelogs"))
        .and(header("authorization", "Bearer lim-key"))
        .and(query_param("limit", "50"))
        .and(query_param("include_transcripts", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lifelogs": [
                {"id": "l1", "title": "Coffee chat", "startTime": "2024-03-05T09:00:00Z",
                 "markdown": "I'll send you the doc"},
                {"id": "l2"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let lifelogs = client(&server)
        .fetch_transcripts(TranscriptQuery::lifelogs(1), 50)
        .await
        .unwrap();

    assert_eq!(lifelogs.len(), 2);
    assert_eq!(lifelogs[0].title.as_deref(), Some("Coffee chat"));
    assert_eq!(lifelogs[0].body(), Some("I'll send you the doc"));
    assert_eq!(lifelogs[1].body(), None);
}

#[tokio::test]
async fn test_fetch_lifelogs_for_a_pinned_day() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lifelogs"))
        .and(query_param("since", "2024-03-05T00:00:00Z"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lifelogs": [{"id": "l1", "markdown": "Standup notes"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let lifelogs = client(&server)
        .fetch_transcripts(TranscriptQuery::lifelogs_on(day), 10)
        .await
        .unwrap();

    assert_eq!(lifelogs.len(), 1);
    assert_eq!(lifelogs[0].body(), Some("Standup notes"));
}

#[tokio::test]
async fn test_fetch_meeting_notes_truncates_to_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meetings/notes"))
        .and(query_param("days", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notes": [
                {"title": "A", "attendees": ["Ana", {"name": "Ben", "email": "ben@x.io"}],
                 "action_items": ["Ship it"]},
                {"title": "B"},
                {"title": "C"}
            ]
        })))
        .mount(&server)
        .await;

    let notes = client(&server)
        .fetch_transcripts(TranscriptQuery::meeting_notes(7), 2)
        .await
        .unwrap();

    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].attendees.len(), 2);
    assert_eq!(notes[0].attendees[1].label(), Some("Ben"));
    assert_eq!(notes[0].action_items, vec!["Ship it".to_string()]);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/memories"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/memories"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memories": [{"id": "m1", "content": "Prefers mornings", "createdAt": "2024-03-01"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let memories = client(&server).recent_memories(7, 10).await.unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].date.as_deref(), Some("2024-03-01"));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lifelogs"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .fetch_transcripts(TranscriptQuery::lifelogs(1), 10)
        .await
        .unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_is_connected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lifelogs"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lifelogs": []})))
        .mount(&server)
        .await;

    assert!(client(&server).is_connected().await);

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&down)
        .await;
    assert!(!client(&down).is_connected().await);
}
