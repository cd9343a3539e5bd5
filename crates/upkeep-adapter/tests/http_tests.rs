/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for HTTP client
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints change
*/

mod common;

use common::{client_for, mock_token, setup_mock_server};
use std::time::Duration;
use tokio_test::assert_ok;
use upkeep_adapter::{
    ClientConfig, Credentials, TaskEntry, TaskKind, TaskSchedule, UpkeepClient, UpkeepError,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn test_client_creation() {
    let _client = assert_ok!(UpkeepClient::new());
}

#[test]
fn test_client_with_config() {
    let config = ClientConfig::default();
    let _client = assert_ok!(UpkeepClient::with_config(config));
}

#[test]
fn test_invalid_base_url() {
    let err = UpkeepClient::with_config_and_base_url(ClientConfig::default(), "not a url")
        .unwrap_err();
    assert!(matches!(err, UpkeepError::UrlParse(_)));
}

#[test]
fn test_client_credentials_roundtrip() {
    let mut client = assert_ok!(UpkeepClient::new());
    let credentials = Credentials::new(mock_token());

    client.set_credentials(credentials.clone());
    assert_eq!(client.credentials(), Some(&credentials));

    client.clear_credentials();
    assert!(client.credentials().is_none());
}

#[tokio::test]
async fn test_unauthenticated_call_never_hits_network() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/equipment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.list_equipment().await.unwrap_err();
    assert!(matches!(err, UpkeepError::AuthRequired));
}

#[tokio::test]
async fn test_date_based_listing() {
    let server = setup_mock_server().await;
    let token = mock_token();
    Mock::given(method("GET"))
        .and(path("/api/equipment/7/tasks"))
        .and(query_param("kind", "date-based"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 31,
                "title": "Fire extinguisher check",
                "status": "completed",
                "kind": "date-based",
                "dueAt": "2026-07-01T00:00:00Z",
                "createdAt": "2026-01-01T00:00:00Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(&token));
    let entries = assert_ok!(client.list_tasks("7", TaskKind::DateBased).await);
    let task = match &entries[0] {
        TaskEntry::Valid(task) => task,
        other => panic!("expected a valid task, got {other:?}"),
    };
    assert_eq!(task.id, "31");
    assert!(task.is_completed());
    assert!(matches!(task.schedule, TaskSchedule::DateBased { .. }));
}

#[tokio::test]
async fn test_undecodable_payload_is_serialization_error() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/equipment"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"not\":\"a list\"}", "application/json"))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("t"));
    let err = client.list_equipment().await.unwrap_err();
    assert!(matches!(err, UpkeepError::Serialization(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/subsystems/3/functions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("t"));
    let err = client.list_functions("3").await.unwrap_err();
    assert!(matches!(err, UpkeepError::Api { code: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/equipment"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig {
        timeout: Duration::from_millis(50),
        connect_timeout: Duration::from_millis(50),
    };
    let mut client = assert_ok!(UpkeepClient::with_config_and_base_url(config, &server.uri()));
    client.set_credentials(Credentials::new("t"));

    let err = client.list_equipment().await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/cmms/api/equipment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "eq-1", "name": "Press", "technicalId": "PR-01"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/equipment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let base = format!("{}/cmms", server.uri());
    let mut client = assert_ok!(UpkeepClient::with_config_and_base_url(
        ClientConfig::default(),
        &base
    ));
    client.set_credentials(Credentials::new("t"));
    let equipment = assert_ok!(client.list_equipment().await);
    assert_eq!(equipment.len(), 1);
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/equipment"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("t"));
    let err = client.list_equipment().await.unwrap_err();
    assert!(matches!(err, UpkeepError::RateLimit { retry_after: 7 }));
    assert_eq!(err.retry_delay(), Some(7));
    assert!(err.is_retryable());
}
