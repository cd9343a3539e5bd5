/*
[INPUT]:  upkeep-client core driven against a mock maintenance API
[OUTPUT]: End-to-end tests with mock server
[POS]:    Integration test layer - full flow verification
[UPDATE]: When adding new integration scenarios
*/

mod common;

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::assert_ok;
use upkeep_adapter::{Severity, TaskKind};
use upkeep_client::{
    ClassificationWizard, CompletionError, CompletionRequest, Fetcher, JsonFileSessionStore,
    ReportDraft, ServiceError, SessionCache, TaskBoard, TaskCompletionCoordinator,
    UrgencyCalculator, UrgencyTier, WizardEvent, WizardStep,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{EQUIPMENT_ID, client_for, memory_session, mount_counter_tasks, mount_equipment};

#[tokio::test]
async fn task_board_ranks_tasks_by_urgency() {
    let server = wiremock::MockServer::start().await;
    mount_equipment(&server, 1250.0).await;
    mount_counter_tasks(&server).await;

    let client = client_for(&server);
    let mut session = memory_session().await;
    let equipment = Fetcher::list_equipment(&client).await.unwrap().remove(0);
    assert!(session.select_equipment(equipment.clone()).await.unwrap());

    let mut board = TaskBoard::new();
    assert!(assert_ok!(board.load(&client, EQUIPMENT_ID, TaskKind::CounterBased).await));

    let views = board.sorted_by_urgency(&equipment, Utc::now(), &UrgencyCalculator::default());
    let rows: Vec<_> = views
        .iter()
        .map(|view| (view.id().unwrap_or("?"), view.urgency.remaining_label()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("t-filter", "40 hours remaining".to_string()),
            ("t-oil", "250 hours remaining".to_string()),
            ("t-broken", "Unknown".to_string()),
        ]
    );
    assert_eq!(views[0].urgency.tier(), UrgencyTier::Medium);
    assert_eq!(views[2].title(), "Legacy record");
}

#[tokio::test]
async fn completing_twice_calls_the_api_once() {
    let server = wiremock::MockServer::start().await;
    mount_equipment(&server, 1250.0).await;
    mount_counter_tasks(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/t-filter/complete"))
        .and(body_partial_json(json!({"counterReading": 1255.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taskId": "t-filter",
            "completedAt": "2026-06-01T08:00:00Z",
            "counterReading": 1260
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut session = memory_session().await;
    let equipment = Fetcher::list_equipment(&client).await.unwrap().remove(0);
    session.select_equipment(equipment).await.unwrap();

    let mut board = TaskBoard::new();
    board
        .load(&client, EQUIPMENT_ID, TaskKind::CounterBased)
        .await
        .unwrap();

    let mut coordinator = TaskCompletionCoordinator::new(Arc::new(client.clone()));
    let request = CompletionRequest::new("t-filter").with_counter_reading(1255.0);
    let outcome = coordinator
        .complete(&mut board, &mut session, request.clone())
        .await
        .unwrap();
    assert!(outcome.applied_locally);

    let err = coordinator
        .complete(&mut board, &mut session, request)
        .await
        .unwrap_err();
    assert!(matches!(err, CompletionError::AlreadyCompleted { .. }));

    let update = session.last_counter_update(EQUIPMENT_ID).unwrap();
    assert_eq!(update.value, 1260.0);
    assert_eq!(
        session.equipment().and_then(|equipment| equipment.hour_counter),
        Some(1260.0)
    );

    // Completed task drops below the open ones.
    let equipment = session.equipment().unwrap().clone();
    let views = board.sorted_by_urgency(&equipment, Utc::now(), &UrgencyCalculator::default());
    assert_eq!(views.last().and_then(|view| view.id()), Some("t-filter"));
}

#[tokio::test]
async fn counter_reading_survives_restart() {
    let server = wiremock::MockServer::start().await;
    mount_counter_tasks(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/t-oil/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "t-oil"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    let client = client_for(&server);

    {
        let store = JsonFileSessionStore::open(&session_path).await.unwrap();
        let mut session = SessionCache::load(Arc::new(store)).await.unwrap();
        session.set_token("session-token").await.unwrap();

        let mut board = TaskBoard::new();
        board
            .load(&client, EQUIPMENT_ID, TaskKind::CounterBased)
            .await
            .unwrap();
        let mut coordinator = TaskCompletionCoordinator::new(Arc::new(client.clone()));
        coordinator
            .complete(
                &mut board,
                &mut session,
                CompletionRequest::new("t-oil").with_counter_reading(1251.0),
            )
            .await
            .unwrap();
    }

    let store = JsonFileSessionStore::open(&session_path).await.unwrap();
    let session = SessionCache::load(Arc::new(store)).await.unwrap();
    assert_eq!(session.token(), Some("session-token"));
    assert_eq!(
        session.last_counter_update(EQUIPMENT_ID).map(|update| update.value),
        Some(1251.0)
    );
}

#[tokio::test]
async fn wizard_walk_submits_report_and_resets() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/equipment/{EQUIPMENT_ID}/subsystems")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "sub-hyd", "name": "Hydraulics"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subsystems/sub-hyd/functions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "fn-press",
                "name": "Apply pressure",
                "failureModes": [
                    {"id": "fm-leak", "name": "Seal leak"},
                    {"id": "fm-pump", "name": "Pump wear"}
                ]
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/reports"))
        .and(body_partial_json(json!({
            "equipmentId": EQUIPMENT_ID,
            "subsystemId": "sub-hyd",
            "functionId": "fn-press",
            "failureModeId": "fm-leak",
            "description": "Oil under the press",
            "severity": "high"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "rep-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut wizard = ClassificationWizard::new(true);
    wizard.load_subsystems(&client, EQUIPMENT_ID).await.unwrap();

    let subsystem = wizard.subsystems()[0].clone();
    wizard.dispatch(WizardEvent::SelectSubsystem(subsystem));
    wizard.load_functions(&client, "sub-hyd").await.unwrap();

    let function = wizard.functions()[0].clone();
    assert_eq!(wizard.dispatch(WizardEvent::SelectFunction(function)), WizardStep::FailureMode);
    assert_eq!(wizard.dispatch(WizardEvent::Back), WizardStep::Function);
    assert_eq!(wizard.dispatch(WizardEvent::Forward), WizardStep::FailureMode);

    let mode = wizard.failure_mode_options()[0].clone();
    assert_eq!(wizard.dispatch(WizardEvent::SelectFailureMode(mode)), WizardStep::Details);

    let outcome = wizard
        .submit(
            &client,
            EQUIPMENT_ID,
            ReportDraft::new("Oil under the press", Severity::High),
        )
        .await
        .unwrap();
    assert_eq!(outcome.ack.id, "rep-1");
    assert!(outcome.wizard_reset);
    assert_eq!(wizard.step(), WizardStep::Subsystem);
    assert!(wizard.selection().subsystem().is_none());
}

#[tokio::test]
async fn expired_session_surfaces_as_auth_required() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/equipment/{EQUIPMENT_ID}/tasks")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut board = TaskBoard::new();
    let err = board
        .load(&client, EQUIPMENT_ID, TaskKind::CounterBased)
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::AuthRequired);
    assert!(board.entries().is_empty());
}
