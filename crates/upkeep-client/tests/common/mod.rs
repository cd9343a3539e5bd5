/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared fixtures and mock API helpers
[POS]:    Test infrastructure - shared across client integration tests
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for upkeep-client tests

use serde_json::{Value, json};
use std::sync::Arc;
use upkeep_adapter::{ClientConfig, Credentials, UpkeepClient};
use upkeep_client::{MemorySessionStore, SessionCache, SessionStore};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "session-token";
pub const EQUIPMENT_ID: &str = "eq-7";

/// Signed-in client pointed at the mock server
pub fn client_for(server: &MockServer) -> UpkeepClient {
    let mut client = UpkeepClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init");
    client.set_credentials(Credentials::new(TOKEN));
    client
}

pub async fn memory_session() -> SessionCache {
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    SessionCache::load(store).await.expect("session load")
}

pub fn equipment_json(hour_counter: f64) -> Value {
    json!({
        "id": EQUIPMENT_ID,
        "name": "Hydraulic press",
        "technicalId": "HP-07",
        "hourCounter": hour_counter
    })
}

/// Two counter tasks and one record without a `kind`
pub fn counter_tasks_json() -> Value {
    json!([
        {
            "id": "t-oil",
            "title": "Change hydraulic oil",
            "status": "open",
            "kind": "counter-based",
            "intervalCounterUnits": 500,
            "lastCompletedAtCounter": 1000
        },
        {
            "id": "t-filter",
            "title": "Replace filter",
            "status": "open",
            "kind": "counter-based",
            "intervalCounterUnits": 100,
            "lastCompletedAtCounter": 1190
        },
        {
            "id": "t-broken",
            "title": "Legacy record"
        }
    ])
}

pub async fn mount_equipment(server: &MockServer, hour_counter: f64) {
    Mock::given(method("GET"))
        .and(path("/api/equipment"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([equipment_json(hour_counter)])))
        .mount(server)
        .await;
}

pub async fn mount_counter_tasks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/api/equipment/{EQUIPMENT_ID}/tasks")))
        .and(query_param("kind", "counter-based"))
        .respond_with(ResponseTemplate::new(200).set_body_json(counter_tasks_json()))
        .mount(server)
        .await;
}
