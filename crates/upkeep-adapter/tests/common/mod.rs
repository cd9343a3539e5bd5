/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for upkeep-adapter tests

use upkeep_adapter::{ClientConfig, Credentials, UpkeepClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at the mock server, optionally signed in
pub fn client_for(server: &MockServer, token: Option<&str>) -> UpkeepClient {
    let mut client = UpkeepClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
        .expect("client init");
    if let Some(token) = token {
        client.set_credentials(Credentials::new(token));
    }
    client
}

/// Mock session token for testing
#[allow(dead_code)]
pub fn mock_token() -> String {
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.signature".to_string()
}
