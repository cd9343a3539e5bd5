/*
[INPUT]:  Failure reports and task completion requests
[OUTPUT]: Server acknowledgments
[POS]:    HTTP layer - write endpoints (require auth)
[UPDATE]: When report payload or completion flow changes
*/

use reqwest::Method;
use tracing::info;

use crate::http::{Result, UpkeepClient};
use crate::types::{CompleteTaskRequest, CompletionAck, FailureReport, ReportAck};

impl UpkeepClient {
    /// Submit a classified failure report
    ///
    /// POST /api/reports
    pub async fn submit_report(&self, report: &FailureReport) -> Result<ReportAck> {
        let builder = self
            .authed_request(Method::POST, "/api/reports")?
            .json(report);
        let ack: ReportAck = self.send_json(builder).await?;
        info!(
            report_id = %ack.id,
            client_ref = %report.client_ref,
            equipment_id = %report.equipment_id,
            "failure report accepted"
        );
        Ok(ack)
    }

    /// Mark a maintenance task as done
    ///
    /// POST /api/tasks/{id}/complete
    /// The server treats repeated completion of the same task as a no-op.
    pub async fn complete_task(
        &self,
        task_id: &str,
        request: &CompleteTaskRequest,
    ) -> Result<CompletionAck> {
        let endpoint = format!("/api/tasks/{task_id}/complete");
        let builder = self.authed_request(Method::POST, &endpoint)?.json(request);
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{ClientConfig, Credentials, UpkeepClient, UpkeepError};
    use crate::types::{CompleteTaskRequest, FailureReport, Severity};
    use uuid::Uuid;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> UpkeepClient {
        let mut client =
            UpkeepClient::with_config_and_base_url(ClientConfig::default(), &server.uri())
                .expect("client init");
        client.set_credentials(Credentials::new("token-1"));
        client
    }

    #[tokio::test]
    async fn test_complete_task_sends_reading() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tasks/t-5/complete"))
            .and(body_json(serde_json::json!({"notes": "done", "counterReading": 1800.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "taskId": "t-5",
                "completedAt": "2026-05-01T10:00:00Z",
                "counterReading": 1800.0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ack = client_for(&server)
            .complete_task(
                "t-5",
                &CompleteTaskRequest {
                    notes: Some("done".to_string()),
                    counter_reading: Some(1800.0),
                },
            )
            .await
            .expect("complete_task");
        assert_eq!(ack.task_id, "t-5");
        assert_eq!(ack.counter_reading, Some(1800.0));
        assert!(ack.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_submit_report_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reports"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"message": "unknown subsystem"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let report = FailureReport {
            client_ref: Uuid::new_v4(),
            equipment_id: "eq-1".to_string(),
            subsystem_id: "s-1".to_string(),
            function_id: "f-1".to_string(),
            functional_failure_id: None,
            failure_mode_id: Some("m-1".to_string()),
            description: "Smoke from exhaust".to_string(),
            severity: Severity::Medium,
            media: Vec::new(),
            reported_at: chrono::Utc::now(),
        };

        match client_for(&server).submit_report(&report).await.unwrap_err() {
            UpkeepError::Api { code, message } => {
                assert_eq!(code, 422);
                assert_eq!(message, "unknown subsystem");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
