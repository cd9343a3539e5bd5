/*
[INPUT]:  Adapter REST client (or any test double)
[OUTPUT]: Narrow async seams the core depends on
[POS]:    Service layer - boundary between core and transport
[UPDATE]: When the core needs a new remote operation
*/

use async_trait::async_trait;
use upkeep_adapter::{
    CompleteTaskRequest, CompletionAck, Equipment, FailureReport, Function, ReportAck, Subsystem,
    TaskEntry, TaskKind, UpkeepClient,
};

use crate::error::ServiceError;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Read side: equipment, task listings and the failure taxonomy.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn list_equipment(&self) -> ServiceResult<Vec<Equipment>>;

    async fn list_tasks(&self, equipment_id: &str, kind: TaskKind) -> ServiceResult<Vec<TaskEntry>>;

    async fn list_subsystems(&self, equipment_id: &str) -> ServiceResult<Vec<Subsystem>>;

    async fn list_functions(&self, subsystem_id: &str) -> ServiceResult<Vec<Function>>;
}

/// Write side: failure reports and task completions.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit_report(&self, report: &FailureReport) -> ServiceResult<ReportAck>;

    async fn complete_task(
        &self,
        task_id: &str,
        request: &CompleteTaskRequest,
    ) -> ServiceResult<CompletionAck>;
}

#[async_trait]
impl Fetcher for UpkeepClient {
    async fn list_equipment(&self) -> ServiceResult<Vec<Equipment>> {
        Ok(UpkeepClient::list_equipment(self).await?)
    }

    async fn list_tasks(&self, equipment_id: &str, kind: TaskKind) -> ServiceResult<Vec<TaskEntry>> {
        Ok(UpkeepClient::list_tasks(self, equipment_id, kind).await?)
    }

    async fn list_subsystems(&self, equipment_id: &str) -> ServiceResult<Vec<Subsystem>> {
        Ok(UpkeepClient::list_subsystems(self, equipment_id).await?)
    }

    async fn list_functions(&self, subsystem_id: &str) -> ServiceResult<Vec<Function>> {
        Ok(UpkeepClient::list_functions(self, subsystem_id).await?)
    }
}

#[async_trait]
impl Submitter for UpkeepClient {
    async fn submit_report(&self, report: &FailureReport) -> ServiceResult<ReportAck> {
        Ok(UpkeepClient::submit_report(self, report).await?)
    }

    async fn complete_task(
        &self,
        task_id: &str,
        request: &CompleteTaskRequest,
    ) -> ServiceResult<CompletionAck> {
        Ok(UpkeepClient::complete_task(self, task_id, request).await?)
    }
}
