/*
[INPUT]:  Equipment identifiers and task kind filters
[OUTPUT]: Equipment records and per-equipment maintenance task listings
[POS]:    HTTP layer - equipment endpoints (require auth)
[UPDATE]: When adding new equipment endpoints or changing query parameters
*/

use reqwest::Method;
use serde_json::Value;
use tracing::warn;

use crate::http::{Result, UpkeepClient};
use crate::types::{Equipment, TaskEntry, TaskKind, parse_task_entries};

impl UpkeepClient {
    /// List equipment visible to the signed-in operator
    ///
    /// GET /api/equipment
    pub async fn list_equipment(&self) -> Result<Vec<Equipment>> {
        let builder = self.authed_request(Method::GET, "/api/equipment")?;
        self.send_json(builder).await
    }

    /// List maintenance tasks of one kind for an equipment
    ///
    /// GET /api/equipment/{id}/tasks?kind={kind}
    ///
    /// Records are decoded one at a time; a record the client cannot
    /// interpret comes back as [`TaskEntry::Malformed`].
    pub async fn list_tasks(&self, equipment_id: &str, kind: TaskKind) -> Result<Vec<TaskEntry>> {
        let endpoint = format!("/api/equipment/{equipment_id}/tasks");
        let builder = self
            .authed_request(Method::GET, &endpoint)?
            .query(&[("kind", kind.as_str())]);
        let raw: Vec<Value> = self.send_json(builder).await?;
        let entries = parse_task_entries(raw);

        let malformed = entries
            .iter()
            .filter(|entry| matches!(entry, TaskEntry::Malformed(_)))
            .count();
        if malformed > 0 {
            warn!(equipment_id, malformed, "task listing contained malformed records");
        }
        Ok(entries)
    }
}
