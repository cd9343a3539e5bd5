/*
[INPUT]:  Equipment and subsystem identifiers
[OUTPUT]: Failure taxonomy levels (subsystems, functions with nested failures)
[POS]:    HTTP layer - classification taxonomy endpoints (require auth)
[UPDATE]: When the taxonomy shape or endpoints change
*/

use reqwest::Method;

use crate::http::{Result, UpkeepClient};
use crate::types::{Function, Subsystem};

impl UpkeepClient {
    /// GET /api/equipment/{id}/subsystems
    pub async fn list_subsystems(&self, equipment_id: &str) -> Result<Vec<Subsystem>> {
        let endpoint = format!("/api/equipment/{equipment_id}/subsystems");
        let builder = self.authed_request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }

    /// GET /api/subsystems/{id}/functions
    ///
    /// Functions embed their functional failures and, for flattened
    /// taxonomies, failure modes directly.
    pub async fn list_functions(&self, subsystem_id: &str) -> Result<Vec<Function>> {
        let endpoint = format!("/api/subsystems/{subsystem_id}/functions");
        let builder = self.authed_request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }
}
