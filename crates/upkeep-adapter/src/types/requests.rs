/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Severity;
use super::models::MediaRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Failure report assembled from a finished classification walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    /// Client-generated reference, lets the server deduplicate retries.
    pub client_ref: Uuid,
    pub equipment_id: String,
    pub subsystem_id: String,
    pub function_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functional_failure_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_mode_id: Option<String>,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Hour-counter reading taken when the work was done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_reading: Option<f64>,
}
