/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
[UPDATE]: Parse task lists item by item so one bad record cannot sink the list
*/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::{TaskKind, TaskStatus};

/// A machine operators log maintenance against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    #[serde(deserialize_with = "serde_helpers::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub technical_id: String,
    /// Current operating-hour counter, absent when never read.
    #[serde(default, deserialize_with = "serde_helpers::deserialize_number_opt")]
    pub hour_counter: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceTask {
    #[serde(deserialize_with = "serde_helpers::deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
    #[serde(flatten)]
    pub schedule: TaskSchedule,
}

impl MaintenanceTask {
    pub fn kind(&self) -> TaskKind {
        self.schedule.kind()
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Kind-specific scheduling data, discriminated by the `kind` field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TaskSchedule {
    #[serde(rename_all = "camelCase")]
    CounterBased {
        #[serde(deserialize_with = "serde_helpers::deserialize_number")]
        interval_counter_units: f64,
        #[serde(default, deserialize_with = "serde_helpers::deserialize_number_opt")]
        last_completed_at_counter: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    DateBased {
        due_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    },
}

impl TaskSchedule {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskSchedule::CounterBased { .. } => TaskKind::CounterBased,
            TaskSchedule::DateBased { .. } => TaskKind::DateBased,
        }
    }
}

/// A task record the server sent without a usable `kind` or kind fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedTask {
    pub id: Option<String>,
    pub title: Option<String>,
    pub reason: String,
}

/// One row of a task listing.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEntry {
    Valid(MaintenanceTask),
    Malformed(MalformedTask),
}

impl TaskEntry {
    /// Parse one raw record, keeping whatever identifies it when it is malformed.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<MaintenanceTask>(value.clone()) {
            Ok(task) => TaskEntry::Valid(task),
            Err(err) => {
                let id = value.get("id").and_then(|raw| match raw {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
                let title = value
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                TaskEntry::Malformed(MalformedTask {
                    id,
                    title,
                    reason: err.to_string(),
                })
            }
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            TaskEntry::Valid(task) => Some(task.id.as_str()),
            TaskEntry::Malformed(bad) => bad.id.as_deref(),
        }
    }

    pub fn task(&self) -> Option<&MaintenanceTask> {
        match self {
            TaskEntry::Valid(task) => Some(task),
            TaskEntry::Malformed(_) => None,
        }
    }
}

/// Parse a task listing record by record.
pub fn parse_task_entries(values: Vec<Value>) -> Vec<TaskEntry> {
    values.into_iter().map(TaskEntry::from_value).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsystem {
    #[serde(deserialize_with = "serde_helpers::deserialize_id")]
    pub id: String,
    pub name: String,
}

/// A function of a subsystem. Some sources flatten the functional-failure
/// level away and list failure modes directly on the function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    #[serde(deserialize_with = "serde_helpers::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub functional_failures: Vec<FunctionalFailure>,
    #[serde(default)]
    pub failure_modes: Vec<FailureMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalFailure {
    #[serde(deserialize_with = "serde_helpers::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub failure_modes: Vec<FailureMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMode {
    #[serde(deserialize_with = "serde_helpers::deserialize_id")]
    pub id: String,
    pub name: String,
}

/// Opaque descriptor of media captured outside the core (photo, video).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Open
}

mod serde_helpers {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
        }
    }

    pub fn deserialize_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        number_from_value(&value)?
            .ok_or_else(|| serde::de::Error::custom("missing numeric value"))
    }

    pub fn deserialize_number_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        number_from_value(&value)
    }

    fn number_from_value<E: serde::de::Error>(value: &Value) -> Result<Option<f64>, E> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| E::custom("number out of range")),
            Value::String(raw) if raw.trim().is_empty() => Ok(None),
            Value::String(raw) => raw.trim().parse::<f64>().map(Some).map_err(E::custom),
            _ => Err(E::custom("invalid numeric value")),
        }
    }
}
