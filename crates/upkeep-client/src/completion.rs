/*
[INPUT]:  Operator completion requests, TaskBoard, SessionCache, Submitter
[OUTPUT]: Remote completion plus the matching local status and counter update
[POS]:    Core - task completion flow
[UPDATE]: When completion guards or post-acknowledgment effects change
*/

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use upkeep_adapter::{CompleteTaskRequest, CompletionAck};

use crate::board::TaskBoard;
use crate::error::{CompletionError, ServiceError};
use crate::services::Submitter;
use crate::state::SessionCache;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub task_id: String,
    pub notes: Option<String>,
    /// Hour-counter reading taken on site.
    pub counter_reading: Option<f64>,
}

impl CompletionRequest {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            notes: None,
            counter_reading: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_counter_reading(mut self, reading: f64) -> Self {
        self.counter_reading = Some(reading);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub ack: CompletionAck,
    /// False when the board moved to other equipment before the
    /// acknowledgment arrived.
    pub applied_locally: bool,
}

/// A completion that passed the local guards and is reserved in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCompletion {
    task_id: String,
    equipment_id: String,
    request: CompleteTaskRequest,
}

impl PendingCompletion {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn request(&self) -> &CompleteTaskRequest {
        &self.request
    }
}

pub struct TaskCompletionCoordinator {
    submitter: Arc<dyn Submitter>,
    in_flight: HashSet<String>,
}

impl TaskCompletionCoordinator {
    pub fn new(submitter: Arc<dyn Submitter>) -> Self {
        Self {
            submitter,
            in_flight: HashSet::new(),
        }
    }

    pub fn is_in_flight(&self, task_id: &str) -> bool {
        self.in_flight.contains(task_id)
    }

    /// Local guards. Passing them reserves the task until [`apply`] runs.
    ///
    /// [`apply`]: TaskCompletionCoordinator::apply
    pub fn prepare(
        &mut self,
        board: &TaskBoard,
        request: CompletionRequest,
    ) -> Result<PendingCompletion, CompletionError> {
        let task_id = request.task_id;
        let (Some(task), Some(equipment_id)) = (board.get(&task_id), board.equipment_id()) else {
            return Err(CompletionError::UnknownTask { task_id });
        };
        if task.is_completed() {
            info!(task_id = %task_id, "task already completed, nothing sent");
            return Err(CompletionError::AlreadyCompleted { task_id });
        }
        if self.in_flight.contains(&task_id) {
            return Err(CompletionError::InProgress { task_id });
        }

        let pending = PendingCompletion {
            equipment_id: equipment_id.to_string(),
            request: CompleteTaskRequest {
                notes: request.notes.filter(|notes| !notes.trim().is_empty()),
                counter_reading: request.counter_reading,
            },
            task_id,
        };
        self.in_flight.insert(pending.task_id.clone());
        Ok(pending)
    }

    /// Apply the remote answer. A failure changes nothing locally. On success
    /// the task is marked completed when the board still shows the same
    /// equipment, and the counter reading is recorded either way.
    pub async fn apply(
        &mut self,
        board: &mut TaskBoard,
        session: &mut SessionCache,
        pending: PendingCompletion,
        result: Result<CompletionAck, ServiceError>,
    ) -> Result<CompletionOutcome, CompletionError> {
        self.in_flight.remove(&pending.task_id);
        let ack = match result {
            Ok(ack) => ack,
            Err(err) => {
                warn!(task_id = %pending.task_id, error = %err, "task completion failed");
                return Err(err.into());
            }
        };

        let applied_locally = board.equipment_id() == Some(pending.equipment_id.as_str())
            && board.mark_completed(&pending.task_id);

        if let Some(reading) = ack.counter_reading.or(pending.request.counter_reading) {
            let timestamp = ack.completed_at.unwrap_or_else(Utc::now);
            if let Err(err) = session
                .record_counter_update(&pending.equipment_id, reading, timestamp)
                .await
            {
                warn!(
                    equipment_id = %pending.equipment_id,
                    error = %err,
                    "failed to persist counter reading"
                );
            }
        }

        info!(
            task_id = %pending.task_id,
            equipment_id = %pending.equipment_id,
            applied_locally,
            "task completed"
        );
        Ok(CompletionOutcome {
            ack,
            applied_locally,
        })
    }

    /// Guard, send, apply.
    pub async fn complete(
        &mut self,
        board: &mut TaskBoard,
        session: &mut SessionCache,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, CompletionError> {
        let pending = self.prepare(board, request)?;
        let result = self
            .submitter
            .complete_task(&pending.task_id, &pending.request)
            .await;
        self.apply(board, session, pending, result).await
    }
}
