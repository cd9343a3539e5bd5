/*
[INPUT]:  Task listings from a Fetcher, selected equipment, clock
[OUTPUT]: Current task list with per-task urgency for display
[POS]:    Core - task list owner between fetch and render
[UPDATE]: When task list display or reload rules change
*/

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use upkeep_adapter::{Equipment, MaintenanceTask, TaskEntry, TaskKind, TaskStatus};

use crate::error::ServiceError;
use crate::sequence::{RequestSequence, RequestTicket};
use crate::services::Fetcher;
use crate::urgency::{UrgencyCalculator, UrgencyResult};

/// One display row: the task entry with its urgency at render time.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView<'a> {
    pub entry: &'a TaskEntry,
    pub urgency: UrgencyResult,
}

impl TaskView<'_> {
    pub fn id(&self) -> Option<&str> {
        self.entry.id()
    }

    pub fn title(&self) -> &str {
        match self.entry {
            TaskEntry::Valid(task) => &task.title,
            TaskEntry::Malformed(bad) => bad.title.as_deref().unwrap_or("(untitled task)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingLoad {
    equipment_id: String,
    kind: TaskKind,
}

/// Task list of one equipment and one task kind.
#[derive(Debug, Default)]
pub struct TaskBoard {
    equipment_id: Option<String>,
    kind: Option<TaskKind>,
    entries: Vec<TaskEntry>,
    pending: Option<PendingLoad>,
    sequence: RequestSequence,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equipment_id(&self) -> Option<&str> {
        self.equipment_id.as_deref()
    }

    pub fn kind(&self) -> Option<TaskKind> {
        self.kind
    }

    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    /// Start a reload. Any load still in flight becomes stale.
    pub fn begin_load(&mut self, equipment_id: &str, kind: TaskKind) -> RequestTicket {
        let ticket = self.sequence.issue();
        self.pending = Some(PendingLoad {
            equipment_id: equipment_id.to_string(),
            kind,
        });
        debug!(equipment_id, kind = kind.as_str(), ticket = ticket.value(), "task load started");
        ticket
    }

    /// Apply the result of a load. Returns `Ok(false)` and leaves the board
    /// untouched when a newer load or a clear happened in the meantime.
    pub fn apply_load(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<TaskEntry>, ServiceError>,
    ) -> Result<bool, ServiceError> {
        if !self.sequence.is_current(ticket) {
            debug!(ticket = ticket.value(), "discarding stale task load");
            return Ok(false);
        }
        let pending = self.pending.take();
        let entries = result?;
        let Some(PendingLoad { equipment_id, kind }) = pending else {
            return Ok(false);
        };

        let malformed = entries
            .iter()
            .filter(|entry| matches!(entry, TaskEntry::Malformed(_)))
            .count();
        info!(
            equipment_id = %equipment_id,
            kind = kind.as_str(),
            count = entries.len(),
            malformed,
            "task list loaded"
        );

        self.equipment_id = Some(equipment_id);
        self.kind = Some(kind);
        self.entries = entries;
        Ok(true)
    }

    /// Fetch and apply in one step.
    pub async fn load(
        &mut self,
        fetcher: &dyn Fetcher,
        equipment_id: &str,
        kind: TaskKind,
    ) -> Result<bool, ServiceError> {
        let ticket = self.begin_load(equipment_id, kind);
        let result = fetcher.list_tasks(equipment_id, kind).await;
        self.apply_load(ticket, result)
    }

    pub fn get(&self, task_id: &str) -> Option<&MaintenanceTask> {
        self.entries
            .iter()
            .filter_map(TaskEntry::task)
            .find(|task| task.id == task_id)
    }

    /// Set a task's status to completed. Returns `false` when the task is not
    /// on the board.
    pub fn mark_completed(&mut self, task_id: &str) -> bool {
        let task = self.entries.iter_mut().find_map(|entry| match entry {
            TaskEntry::Valid(task) if task.id == task_id => Some(task),
            _ => None,
        });
        match task {
            Some(task) => {
                task.status = TaskStatus::Completed;
                true
            }
            None => false,
        }
    }

    /// Drop the list and any load in flight, e.g. when equipment changes.
    pub fn clear(&mut self) {
        self.sequence.invalidate();
        self.pending = None;
        self.equipment_id = None;
        self.kind = None;
        self.entries.clear();
    }

    /// Rows in list order. Malformed records and tasks of other equipment
    /// render as unknown urgency.
    pub fn views(
        &self,
        equipment: &Equipment,
        now: DateTime<Utc>,
        calculator: &UrgencyCalculator,
    ) -> Vec<TaskView<'_>> {
        let same_equipment = self.equipment_id.as_deref() == Some(equipment.id.as_str());
        self.entries
            .iter()
            .map(|entry| {
                let urgency = match entry {
                    TaskEntry::Valid(task) if same_equipment => {
                        calculator.compute(task, equipment, now)
                    }
                    _ => UrgencyResult::unknown(),
                };
                TaskView { entry, urgency }
            })
            .collect()
    }

    /// Rows ordered most urgent first. Open tasks sort before completed ones.
    pub fn sorted_by_urgency(
        &self,
        equipment: &Equipment,
        now: DateTime<Utc>,
        calculator: &UrgencyCalculator,
    ) -> Vec<TaskView<'_>> {
        let mut views = self.views(equipment, now, calculator);
        views.sort_by(|a, b| {
            let done = |view: &TaskView<'_>| view.entry.task().is_some_and(|t| t.is_completed());
            done(a)
                .cmp(&done(b))
                .then_with(|| b.urgency.progress.total_cmp(&a.urgency.progress))
        });
        views
    }
}
