/*
[INPUT]:  MaintenanceTask, owning Equipment counter, current time
[OUTPUT]: UrgencyResult (progress + remaining time) and "last updated" labels
[POS]:    Core computation - due-status of periodic maintenance
[UPDATE]: When due-status rules or display buckets change
*/

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use upkeep_adapter::{Equipment, MaintenanceTask, TaskSchedule};

/// Share of the interval assumed already consumed by a counter-based task
/// that has never been completed. A heuristic, not a measurement.
pub const DEFAULT_NO_HISTORY_FRACTION: f64 = 0.2;

const MILLIS_PER_DAY: f64 = 86_400_000.0;
const HIGH_TIER_THRESHOLD: f64 = 0.75;
const MEDIUM_TIER_THRESHOLD: f64 = 0.5;

/// Tunable assumptions of the urgency computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrgencyPolicy {
    pub no_history_fraction: f64,
}

impl Default for UrgencyPolicy {
    fn default() -> Self {
        Self {
            no_history_fraction: DEFAULT_NO_HISTORY_FRACTION,
        }
    }
}

impl UrgencyPolicy {
    /// Policy with a custom no-history fraction, clamped to `[0, 1]`.
    pub fn with_no_history_fraction(fraction: f64) -> Self {
        if fraction.is_nan() {
            return Self::default();
        }
        Self {
            no_history_fraction: fraction.clamp(0.0, 1.0),
        }
    }
}

/// Time left until a task is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Hours(i64),
    Days(i64),
    DueNow,
    /// Nothing to measure against (no hour counter, unreadable task)
    Unknown,
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Hours(hours) => write!(f, "{hours} hours remaining"),
            Remaining::Days(days) => write!(f, "{days} days remaining"),
            Remaining::DueNow => f.write_str("Due now"),
            Remaining::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Presentation bucket derived from progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UrgencyTier {
    Low,
    Medium,
    High,
}

impl UrgencyTier {
    pub fn from_progress(progress: f64) -> Self {
        if progress > HIGH_TIER_THRESHOLD {
            UrgencyTier::High
        } else if progress > MEDIUM_TIER_THRESHOLD {
            UrgencyTier::Medium
        } else {
            UrgencyTier::Low
        }
    }
}

/// Due-status of one task. Recomputed on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrgencyResult {
    /// Share of the interval consumed, in `[0, 1]`
    pub progress: f64,
    pub remaining: Remaining,
}

impl UrgencyResult {
    pub fn unknown() -> Self {
        Self {
            progress: 0.0,
            remaining: Remaining::Unknown,
        }
    }

    pub fn due_now() -> Self {
        Self {
            progress: 1.0,
            remaining: Remaining::DueNow,
        }
    }

    pub fn tier(&self) -> UrgencyTier {
        UrgencyTier::from_progress(self.progress)
    }

    pub fn remaining_label(&self) -> String {
        self.remaining.to_string()
    }

    pub fn is_known(&self) -> bool {
        self.remaining != Remaining::Unknown
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrgencyCalculator {
    policy: UrgencyPolicy,
}

impl UrgencyCalculator {
    pub fn new(policy: UrgencyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UrgencyPolicy {
        self.policy
    }

    /// Compute the due-status of `task` on `equipment` at `now`. Total: every
    /// typed input yields a result.
    pub fn compute(
        &self,
        task: &MaintenanceTask,
        equipment: &Equipment,
        now: DateTime<Utc>,
    ) -> UrgencyResult {
        match &task.schedule {
            TaskSchedule::CounterBased {
                interval_counter_units,
                last_completed_at_counter,
            } => counter_urgency(
                *interval_counter_units,
                *last_completed_at_counter,
                equipment.hour_counter,
                self.policy.no_history_fraction,
            ),
            TaskSchedule::DateBased { due_at, created_at } => {
                date_urgency(*due_at, *created_at, now)
            }
        }
    }
}

/// [`UrgencyCalculator::compute`] with the default policy.
pub fn compute_urgency(
    task: &MaintenanceTask,
    equipment: &Equipment,
    now: DateTime<Utc>,
) -> UrgencyResult {
    UrgencyCalculator::default().compute(task, equipment, now)
}

fn counter_urgency(
    interval: f64,
    last_completed_at: Option<f64>,
    hour_counter: Option<f64>,
    no_history_fraction: f64,
) -> UrgencyResult {
    // A zero or negative interval has nothing left to run down.
    if interval.is_nan() || interval <= 0.0 {
        return UrgencyResult::due_now();
    }
    let Some(counter) = hour_counter.filter(|value| value.is_finite()) else {
        return UrgencyResult::unknown();
    };

    let baseline = last_completed_at
        .filter(|value| value.is_finite())
        .unwrap_or(counter - no_history_fraction * interval);
    // Counter went backward (meter swap, typo): treat as no time elapsed.
    let elapsed = (counter - baseline).max(0.0);
    let progress = (elapsed / interval).clamp(0.0, 1.0);
    let remaining = interval - elapsed;

    UrgencyResult {
        progress,
        remaining: if remaining > 0.0 {
            Remaining::Hours(remaining.round() as i64)
        } else {
            Remaining::DueNow
        },
    }
}

fn date_urgency(due_at: DateTime<Utc>, created_at: DateTime<Utc>, now: DateTime<Utc>) -> UrgencyResult {
    let total_ms = (due_at - created_at).num_milliseconds();
    if total_ms <= 0 {
        return UrgencyResult::due_now();
    }

    let elapsed_ms = (now - created_at).num_milliseconds() as f64;
    let progress = (elapsed_ms / total_ms as f64).clamp(0.0, 1.0);
    let days = ((due_at - now).num_milliseconds() as f64 / MILLIS_PER_DAY).round() as i64;

    UrgencyResult {
        progress,
        remaining: if days > 0 {
            Remaining::Days(days)
        } else {
            Remaining::DueNow
        },
    }
}

/// When an equipment reading was last updated, bucketed by calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastUpdated {
    Today(NaiveTime),
    Yesterday,
    On(NaiveDate),
}

impl fmt::Display for LastUpdated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastUpdated::Today(time) => write!(f, "Today at {}", time.format("%H:%M")),
            LastUpdated::Yesterday => f.write_str("Yesterday"),
            LastUpdated::On(date) => write!(f, "{}", date.format("%d/%m/%Y")),
        }
    }
}

/// Classify `last` relative to `now` by calendar dates in `tz`.
///
/// 23:50 yesterday seen at 00:10 today is "Yesterday" even though only
/// twenty minutes passed; 26 hours spanning two midnights is a plain date.
pub fn last_updated_label<Tz: TimeZone>(
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> LastUpdated {
    let last_local = last.with_timezone(tz);
    let last_day = last_local.date_naive();
    let today = now.with_timezone(tz).date_naive();

    if last_day == today {
        LastUpdated::Today(last_local.time())
    } else if today.pred_opt() == Some(last_day) {
        LastUpdated::Yesterday
    } else {
        LastUpdated::On(last_day)
    }
}
