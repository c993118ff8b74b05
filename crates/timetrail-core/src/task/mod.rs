//! Task model: the unit of time tracking and of synchronization.
//!
//! A task accumulates timing [`TimeInterval`]s and moves through a small
//! status lifecycle:
//!
//!   IDLE ──────> RUNNING ──────> COMPLETED
//!     ^   start     |    complete     |
//!     |             v                 | reopen
//!     |   pause  PAUSED ── resume ────+──> IDLE
//!
//! Valid transitions:
//! - IDLE → RUNNING (start)
//! - RUNNING → PAUSED (pause)
//! - RUNNING / PAUSED / IDLE → COMPLETED (complete)
//! - PAUSED → RUNNING (resume)
//! - COMPLETED → IDLE (reopen)
//!
//! `updated_at` is the authoritative conflict-resolution field: every
//! mutation must stamp it. Records that predate the field deserialize with
//! `None`, which the sync layer treats as epoch zero so they never win a
//! conflict against a stamped record.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created but not currently being timed.
    Idle,
    /// Actively being timed (has an open interval).
    Running,
    /// Timing stopped, task not finished.
    Paused,
    /// Finished (terminal until reopened).
    Completed,
}

impl TaskStatus {
    /// Check if a transition is valid.
    pub fn can_transition_to(&self, to: &TaskStatus) -> bool {
        match self {
            TaskStatus::Idle => matches!(to, TaskStatus::Running | TaskStatus::Completed),
            TaskStatus::Running => matches!(to, TaskStatus::Paused | TaskStatus::Completed),
            TaskStatus::Paused => matches!(to, TaskStatus::Running | TaskStatus::Completed),
            TaskStatus::Completed => matches!(to, TaskStatus::Idle),
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Idle
    }
}

/// A colored label attached to a task.
///
/// Label uniqueness is a UI convention; nothing here enforces it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub label: String,
    pub color: String,
}

impl Tag {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            color: color.into(),
        }
    }
}

/// One contiguous timing session. `end = None` means the interval is open
/// and the task is actively being timed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeInterval {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeInterval {
    /// Open a new interval starting at `start`.
    pub fn open(start: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            start,
            end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Elapsed milliseconds; an open interval is counted up to `now`.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        let end = self.end.unwrap_or(now);
        (end - self.start).num_milliseconds().max(0)
    }
}

/// A trackable unit of work.
///
/// Serializes with camelCase field names; this is both the local-persistence
/// shape and the wire shape inside the backup payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable unique id, assigned at creation, never reassigned.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub intervals: Vec<TimeInterval>,
    /// Creation timestamp, immutable.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp; authoritative for conflict resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a fresh idle task stamped at `now`.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        tags: Vec<Tag>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description,
            tags,
            status: TaskStatus::Idle,
            intervals: Vec::new(),
            created_at: now,
            updated_at: Some(now),
            completed_at: None,
        }
    }

    /// `updated_at` for conflict resolution; missing means epoch zero so
    /// legacy records never spuriously win.
    pub fn effective_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Stamp the modification timestamp. Every mutation must call this.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    pub fn open_interval(&self) -> Option<&TimeInterval> {
        self.intervals.iter().find(|i| i.is_open())
    }

    /// Close any open interval at `now`.
    pub fn close_open_intervals(&mut self, now: DateTime<Utc>) {
        for interval in &mut self.intervals {
            if interval.end.is_none() {
                interval.end = Some(now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_transitions() {
        assert!(TaskStatus::Idle.can_transition_to(&TaskStatus::Running));
        assert!(TaskStatus::Running.can_transition_to(&TaskStatus::Paused));
        assert!(TaskStatus::Paused.can_transition_to(&TaskStatus::Running));
        assert!(TaskStatus::Completed.can_transition_to(&TaskStatus::Idle));

        assert!(!TaskStatus::Idle.can_transition_to(&TaskStatus::Paused));
        assert!(!TaskStatus::Completed.can_transition_to(&TaskStatus::Running));
    }

    #[test]
    fn test_effective_updated_at_missing_is_epoch() {
        let mut task = Task::new("legacy", None, vec![], Utc::now());
        task.updated_at = None;
        assert_eq!(task.effective_updated_at(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_interval_elapsed_open_counts_to_now() {
        let start = Utc::now();
        let interval = TimeInterval::open(start);
        let now = start + Duration::seconds(90);
        assert_eq!(interval.elapsed_ms(now), 90_000);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let task = Task::new("shape", None, vec![], Utc::now());
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("completed_at").is_none());
    }

    #[test]
    fn test_legacy_record_deserializes_without_updated_at() {
        let json = r#"{
            "id": "t1",
            "name": "old",
            "tags": [],
            "status": "idle",
            "intervals": [],
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert!(task.updated_at.is_none());
        assert_eq!(task.effective_updated_at(), DateTime::UNIX_EPOCH);
    }
}
