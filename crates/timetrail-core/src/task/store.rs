//! Owned task-list container with a single mutation entry point.
//!
//! Every mutation goes through a method on [`TaskStore`], stamps the task's
//! `updated_at`, and bumps a monotonic revision counter. The sync
//! orchestrator watches the revision to observe local changes, so flag state
//! and store state can never desynchronize the way ambient closures can.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::settings::{DecimalSeparator, SyncedSettings};
use crate::storage::{LocalStore, StorageError};
use crate::task::{Tag, Task, TaskStatus};

/// Local-persistence key for the task list.
pub const TASKS_KEY: &str = "tasks-v1";
/// Local-persistence key for the synced settings.
pub const SETTINGS_KEY: &str = "settings-v1";

/// Errors from task-store mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No task with id {0}")]
    NotFound(String),

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}

/// The store, shared between the mutation layer and the sync orchestrator.
pub type SharedTaskStore = Arc<Mutex<TaskStore>>;

/// Canonical in-memory task collection; single source of truth for what is
/// rendered and for what gets written remotely.
#[derive(Debug, Default)]
pub struct TaskStore {
    /// Insertion/display order; newest first. Not significant to sync.
    tasks: Vec<Task>,
    settings: SyncedSettings,
    /// Bumped by every mutation, including value-equal replacements.
    revision: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tasks and settings from local persistence. Missing keys yield an
    /// empty store.
    pub fn load(local: &dyn LocalStore) -> Result<Self, StorageError> {
        let tasks = match local.get(TASKS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        let settings = match local.get(SETTINGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => SyncedSettings::default(),
        };
        Ok(Self {
            tasks,
            settings,
            revision: 0,
        })
    }

    /// Write tasks and settings back to local persistence.
    pub fn persist(&self, local: &dyn LocalStore) -> Result<(), StorageError> {
        local.set(TASKS_KEY, &serde_json::to_string(&self.tasks)?)?;
        local.set(SETTINGS_KEY, &serde_json::to_string(&self.settings)?)?;
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn settings(&self) -> &SyncedSettings {
        &self.settings
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The task currently being timed, if any.
    pub fn running_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| t.status == TaskStatus::Running)
    }

    /// Create a new idle task at the front of the display order.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        tags: Vec<Tag>,
        now: DateTime<Utc>,
    ) -> Task {
        let task = Task::new(name, description, tags, now);
        self.tasks.insert(0, task.clone());
        self.bump();
        task
    }

    /// Edit name and/or description.
    pub fn edit(
        &mut self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let task = self.get_mut(id)?;
        if let Some(name) = name {
            task.name = name;
        }
        if let Some(description) = description {
            task.description = Some(description);
        }
        task.touch(now);
        self.bump();
        Ok(())
    }

    pub fn set_tags(&mut self, id: &str, tags: Vec<Tag>, now: DateTime<Utc>) -> Result<(), StoreError> {
        let task = self.get_mut(id)?;
        task.tags = tags;
        task.touch(now);
        self.bump();
        Ok(())
    }

    /// Start timing a task, opening a fresh interval.
    ///
    /// Any other running task is paused first: at most one interval may be
    /// open across the whole store, or elapsed-time computation corrupts.
    pub fn start(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_transition(id, TaskStatus::Running)?;

        for task in &mut self.tasks {
            if task.id != id && task.status == TaskStatus::Running {
                task.status = TaskStatus::Paused;
                task.close_open_intervals(now);
                task.touch(now);
            }
        }

        let task = self.get_mut(id)?;
        task.status = TaskStatus::Running;
        task.intervals.push(crate::task::TimeInterval::open(now));
        task.touch(now);
        self.bump();
        Ok(())
    }

    /// Pause a running task, closing its open interval.
    pub fn pause(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_transition(id, TaskStatus::Paused)?;
        let task = self.get_mut(id)?;
        task.status = TaskStatus::Paused;
        task.close_open_intervals(now);
        task.touch(now);
        self.bump();
        Ok(())
    }

    /// Complete a task from any non-completed status.
    pub fn complete(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_transition(id, TaskStatus::Completed)?;
        let task = self.get_mut(id)?;
        task.status = TaskStatus::Completed;
        task.close_open_intervals(now);
        task.completed_at = Some(now);
        task.touch(now);
        self.bump();
        Ok(())
    }

    /// Reopen a completed task, clearing `completed_at`.
    pub fn reopen(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_transition(id, TaskStatus::Idle)?;
        let task = self.get_mut(id)?;
        task.status = TaskStatus::Idle;
        task.completed_at = None;
        task.touch(now);
        self.bump();
        Ok(())
    }

    /// Remove a task from the list, returning it.
    ///
    /// Removal only propagates remotely through the next whole-document
    /// push; a merge against a remote copy that still holds the task will
    /// resurrect it.
    pub fn delete(&mut self, id: &str) -> Result<Task, StoreError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = self.tasks.remove(index);
        self.bump();
        Ok(removed)
    }

    /// Replace the whole list (pull or merge application).
    ///
    /// Bumps the revision even when the new list is value-equal, so an armed
    /// echo latch is always consumed by the following observation instead of
    /// leaking into a later user-mutation window.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.bump();
    }

    pub fn set_decimal_separator(&mut self, separator: DecimalSeparator) {
        self.settings.decimal_separator = separator;
        self.bump();
    }

    /// Apply settings arriving from a remote snapshot.
    pub fn apply_settings(&mut self, settings: SyncedSettings) {
        if self.settings != settings {
            self.settings = settings;
            self.bump();
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task, StoreError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn check_transition(&self, id: &str, to: TaskStatus) -> Result<(), StoreError> {
        let task = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !task.status.can_transition_to(&to) {
            return Err(StoreError::InvalidTransition {
                from: task.status,
                to,
            });
        }
        Ok(())
    }

    fn bump(&mut self) {
        self.revision += 1;
        debug!(revision = self.revision, "task store mutated");
    }
}

/// Convenience constructor for the shared handle.
pub fn shared(store: TaskStore) -> SharedTaskStore {
    Arc::new(Mutex::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_create_prepends_and_bumps_revision() {
        let mut store = TaskStore::new();
        store.create("first", None, vec![], now());
        let second = store.create("second", None, vec![], now());
        assert_eq!(store.tasks()[0].id, second.id);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_start_pauses_other_running_task() {
        let mut store = TaskStore::new();
        let t0 = now();
        let a = store.create("a", None, vec![], t0);
        let b = store.create("b", None, vec![], t0);

        store.start(&a.id, t0).unwrap();
        store.start(&b.id, t0 + Duration::seconds(5)).unwrap();

        let a = store.get(&a.id).unwrap();
        let b = store.get(&b.id).unwrap();
        assert_eq!(a.status, TaskStatus::Paused);
        assert_eq!(b.status, TaskStatus::Running);

        // Single open interval across the whole store.
        let open_count: usize = store
            .tasks()
            .iter()
            .map(|t| t.intervals.iter().filter(|i| i.is_open()).count())
            .sum();
        assert_eq!(open_count, 1);
    }

    #[test]
    fn test_pause_requires_running() {
        let mut store = TaskStore::new();
        let t = store.create("t", None, vec![], now());
        let err = store.pause(&t.id, now()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_complete_closes_interval_and_stamps() {
        let mut store = TaskStore::new();
        let t0 = now();
        let t = store.create("t", None, vec![], t0);
        store.start(&t.id, t0).unwrap();
        let t1 = t0 + Duration::minutes(10);
        store.complete(&t.id, t1).unwrap();

        let task = store.get(&t.id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(t1));
        assert!(task.open_interval().is_none());
        assert_eq!(task.updated_at, Some(t1));
    }

    #[test]
    fn test_reopen_clears_completed_at() {
        let mut store = TaskStore::new();
        let t0 = now();
        let t = store.create("t", None, vec![], t0);
        store.complete(&t.id, t0).unwrap();
        store.reopen(&t.id, t0 + Duration::seconds(1)).unwrap();

        let task = store.get(&t.id).unwrap();
        assert_eq!(task.status, TaskStatus::Idle);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut store = TaskStore::new();
        assert!(matches!(
            store.delete("missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_replace_all_bumps_even_when_equal() {
        let mut store = TaskStore::new();
        store.create("t", None, vec![], now());
        let before = store.revision();
        let same = store.tasks().to_vec();
        store.replace_all(same);
        assert_eq!(store.revision(), before + 1);
    }

    #[test]
    fn test_persist_and_load_round_trip() {
        let local = MemoryStore::new();
        let mut store = TaskStore::new();
        store.create("persisted", None, vec![Tag::new("work", "#ff0000")], now());
        store.set_decimal_separator(DecimalSeparator::Comma);
        store.persist(&local).unwrap();

        let loaded = TaskStore::load(&local).unwrap();
        assert_eq!(loaded.tasks(), store.tasks());
        assert_eq!(
            loaded.settings().decimal_separator,
            DecimalSeparator::Comma
        );
    }

    #[test]
    fn test_load_empty_store() {
        let local = MemoryStore::new();
        let store = TaskStore::load(&local).unwrap();
        assert!(store.tasks().is_empty());
        assert_eq!(store.revision(), 0);
    }
}
