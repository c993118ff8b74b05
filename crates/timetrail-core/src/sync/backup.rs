//! Operator-triggered reconciliation strategies: push, pull, smart merge.
//!
//! The three operations are mutually exclusive; an `is_syncing` guard rejects
//! a request while another is in flight and is released on every exit path.
//!
//! - push: local wins, destructive to remote-only data
//! - pull: remote wins, destructive to local-only data
//! - smart merge: last-write-wins union written to both sides

use std::cell::Cell;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::storage::LocalStore;
use crate::sync::merge::merge_task_lists;
use crate::sync::remote::{RemoteStore, UserId};
use crate::sync::status::SyncStatusHandle;
use crate::sync::types::{BackupPayload, SyncError, SyncState};
use crate::task::store::SharedTaskStore;

/// Outcome of a pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// Local store overwritten with the remote list.
    Restored { tasks: usize },
    /// No valid backup payload exists remotely; nothing was mutated.
    NoBackup,
}

/// Executes the three reconciliation strategies against one remote store.
pub struct BackupEngine {
    remote: Arc<dyn RemoteStore>,
    store: SharedTaskStore,
    local: Arc<dyn LocalStore>,
    status: SyncStatusHandle,
    is_syncing: Cell<bool>,
}

impl BackupEngine {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        store: SharedTaskStore,
        local: Arc<dyn LocalStore>,
        status: SyncStatusHandle,
    ) -> Self {
        Self {
            remote,
            store,
            local,
            status,
            is_syncing: Cell::new(false),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing.get()
    }

    /// Write the current local list to the remote document wholesale.
    ///
    /// Destructive to remote-only data; this is both the explicit "send"
    /// action and the automatic debounced push. Returns the pushed task
    /// count.
    pub fn push(&self, user: &UserId) -> Result<usize, SyncError> {
        let _guard = self.begin()?;
        self.status.set_state(SyncState::Syncing);

        let result = self.do_push(user);
        self.finish(result.is_ok());
        result
    }

    /// Overwrite the local store with the remote list wholesale.
    ///
    /// Destructive to local-only data. A missing or invalid remote payload
    /// is a graceful no-op.
    pub fn pull(&self, user: &UserId) -> Result<PullOutcome, SyncError> {
        let _guard = self.begin()?;
        let previous = self.status.state();
        self.status.set_state(SyncState::Syncing);

        let result = self.do_pull(user);
        match &result {
            Ok(PullOutcome::Restored { .. }) => self.status.mark_synced(Utc::now()),
            Ok(PullOutcome::NoBackup) => self.status.set_state(previous),
            Err(_) => self.status.set_state(SyncState::Error),
        }
        result
    }

    /// Merge both lists last-write-wins and write the result to both sides.
    /// The only non-destructive strategy. Returns the merged task count.
    pub fn smart_merge(&self, user: &UserId) -> Result<usize, SyncError> {
        let _guard = self.begin()?;
        self.status.set_state(SyncState::Syncing);

        let result = self.do_smart_merge(user);
        self.finish(result.is_ok());
        result
    }

    fn do_push(&self, user: &UserId) -> Result<usize, SyncError> {
        let payload = {
            let store = self.store.lock().unwrap();
            BackupPayload::new(store.tasks().to_vec(), store.settings().clone())
        };
        let count = payload.tasks.len();
        self.remote.store_merge(user, &payload)?;
        debug!(user = %user, tasks = count, "pushed local state to remote");
        Ok(count)
    }

    fn do_pull(&self, user: &UserId) -> Result<PullOutcome, SyncError> {
        let Some(snapshot) = self.remote.fetch(user)? else {
            warn!(user = %user, "no valid backup found remotely; local state untouched");
            return Ok(PullOutcome::NoBackup);
        };

        let count = snapshot.payload.tasks.len();
        {
            let mut store = self.store.lock().unwrap();
            store.replace_all(snapshot.payload.tasks);
            store.apply_settings(snapshot.payload.settings);
            store.persist(self.local.as_ref())?;
        }
        debug!(user = %user, tasks = count, "restored local state from remote");
        Ok(PullOutcome::Restored { tasks: count })
    }

    fn do_smart_merge(&self, user: &UserId) -> Result<usize, SyncError> {
        let (local_tasks, settings) = {
            let store = self.store.lock().unwrap();
            (store.tasks().to_vec(), store.settings().clone())
        };

        let remote_tasks = match self.remote.fetch(user)? {
            Some(snapshot) => snapshot.payload.tasks,
            None => Vec::new(),
        };

        let outcome = merge_task_lists(&local_tasks, &remote_tasks);
        let count = outcome.tasks.len();

        // Remote first: a failed write leaves local state untouched.
        let payload = BackupPayload::new(outcome.tasks.clone(), settings);
        self.remote.store_merge(user, &payload)?;

        {
            let mut store = self.store.lock().unwrap();
            store.replace_all(outcome.tasks);
            store.persist(self.local.as_ref())?;
        }
        debug!(user = %user, tasks = count, "smart merge applied to both sides");
        Ok(count)
    }

    fn begin(&self) -> Result<SyncingGuard<'_>, SyncError> {
        if self.is_syncing.get() {
            return Err(SyncError::Busy);
        }
        self.is_syncing.set(true);
        Ok(SyncingGuard(&self.is_syncing))
    }

    fn finish(&self, ok: bool) {
        if ok {
            self.status.mark_synced(Utc::now());
        } else {
            self.status.set_state(SyncState::Error);
        }
    }
}

/// Releases the `is_syncing` flag on every exit path.
struct SyncingGuard<'a>(&'a Cell<bool>);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
