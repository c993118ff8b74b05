//! Shared, observable sync status.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::sync::types::{SyncState, SyncStatus};

/// Cloneable handle to the process-wide sync status.
///
/// Written only by the orchestrator and the backup engine; everyone else
/// reads snapshots.
#[derive(Clone, Default)]
pub struct SyncStatusHandle {
    inner: Arc<Mutex<SyncStatus>>,
}

impl SyncStatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, state: SyncState) {
        self.inner.lock().unwrap().state = state;
    }

    /// Record a successful sync: state `Synced` plus refreshed timestamp.
    pub fn mark_synced(&self, at: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = SyncState::Synced;
        inner.last_sync_at = Some(at);
    }

    /// Back to `Idle`, e.g. on sign-out or switch to manual mode. Keeps the
    /// last-sync timestamp.
    pub fn reset(&self) {
        self.inner.lock().unwrap().state = SyncState::Idle;
    }

    pub fn state(&self) -> SyncState {
        self.inner.lock().unwrap().state
    }

    pub fn snapshot(&self) -> SyncStatus {
        self.inner.lock().unwrap().clone()
    }
}
