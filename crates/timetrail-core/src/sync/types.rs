//! Core types for cloud synchronization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::SyncedSettings;
use crate::storage::StorageError;
use crate::sync::remote::RemoteError;
use crate::task::store::StoreError;
use crate::task::Task;

/// Current backup payload schema version.
pub const BACKUP_VERSION: u32 = 1;

/// Derived, observable sync state consumed by the UI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Signed out or manual mode; nothing in flight.
    #[default]
    Idle,
    /// A push or pull is in flight, or the listener awaits its first snapshot.
    Syncing,
    Synced,
    Error,
    /// Data served from the local cache while connectivity is absent.
    /// Explicitly not an error.
    Offline,
}

/// Status snapshot exposed read-only to the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncState,
    /// Last successful sync timestamp.
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// The whole-document backup written under one user key.
///
/// This is the single canonical remote layout; there is no per-task-document
/// variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub settings: SyncedSettings,
    pub version: u32,
    /// Server-assigned write timestamp; `None` until stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BackupPayload {
    pub fn new(tasks: Vec<Task>, settings: SyncedSettings) -> Self {
        Self {
            tasks,
            settings,
            version: BACKUP_VERSION,
            updated_at: None,
        }
    }

    /// Extract and validate a payload from a remote document.
    ///
    /// Returns `None` when the `backup` field is missing or `tasks` is not an
    /// array of well-formed task records; callers treat that as "no backup
    /// available", never as a crash.
    pub fn from_document(document: &serde_json::Value) -> Option<Self> {
        let backup = document.get("backup")?;
        backup.get("tasks")?.as_array()?;
        serde_json::from_value(backup.clone()).ok()
    }

    /// Wrap into the `{ "backup": ... }` document envelope.
    pub fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(serde_json::json!({ "backup": serde_json::to_value(self)? }))
    }
}

/// Sync operation errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Another sync operation is already in flight")]
    Busy,

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Task store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
