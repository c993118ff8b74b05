//! Offline-first multi-device synchronization layer.
//!
//! Reconciles the local task store against one remote backup document per
//! user. Conflicts resolve at whole-record granularity, last-write-wins by
//! `updated_at`; a live watch plus a debounced push keep devices converged
//! in automatic mode, and three explicit strategies (push, pull, smart
//! merge) cover manual reconciliation.

pub mod backup;
pub mod merge;
pub mod orchestrator;
pub mod remote;
pub mod status;
pub mod types;

#[cfg(test)]
mod testutil;

pub use backup::{BackupEngine, PullOutcome};
pub use merge::{merge_task_lists, MergeOutcome};
pub use orchestrator::{AlwaysOnline, Connectivity, SyncOrchestrator};
pub use remote::{FileRemote, RemoteError, RemoteEvent, RemoteSnapshot, RemoteStore, RemoteWatch, UserId};
pub use status::SyncStatusHandle;
pub use types::{BackupPayload, SyncError, SyncState, SyncStatus, BACKUP_VERSION};
