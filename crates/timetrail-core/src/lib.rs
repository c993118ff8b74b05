//! # Timetrail Core Library
//!
//! Core business logic for Timetrail, a personal time tracker with
//! offline-first multi-device synchronization. The library owns the task
//! model and store, local persistence, and the whole sync engine; the CLI
//! binary (and any future GUI) is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Task store**: owned state container with a single mutation entry
//!   point and a revision counter the sync layer observes
//! - **Storage**: JSON key-value persistence for tasks plus a TOML device
//!   config
//! - **Sync**: last-write-wins merge engine, push/pull/smart-merge backup
//!   strategies, and a tick-driven orchestrator that suppresses echo loops
//!   between the remote watch and the debounced write-back
//! - **Stats**: pure aggregation over task intervals for dashboards
//!
//! ## Key components
//!
//! - [`TaskStore`]: canonical task collection
//! - [`SyncOrchestrator`]: automatic-mode sync state machine
//! - [`BackupEngine`]: the three manual reconciliation strategies
//! - [`merge_task_lists`]: the conflict-resolution function

pub mod settings;
pub mod stats;
pub mod storage;
pub mod sync;
pub mod task;
pub mod timefmt;

pub use settings::{DecimalSeparator, SyncMode, SyncedSettings};
pub use storage::{AppConfig, JsonFileStore, LocalStore, MemoryStore};
pub use sync::{
    merge_task_lists, BackupEngine, BackupPayload, FileRemote, PullOutcome, RemoteStore,
    SyncError, SyncOrchestrator, SyncState, SyncStatus, SyncStatusHandle, UserId,
};
pub use task::store::{shared, SharedTaskStore, StoreError, TaskStore};
pub use task::{Tag, Task, TaskStatus, TimeInterval};
