//! Cloud synchronization commands.
//!
//! `push`, `pull` and `merge` are the three manual reconciliation
//! strategies; `watch` runs the automatic-mode orchestrator in the
//! foreground until interrupted.

use chrono::{Duration, Utc};
use clap::Subcommand;
use timetrail_core::sync::backup::{BackupEngine, PullOutcome};
use timetrail_core::sync::orchestrator::SyncOrchestrator;
use timetrail_core::sync::status::SyncStatusHandle;
use timetrail_core::sync::SyncState;

use super::common::AppContext;

#[derive(Subcommand)]
pub enum SyncAction {
    /// Overwrite the remote backup with local state (destructive to remote)
    Push,
    /// Overwrite local state with the remote backup (destructive to local)
    Pull,
    /// Merge both sides last-write-wins and write the result to both
    Merge,
    /// Show local and remote backup state
    Status,
    /// Run the live listener with debounced push until interrupted
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        interval_ms: u64,
    },
}

pub fn run(action: SyncAction) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::open()?;
    let remote = ctx.remote()?;
    let user = ctx.user()?;
    let status = SyncStatusHandle::new();

    match action {
        SyncAction::Push => {
            let engine = BackupEngine::new(
                remote,
                ctx.store.clone(),
                ctx.local.clone(),
                status,
            );
            let count = engine.push(&user)?;
            println!("Pushed {count} task(s) to remote");
        }
        SyncAction::Pull => {
            let engine = BackupEngine::new(
                remote,
                ctx.store.clone(),
                ctx.local.clone(),
                status,
            );
            match engine.pull(&user)? {
                PullOutcome::Restored { tasks } => {
                    println!("Restored {tasks} task(s) from remote");
                }
                PullOutcome::NoBackup => {
                    println!("No backup found for {user}; local state untouched");
                }
            }
        }
        SyncAction::Merge => {
            let engine = BackupEngine::new(
                remote,
                ctx.store.clone(),
                ctx.local.clone(),
                status,
            );
            let count = engine.smart_merge(&user)?;
            println!("Merged: {count} task(s) on both sides");
        }
        SyncAction::Status => {
            let local_count = ctx.store.lock().unwrap().tasks().len();
            println!("user: {user}");
            println!("local tasks: {local_count}");
            match remote.fetch(&user)? {
                Some(snapshot) => {
                    println!("remote tasks: {}", snapshot.payload.tasks.len());
                    match snapshot.payload.updated_at {
                        Some(at) => println!("remote updated: {at}"),
                        None => println!("remote updated: unknown"),
                    }
                }
                None => println!("remote tasks: no backup"),
            }
        }
        SyncAction::Watch { interval_ms } => {
            let window = Duration::seconds(ctx.config.debounce_secs as i64);
            let mut orchestrator = SyncOrchestrator::new(
                remote,
                ctx.store.clone(),
                ctx.local.clone(),
                status.clone(),
                window,
            );
            orchestrator.connect(user.clone())?;
            println!("Watching remote changes for {user} (Ctrl-C to stop)");

            let mut last_state = status.state();
            loop {
                orchestrator.tick(Utc::now());
                let state = status.state();
                if state != last_state {
                    println!("sync state: {}", state_label(state));
                    last_state = state;
                }
                std::thread::sleep(std::time::Duration::from_millis(interval_ms));
            }
        }
    }

    Ok(())
}

fn state_label(state: SyncState) -> &'static str {
    match state {
        SyncState::Idle => "idle",
        SyncState::Syncing => "syncing",
        SyncState::Synced => "synced",
        SyncState::Error => "error",
        SyncState::Offline => "offline",
    }
}
