//! Feedback-loop-prevention state machine wiring the remote watch, the merge
//! engine and the task store together.
//!
//! Single-threaded and tick-driven: the host loop calls [`SyncOrchestrator::tick`]
//! periodically with the current wall-clock time. Each tick drains remote
//! events, observes local mutations through the store revision counter, and
//! fires the debounced push when its deadline elapses. Applying a remote
//! snapshot arms a one-shot echo latch strictly before the store mutation;
//! the next local-change observation consumes it instead of scheduling a
//! push, which is what breaks the write-back loop.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::storage::LocalStore;
use crate::sync::backup::BackupEngine;
use crate::sync::merge::merge_task_lists;
use crate::sync::remote::{RemoteEvent, RemoteSnapshot, RemoteStore, RemoteWatch, UserId};
use crate::sync::status::SyncStatusHandle;
use crate::sync::types::{SyncError, SyncState};
use crate::task::store::SharedTaskStore;

/// Network reachability probe, consulted to tell "offline cache" apart from
/// a live snapshot.
pub trait Connectivity {
    fn is_online(&self) -> bool;
}

/// Default probe for transports without an offline mode.
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// One-shot suppression latch for the echo of an applied remote update.
///
/// Armed strictly before the store mutation a snapshot causes; consumed by at
/// most one subsequent local-change observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum EchoLatch {
    #[default]
    Clear,
    Armed,
}

impl EchoLatch {
    fn arm(&mut self) {
        *self = EchoLatch::Armed;
    }

    /// Returns true when an armed latch was consumed.
    fn consume(&mut self) -> bool {
        match self {
            EchoLatch::Armed => {
                *self = EchoLatch::Clear;
                true
            }
            EchoLatch::Clear => false,
        }
    }
}

/// Orchestrates automatic sync for one device session.
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteStore>,
    store: SharedTaskStore,
    local: Arc<dyn LocalStore>,
    engine: BackupEngine,
    status: SyncStatusHandle,
    connectivity: Box<dyn Connectivity>,
    debounce_window: Duration,

    user: Option<UserId>,
    watch: Option<Box<dyn RemoteWatch>>,
    latch: EchoLatch,
    debounce_deadline: Option<DateTime<Utc>>,
    last_seen_revision: u64,
}

impl SyncOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        store: SharedTaskStore,
        local: Arc<dyn LocalStore>,
        status: SyncStatusHandle,
        debounce_window: Duration,
    ) -> Self {
        let engine = BackupEngine::new(
            Arc::clone(&remote),
            Arc::clone(&store),
            Arc::clone(&local),
            status.clone(),
        );
        Self {
            remote,
            store,
            local,
            engine,
            status,
            connectivity: Box::new(AlwaysOnline),
            debounce_window,
            user: None,
            watch: None,
            latch: EchoLatch::Clear,
            debounce_deadline: None,
            last_seen_revision: 0,
        }
    }

    /// Replace the connectivity probe (platform-specific or test double).
    pub fn with_connectivity(mut self, connectivity: Box<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Attach the remote watch for a signed-in user.
    ///
    /// Status stays `Syncing` until the first snapshot arrives.
    pub fn connect(&mut self, user: UserId) -> Result<(), SyncError> {
        self.disconnect();
        let watch = self.remote.watch(&user)?;
        self.last_seen_revision = self.store.lock().unwrap().revision();
        self.watch = Some(watch);
        self.user = Some(user);
        self.status.set_state(SyncState::Syncing);
        Ok(())
    }

    /// Tear down the session: drop the watch, cancel any pending debounce,
    /// clear the latch, force status back to `Idle`.
    ///
    /// After this returns, late events still queued in the transport can
    /// never reach the task store.
    pub fn disconnect(&mut self) {
        self.watch = None;
        self.user = None;
        self.debounce_deadline = None;
        self.latch = EchoLatch::Clear;
        self.status.reset();
    }

    pub fn is_listening(&self) -> bool {
        self.watch.is_some()
    }

    /// Drive the state machine. Call periodically; all deadlines are
    /// comparisons against `now`, so tests can feed synthetic clocks.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.watch.is_none() {
            return;
        }

        let events = match self.watch.as_mut() {
            Some(watch) => watch.poll(),
            None => Vec::new(),
        };
        for event in events {
            // A handler may disconnect on fatal errors; stop draining then.
            if self.watch.is_none() {
                break;
            }
            match event {
                RemoteEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot),
                RemoteEvent::Absent => self.apply_absent(now),
                RemoteEvent::Error(e) => {
                    warn!(error = %e, "remote listener error");
                    self.status.set_state(SyncState::Error);
                }
            }
        }

        self.observe_local(now);
        self.flush_debounce(now);
    }

    /// Merge an incoming snapshot into the task store.
    fn apply_snapshot(&mut self, snapshot: RemoteSnapshot) {
        let offline = snapshot.from_cache && !self.connectivity.is_online();

        let outcome = {
            let store = self.store.lock().unwrap();
            merge_task_lists(store.tasks(), &snapshot.payload.tasks)
        };

        // Arm before the mutation, never after: the next local-change
        // observation must see the latch already set.
        self.latch.arm();
        {
            let mut store = self.store.lock().unwrap();
            store.replace_all(outcome.tasks.clone());
            store.apply_settings(snapshot.payload.settings.clone());
            if let Err(e) = store.persist(self.local.as_ref()) {
                warn!(error = %e, "failed to persist merged state locally");
            }
        }

        if offline {
            self.status.set_state(SyncState::Offline);
        }

        if outcome.matches_remote {
            debug!("remote snapshot applied cleanly, no push-back needed");
            if !offline {
                self.status.set_state(SyncState::Synced);
            }
            return;
        }

        // A cache-served snapshot may lag the live document; pushing against
        // it would also trade the offline status for an error. The divergence
        // syncs once live snapshots or local mutations resume.
        if offline {
            debug!("merge diverged while offline, deferring push-back");
            return;
        }

        // Local had data the remote lacks: push the merged list immediately
        // instead of waiting out the debounce. The echo of this push is
        // absorbed by a later idempotent merge.
        debug!("merge diverged from remote, pushing merged state back");
        if let Some(user) = self.user.clone() {
            if let Err(e) = self.engine.push(&user) {
                warn!(error = %e, "push-back of merged state failed");
            }
        }
    }

    /// Handle a watch confirming no backup document exists. Only meaningful
    /// while awaiting the first snapshot: an empty store is already
    /// converged, local data gets seeded through the debounce path.
    fn apply_absent(&mut self, now: DateTime<Utc>) {
        if self.status.state() != SyncState::Syncing {
            return;
        }
        if self.store.lock().unwrap().tasks().is_empty() {
            debug!("no remote backup and nothing local, settling as synced");
            self.status.set_state(SyncState::Synced);
        } else {
            debug!("no remote backup yet, scheduling initial push");
            self.debounce_deadline = Some(now + self.debounce_window);
        }
    }

    /// Observe local task-store mutations via the revision counter.
    fn observe_local(&mut self, now: DateTime<Utc>) {
        let revision = self.store.lock().unwrap().revision();
        if revision == self.last_seen_revision {
            return;
        }
        self.last_seen_revision = revision;

        if self.latch.consume() {
            debug!("local change was a remote echo, skipping push");
            return;
        }

        // Trailing-edge debounce: every further mutation restarts the timer.
        self.debounce_deadline = Some(now + self.debounce_window);
        debug!("local change observed, push debounced");
    }

    /// Fire the debounced push once its deadline elapses.
    fn flush_debounce(&mut self, now: DateTime<Utc>) {
        let Some(deadline) = self.debounce_deadline else {
            return;
        };
        if now < deadline {
            return;
        }
        self.debounce_deadline = None;

        let Some(user) = self.user.clone() else {
            return;
        };
        match self.engine.push(&user) {
            Ok(count) => debug!(tasks = count, "debounced push completed"),
            Err(e) => warn!(error = %e, "debounced push failed"),
        }
    }
}
