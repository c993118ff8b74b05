//! In-memory remote store double shared by the sync tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::settings::SyncedSettings;
use crate::sync::remote::{
    RemoteError, RemoteEvent, RemoteSnapshot, RemoteStore, RemoteWatch, UserId,
};
use crate::sync::types::BackupPayload;
use crate::task::{Task, TaskStatus};

#[derive(Default)]
struct FakeRemoteInner {
    doc: Mutex<Option<BackupPayload>>,
    /// Delivered on every snapshot; simulates cache-served reads.
    from_cache: Mutex<bool>,
    fail_store: Mutex<bool>,
    store_calls: Mutex<usize>,
    /// Errors each watch emits before looking at the document.
    queued_errors: Mutex<Vec<RemoteError>>,
}

/// In-memory [`RemoteStore`] with failure and cache-flag injection.
#[derive(Clone, Default)]
pub struct FakeRemote {
    inner: Arc<FakeRemoteInner>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the remote document directly, bypassing the store-call counter.
    pub fn seed(&self, payload: BackupPayload) {
        *self.inner.doc.lock().unwrap() = Some(payload);
    }

    pub fn document(&self) -> Option<BackupPayload> {
        self.inner.doc.lock().unwrap().clone()
    }

    pub fn store_calls(&self) -> usize {
        *self.inner.store_calls.lock().unwrap()
    }

    pub fn set_from_cache(&self, from_cache: bool) {
        *self.inner.from_cache.lock().unwrap() = from_cache;
    }

    pub fn set_fail_store(&self, fail: bool) {
        *self.inner.fail_store.lock().unwrap() = fail;
    }

    pub fn queue_error(&self, error: RemoteError) {
        self.inner.queued_errors.lock().unwrap().push(error);
    }
}

impl RemoteStore for FakeRemote {
    fn fetch(&self, _user: &UserId) -> Result<Option<RemoteSnapshot>, RemoteError> {
        let from_cache = *self.inner.from_cache.lock().unwrap();
        Ok(self
            .inner
            .doc
            .lock()
            .unwrap()
            .clone()
            .map(|payload| RemoteSnapshot { payload, from_cache }))
    }

    fn store_merge(
        &self,
        _user: &UserId,
        payload: &BackupPayload,
    ) -> Result<DateTime<Utc>, RemoteError> {
        if *self.inner.fail_store.lock().unwrap() {
            return Err(RemoteError::Unavailable("injected failure".into()));
        }
        let stamped_at = Utc::now();
        let mut stamped = payload.clone();
        stamped.updated_at = Some(stamped_at);
        *self.inner.doc.lock().unwrap() = Some(stamped);
        *self.inner.store_calls.lock().unwrap() += 1;
        Ok(stamped_at)
    }

    fn delete(&self, _user: &UserId) -> Result<(), RemoteError> {
        *self.inner.doc.lock().unwrap() = None;
        Ok(())
    }

    fn watch(&self, _user: &UserId) -> Result<Box<dyn RemoteWatch>, RemoteError> {
        Ok(Box::new(FakeWatch {
            inner: Arc::clone(&self.inner),
            last_seen: None,
            notified_absent: false,
        }))
    }
}

struct FakeWatch {
    inner: Arc<FakeRemoteInner>,
    last_seen: Option<BackupPayload>,
    notified_absent: bool,
}

impl RemoteWatch for FakeWatch {
    fn poll(&mut self) -> Vec<RemoteEvent> {
        let mut events: Vec<RemoteEvent> = self
            .inner
            .queued_errors
            .lock()
            .unwrap()
            .drain(..)
            .map(RemoteEvent::Error)
            .collect();

        let doc = self.inner.doc.lock().unwrap().clone();
        match doc {
            Some(payload) => {
                if self.last_seen.as_ref() != Some(&payload) {
                    self.last_seen = Some(payload.clone());
                    events.push(RemoteEvent::Snapshot(RemoteSnapshot {
                        payload,
                        from_cache: *self.inner.from_cache.lock().unwrap(),
                    }));
                }
            }
            None => {
                if !self.notified_absent {
                    self.notified_absent = true;
                    events.push(RemoteEvent::Absent);
                }
            }
        }
        events
    }
}

/// Deterministic base instant for scenario timestamps.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Build a task with fixed id and timestamps for scenario tests.
pub fn task_at(id: &str, name: &str, updated_at: DateTime<Utc>) -> Task {
    Task {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        tags: vec![],
        status: TaskStatus::Idle,
        intervals: vec![],
        created_at: t0(),
        updated_at: Some(updated_at),
        completed_at: None,
    }
}

pub fn payload_of(tasks: Vec<Task>) -> BackupPayload {
    BackupPayload::new(tasks, SyncedSettings::default())
}
