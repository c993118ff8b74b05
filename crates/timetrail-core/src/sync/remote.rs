//! Remote document store boundary.
//!
//! The store is a black box: it keeps one backup document per user, supports
//! merge-writes, and can be watched for changes. Watches deliver snapshots in
//! emission order, including echoes of this device's own writes; the
//! orchestrator is responsible for not looping on those.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::sync::types::BackupPayload;

/// Stable user identifier supplied by the auth boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote store errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Access denied, e.g. a listener outliving a sign-out.
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A materialized remote state plus delivery metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub payload: BackupPayload,
    /// True when served from a local cache rather than the live store; used
    /// to infer offline status, never treated as an error.
    pub from_cache: bool,
}

/// Events delivered by a watch, in emission order.
#[derive(Debug)]
pub enum RemoteEvent {
    Snapshot(RemoteSnapshot),
    /// The user has no valid backup document. Emitted once per watch so a
    /// fresh user is not left waiting for a snapshot that never comes.
    Absent,
    Error(RemoteError),
}

/// Live subscription to one user's backup document.
///
/// Dropping the watch is the unsubscribe; a leaked watch that keeps applying
/// another user's data after sign-out is a correctness bug.
pub trait RemoteWatch {
    /// Drain events observed since the previous poll.
    fn poll(&mut self) -> Vec<RemoteEvent>;
}

/// The remote document store contract.
pub trait RemoteStore {
    /// Read the user's backup document. `Ok(None)` when no valid backup
    /// exists (missing document or malformed payload).
    fn fetch(&self, user: &UserId) -> Result<Option<RemoteSnapshot>, RemoteError>;

    /// Merge-write the payload, returning the server-assigned timestamp that
    /// was stamped into it.
    fn store_merge(&self, user: &UserId, payload: &BackupPayload)
        -> Result<DateTime<Utc>, RemoteError>;

    /// Delete the user's backup document.
    fn delete(&self, user: &UserId) -> Result<(), RemoteError>;

    /// Open a change watch for the user's document.
    fn watch(&self, user: &UserId) -> Result<Box<dyn RemoteWatch>, RemoteError>;
}

/// File-backed remote store: one `<user>.json` document per user inside a
/// directory the operator points at a cloud-synced folder.
///
/// Snapshots are always `from_cache = false`; the local filesystem is the
/// transport, so the cache/offline distinction does not arise here.
pub struct FileRemote {
    root: PathBuf,
}

impl FileRemote {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn document_path(&self, user: &UserId) -> PathBuf {
        self.root.join(format!("{user}.json"))
    }

    fn read_document(&self, user: &UserId) -> Result<Option<serde_json::Value>, RemoteError> {
        let path = self.document_path(user);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

impl RemoteStore for FileRemote {
    fn fetch(&self, user: &UserId) -> Result<Option<RemoteSnapshot>, RemoteError> {
        let Some(document) = self.read_document(user)? else {
            return Ok(None);
        };
        match BackupPayload::from_document(&document) {
            Some(payload) => Ok(Some(RemoteSnapshot {
                payload,
                from_cache: false,
            })),
            None => {
                warn!(user = %user, "remote document holds no valid backup payload");
                Ok(None)
            }
        }
    }

    fn store_merge(
        &self,
        user: &UserId,
        payload: &BackupPayload,
    ) -> Result<DateTime<Utc>, RemoteError> {
        let stamped_at = Utc::now();
        let mut stamped = payload.clone();
        stamped.updated_at = Some(stamped_at);

        std::fs::create_dir_all(&self.root)?;
        let document = stamped.to_document()?;
        std::fs::write(
            self.document_path(user),
            serde_json::to_string_pretty(&document)?,
        )?;
        Ok(stamped_at)
    }

    fn delete(&self, user: &UserId) -> Result<(), RemoteError> {
        let path = self.document_path(user);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn watch(&self, user: &UserId) -> Result<Box<dyn RemoteWatch>, RemoteError> {
        Ok(Box::new(FileRemoteWatch {
            remote: FileRemote::new(self.root.clone()),
            user: user.clone(),
            last_seen: None,
            notified_absent: false,
        }))
    }
}

/// Poll-based watch over a [`FileRemote`] document.
///
/// Emits a snapshot whenever the stored payload differs from the last one
/// delivered, including the initial state and echoes of our own writes.
struct FileRemoteWatch {
    remote: FileRemote,
    user: UserId,
    last_seen: Option<BackupPayload>,
    notified_absent: bool,
}

impl RemoteWatch for FileRemoteWatch {
    fn poll(&mut self) -> Vec<RemoteEvent> {
        match self.remote.fetch(&self.user) {
            Ok(Some(snapshot)) => {
                if self.last_seen.as_ref() == Some(&snapshot.payload) {
                    return Vec::new();
                }
                self.last_seen = Some(snapshot.payload.clone());
                vec![RemoteEvent::Snapshot(snapshot)]
            }
            Ok(None) => {
                if self.notified_absent {
                    return Vec::new();
                }
                self.notified_absent = true;
                vec![RemoteEvent::Absent]
            }
            Err(e) => vec![RemoteEvent::Error(e)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SyncedSettings;
    use crate::task::Task;
    use tempfile::TempDir;

    fn payload_with_task(name: &str) -> BackupPayload {
        BackupPayload::new(
            vec![Task::new(name, None, vec![], Utc::now())],
            SyncedSettings::default(),
        )
    }

    #[test]
    fn test_fetch_missing_document() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemote::new(dir.path().to_path_buf());
        let user = UserId::new("u1");
        assert!(remote.fetch(&user).unwrap().is_none());
    }

    #[test]
    fn test_store_then_fetch() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemote::new(dir.path().to_path_buf());
        let user = UserId::new("u1");

        let stamped_at = remote.store_merge(&user, &payload_with_task("t")).unwrap();
        let snapshot = remote.fetch(&user).unwrap().unwrap();
        assert_eq!(snapshot.payload.updated_at, Some(stamped_at));
        assert_eq!(snapshot.payload.tasks[0].name, "t");
        assert!(!snapshot.from_cache);
    }

    #[test]
    fn test_malformed_document_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemote::new(dir.path().to_path_buf());
        let user = UserId::new("u1");

        std::fs::write(
            dir.path().join("u1.json"),
            r#"{"backup":{"tasks":"garbage","version":1}}"#,
        )
        .unwrap();
        assert!(remote.fetch(&user).unwrap().is_none());
    }

    #[test]
    fn test_watch_emits_initial_and_changed_only() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemote::new(dir.path().to_path_buf());
        let user = UserId::new("u1");

        remote.store_merge(&user, &payload_with_task("a")).unwrap();
        let mut watch = remote.watch(&user).unwrap();

        let events = watch.poll();
        assert_eq!(events.len(), 1);

        // Unchanged document: quiet.
        assert!(watch.poll().is_empty());

        // A new write surfaces on the next poll.
        remote.store_merge(&user, &payload_with_task("b")).unwrap();
        let events = watch.poll();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RemoteEvent::Snapshot(s) => assert_eq!(s.payload.tasks[0].name, "b"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_watch_reports_missing_document_once() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemote::new(dir.path().to_path_buf());
        let user = UserId::new("u1");

        let mut watch = remote.watch(&user).unwrap();
        let events = watch.poll();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RemoteEvent::Absent));

        // Still missing: quiet, not a repeat notification.
        assert!(watch.poll().is_empty());

        // The first write surfaces as a snapshot afterwards.
        remote.store_merge(&user, &payload_with_task("t")).unwrap();
        let events = watch.poll();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RemoteEvent::Snapshot(_)));
    }

    #[test]
    fn test_delete_removes_document() {
        let dir = TempDir::new().unwrap();
        let remote = FileRemote::new(dir.path().to_path_buf());
        let user = UserId::new("u1");

        remote.store_merge(&user, &payload_with_task("t")).unwrap();
        remote.delete(&user).unwrap();
        assert!(remote.fetch(&user).unwrap().is_none());
    }
}
