//! Shared wiring for CLI commands: config, local persistence, task store,
//! and the remote store boundary.

use std::sync::Arc;

use timetrail_core::storage::{AppConfig, JsonFileStore, LocalStore};
use timetrail_core::sync::remote::{FileRemote, RemoteStore, UserId};
use timetrail_core::sync::SyncError;
use timetrail_core::task::store::{shared, SharedTaskStore, TaskStore};

/// Everything a command needs to touch application state.
pub struct AppContext {
    pub config: AppConfig,
    pub local: Arc<dyn LocalStore>,
    pub store: SharedTaskStore,
}

impl AppContext {
    /// Load config and the persisted task store from the data dir.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::load()?;
        let local: Arc<dyn LocalStore> = Arc::new(JsonFileStore::open()?);
        let store = shared(TaskStore::load(local.as_ref())?);
        Ok(Self {
            config,
            local,
            store,
        })
    }

    /// Write the task store back to local persistence.
    pub fn persist(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.store.lock().unwrap().persist(self.local.as_ref())?;
        Ok(())
    }

    /// The configured remote store.
    pub fn remote(&self) -> Result<Arc<dyn RemoteStore>, Box<dyn std::error::Error>> {
        let dir = self.config.remote_dir.clone().ok_or(
            "no remote directory configured; run `timetrail config set remote-dir <path>`",
        )?;
        Ok(Arc::new(FileRemote::new(dir)))
    }

    /// The signed-in user, or [`SyncError::NotSignedIn`].
    pub fn user(&self) -> Result<UserId, Box<dyn std::error::Error>> {
        match &self.config.user_id {
            Some(id) => Ok(UserId::new(id.clone())),
            None => Err(Box::new(SyncError::NotSignedIn)),
        }
    }

    /// Resolve a task id or unique id prefix to a full id.
    pub fn resolve_task_id(&self, prefix: &str) -> Result<String, Box<dyn std::error::Error>> {
        let store = self.store.lock().unwrap();
        let mut matches = store
            .tasks()
            .iter()
            .filter(|t| t.id.starts_with(prefix))
            .map(|t| t.id.clone());

        let Some(id) = matches.next() else {
            return Err(format!("no task with id {prefix}").into());
        };
        if matches.next().is_some() {
            return Err(format!("ambiguous task id prefix: {prefix}").into());
        }
        Ok(id)
    }
}
