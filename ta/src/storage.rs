//! TaskRepository - the task list's home in the blob store
//!
//! Binds a `taskstore::Store` to one key. The whole list is read at the start
//! of a run and the whole list is written back after every addition.

use std::path::Path;

use eyre::{Context, Result};
use taskstore::Store;
use tracing::debug;

use crate::config::StorageConfig;
use crate::domain::{Task, TaskList};

/// Task list persistence bound to a single store key
#[derive(Debug, Clone)]
pub struct TaskRepository {
    store: Store,
    key: String,
}

impl TaskRepository {
    pub fn open(dir: impl AsRef<Path>, key: impl Into<String>) -> Result<Self> {
        let store = Store::open(dir).context("Failed to open task store")?;
        Ok(Self { store, key: key.into() })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::open(&config.dir, config.key.clone())
    }

    /// File backing the task list
    pub fn path(&self) -> std::path::PathBuf {
        self.store.blob_path(&self.key)
    }

    /// Load the task list; a missing or blank file is an empty list
    pub fn load(&self) -> Result<TaskList> {
        debug!(key = %self.key, "TaskRepository::load: called");
        self.store
            .load(&self.key)
            .context(format!("Failed to load tasks from {}", self.path().display()))
    }

    /// Replace the persisted list with `tasks`
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        debug!(key = %self.key, count = tasks.len(), "TaskRepository::save: called");
        self.store
            .save(&self.key, tasks)
            .context(format!("Failed to save tasks to {}", self.path().display()))
    }
}
