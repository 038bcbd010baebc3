//! Provider replaying a recorded process table.
//!
//! Snapshots are JSON arrays of process records, as written by [`to_json`].

use std::path::PathBuf;

use tracing::debug;

use crate::collector::UserResolver;
use crate::collector::traits::FileSystem;
use crate::model::ProcessRecord;
use crate::table::ProcessTable;

use super::{ProviderError, TableProvider};

/// Provider reading a process table from a JSON snapshot file.
pub struct SnapshotProvider<F: FileSystem> {
    fs: F,
    path: PathBuf,
    users: Option<UserResolver>,
}

impl<F: FileSystem> SnapshotProvider<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            users: None,
        }
    }

    /// Uses `users` to name owners in the replayed table.
    pub fn with_users(mut self, users: UserResolver) -> Self {
        self.users = Some(users);
        self
    }
}

impl<F: FileSystem> TableProvider for SnapshotProvider<F> {
    fn load(&self) -> Result<ProcessTable, ProviderError> {
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| ProviderError::Io(format!("{}: {}", self.path.display(), e)))?;
        let records: Vec<ProcessRecord> = serde_json::from_str(&content)
            .map_err(|e| ProviderError::Parse(format!("{}: {}", self.path.display(), e)))?;
        debug!(records = records.len(), path = %self.path.display(), "loaded snapshot");
        Ok(ProcessTable::from_records(records))
    }

    fn user_resolver(&self) -> Option<&UserResolver> {
        self.users.as_ref()
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Serializes a table as a JSON snapshot, records ordered by pid.
pub fn to_json(table: &ProcessTable) -> Result<String, ProviderError> {
    serde_json::to_string_pretty(&table.records()).map_err(|e| ProviderError::Parse(e.to_string()))
}
