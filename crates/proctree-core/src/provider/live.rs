//! Live provider scanning the running system.

use std::path::Path;

use crate::collector::traits::FileSystem;
use crate::collector::{ProcessScanner, ScanOptions, UserResolver};
use crate::table::ProcessTable;

use super::{ProviderError, TableProvider};

/// Provider reading the process table from `/proc` on every `load`.
pub struct LiveProvider<F: FileSystem> {
    scanner: ProcessScanner<F>,
    options: ScanOptions,
    users: UserResolver,
}

impl<F: FileSystem> LiveProvider<F> {
    /// Creates a live provider.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `passwd_path` - Path to the passwd file used to name owners
    /// * `options` - What to read per process
    pub fn new(
        fs: F,
        proc_path: impl Into<String>,
        passwd_path: impl AsRef<Path>,
        options: ScanOptions,
    ) -> Self {
        let users = UserResolver::load(&fs, passwd_path.as_ref());
        Self {
            scanner: ProcessScanner::new(fs, proc_path),
            options,
            users,
        }
    }
}

impl<F: FileSystem> TableProvider for LiveProvider<F> {
    fn load(&self) -> Result<ProcessTable, ProviderError> {
        Ok(self.scanner.scan(self.options)?)
    }

    fn user_resolver(&self) -> Option<&UserResolver> {
        Some(&self.users)
    }

    fn is_live(&self) -> bool {
        true
    }
}
