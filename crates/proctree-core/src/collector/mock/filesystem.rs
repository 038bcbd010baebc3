//! In-memory `/proc` tree for tests and non-Linux hosts.

use crate::collector::traits::FileSystem;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem held in memory. Directories are created implicitly for every
/// ancestor of an added path.
#[derive(Debug, Default)]
pub struct MockFs {
    /// File contents, `None` for directories.
    entries: BTreeMap<PathBuf, Option<String>>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        self.add_ancestors(path);
        self.entries.insert(path.to_path_buf(), Some(content.into()));
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.add_ancestors(path);
        self.entries.entry(path.to_path_buf()).or_insert(None);
    }

    fn add_ancestors(&mut self, path: &Path) {
        for dir in path.ancestors().skip(1) {
            if dir.as_os_str().is_empty() {
                continue;
            }
            self.entries.entry(dir.to_path_buf()).or_insert(None);
        }
    }

    /// Adds `/proc/<pid>/` with `stat` and `cmdline`. An empty `status`
    /// leaves that file out, as if it were unreadable.
    pub fn add_process(&mut self, pid: u32, stat: &str, status: &str, cmdline: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_file(base.join("stat"), stat);
        if !status.is_empty() {
            self.add_file(base.join("status"), status);
        }
        self.add_file(base.join("cmdline"), cmdline);
    }

    /// Adds `/proc/<pid>/task/<tid>` for each thread id.
    pub fn add_tasks(&mut self, pid: u32, tids: &[u32]) {
        for tid in tids {
            self.add_dir(format!("/proc/{}/task/{}", pid, tid));
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{}: no such entry", path.display()))
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.entries.get(path) {
            Some(Some(content)) => Ok(content.clone()),
            _ => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        match self.entries.get(path) {
            Some(None) => Ok(self
                .entries
                .keys()
                .filter(|entry| entry.parent() == Some(path))
                .cloned()
                .collect()),
            _ => Err(not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_creates_parent_dirs() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/comm", "systemd\n");

        assert_eq!(fs.read_to_string(Path::new("/proc/1/comm")).unwrap(), "systemd\n");
        assert_eq!(
            fs.read_dir(Path::new("/proc")).unwrap(),
            vec![PathBuf::from("/proc/1")]
        );
    }

    #[test]
    fn test_read_dir_lists_direct_children_only() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/stat", "stat content");
        fs.add_file("/proc/1/status", "status content");
        fs.add_file("/proc/2/stat", "stat content 2");
        fs.add_tasks(2, &[2, 3]);

        assert_eq!(fs.read_dir(Path::new("/proc")).unwrap().len(), 2);
        assert_eq!(fs.read_dir(Path::new("/proc/1")).unwrap().len(), 2);
        assert_eq!(fs.read_dir(Path::new("/proc/2/task")).unwrap().len(), 2);
    }

    #[test]
    fn test_add_process_without_status() {
        let mut fs = MockFs::new();
        fs.add_process(42, "42 (x) S 1 42 42", "", "");
        assert!(fs.read_to_string(Path::new("/proc/42/stat")).is_ok());
        assert!(fs.read_to_string(Path::new("/proc/42/status")).is_err());
    }

    #[test]
    fn test_dir_is_not_a_file() {
        let mut fs = MockFs::new();
        fs.add_dir("/proc/9");
        let err = fs.read_to_string(Path::new("/proc/9")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(fs.read_dir(Path::new("/proc/9/stat")).is_err());
    }
}
