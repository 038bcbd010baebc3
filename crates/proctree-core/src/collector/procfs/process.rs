//! Process scanner building a process table from `/proc/[pid]/`.

use crate::collector::procfs::parser::{parse_cmdline, parse_proc_stat, parse_status_uid};
use crate::collector::traits::FileSystem;
use crate::model::ProcessRecord;
use crate::table::ProcessTable;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Upper bound on the number of processes read in one scan.
pub const MAX_PROCESSES: usize = 65536;

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// The process directory itself cannot be listed.
    Unavailable { path: String, source: std::io::Error },
    /// Process disappeared during collection.
    ProcessGone(u32),
    /// I/O error reading process files.
    Io(std::io::Error),
    /// Parse error in process files.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Unavailable { path, source } => {
                write!(f, "cannot read process table at {}: {}", path, source)
            }
            CollectError::ProcessGone(pid) => write!(f, "process {} disappeared", pid),
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Unavailable { source, .. } => Some(source),
            CollectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// What to read for each process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Read `/proc/[pid]/cmdline`.
    pub with_args: bool,
}

/// Reads process records from `/proc/[pid]/` files.
pub struct ProcessScanner<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> ProcessScanner<F> {
    /// Creates a new process scanner.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Reads a single process.
    pub fn read_process(&self, pid: u32, opts: ScanOptions) -> Result<ProcessRecord, CollectError> {
        let proc_dir = PathBuf::from(format!("{}/{}", self.proc_path, pid));

        let stat_content = self
            .fs
            .read_to_string(&proc_dir.join("stat"))
            .map_err(|_| CollectError::ProcessGone(pid))?;
        let stat =
            parse_proc_stat(&stat_content).map_err(|e| CollectError::Parse(e.message.clone()))?;

        // status may be unreadable for processes of other users on hardened kernels
        let owner_id = self
            .fs
            .read_to_string(&proc_dir.join("status"))
            .ok()
            .and_then(|content| parse_status_uid(&content));

        let command_line = if opts.with_args {
            self.fs
                .read_to_string(&proc_dir.join("cmdline"))
                .map(|content| parse_cmdline(&content))
                .unwrap_or_default()
        } else {
            String::new()
        };

        let thread_count = self
            .count_tasks(&proc_dir, pid)
            .unwrap_or_else(|| stat.num_threads.unwrap_or(1).saturating_sub(1));

        Ok(ProcessRecord {
            pid: stat.pid,
            parent_pid: stat.ppid,
            group_id: Some(stat.pgrp),
            owner_id,
            command_name: stat.comm,
            command_line,
            thread_count,
            is_thread_entry: stat.is_thread,
        })
    }

    /// Counts entries of `<proc_dir>/task` other than the main thread.
    fn count_tasks(&self, proc_dir: &Path, pid: u32) -> Option<u32> {
        let entries = self.fs.read_dir(&proc_dir.join("task")).ok()?;
        let count = entries
            .iter()
            .filter_map(|entry| entry.file_name()?.to_str()?.parse::<u32>().ok())
            .filter(|&tid| tid != pid)
            .count();
        Some(count as u32)
    }

    /// Reads all processes into a table.
    ///
    /// Fails only if the process directory cannot be listed; processes that
    /// disappear or cannot be parsed during the scan are skipped.
    pub fn scan(&self, opts: ScanOptions) -> Result<ProcessTable, CollectError> {
        let proc_path = Path::new(&self.proc_path);
        let entries = self
            .fs
            .read_dir(proc_path)
            .map_err(|source| CollectError::Unavailable {
                path: self.proc_path.clone(),
                source,
            })?;

        let mut pids: Vec<u32> = entries
            .iter()
            .filter_map(|entry| entry.file_name()?.to_str()?.parse::<u32>().ok())
            .collect();
        pids.sort_unstable();

        if pids.len() > MAX_PROCESSES {
            warn!(
                found = pids.len(),
                limit = MAX_PROCESSES,
                "too many processes, ignoring the rest"
            );
            pids.truncate(MAX_PROCESSES);
        }

        let mut records = Vec::with_capacity(pids.len());
        for pid in pids {
            match self.read_process(pid, opts) {
                Ok(record) => records.push(record),
                Err(CollectError::ProcessGone(_)) => {
                    trace!(pid, "process disappeared during scan");
                }
                Err(e) => {
                    warn!(pid, error = %e, "failed to read process, skipping");
                }
            }
        }

        debug!(records = records.len(), path = %self.proc_path, "scanned processes");
        Ok(ProcessTable::from_records(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_read_single_process() {
        let scanner = ProcessScanner::new(MockFs::typical_system(), "/proc");

        let rec = scanner.read_process(1, ScanOptions::default()).unwrap();

        assert_eq!(rec.pid, 1);
        assert_eq!(rec.parent_pid, 0);
        assert_eq!(rec.owner_id, Some(0));
        assert_eq!(rec.group_id, Some(1));
        assert_eq!(rec.command_name, "systemd");
        assert_eq!(rec.command_line, "");
    }

    #[test]
    fn test_read_process_with_args() {
        let scanner = ProcessScanner::new(MockFs::typical_system(), "/proc");
        let opts = ScanOptions { with_args: true };

        let rec = scanner.read_process(1000, opts).unwrap();
        assert_eq!(rec.command_line, "/usr/sbin/sshd -D");
    }

    #[test]
    fn test_read_process_with_special_name() {
        let scanner = ProcessScanner::new(MockFs::with_special_names(), "/proc");

        let rec = scanner.read_process(5000, ScanOptions::default()).unwrap();
        assert_eq!(rec.command_name, "Web Content");
        let rec = scanner.read_process(5001, ScanOptions::default()).unwrap();
        assert_eq!(rec.command_name, "test(1)");
    }

    #[test]
    fn test_thread_count_from_task_dir() {
        let scanner = ProcessScanner::new(MockFs::threaded_daemon(), "/proc");
        let rec = scanner.read_process(700, ScanOptions::default()).unwrap();
        assert_eq!(rec.thread_count, 3);
    }

    #[test]
    fn test_thread_count_falls_back_to_stat() {
        let scanner = ProcessScanner::new(MockFs::threaded_daemon(), "/proc");
        // pid 800 has no task directory, stat reports 5 threads
        let rec = scanner.read_process(800, ScanOptions::default()).unwrap();
        assert_eq!(rec.thread_count, 4);
    }

    #[test]
    fn test_scan_all_processes() {
        let scanner = ProcessScanner::new(MockFs::typical_system(), "/proc");

        let table = scanner.scan(ScanOptions::default()).unwrap();

        assert_eq!(table.pids_sorted(), vec![1, 2, 1000, 1001, 1002]);
        assert_eq!(table.get(1001).unwrap().parent_pid, 1000);
    }

    #[test]
    fn test_process_gone() {
        let mut fs = MockFs::new();
        fs.add_dir("/proc/9999"); // Directory exists but no files

        let scanner = ProcessScanner::new(fs, "/proc");
        let result = scanner.read_process(9999, ScanOptions::default());

        assert!(matches!(result, Err(CollectError::ProcessGone(9999))));
    }

    #[test]
    fn test_scan_skips_vanished_and_malformed() {
        let scanner = ProcessScanner::new(MockFs::with_vanishing_process(), "/proc");
        let table = scanner.scan(ScanOptions::default()).unwrap();
        assert_eq!(table.pids_sorted(), vec![1, 10]);
    }

    #[test]
    fn test_unreadable_status_keeps_record() {
        let scanner = ProcessScanner::new(MockFs::with_vanishing_process(), "/proc");
        let rec = scanner.read_process(10, ScanOptions::default()).unwrap();
        assert_eq!(rec.owner_id, None);
    }

    #[test]
    fn test_scan_unavailable() {
        let scanner = ProcessScanner::new(MockFs::new(), "/proc");
        let err = scanner.scan(ScanOptions::default()).unwrap_err();
        assert!(matches!(err, CollectError::Unavailable { .. }));
        assert!(err.to_string().starts_with("cannot read process table at /proc"));
    }

    #[test]
    fn test_scan_ignores_non_numeric_entries() {
        let mut fs = MockFs::typical_system();
        fs.add_file("/proc/self/stat", "1 (systemd) S 0 1 1 0");
        fs.add_dir("/proc/sys");
        let scanner = ProcessScanner::new(fs, "/proc");
        let table = scanner.scan(ScanOptions::default()).unwrap();
        assert_eq!(table.len(), 5);
    }
}
