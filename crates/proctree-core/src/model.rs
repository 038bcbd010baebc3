//! Process records as captured from a single scan of the process table.
//!
//! A record is a snapshot of one process at scan time. Records are never
//! refreshed; a later scan produces a new set of records.

use serde::{Deserialize, Serialize};

/// One entry of the process table.
///
/// Source: `/proc/[pid]/stat`, `/proc/[pid]/status`, `/proc/[pid]/cmdline`,
/// `/proc/[pid]/task/`, or a recorded snapshot file.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct ProcessRecord {
    /// Process ID. Unique within a table.
    /// Source: `/proc/[pid]/stat` field 1
    pub pid: u32,

    /// Parent process ID. `0` means the process is a root.
    /// Source: `/proc/[pid]/stat` field 4
    #[serde(default)]
    pub parent_pid: u32,

    /// Process group ID, `None` when it could not be read.
    /// Source: `/proc/[pid]/stat` field 5
    #[serde(default)]
    pub group_id: Option<i32>,

    /// Real user ID of the owner, `None` when it could not be read.
    /// Source: `/proc/[pid]/status` (Uid, first column)
    #[serde(default)]
    pub owner_id: Option<u32>,

    /// Short command name.
    /// Source: `/proc/[pid]/stat` field 2, without the parentheses
    pub command_name: String,

    /// Full command line with arguments separated by spaces.
    /// Empty when arguments were not requested or the process is a kernel thread.
    /// Source: `/proc/[pid]/cmdline`
    #[serde(default)]
    pub command_line: String,

    /// Number of threads besides the main one.
    /// Source: entries of `/proc/[pid]/task/` other than `pid` itself
    #[serde(default)]
    pub thread_count: u32,

    /// True if the record describes a thread rather than a process.
    /// Thread entries are folded into their owner's `thread_count`.
    #[serde(default)]
    pub is_thread_entry: bool,
}

impl ProcessRecord {
    /// Creates a record with the given identity and no optional metadata.
    pub fn new(pid: u32, parent_pid: u32, command_name: impl Into<String>) -> Self {
        Self {
            pid,
            parent_pid,
            command_name: command_name.into(),
            ..Self::default()
        }
    }

    pub fn with_owner(mut self, uid: u32) -> Self {
        self.owner_id = Some(uid);
        self
    }

    pub fn with_group(mut self, pgid: i32) -> Self {
        self.group_id = Some(pgid);
        self
    }

    pub fn with_command_line(mut self, cmdline: impl Into<String>) -> Self {
        self.command_line = cmdline.into();
        self
    }

    pub fn with_threads(mut self, count: u32) -> Self {
        self.thread_count = count;
        self
    }

    /// Creates a thread entry owned by `owner_pid`.
    pub fn thread(tid: u32, owner_pid: u32, command_name: impl Into<String>) -> Self {
        Self {
            is_thread_entry: true,
            ..Self::new(tid, owner_pid, command_name)
        }
    }

    /// Text shown for the process: the command line when `show_args` is set
    /// and one was captured, otherwise the command name.
    pub fn display_name(&self, show_args: bool) -> &str {
        if show_args && !self.command_line.is_empty() {
            &self.command_line
        } else {
            &self.command_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_command_line() {
        let rec = ProcessRecord::new(10, 1, "sshd").with_command_line("/usr/sbin/sshd -D");
        assert_eq!(rec.display_name(true), "/usr/sbin/sshd -D");
        assert_eq!(rec.display_name(false), "sshd");
    }

    #[test]
    fn test_display_name_empty_command_line() {
        let rec = ProcessRecord::new(2, 0, "kthreadd");
        assert_eq!(rec.display_name(true), "kthreadd");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let rec: ProcessRecord =
            serde_json::from_str(r#"{"pid": 7, "command_name": "cron"}"#).unwrap();
        assert_eq!(rec, ProcessRecord::new(7, 0, "cron"));
        assert_eq!(rec.parent_pid, 0);
        assert_eq!(rec.owner_id, None);
        assert_eq!(rec.group_id, None);
    }

    #[test]
    fn test_thread_constructor() {
        let t = ProcessRecord::thread(101, 100, "worker");
        assert!(t.is_thread_entry);
        assert_eq!(t.parent_pid, 100);
    }
}
