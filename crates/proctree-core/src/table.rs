//! Process table: the pid-indexed snapshot every later stage reads from.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::model::ProcessRecord;

/// Snapshot of the process table, indexed by pid.
///
/// Thread entries are folded into their owner's `thread_count` on
/// construction, so every record held here is a process.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    by_pid: HashMap<u32, ProcessRecord>,
}

impl ProcessTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from raw records.
    ///
    /// The first record seen for a pid wins. Thread entries count towards the
    /// record whose pid equals their `parent_pid`, except the main thread
    /// (tid equal to the owner's pid); threads of unknown owners are dropped.
    pub fn from_records(records: impl IntoIterator<Item = ProcessRecord>) -> Self {
        let mut table = Self::new();
        let mut threads = Vec::new();

        for record in records {
            if record.is_thread_entry {
                threads.push(record);
            } else {
                table.insert(record);
            }
        }

        for thread in threads {
            if thread.pid == thread.parent_pid {
                continue;
            }
            match table.by_pid.get_mut(&thread.parent_pid) {
                Some(owner) => owner.thread_count += 1,
                None => trace!(
                    tid = thread.pid,
                    owner = thread.parent_pid,
                    "dropping thread entry without owner"
                ),
            }
        }

        debug!(processes = table.len(), "process table built");
        table
    }

    /// Inserts a process record unless its pid is already present.
    ///
    /// Returns `false` if the record was dropped as a duplicate.
    fn insert(&mut self, record: ProcessRecord) -> bool {
        if self.by_pid.contains_key(&record.pid) {
            debug!(pid = record.pid, "duplicate pid in process table, keeping first");
            return false;
        }
        self.by_pid.insert(record.pid, record);
        true
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.by_pid.get(&pid)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.by_pid.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.by_pid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pid.is_empty()
    }

    /// All pids in ascending order.
    pub fn pids_sorted(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.by_pid.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// All records, ordered by pid.
    pub fn records(&self) -> Vec<&ProcessRecord> {
        self.pids_sorted()
            .into_iter()
            .filter_map(|pid| self.by_pid.get(&pid))
            .collect()
    }
}
