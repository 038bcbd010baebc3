//! Process forest built from a flat process table.
//!
//! # Construction
//!
//! Parent links are resolved through the table's pid index, one lookup per
//! record, so building stays O(n log n) (sorting dominates) even for tables
//! with tens of thousands of entries. Scanning the table for each parent would
//! be quadratic and is noticeably slow on busy hosts.
//!
//! Records are visited in ascending pid order. The first link seen is
//! authoritative: a link that would make a process its own descendant is
//! dropped and the process becomes a root instead. Cycle detection uses a
//! disjoint set over accepted links, so it costs amortized O(α(n)) per record
//! regardless of how deep the chains are. Self-parented records and records
//! whose parent is not in the table become roots too, which happens routinely
//! when a parent exits between scan and render.
//!
//! Nothing here recurses over the tree: chains can be as deep as the table
//! is large.

mod ancestry;

pub use ancestry::Ancestry;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::model::ProcessRecord;
use crate::table::ProcessTable;

/// Ordering applied to siblings (and to forest roots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Ascending pid.
    Numeric,
    /// Ascending command name, ties broken by pid.
    #[default]
    Name,
}

impl SortMode {
    pub fn compare(self, a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
        match self {
            SortMode::Numeric => a.pid.cmp(&b.pid),
            SortMode::Name => a
                .command_name
                .cmp(&b.command_name)
                .then_with(|| a.pid.cmp(&b.pid)),
        }
    }
}

/// A process and the processes it exclusively owns as children.
pub struct TreeNode {
    record: ProcessRecord,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn record(&self) -> &ProcessRecord {
        &self.record
    }

    pub fn pid(&self) -> u32 {
        self.record.pid
    }

    /// Children in sibling order.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

impl Drop for TreeNode {
    fn drop(&mut self) {
        // Detach descendants first so each node is dropped childless.
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.record != b.record || a.children.len() != b.children.len() {
                return false;
            }
            stack.extend(a.children.iter().zip(b.children.iter()));
        }
        true
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("pid", &self.record.pid)
            .field("command_name", &self.record.command_name)
            .field("children", &self.children.len())
            .finish()
    }
}

/// Union-find over table positions.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    /// Joins the sets of `a` and `b`. Returns false if they already were one.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Every process of a table arranged as a set of trees.
#[derive(Debug, Default)]
pub struct ProcessForest {
    roots: Vec<TreeNode>,
    /// Accepted parent of every node, `None` for roots.
    parents: HashMap<u32, Option<u32>>,
}

impl ProcessForest {
    /// Builds the forest for `table`, ordering siblings by `sort`.
    ///
    /// Never fails: inconsistent parent links only produce extra roots.
    pub fn build(table: &ProcessTable, sort: SortMode) -> Self {
        let pids = table.pids_sorted();
        let position: HashMap<u32, usize> =
            pids.iter().enumerate().map(|(i, &pid)| (pid, i)).collect();
        let mut sets = DisjointSet::new(pids.len());
        let mut parents: HashMap<u32, Option<u32>> = HashMap::with_capacity(pids.len());
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut root_pids = Vec::new();

        for (i, &pid) in pids.iter().enumerate() {
            let Some(record) = table.get(pid) else {
                continue;
            };
            let ppid = record.parent_pid;

            let accepted = match position.get(&ppid) {
                _ if ppid == 0 => false,
                Some(&p) if ppid != pid => {
                    let joined = sets.union(i, p);
                    if !joined {
                        debug!(pid, ppid, "parent link would form a cycle, treating as root");
                    }
                    joined
                }
                _ => {
                    trace!(pid, ppid, "parent not resolvable, treating as root");
                    false
                }
            };

            if accepted {
                parents.insert(pid, Some(ppid));
                children.entry(ppid).or_default().push(pid);
            } else {
                parents.insert(pid, None);
                root_pids.push(pid);
            }
        }

        // Assemble owned nodes bottom-up so deep chains don't recurse.
        let mut nodes: HashMap<u32, TreeNode> = HashMap::with_capacity(pids.len());
        for &root in &root_pids {
            let mut stack = vec![(root, false)];
            while let Some((pid, expanded)) = stack.pop() {
                if expanded {
                    let mut kids: Vec<TreeNode> = children
                        .remove(&pid)
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(|kid| nodes.remove(&kid))
                        .collect();
                    kids.sort_by(|a, b| sort.compare(&a.record, &b.record));
                    if let Some(record) = table.get(pid) {
                        nodes.insert(
                            pid,
                            TreeNode {
                                record: record.clone(),
                                children: kids,
                            },
                        );
                    }
                } else {
                    stack.push((pid, true));
                    if let Some(kids) = children.get(&pid) {
                        stack.extend(kids.iter().map(|&kid| (kid, false)));
                    }
                }
            }
        }

        let mut roots: Vec<TreeNode> = root_pids
            .iter()
            .filter_map(|pid| nodes.remove(pid))
            .collect();
        roots.sort_by(|a, b| sort.compare(&a.record, &b.record));

        debug!(roots = roots.len(), nodes = parents.len(), "process forest built");

        Self { roots, parents }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn node_count(&self) -> usize {
        self.parents.len()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.parents.contains_key(&pid)
    }

    /// Parent of `pid` in the forest. Differs from the declared parent when
    /// that link was rejected.
    pub fn parent_of(&self, pid: u32) -> Option<u32> {
        self.parents.get(&pid).copied().flatten()
    }

    /// Finds the node for `pid` anywhere in the forest.
    pub fn find(&self, pid: u32) -> Option<&TreeNode> {
        if !self.contains(pid) {
            return None;
        }
        let mut stack: Vec<&TreeNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.pid() == pid {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::procfs::MAX_PROCESSES;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::time::{Duration, Instant};

    fn table(records: &[(u32, u32, &str)]) -> ProcessTable {
        ProcessTable::from_records(
            records
                .iter()
                .map(|&(pid, ppid, name)| ProcessRecord::new(pid, ppid, name)),
        )
    }

    fn child_pids(node: &TreeNode) -> Vec<u32> {
        node.children().iter().map(TreeNode::pid).collect()
    }

    fn collect_pids(forest: &ProcessForest) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack: Vec<&TreeNode> = forest.roots().iter().collect();
        while let Some(node) = stack.pop() {
            out.push(node.pid());
            stack.extend(node.children());
        }
        out
    }

    #[test]
    fn test_build_simple_chain() {
        let forest = ProcessForest::build(
            &table(&[(1, 0, "init"), (2, 1, "sshd"), (3, 2, "bash")]),
            SortMode::Numeric,
        );
        assert_eq!(forest.roots().len(), 1);
        let init = &forest.roots()[0];
        assert_eq!(init.pid(), 1);
        assert_eq!(child_pids(init), vec![2]);
        assert_eq!(child_pids(&init.children()[0]), vec![3]);
        assert_eq!(forest.node_count(), 3);
    }

    #[test]
    fn test_sibling_order_numeric() {
        let forest = ProcessForest::build(
            &table(&[(1, 0, "init"), (30, 1, "a"), (4, 1, "z"), (12, 1, "m")]),
            SortMode::Numeric,
        );
        assert_eq!(child_pids(&forest.roots()[0]), vec![4, 12, 30]);
    }

    #[test]
    fn test_sibling_order_by_name_with_pid_tiebreak() {
        let forest = ProcessForest::build(
            &table(&[
                (1, 0, "init"),
                (30, 1, "agetty"),
                (4, 1, "sshd"),
                (12, 1, "agetty"),
            ]),
            SortMode::Name,
        );
        assert_eq!(child_pids(&forest.roots()[0]), vec![12, 30, 4]);
    }

    #[test]
    fn test_missing_parent_becomes_root() {
        let forest = ProcessForest::build(
            &table(&[(1, 0, "init"), (5, 99, "orphan")]),
            SortMode::Numeric,
        );
        let roots: Vec<u32> = forest.roots().iter().map(TreeNode::pid).collect();
        assert_eq!(roots, vec![1, 5]);
        assert!(forest.find(5).unwrap().is_leaf());
    }

    #[test]
    fn test_self_parent_becomes_root() {
        let forest = ProcessForest::build(&table(&[(7, 7, "weird")]), SortMode::Numeric);
        assert_eq!(forest.roots().len(), 1);
        assert!(forest.roots()[0].is_leaf());
    }

    #[test]
    fn test_cycle_broken_at_first_back_edge() {
        // 10 -> 20 -> 30 -> 10
        let forest = ProcessForest::build(
            &table(&[(10, 20, "a"), (20, 30, "b"), (30, 10, "c")]),
            SortMode::Numeric,
        );
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.roots()[0].pid(), 30);
        assert_eq!(forest.node_count(), 3);
        let b = forest.find(20).unwrap();
        assert_eq!(child_pids(b), vec![10]);

        assert_eq!(forest.parent_of(10), Some(20));
        assert_eq!(forest.parent_of(20), Some(30));
        assert_eq!(forest.parent_of(30), None);
    }

    #[test]
    fn test_cycle_back_edge_into_middle_of_chain() {
        // 5 -> 6 -> 7 -> 6; the link of 7 back to 6 is rejected, 6 -> 7 wins
        let forest = ProcessForest::build(
            &table(&[(5, 6, "a"), (6, 7, "b"), (7, 6, "c"), (8, 5, "d")]),
            SortMode::Numeric,
        );
        let roots: Vec<u32> = forest.roots().iter().map(TreeNode::pid).collect();
        assert_eq!(roots, vec![7]);
        assert_eq!(forest.parent_of(8), Some(5));
        assert_eq!(forest.node_count(), 4);
    }

    #[test]
    fn test_find_missing() {
        let forest = ProcessForest::build(&table(&[(1, 0, "init")]), SortMode::Numeric);
        assert!(forest.find(2).is_none());
        assert!(!forest.contains(2));
        assert_eq!(forest.find(1).unwrap().record().command_name, "init");
    }

    fn deep_chain(len: u32) -> ProcessTable {
        ProcessTable::from_records((1..=len).map(|pid| ProcessRecord::new(pid, pid - 1, "sh")))
    }

    #[test]
    fn test_deep_chain_builds_in_linear_time() {
        let len = MAX_PROCESSES as u32;
        let table = deep_chain(len);

        let started = Instant::now();
        let forest = ProcessForest::build(&table, SortMode::Numeric);
        let elapsed = started.elapsed();

        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.node_count(), MAX_PROCESSES);
        assert_eq!(forest.parent_of(len), Some(len - 1));
        // quadratic cycle checks take minutes at this depth
        assert!(elapsed < Duration::from_secs(10), "build took {:?}", elapsed);
    }

    #[test]
    fn test_deep_chain_drops_on_small_stack() {
        let table = deep_chain(MAX_PROCESSES as u32);
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || {
                let forest = ProcessForest::build(&table, SortMode::Numeric);
                let deepest = forest.find(MAX_PROCESSES as u32).map(TreeNode::pid);
                let same = ProcessForest::build(&table, SortMode::Numeric);
                let equal = forest.roots() == same.roots();
                drop(forest);
                (deepest, equal)
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), (Some(MAX_PROCESSES as u32), true));
    }

    proptest! {
        #[test]
        fn prop_every_record_appears_once(
            links in proptest::collection::vec((1u32..60, 0u32..60), 0..80),
            numeric in any::<bool>(),
        ) {
            let records: Vec<ProcessRecord> = links
                .iter()
                .map(|&(pid, ppid)| ProcessRecord::new(pid, ppid, format!("p{}", pid % 7)))
                .collect();
            let table = ProcessTable::from_records(records);
            let sort = if numeric { SortMode::Numeric } else { SortMode::Name };
            let forest = ProcessForest::build(&table, sort);

            let pids = collect_pids(&forest);
            let unique: HashSet<u32> = pids.iter().copied().collect();
            prop_assert_eq!(pids.len(), unique.len());
            prop_assert_eq!(pids.len(), table.len());
            prop_assert_eq!(forest.node_count(), table.len());
        }

        #[test]
        fn prop_siblings_strictly_ordered(
            links in proptest::collection::vec((1u32..40, 0u32..40), 0..60),
            numeric in any::<bool>(),
        ) {
            let records: Vec<ProcessRecord> = links
                .iter()
                .map(|&(pid, ppid)| ProcessRecord::new(pid, ppid, format!("p{}", pid % 5)))
                .collect();
            let table = ProcessTable::from_records(records);
            let sort = if numeric { SortMode::Numeric } else { SortMode::Name };
            let forest = ProcessForest::build(&table, sort);

            let mut stack: Vec<&TreeNode> = forest.roots().iter().collect();
            while let Some(node) = stack.pop() {
                for pair in node.children().windows(2) {
                    prop_assert_eq!(sort.compare(pair[0].record(), pair[1].record()), Ordering::Less);
                }
                stack.extend(node.children());
            }

            let again = ProcessForest::build(&table, sort);
            prop_assert_eq!(forest.roots(), again.roots());
        }
    }
}
