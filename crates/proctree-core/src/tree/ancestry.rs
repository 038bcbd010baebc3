//! Ancestor queries over the process forest, used for highlighting.

use super::ProcessForest;

/// Answers "is A an ancestor of B" by walking the forest's parent links.
///
/// The forest has already dropped parent links that would close a cycle, so
/// highlighting always agrees with the drawn tree. Walks are still bounded by
/// the node count.
#[derive(Debug, Clone, Copy)]
pub struct Ancestry<'a> {
    forest: &'a ProcessForest,
    target: Option<u32>,
}

impl<'a> Ancestry<'a> {
    /// Creates a resolver; `target` is the process to highlight, if any.
    pub fn new(forest: &'a ProcessForest, target: Option<u32>) -> Self {
        Self { forest, target }
    }

    /// Returns true if `ancestor` is `descendant` or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: u32, descendant: u32) -> bool {
        if ancestor == descendant {
            return true;
        }

        let mut current = descendant;
        for _ in 0..self.forest.node_count() {
            match self.forest.parent_of(current) {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// True if `pid` is the highlight target or one of its ancestors.
    pub fn should_highlight(&self, pid: u32) -> bool {
        match self.target {
            Some(target) => self.is_ancestor(pid, target),
            None => false,
        }
    }

    /// Pids from the target up to its root.
    pub fn highlight_path(&self) -> Vec<u32> {
        let Some(target) = self.target.filter(|&pid| self.forest.contains(pid)) else {
            return Vec::new();
        };

        let mut path = vec![target];
        let mut current = target;
        while path.len() <= self.forest.node_count() {
            let Some(parent) = self.forest.parent_of(current) else {
                break;
            };
            path.push(parent);
            current = parent;
        }
        path
    }
}
