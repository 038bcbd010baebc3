//! Text rendering of a process subtree.
//!
//! Two renderers implement [`SubtreeRenderer`]:
//! - [`ExpandedRenderer`]: one line per process.
//! - [`CompactRenderer`] (default): folds single-child chains onto one line
//!   and appends thread counts.
//!
//! Both share [`RenderContext`], which owns glyph selection, label
//! formatting, and highlighting, so the renderers only differ in how they
//! walk the tree. Both walk an explicit stack of pending subtrees rather
//! than recursing, so output depth is limited by memory only.
//!
//! ```
//! use proctree_core::model::ProcessRecord;
//! use proctree_core::render::{RenderOptions, render_tree};
//! use proctree_core::table::ProcessTable;
//! use proctree_core::tree::{ProcessForest, SortMode};
//!
//! let table = ProcessTable::from_records(vec![
//!     ProcessRecord::new(1, 0, "init"),
//!     ProcessRecord::new(2, 1, "sshd"),
//!     ProcessRecord::new(3, 2, "bash"),
//! ]);
//! let forest = ProcessForest::build(&table, SortMode::Numeric);
//! let out = render_tree(&forest, &table, None, &RenderOptions::default(), 1).unwrap();
//! assert_eq!(out, "└─init───sshd───bash\n");
//! ```

mod compact;
mod expanded;

pub use compact::CompactRenderer;
pub use expanded::ExpandedRenderer;

use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::collector::UserResolver;
use crate::model::ProcessRecord;
use crate::table::ProcessTable;
use crate::tree::{Ancestry, ProcessForest, TreeNode};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Error returned when a tree cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The requested root pid is not in the snapshot.
    TargetNotFound(u32),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::TargetNotFound(pid) => write!(f, "Process {} not found", pid),
        }
    }
}

impl std::error::Error for RenderError {}

/// How the tree is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Expanded,
    Compact,
}

impl RenderMode {
    fn renderer(self) -> &'static dyn SubtreeRenderer {
        match self {
            RenderMode::Expanded => &ExpandedRenderer,
            RenderMode::Compact => &CompactRenderer,
        }
    }
}

/// Display options, passed explicitly down the rendering call chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Append `(pid)` to each process. Disables chain folding.
    pub show_pids: bool,
    /// Show the command line instead of the command name.
    pub show_args: bool,
    /// Append `[pgid]` to each process. Disables chain folding.
    pub show_pgids: bool,
    /// Annotate processes whose owner differs from their parent's.
    pub show_owner_changes: bool,
    /// Draw with ASCII instead of Unicode box characters.
    pub ascii: bool,
    /// Fold single-child chains onto one line.
    pub compact: bool,
    /// Process to highlight together with its ancestors.
    pub highlight: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_pids: false,
            show_args: false,
            show_pgids: false,
            show_owner_changes: false,
            ascii: false,
            compact: true,
            highlight: None,
        }
    }
}

impl RenderOptions {
    /// Per-process metadata makes folded lines ambiguous, so pid and group
    /// annotations force the expanded layout.
    pub fn mode(&self) -> RenderMode {
        if self.compact && !self.show_pids && !self.show_pgids {
            RenderMode::Compact
        } else {
            RenderMode::Expanded
        }
    }
}

/// Line-drawing characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub branch: &'static str,
    pub last_branch: &'static str,
    pub continuation: &'static str,
    pub last_continuation: &'static str,
    pub connector: &'static str,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs {
        branch: "├─",
        last_branch: "└─",
        continuation: "│ ",
        last_continuation: "  ",
        connector: "───",
    };

    pub const ASCII: Glyphs = Glyphs {
        branch: "|-",
        last_branch: "`-",
        continuation: "| ",
        last_continuation: "  ",
        connector: "---",
    };

    pub fn branch(&self, is_last: bool) -> &'static str {
        if is_last {
            self.last_branch
        } else {
            self.branch
        }
    }

    pub fn continuation(&self, is_last: bool) -> &'static str {
        if is_last {
            self.last_continuation
        } else {
            self.continuation
        }
    }
}

/// Output line that tracks its printed width, ignoring escape sequences.
#[derive(Debug, Default)]
pub(crate) struct Line {
    text: String,
    width: usize,
}

impl Line {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            text: prefix.to_string(),
            width: 0,
        }
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.text.push_str(s);
        self.width += s.width();
    }

    fn push_escape(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Printed width of everything pushed after the prefix.
    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn finish(self, out: &mut String) {
        out.push_str(&self.text);
        out.push('\n');
    }
}

/// State shared by both renderers for one rendering pass.
pub struct RenderContext<'a> {
    pub options: &'a RenderOptions,
    pub glyphs: Glyphs,
    pub ancestry: Ancestry<'a>,
    pub users: Option<&'a UserResolver>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        options: &'a RenderOptions,
        forest: &'a ProcessForest,
        users: Option<&'a UserResolver>,
    ) -> Self {
        Self {
            options,
            glyphs: if options.ascii {
                Glyphs::ASCII
            } else {
                Glyphs::UNICODE
            },
            ancestry: Ancestry::new(forest, options.highlight),
            users,
        }
    }

    /// Appends the label of `record`: name, annotations, and owner change.
    pub(crate) fn push_label(
        &self,
        line: &mut Line,
        record: &ProcessRecord,
        parent: Option<&ProcessRecord>,
    ) {
        let highlight = self.ancestry.should_highlight(record.pid);
        if highlight {
            line.push_escape(BOLD);
        }
        line.push(record.display_name(self.options.show_args));
        if highlight {
            line.push_escape(RESET);
        }

        if self.options.show_pids {
            line.push(&format!("({})", record.pid));
        }
        if self.options.show_pgids
            && let Some(pgid) = record.group_id
        {
            line.push(&format!("[{}]", pgid));
        }
        if self.options.show_owner_changes
            && let Some(annotation) = self.owner_change(record, parent)
        {
            line.push(&annotation);
        }
    }

    /// Appends `───N*[{name}]` when the process has extra threads.
    pub(crate) fn push_threads(&self, line: &mut Line, record: &ProcessRecord) {
        if record.thread_count > 0 {
            line.push(self.glyphs.connector);
            line.push(&format!(
                "{}*[{{{}}}]",
                record.thread_count, record.command_name
            ));
        }
    }

    fn owner_change(&self, record: &ProcessRecord, parent: Option<&ProcessRecord>) -> Option<String> {
        let uid = record.owner_id?;
        let parent_uid = parent?.owner_id?;
        if uid == parent_uid {
            return None;
        }
        Some(
            match self.users.and_then(|users| users.lookup(uid)) {
                Some(name) => format!("(user: {})", name),
                None => format!("(uid: {})", uid),
            },
        )
    }
}

/// A subtree waiting to be rendered.
pub(crate) struct Pending<'t> {
    pub(crate) node: &'t TreeNode,
    /// Record `node` hangs off, for owner transitions.
    pub(crate) parent: Option<&'t ProcessRecord>,
    pub(crate) prefix: String,
    pub(crate) is_last: bool,
}

impl<'t> Pending<'t> {
    pub(crate) fn new(
        node: &'t TreeNode,
        parent: Option<&'t ProcessRecord>,
        prefix: &str,
        is_last: bool,
    ) -> Self {
        Self {
            node,
            parent,
            prefix: prefix.to_string(),
            is_last,
        }
    }

    /// Queues the children of `node` so the first child is popped first.
    pub(crate) fn push_children(stack: &mut Vec<Pending<'t>>, node: &'t TreeNode, prefix: &str) {
        let count = node.children().len();
        for (i, child) in node.children().iter().enumerate().rev() {
            stack.push(Pending::new(child, Some(node.record()), prefix, i + 1 == count));
        }
    }
}

/// Renders a subtree rooted at `node` into `out`, one `\n`-terminated line
/// at a time.
pub trait SubtreeRenderer {
    /// `parent` is the record `node` hangs off (for owner transitions),
    /// `prefix` the indentation inherited from the ancestors.
    fn render_subtree(
        &self,
        ctx: &RenderContext<'_>,
        node: &TreeNode,
        parent: Option<&ProcessRecord>,
        prefix: &str,
        is_last: bool,
        out: &mut String,
    );
}

/// Renders the subtree rooted at `root_pid` with the renderer chosen by
/// `options`.
///
/// Nothing is rendered if the root is missing.
pub fn render_tree(
    forest: &ProcessForest,
    table: &ProcessTable,
    users: Option<&UserResolver>,
    options: &RenderOptions,
    root_pid: u32,
) -> Result<String, RenderError> {
    let root = forest
        .find(root_pid)
        .ok_or(RenderError::TargetNotFound(root_pid))?;
    let parent = table
        .get(root.record().parent_pid)
        .filter(|p| p.pid != root_pid);

    let mode = options.mode();
    debug!(root = root_pid, ?mode, "rendering process tree");

    let ctx = RenderContext::new(options, forest, users);
    let mut out = String::new();
    mode.renderer()
        .render_subtree(&ctx, root, parent, "", true, &mut out);
    Ok(out)
}
