//! Compact layout: single-child chains share one line.
//!
//! A process whose only child has its own single child is printed as
//! `a───b───c`. Children of the last process of such a chain start in the
//! column right after the chain, so the prefix of the next block is padded
//! by the printed width of everything after the branch glyph. The width is
//! measured while the line is built and recomputed for every line.

use super::{Line, Pending, RenderContext, SubtreeRenderer};
use crate::model::ProcessRecord;
use crate::tree::TreeNode;

/// Folds chains and appends thread counts.
///
/// Tree nodes never include thread entries (they are folded into
/// `thread_count` by the table), so every child counts towards folding.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompactRenderer;

impl SubtreeRenderer for CompactRenderer {
    fn render_subtree(
        &self,
        ctx: &RenderContext<'_>,
        node: &TreeNode,
        parent: Option<&ProcessRecord>,
        prefix: &str,
        is_last: bool,
        out: &mut String,
    ) {
        let mut stack = vec![Pending::new(node, parent, prefix, is_last)];
        while let Some(item) = stack.pop() {
            let mut line = Line::new(&item.prefix);
            line.push(ctx.glyphs.branch(item.is_last));
            let branch_width = line.width();
            ctx.push_label(&mut line, item.node.record(), item.parent);
            ctx.push_threads(&mut line, item.node.record());

            let mut tail = item.node;
            let mut folded = 0usize;
            while let [only] = tail.children() {
                line.push(ctx.glyphs.connector);
                ctx.push_label(&mut line, only.record(), Some(tail.record()));
                ctx.push_threads(&mut line, only.record());
                tail = only;
                folded += 1;
            }

            let padding = if folded > 0 {
                line.width() - branch_width
            } else {
                0
            };
            line.finish(out);

            let child_prefix = format!(
                "{}{}{}",
                item.prefix,
                ctx.glyphs.continuation(item.is_last),
                " ".repeat(padding)
            );
            Pending::push_children(&mut stack, tail, &child_prefix);
        }
    }
}
