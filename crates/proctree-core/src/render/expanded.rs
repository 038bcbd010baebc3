//! One line per process, full indentation.

use super::{Line, Pending, RenderContext, SubtreeRenderer};
use crate::model::ProcessRecord;
use crate::tree::TreeNode;

/// Renders every process on its own line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpandedRenderer;

impl SubtreeRenderer for ExpandedRenderer {
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
            ctx.push_label(&mut line, item.node.record(), item.parent);
            line.finish(out);

            let child_prefix = format!("{}{}", item.prefix, ctx.glyphs.continuation(item.is_last));
            Pending::push_children(&mut stack, item.node, &child_prefix);
        }
    }
}
