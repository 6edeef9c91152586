//! Plain-text rendering of the chat tree for the `tree` subcommand.

use std::collections::HashSet;

use crate::core::expansion::ExpansionStore;
use crate::core::hierarchy::HierarchyNode;
use crate::ui::hierarchy::{HierarchyRenderer, RenderError};
use crate::ui::tree_pane::TreePane;

fn expand_all(nodes: &[HierarchyNode], expansion: &mut ExpansionStore) {
    for node in nodes {
        if let HierarchyNode::Folder(folder) = node {
            expansion.set(&folder.path, true);
            expand_all(&folder.children, expansion);
        }
    }
}

/// One line per node with every folder unfolded.
pub fn tree_lines(nodes: &[HierarchyNode]) -> Result<Vec<String>, RenderError> {
    let mut expansion = ExpansionStore::new();
    expand_all(nodes, &mut expansion);
    let ancestors = HashSet::new();
    let mut pane = TreePane::new();
    HierarchyRenderer::new(&expansion, None, &ancestors).render_root(nodes, &mut pane)?;

    if pane.rows().is_empty() {
        return Ok(pane
            .placeholder()
            .map(|placeholder| vec![placeholder.text()])
            .unwrap_or_default());
    }
    Ok(pane
        .rows()
        .iter()
        .map(|row| match &row.detail {
            Some(detail) => format!("{}{} {}  {}", row.indent, row.icon.glyph(), row.label, detail),
            None => format!("{}{} {}", row.indent, row.icon.glyph(), row.label),
        })
        .collect())
}
