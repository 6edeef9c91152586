//! Turns a hierarchy snapshot into [`TreePane`] rows.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;

use chrono::{DateTime, Local};

use crate::core::expansion::ExpansionStore;
use crate::core::hierarchy::{ancestor_chain, join_path, HierarchyNode, NodeKind};
use crate::ui::tree_pane::{RowAction, RowIcon, RowKey, RowMarkers, TreePane, TreeRow};

const FOLDER_ACTIONS: &[RowAction] = &[RowAction::NewFolder, RowAction::Rename, RowAction::Delete];
const LEAF_ACTIONS: &[RowAction] = &[RowAction::Open];

/// Marker shown for timestamps that do not parse.
pub const INVALID_TIMESTAMP: &str = "invalid";

/// The snapshot contradicts the hierarchy invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A child's path is not its parent's path plus its own name.
    MisplacedNode { parent: String, child: String },
    /// Two folders share one path.
    DuplicateFolder(String),
    /// A folder lists itself (directly or through a descendant) as a child.
    SelfContained(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::MisplacedNode { parent, child } => {
                write!(f, "'{child}' is listed under '{parent}' but lives elsewhere")
            }
            RenderError::DuplicateFolder(path) => write!(f, "folder '{path}' appears twice"),
            RenderError::SelfContained(path) => write!(f, "folder '{path}' contains itself"),
        }
    }
}

impl StdError for RenderError {}

pub struct HierarchyRenderer<'a> {
    expansion: &'a ExpansionStore,
    active_leaf_id: Option<&'a str>,
    active_ancestors: &'a HashSet<String>,
}

impl<'a> HierarchyRenderer<'a> {
    pub fn new(
        expansion: &'a ExpansionStore,
        active_leaf_id: Option<&'a str>,
        active_ancestors: &'a HashSet<String>,
    ) -> Self {
        Self {
            expansion,
            active_leaf_id,
            active_ancestors,
        }
    }

    /// Validates the snapshot and renders it from the top level.
    ///
    /// The pane is only touched once validation passed, so an inconsistent
    /// snapshot never leaves half a tree behind.
    pub fn render_root(&self, nodes: &[HierarchyNode], pane: &mut TreePane) -> Result<(), RenderError> {
        validate_hierarchy(nodes)?;
        let selected = pane.selected().cloned();
        pane.clear();
        if nodes.is_empty() {
            pane.set_placeholder(crate::ui::tree_pane::Placeholder::Empty);
            return Ok(());
        }
        self.render(nodes, pane, 0, None);
        pane.select(selected);
        pane.reconcile_selection();
        Ok(())
    }

    /// Appends rows for `nodes` at `depth`, nesting them under `parent`.
    pub fn render(
        &self,
        nodes: &[HierarchyNode],
        pane: &mut TreePane,
        depth: usize,
        parent: Option<usize>,
    ) {
        for node in nodes {
            match node {
                HierarchyNode::Folder(folder) => {
                    let expanded = self.expansion.get(&folder.path);
                    let idx = pane.push_row(TreeRow {
                        key: RowKey::Folder(folder.path.clone()),
                        kind: NodeKind::Folder,
                        path: folder.path.clone(),
                        name: folder.name.clone(),
                        depth,
                        indent: indent_for(depth),
                        icon: RowIcon::for_folder(expanded),
                        label: folder.name.clone(),
                        detail: None,
                        actions: FOLDER_ACTIONS,
                        parent,
                        expanded,
                        markers: RowMarkers {
                            active_ancestor: self.active_ancestors.contains(&folder.path),
                            ..RowMarkers::default()
                        },
                    });
                    self.render(&folder.children, pane, depth + 1, Some(idx));
                }
                HierarchyNode::Leaf(leaf) => {
                    let active = self.active_leaf_id == Some(leaf.id.as_str());
                    pane.push_row(TreeRow {
                        key: RowKey::Leaf(leaf.id.clone()),
                        kind: NodeKind::Leaf,
                        path: leaf.path.clone(),
                        name: leaf.name.clone(),
                        depth,
                        indent: indent_for(depth),
                        icon: if active {
                            RowIcon::LeafActive
                        } else {
                            RowIcon::LeafInactive
                        },
                        label: leaf.name.clone(),
                        detail: Some(format_timestamp(&leaf.last_modified_at)),
                        actions: LEAF_ACTIONS,
                        parent,
                        expanded: false,
                        markers: RowMarkers {
                            active,
                            ..RowMarkers::default()
                        },
                    });
                }
            }
        }
    }
}

pub fn indent_for(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Local `YYYY-MM-DD HH:MM`, or [`INVALID_TIMESTAMP`].
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => INVALID_TIMESTAMP.to_string(),
    }
}

/// Folder paths from the top level down to the active leaf's folder.
pub fn active_ancestor_paths(active_leaf_path: Option<&str>) -> HashSet<String> {
    active_leaf_path
        .map(|path| ancestor_chain(path).into_iter().collect())
        .unwrap_or_default()
}

/// Checks path consistency, duplicate folders and self-containment.
pub fn validate_hierarchy(nodes: &[HierarchyNode]) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    validate_level(nodes, "", &mut seen)
}

fn validate_level(
    nodes: &[HierarchyNode],
    parent: &str,
    seen: &mut HashSet<String>,
) -> Result<(), RenderError> {
    for node in nodes {
        match node {
            HierarchyNode::Folder(folder) => {
                if folder.path == parent && !parent.is_empty() {
                    return Err(RenderError::SelfContained(folder.path.clone()));
                }
                if folder.path != join_path(parent, &folder.name) {
                    return Err(RenderError::MisplacedNode {
                        parent: parent.to_string(),
                        child: folder.path.clone(),
                    });
                }
                if !seen.insert(folder.path.clone()) {
                    return Err(RenderError::DuplicateFolder(folder.path.clone()));
                }
                validate_level(&folder.children, &folder.path, seen)?;
            }
            HierarchyNode::Leaf(leaf) => {
                if leaf.path != parent {
                    return Err(RenderError::MisplacedNode {
                        parent: parent.to_string(),
                        child: join_path(&leaf.path, &leaf.name),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hierarchy::{FolderNode, LeafNode};
    use crate::ui::tree_pane::Placeholder;

    fn leaf(id: &str, path: &str, stamp: &str) -> HierarchyNode {
        HierarchyNode::Leaf(LeafNode {
            id: id.to_string(),
            path: path.to_string(),
            name: id.to_string(),
            last_modified_at: stamp.to_string(),
        })
    }

    fn folder(path: &str, children: Vec<HierarchyNode>) -> HierarchyNode {
        HierarchyNode::Folder(FolderNode::new(path, children))
    }

    fn sample() -> Vec<HierarchyNode> {
        vec![
            folder(
                "A",
                vec![
                    folder("A/B", vec![leaf("y", "A/B", "2024-01-02T03:04:05Z")]),
                    leaf("x", "A", "2024-01-02T03:04:05Z"),
                ],
            ),
            leaf("z", "", "not a date"),
        ]
    }

    #[test]
    fn renders_every_node_including_collapsed_children() {
        let expansion = ExpansionStore::new();
        let ancestors = HashSet::new();
        let mut pane = TreePane::new();
        HierarchyRenderer::new(&expansion, None, &ancestors)
            .render_root(&sample(), &mut pane)
            .expect("render");

        assert_eq!(pane.rows().len(), 5);
        assert_eq!(pane.visible_indices().len(), 2);
        let y = pane.row(&RowKey::Leaf("y".into())).expect("y row");
        assert_eq!(y.depth, 2);
        assert_eq!(y.indent, "    ");
    }

    #[test]
    fn expansion_store_drives_fold_state() {
        let mut expansion = ExpansionStore::new();
        expansion.set("A", true);
        let ancestors = HashSet::new();
        let mut pane = TreePane::new();
        HierarchyRenderer::new(&expansion, None, &ancestors)
            .render_root(&sample(), &mut pane)
            .expect("render");

        assert_eq!(pane.folder_row("A").map(|r| r.icon), Some(RowIcon::FolderOpen));
        assert_eq!(pane.folder_row("A/B").map(|r| r.icon), Some(RowIcon::FolderClosed));
        assert_eq!(pane.visible_indices().len(), 4);
    }

    #[test]
    fn marks_active_leaf_and_its_ancestors() {
        let expansion = ExpansionStore::new();
        let ancestors = active_ancestor_paths(Some("A/B"));
        let mut pane = TreePane::new();
        HierarchyRenderer::new(&expansion, Some("y"), &ancestors)
            .render_root(&sample(), &mut pane)
            .expect("render");

        let y = pane.row(&RowKey::Leaf("y".into())).expect("y");
        assert!(y.markers.active);
        assert_eq!(y.icon, RowIcon::LeafActive);
        assert!(pane.folder_row("A").expect("A").markers.active_ancestor);
        assert!(pane.folder_row("A/B").expect("A/B").markers.active_ancestor);
        assert!(!pane.row(&RowKey::Leaf("x".into())).expect("x").markers.active);
    }

    #[test]
    fn empty_hierarchy_shows_placeholder() {
        let expansion = ExpansionStore::new();
        let ancestors = HashSet::new();
        let mut pane = TreePane::new();
        HierarchyRenderer::new(&expansion, None, &ancestors)
            .render_root(&[], &mut pane)
            .expect("render");
        assert!(pane.rows().is_empty());
        assert_eq!(pane.placeholder(), Some(&Placeholder::Empty));
    }

    #[test]
    fn bad_timestamp_renders_invalid_marker() {
        assert_eq!(format_timestamp("yesterday"), INVALID_TIMESTAMP);
        assert_ne!(format_timestamp("2024-01-02T03:04:05+02:00"), INVALID_TIMESTAMP);

        let expansion = ExpansionStore::new();
        let ancestors = HashSet::new();
        let mut pane = TreePane::new();
        HierarchyRenderer::new(&expansion, None, &ancestors)
            .render_root(&sample(), &mut pane)
            .expect("render");
        let z = pane.row(&RowKey::Leaf("z".into())).expect("z");
        assert_eq!(z.detail.as_deref(), Some(INVALID_TIMESTAMP));
    }

    #[test]
    fn rejects_misplaced_children() {
        let nodes = vec![folder("A", vec![leaf("x", "B", "")])];
        assert!(matches!(
            validate_hierarchy(&nodes),
            Err(RenderError::MisplacedNode { .. })
        ));

        let nodes = vec![folder("A", vec![]), folder("A", vec![])];
        assert_eq!(
            validate_hierarchy(&nodes),
            Err(RenderError::DuplicateFolder("A".into()))
        );
    }

    #[test]
    fn failed_validation_leaves_pane_untouched() {
        let expansion = ExpansionStore::new();
        let ancestors = HashSet::new();
        let mut pane = TreePane::new();
        let renderer = HierarchyRenderer::new(&expansion, None, &ancestors);
        renderer.render_root(&sample(), &mut pane).expect("render");

        let broken = vec![folder("A", vec![folder("X/B", vec![])])];
        assert!(renderer.render_root(&broken, &mut pane).is_err());
        assert_eq!(pane.rows().len(), 5);
    }
}
