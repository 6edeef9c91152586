//! Folder/leaf hierarchy snapshot and the path arithmetic shared by the
//! renderer, the drag controller and the expansion store.
//!
//! Paths are slash-delimited and relative to the store root. The top-level
//! folder is the empty path. A leaf's `path` is the folder that contains it,
//! so a leaf at the top level has an empty path.

use serde::{Deserialize, Serialize};

/// Path of the hierarchy's top-level folder.
pub const ROOT_PATH: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyNode {
    Folder(FolderNode),
    Leaf(LeafNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafNode {
    /// Stable identity; survives moves.
    pub id: String,
    /// Containing folder.
    pub path: String,
    pub name: String,
    /// RFC 3339 timestamp as reported by the store. May be malformed.
    pub last_modified_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    Leaf,
}

impl HierarchyNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            HierarchyNode::Folder(_) => NodeKind::Folder,
            HierarchyNode::Leaf(_) => NodeKind::Leaf,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HierarchyNode::Folder(folder) => &folder.name,
            HierarchyNode::Leaf(leaf) => &leaf.name,
        }
    }

    /// Folder path for folders, containing folder for leaves.
    pub fn path(&self) -> &str {
        match self {
            HierarchyNode::Folder(folder) => &folder.path,
            HierarchyNode::Leaf(leaf) => &leaf.path,
        }
    }

    /// Path of the folder this node currently sits in.
    pub fn parent_path(&self) -> &str {
        match self {
            HierarchyNode::Folder(folder) => parent_path(&folder.path),
            HierarchyNode::Leaf(leaf) => &leaf.path,
        }
    }
}

impl FolderNode {
    pub fn new(path: impl Into<String>, children: Vec<HierarchyNode>) -> Self {
        let path = path.into();
        let name = file_name(&path).to_string();
        Self {
            path,
            name,
            children,
        }
    }
}

/// Joins a folder path and a child name, treating the top level specially.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Folder containing `path`; the top level for single-segment paths.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => ROOT_PATH,
    }
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// True when `candidate` lies strictly inside the subtree rooted at `ancestor`.
///
/// This is a prefix comparison on whole segments: `A/Bc` is not inside `A/B`.
/// Every non-root path is inside the top-level folder.
pub fn is_descendant(candidate: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() {
        return !candidate.is_empty();
    }
    candidate.len() > ancestor.len()
        && candidate.starts_with(ancestor)
        && candidate.as_bytes()[ancestor.len()] == b'/'
}

/// `path` itself or any path below it.
pub fn is_within(candidate: &str, root: &str) -> bool {
    candidate == root || is_descendant(candidate, root)
}

/// Re-bases `path` from the subtree at `old_root` to `new_root`.
///
/// Returns `None` when `path` is not inside `old_root`.
pub fn rebase_path(path: &str, old_root: &str, new_root: &str) -> Option<String> {
    if path == old_root {
        return Some(new_root.to_string());
    }
    if !is_descendant(path, old_root) {
        return None;
    }
    let suffix = if old_root.is_empty() {
        path
    } else {
        &path[old_root.len() + 1..]
    };
    Some(join_path(new_root, suffix))
}

/// Every folder path from the top level down to and including `path`.
///
/// `"A/B/C"` yields `["A", "A/B", "A/B/C"]`; the top level yields nothing.
pub fn ancestor_chain(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut chain = Vec::new();
    let mut current = String::new();
    for segment in path.split('/') {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        chain.push(current.clone());
    }
    chain
}

/// Finds the leaf with `id` anywhere in `nodes`.
pub fn find_leaf<'a>(nodes: &'a [HierarchyNode], id: &str) -> Option<&'a LeafNode> {
    nodes.iter().find_map(|node| match node {
        HierarchyNode::Leaf(leaf) if leaf.id == id => Some(leaf),
        HierarchyNode::Leaf(_) => None,
        HierarchyNode::Folder(folder) => find_leaf(&folder.children, id),
    })
}

/// Finds the folder at `path` anywhere in `nodes`.
pub fn find_folder<'a>(nodes: &'a [HierarchyNode], path: &str) -> Option<&'a FolderNode> {
    nodes.iter().find_map(|node| match node {
        HierarchyNode::Folder(folder) if folder.path == path => Some(folder),
        HierarchyNode::Folder(folder) if is_descendant(path, &folder.path) => {
            find_folder(&folder.children, path)
        }
        _ => None,
    })
}

/// Total node count, folders and leaves.
pub fn count_nodes(nodes: &[HierarchyNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            HierarchyNode::Folder(folder) => 1 + count_nodes(&folder.children),
            HierarchyNode::Leaf(_) => 1,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, path: &str, name: &str) -> HierarchyNode {
        HierarchyNode::Leaf(LeafNode {
            id: id.to_string(),
            path: path.to_string(),
            name: name.to_string(),
            last_modified_at: "2024-03-01T10:00:00Z".to_string(),
        })
    }

    #[test]
    fn join_and_split_paths() {
        assert_eq!(join_path("", "A"), "A");
        assert_eq!(join_path("A", "B"), "A/B");
        assert_eq!(parent_path("A/B/C"), "A/B");
        assert_eq!(parent_path("A"), "");
        assert_eq!(file_name("A/B/C"), "C");
        assert_eq!(file_name("A"), "A");
    }

    #[test]
    fn descendant_check_respects_segment_boundaries() {
        assert!(is_descendant("A/B", "A"));
        assert!(is_descendant("A/B/C", "A"));
        assert!(!is_descendant("A", "A"));
        assert!(!is_descendant("AB", "A"));
        assert!(!is_descendant("A/Bc", "A/B"));
        assert!(is_descendant("A", ""));
        assert!(!is_descendant("", ""));
        assert!(is_within("A", "A"));
    }

    #[test]
    fn rebase_moves_whole_subtree() {
        assert_eq!(rebase_path("A", "A", "X/A").as_deref(), Some("X/A"));
        assert_eq!(rebase_path("A/B/C", "A", "X/A").as_deref(), Some("X/A/B/C"));
        assert_eq!(rebase_path("AB", "A", "X/A"), None);
        assert_eq!(rebase_path("X/A/B", "X/A", "A").as_deref(), Some("A/B"));
    }

    #[test]
    fn ancestor_chain_walks_from_top() {
        assert_eq!(ancestor_chain("A/B/C"), vec!["A", "A/B", "A/B/C"]);
        assert!(ancestor_chain("").is_empty());
    }

    #[test]
    fn finds_nodes_by_identity() {
        let nodes = vec![HierarchyNode::Folder(FolderNode::new(
            "A",
            vec![
                HierarchyNode::Folder(FolderNode::new("A/B", vec![leaf("y", "A/B", "y")])),
                leaf("x", "A", "x"),
            ],
        ))];

        assert_eq!(find_leaf(&nodes, "y").map(|l| l.path.as_str()), Some("A/B"));
        assert!(find_leaf(&nodes, "missing").is_none());
        assert_eq!(find_folder(&nodes, "A/B").map(|f| f.name.as_str()), Some("B"));
        assert_eq!(count_nodes(&nodes), 4);
        assert_eq!(nodes[0].parent_path(), "");
    }

    #[test]
    fn node_serializes_with_kind_tag() {
        let json = serde_json::to_string(&leaf("x", "A", "x")).expect("serialize");
        assert!(json.contains("\"kind\":\"leaf\""));
        let back: HierarchyNode = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.kind(), NodeKind::Leaf);
    }
}
