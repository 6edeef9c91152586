use chabeau_sidebar::core::expansion::ExpansionStore;
use chabeau_sidebar::core::hierarchy::{join_path, FolderNode, HierarchyNode, LeafNode};
use chabeau_sidebar::ui::hierarchy::{active_ancestor_paths, HierarchyRenderer};
use chabeau_sidebar::ui::renderer::tree_lines;
use chabeau_sidebar::ui::tree_pane::TreePane;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ratatui::layout::Rect;

/// `breadth` folders per level, `depth` levels, `leaves` chats per folder.
fn make_tree(parent: &str, depth: usize, breadth: usize, leaves: usize) -> Vec<HierarchyNode> {
    let mut nodes = Vec::new();
    if depth > 0 {
        for i in 0..breadth {
            let path = join_path(parent, &format!("folder-{i}"));
            let children = make_tree(&path, depth - 1, breadth, leaves);
            nodes.push(HierarchyNode::Folder(FolderNode::new(path, children)));
        }
    }
    for i in 0..leaves {
        nodes.push(HierarchyNode::Leaf(LeafNode {
            id: format!("{parent}#{i}"),
            path: parent.to_string(),
            name: format!("chat {i}"),
            last_modified_at: "2024-05-06T07:08:09Z".to_string(),
        }));
    }
    nodes
}

fn expand_everything(nodes: &[HierarchyNode], expansion: &mut ExpansionStore) {
    for node in nodes {
        if let HierarchyNode::Folder(folder) = node {
            expansion.set(&folder.path, true);
            expand_everything(&folder.children, expansion);
        }
    }
}

fn bench_render_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_tree");

    for &(depth, breadth, leaves) in &[(2, 5, 10), (3, 6, 10), (4, 5, 8)] {
        let nodes = make_tree("", depth, breadth, leaves);
        let mut expansion = ExpansionStore::new();
        expand_everything(&nodes, &mut expansion);
        let ancestors = active_ancestor_paths(Some("folder-0/folder-0"));
        let mut probe = TreePane::new();
        HierarchyRenderer::new(&expansion, Some("folder-0/folder-0#0"), &ancestors)
            .render_root(&nodes, &mut probe)
            .expect("valid tree");
        let rows = probe.rows().len() as u64;
        let label = format!("d{depth}_b{breadth}_l{leaves}");

        group.throughput(Throughput::Elements(rows));
        group.bench_with_input(BenchmarkId::new("rows", &label), &nodes, |b, nodes| {
            b.iter(|| {
                let mut pane = TreePane::new();
                HierarchyRenderer::new(&expansion, Some("folder-0/folder-0#0"), &ancestors)
                    .render_root(nodes, &mut pane)
                    .expect("valid tree");
                pane
            });
        });
        group.bench_with_input(BenchmarkId::new("lines", &label), &probe, |b, pane| {
            b.iter(|| tree_lines(pane, Rect::new(0, 0, 60, 50)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render_tree);
criterion_main!(benches);
