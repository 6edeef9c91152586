//! Sidebar state and the controllers that mutate it.
//!
//! [`Sidebar`] aggregates the tree pane, the expansion store, the drag
//! controller and the accordion. It lives behind a [`SidebarHandle`] so async
//! work (refresh, drops, panel population) can release the lock while it
//! awaits the store and re-check its generation or ticket when it resumes.

pub mod accordion;
pub mod drag;
pub mod folder_ops;
pub mod refresh;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::expansion::ExpansionStore;
use crate::core::hierarchy::HierarchyNode;
use crate::ui::tree_pane::{RowKey, TreePane};

pub use accordion::{
    reload_panel, toggle_panel, AccordionController, AccordionPanel, HeaderClick, PanelContent, PanelItem,
    PanelKey, PanelPhase,
};
pub use drag::{
    drop_on, resolve_drop, DragController, DragPayload, DragSession, DropDecision, DropOutcome,
    DropTarget,
};
pub use folder_ops::{create_folder, delete_folder, open_leaf, rename_folder, FolderOpOutcome};
pub use refresh::{refresh, RefreshOutcome, RefreshTicket};

pub struct Sidebar {
    pub expansion: ExpansionStore,
    pub pane: TreePane,
    pub drag: DragController,
    pub accordion: AccordionController,
    generation: u64,
    active_leaf_id: Option<String>,
    hierarchy: Vec<HierarchyNode>,
}

impl Sidebar {
    pub fn new(expansion: ExpansionStore) -> Self {
        Self {
            expansion,
            pane: TreePane::new(),
            drag: DragController::new(),
            accordion: AccordionController::new(&PanelKey::ALL),
            generation: 0,
            active_leaf_id: None,
            hierarchy: Vec::new(),
        }
    }

    /// Flips a folder's fold state in the store and in the pane.
    ///
    /// Works on the rows already built, so no fetch is needed. Returns the
    /// new expansion value.
    pub fn toggle_folder(&mut self, path: &str) -> bool {
        let expanded = self.expansion.toggle(path);
        self.pane.set_folder_expanded(path, expanded);
        self.pane.reconcile_selection();
        expanded
    }

    /// Expands `path` and every folder above it.
    pub fn reveal_folder(&mut self, path: &str) {
        for ancestor in crate::core::hierarchy::ancestor_chain(path) {
            self.expansion.set(&ancestor, true);
            self.pane.set_folder_expanded(&ancestor, true);
        }
    }

    pub fn is_panel_expanded(&self, key: PanelKey) -> bool {
        self.accordion.is_expanded(key)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active_leaf_id(&self) -> Option<&str> {
        self.active_leaf_id.as_deref()
    }

    /// Hierarchy behind the rows currently in the pane.
    pub fn hierarchy(&self) -> &[HierarchyNode] {
        &self.hierarchy
    }

    /// Ends any drag and strips its markers.
    pub fn end_drag(&mut self) {
        self.drag.on_drag_end(&mut self.pane);
    }

    /// Starts dragging the row `key`; see [`DragController::on_drag_start`].
    pub fn start_drag(&mut self, key: &RowKey) -> Option<DragPayload> {
        self.drag.on_drag_start(&mut self.pane, key)
    }

    /// Deferred work tied to the next frame: scroll restoration and the
    /// accordion's "fully open" state.
    pub fn before_paint(&mut self, viewport_rows: usize) {
        self.pane.begin_paint(viewport_rows);
        self.accordion.settle();
    }
}

/// Shared, lockable sidebar state.
#[derive(Clone)]
pub struct SidebarHandle {
    inner: Arc<Mutex<Sidebar>>,
}

impl SidebarHandle {
    pub fn new(sidebar: Sidebar) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sidebar)),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Sidebar) -> R) -> R {
        let guard = self.inner.lock().await;
        f(&guard)
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut Sidebar) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }
}
