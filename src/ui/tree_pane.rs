//! Retained row model for the chat tree.
//!
//! The hierarchy renderer fills a [`TreePane`] with one [`TreeRow`] per node;
//! the terminal renderer draws whatever the pane currently holds. Folder
//! children are always present as rows and hidden through the folder's
//! `expanded` flag, so folding never needs a fetch.

use crate::core::hierarchy::NodeKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Folder(String),
    Leaf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIcon {
    FolderOpen,
    FolderClosed,
    LeafActive,
    LeafInactive,
}

impl RowIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            RowIcon::FolderOpen => "▾",
            RowIcon::FolderClosed => "▸",
            RowIcon::LeafActive => "●",
            RowIcon::LeafInactive => "○",
        }
    }

    pub fn for_folder(expanded: bool) -> Self {
        if expanded {
            RowIcon::FolderOpen
        } else {
            RowIcon::FolderClosed
        }
    }
}

/// Context actions offered by a row's action affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Open,
    NewFolder,
    Rename,
    Delete,
}

impl RowAction {
    /// Key hint shown in the selected row's action strip.
    pub fn hint(self) -> &'static str {
        match self {
            RowAction::Open => "⏎ open",
            RowAction::NewFolder => "n new",
            RowAction::Rename => "r rename",
            RowAction::Delete => "d delete",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMarkers {
    /// Leaf is the active chat.
    pub active: bool,
    /// Folder contains the active chat somewhere below it.
    pub active_ancestor: bool,
    /// Row is the source of the drag in flight.
    pub dragging: bool,
    /// Row is a legal drop target under the pointer.
    pub drop_target: bool,
}

#[derive(Debug, Clone)]
pub struct TreeRow {
    pub key: RowKey,
    pub kind: NodeKind,
    /// Folder path for folders, containing folder for leaves.
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub indent: String,
    pub icon: RowIcon,
    pub label: String,
    pub detail: Option<String>,
    pub actions: &'static [RowAction],
    /// Index of the folder row owning this row's children block.
    pub parent: Option<usize>,
    /// For folders: whether the children block is shown.
    pub expanded: bool,
    pub markers: RowMarkers,
}

impl TreeRow {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Folder the row currently lives in.
    pub fn parent_path(&self) -> &str {
        match self.kind {
            NodeKind::Folder => crate::core::hierarchy::parent_path(&self.path),
            NodeKind::Leaf => &self.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    Empty,
    Error(String),
}

impl Placeholder {
    pub fn text(&self) -> String {
        match self {
            Placeholder::Loading => "Loading chats…".to_string(),
            Placeholder::Empty => "No chats yet. Press n to create a folder.".to_string(),
            Placeholder::Error(message) => format!("Could not load chats: {message}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreePane {
    rows: Vec<TreeRow>,
    placeholder: Option<Placeholder>,
    scroll_offset: usize,
    pending_scroll: Option<usize>,
    attached: bool,
    drop_zones_active: bool,
    root_zone_highlighted: bool,
    selected: Option<RowKey>,
}

impl Default for TreePane {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePane {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            placeholder: None,
            scroll_offset: 0,
            pending_scroll: None,
            attached: true,
            drop_zones_active: false,
            root_zone_highlighted: false,
            selected: None,
        }
    }

    /// Removes every row and shows the loading placeholder.
    ///
    /// The scroll offset is left alone so a refresh can restore it.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.placeholder = Some(Placeholder::Loading);
    }

    pub fn push_row(&mut self, row: TreeRow) -> usize {
        self.placeholder = None;
        self.rows.push(row);
        self.rows.len() - 1
    }

    pub fn set_placeholder(&mut self, placeholder: Placeholder) {
        self.rows.clear();
        self.placeholder = Some(placeholder);
    }

    pub fn placeholder(&self) -> Option<&Placeholder> {
        self.placeholder.as_ref()
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [TreeRow] {
        &mut self.rows
    }

    pub fn row_index(&self, key: &RowKey) -> Option<usize> {
        self.rows.iter().position(|row| &row.key == key)
    }

    pub fn row(&self, key: &RowKey) -> Option<&TreeRow> {
        self.rows.iter().find(|row| &row.key == key)
    }

    pub fn row_mut(&mut self, key: &RowKey) -> Option<&mut TreeRow> {
        self.rows.iter_mut().find(|row| &row.key == key)
    }

    pub fn folder_row(&self, path: &str) -> Option<&TreeRow> {
        self.rows
            .iter()
            .find(|row| row.is_folder() && row.path == path)
    }

    /// Shows or hides a folder's children block. Returns false when the
    /// folder has no row in the pane.
    pub fn set_folder_expanded(&mut self, path: &str, expanded: bool) -> bool {
        match self
            .rows
            .iter_mut()
            .find(|row| row.is_folder() && row.path == path)
        {
            Some(row) => {
                row.expanded = expanded;
                row.icon = RowIcon::for_folder(expanded);
                true
            }
            None => false,
        }
    }

    /// Row visibility, one entry per row: a row is shown when every folder
    /// above it is expanded.
    pub fn visibility(&self) -> Vec<bool> {
        let mut visible = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let shown = match row.parent {
                None => true,
                Some(parent) => visible[parent] && self.rows[parent].expanded,
            };
            visible.push(shown);
        }
        visible
    }

    /// Indices of rows currently shown, in display order.
    pub fn visible_indices(&self) -> Vec<usize> {
        self.visibility()
            .into_iter()
            .enumerate()
            .filter_map(|(idx, shown)| shown.then_some(idx))
            .collect()
    }

    pub fn is_visible(&self, key: &RowKey) -> bool {
        match self.row_index(key) {
            Some(idx) => self.visibility()[idx],
            None => false,
        }
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let next = self.scroll_offset as i64 + delta as i64;
        self.scroll_offset = next.max(0) as usize;
    }

    pub fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll_offset = offset;
    }

    /// Restores `offset` on the next paint.
    pub fn schedule_scroll_restore(&mut self, offset: usize) {
        self.pending_scroll = Some(offset);
    }

    pub fn pending_scroll(&self) -> Option<usize> {
        self.pending_scroll
    }

    /// Applies deferred paint work and clamps scrolling to the viewport.
    ///
    /// A scheduled scroll restore only lands while the pane is attached;
    /// a detached pane drops it.
    pub fn begin_paint(&mut self, viewport_rows: usize) {
        if let Some(offset) = self.pending_scroll.take() {
            if self.attached {
                self.scroll_offset = offset;
            }
        }
        let total = self.display_len();
        let max_offset = total.saturating_sub(viewport_rows);
        self.scroll_offset = self.scroll_offset.min(max_offset);
    }

    /// Lines the pane occupies, counting the top-level drop zone and the
    /// placeholder.
    pub fn display_len(&self) -> usize {
        let body = if self.rows.is_empty() {
            usize::from(self.placeholder.is_some())
        } else {
            self.visible_indices().len()
        };
        body + usize::from(self.drop_zones_active)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn drop_zones_active(&self) -> bool {
        self.drop_zones_active
    }

    pub fn set_drop_zones_active(&mut self, active: bool) {
        self.drop_zones_active = active;
        if !active {
            self.root_zone_highlighted = false;
        }
    }

    pub fn root_zone_highlighted(&self) -> bool {
        self.root_zone_highlighted
    }

    pub fn set_root_zone_highlighted(&mut self, highlighted: bool) {
        self.root_zone_highlighted = highlighted && self.drop_zones_active;
    }

    pub fn set_drop_target(&mut self, path: &str, highlighted: bool) {
        if let Some(row) = self
            .rows
            .iter_mut()
            .find(|row| row.is_folder() && row.path == path)
        {
            row.markers.drop_target = highlighted;
        }
    }

    pub fn set_dragging(&mut self, key: &RowKey, dragging: bool) {
        if let Some(row) = self.row_mut(key) {
            row.markers.dragging = dragging;
        }
    }

    /// Strips every drag-related marker from the pane.
    pub fn clear_drag_markers(&mut self) {
        for row in &mut self.rows {
            row.markers.dragging = false;
            row.markers.drop_target = false;
        }
        self.root_zone_highlighted = false;
        self.drop_zones_active = false;
    }

    /// Number of drag-related markers currently set, root zone included.
    pub fn drag_marker_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| usize::from(row.markers.dragging) + usize::from(row.markers.drop_target))
            .sum::<usize>()
            + usize::from(self.root_zone_highlighted)
    }

    pub fn selected(&self) -> Option<&RowKey> {
        self.selected.as_ref()
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.selected.as_ref().and_then(|key| self.row(key))
    }

    pub fn select(&mut self, key: Option<RowKey>) {
        self.selected = key;
    }

    /// Moves the selection by `delta` visible rows, wrapping at the ends.
    pub fn move_selection(&mut self, delta: i32) {
        let visible = self.visible_indices();
        if visible.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|key| self.row_index(key))
            .and_then(|idx| visible.iter().position(|v| *v == idx));
        let len = visible.len() as i64;
        let next = match current {
            Some(pos) => (pos as i64 + delta as i64).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.selected = Some(self.rows[visible[next as usize]].key.clone());
    }

    /// Keeps the selection on a shown row; falls back to the nearest
    /// visible ancestor after a collapse, or clears it when the row vanished.
    pub fn reconcile_selection(&mut self) {
        let Some(key) = self.selected.clone() else {
            return;
        };
        let Some(mut idx) = self.row_index(&key) else {
            self.selected = None;
            return;
        };
        let visibility = self.visibility();
        while !visibility[idx] {
            match self.rows[idx].parent {
                Some(parent) => idx = parent,
                None => break,
            }
        }
        self.selected = Some(self.rows[idx].key.clone());
    }

    /// Display line → row index, accounting for scrolling and the
    /// top-level drop zone line.
    pub fn row_at_line(&self, line: usize) -> Option<usize> {
        let zone_lines = usize::from(self.drop_zones_active);
        let position = (line + self.scroll_offset).checked_sub(zone_lines)?;
        self.visible_indices().get(position).copied()
    }

    /// True when `line` is the top-level drop zone.
    pub fn is_root_zone_line(&self, line: usize) -> bool {
        self.drop_zones_active && line + self.scroll_offset == 0
    }
}
