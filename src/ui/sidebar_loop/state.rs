use crate::core::message::Notice;
use crate::core::sidebar::{DragPayload, DropDecision, DropTarget, PanelKey};
use crate::ui::layout::SidebarLayout;
use crate::ui::tree_pane::RowKey;

use super::prompt::Prompt;

/// Async work requested by input handling; the event loop spawns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Refresh,
    TogglePanel(PanelKey),
    ReloadPanel(PanelKey),
    Drop(DropDecision),
    CreateFolder { parent: String, name: String },
    RenameFolder { path: String, name: String },
    DeleteFolder { path: String },
    OpenLeaf { id: String },
}

/// Row under the mouse button while it is held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressedRow {
    pub key: RowKey,
    pub column: u16,
    pub row: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerState {
    pub pressed: Option<PressedRow>,
    /// Set once the press turned into a drag.
    pub payload: Option<DragPayload>,
    pub hover: Option<DropTarget>,
}

impl PointerState {
    pub fn is_dragging(&self) -> bool {
        self.payload.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Terminal-side state that never leaves the event loop.
#[derive(Debug, Default)]
pub struct HostState {
    pub prompt: Option<Prompt>,
    pub notice: Option<Notice>,
    pub pointer: PointerState,
    /// Layout of the last drawn frame, used for hit-testing.
    pub layout: Option<SidebarLayout>,
    pub exit_requested: bool,
}
