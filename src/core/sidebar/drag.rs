//! Drag-and-drop reorganization of the chat tree.
//!
//! `Idle → Dragging → Idle`. The controller owns the one optional
//! [`DragSession`]; every drop decision is recomputed from that session
//! rather than from whatever the hover highlight last said. Moves are
//! delegated to the store; the re-render comes from the store's change
//! broadcast, never from here.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::SidebarHandle;
use crate::core::hierarchy::{is_descendant, join_path, parent_path, NodeKind, ROOT_PATH};
use crate::core::message::{Notice, Notifier};
use crate::core::store::ChatStore;
use crate::ui::tree_pane::{RowKey, TreePane, TreeRow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragSession {
    pub kind: NodeKind,
    /// Leaf id, or the folder path for folders.
    pub id: String,
    pub path: String,
    pub name: String,
}

impl DragSession {
    pub fn from_row(row: &TreeRow) -> Self {
        let id = match &row.key {
            RowKey::Folder(path) => path.clone(),
            RowKey::Leaf(id) => id.clone(),
        };
        Self {
            kind: row.kind,
            id,
            path: row.path.clone(),
            name: row.name.clone(),
        }
    }

    /// Folder the dragged item currently sits in.
    pub fn parent_path(&self) -> &str {
        match self.kind {
            NodeKind::Folder => parent_path(&self.path),
            NodeKind::Leaf => &self.path,
        }
    }

    pub fn row_key(&self) -> RowKey {
        match self.kind {
            NodeKind::Folder => RowKey::Folder(self.path.clone()),
            NodeKind::Leaf => RowKey::Leaf(self.id.clone()),
        }
    }

    /// Where the item would end up when dropped into `target_path`.
    pub fn destination(&self, target_path: &str) -> String {
        join_path(target_path, &self.name)
    }
}

/// Serialized session carried by the drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload(String);

impl DragPayload {
    pub fn encode(session: &DragSession) -> Result<Self, serde_json::Error> {
        serde_json::to_string(session).map(Self)
    }

    pub fn decode(&self) -> Result<DragSession, serde_json::Error> {
        serde_json::from_str(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Folder(String),
    /// The dedicated "move to top level" zone.
    Root,
}

impl DropTarget {
    pub fn path(&self) -> &str {
        match self {
            DropTarget::Folder(path) => path,
            DropTarget::Root => ROOT_PATH,
        }
    }
}

/// A validated move, ready to hand to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    pub source: DragSession,
    pub target_path: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropDecision {
    /// Nothing to do: no drag in flight, self-drop, or already there.
    Ignore,
    /// A folder dropped into its own subtree.
    RejectDescendant { source: String, target: String },
    Proceed(DropRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Ignored,
    Rejected,
    Collision { destination: String },
    Moved { from: String, to: String },
    Failed(String),
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a drag from the row `key`.
    ///
    /// Marks the source row, reveals the top-level drop zone and returns the
    /// payload for the gesture. `None` when the row is unknown.
    pub fn on_drag_start(&mut self, pane: &mut TreePane, key: &RowKey) -> Option<DragPayload> {
        if self.session.is_some() {
            warn!("Drag started while another was in flight; ending the previous one");
            self.on_drag_end(pane);
        }
        let session = DragSession::from_row(pane.row(key)?);
        let payload = match DragPayload::encode(&session) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "Could not encode drag payload");
                return None;
            }
        };
        debug!(kind = ?session.kind, path = %session.path, name = %session.name, "Drag started");
        pane.set_dragging(key, true);
        pane.set_drop_zones_active(true);
        self.session = Some(session);
        Some(payload)
    }

    /// Whether the current session may land in `target_path`.
    ///
    /// Leaves may go anywhere; folders may not go into themselves or their
    /// own subtree. Checked on paths, not by walking nodes.
    pub fn can_drop_on(&self, target_path: &str) -> bool {
        match &self.session {
            None => false,
            Some(session) => match session.kind {
                NodeKind::Leaf => true,
                NodeKind::Folder => {
                    target_path != session.path && !is_descendant(target_path, &session.path)
                }
            },
        }
    }

    pub fn on_drag_enter_target(&self, pane: &mut TreePane, target_path: &str) -> bool {
        let legal = self.can_drop_on(target_path);
        if legal {
            pane.set_drop_target(target_path, true);
        }
        legal
    }

    pub fn on_drag_leave_target(&self, pane: &mut TreePane, target_path: &str) {
        pane.set_drop_target(target_path, false);
    }

    /// Like [`Self::on_drag_enter_target`] for the top-level zone; no
    /// highlight when the item already sits at the top level.
    pub fn on_drag_enter_root(&self, pane: &mut TreePane) -> bool {
        let highlight = self.can_drop_on(ROOT_PATH)
            && self
                .session
                .as_ref()
                .is_some_and(|session| session.parent_path() != ROOT_PATH);
        pane.set_root_zone_highlighted(highlight);
        highlight
    }

    pub fn on_drag_leave_root(&self, pane: &mut TreePane) {
        pane.set_root_zone_highlighted(false);
    }

    /// Re-validates a drop from the session alone.
    ///
    /// A payload that does not decode to the current session is ignored.
    pub fn on_drop(&self, target: &DropTarget, payload: Option<&DragPayload>) -> DropDecision {
        let Some(session) = &self.session else {
            debug!("Drop without an active drag session");
            return DropDecision::Ignore;
        };
        if let Some(payload) = payload {
            match payload.decode() {
                Ok(carried) if carried == *session => {}
                Ok(_) | Err(_) => {
                    warn!("Drop payload does not match the active drag session");
                    return DropDecision::Ignore;
                }
            }
        }

        let target_path = target.path();
        match session.kind {
            NodeKind::Folder => {
                if target_path == session.path {
                    return DropDecision::Ignore;
                }
                if is_descendant(target_path, &session.path) {
                    return DropDecision::RejectDescendant {
                        source: session.path.clone(),
                        target: target_path.to_string(),
                    };
                }
            }
            NodeKind::Leaf => {}
        }
        if session.parent_path() == target_path {
            return DropDecision::Ignore;
        }

        DropDecision::Proceed(DropRequest {
            source: session.clone(),
            target_path: target_path.to_string(),
            destination: session.destination(target_path),
        })
    }

    /// Puts the source marker and drop zones back on freshly rendered rows.
    pub fn restore_markers(&self, pane: &mut TreePane) {
        if let Some(session) = &self.session {
            pane.set_dragging(&session.row_key(), true);
            pane.set_drop_zones_active(true);
        }
    }

    /// Ends the drag. Always clears the session and every drag marker,
    /// whether or not a drop happened.
    pub fn on_drag_end(&mut self, pane: &mut TreePane) {
        if let Some(session) = self.session.take() {
            debug!(path = %session.path, name = %session.name, "Drag ended");
        }
        pane.clear_drag_markers();
    }
}

/// Carries out a drop decision against the store.
pub async fn resolve_drop(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    notifier: &dyn Notifier,
    decision: DropDecision,
) -> DropOutcome {
    match decision {
        DropDecision::Ignore => DropOutcome::Ignored,
        DropDecision::RejectDescendant { source, target } => {
            warn!(%source, %target, "Rejected folder drop into its own subtree");
            notifier.notify(Notice::error(format!(
                "Cannot move '{source}' into its own subfolder '{target}'"
            )));
            DropOutcome::Rejected
        }
        DropDecision::Proceed(request) => execute_drop(handle, store, notifier, request).await,
    }
}

/// Computes the decision for `target` and resolves it in one go.
pub async fn drop_on(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    notifier: &dyn Notifier,
    target: DropTarget,
    payload: Option<DragPayload>,
) -> DropOutcome {
    let decision = handle
        .read(|sidebar| sidebar.drag.on_drop(&target, payload.as_ref()))
        .await;
    resolve_drop(handle, store, notifier, decision).await
}

async fn execute_drop(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    notifier: &dyn Notifier,
    request: DropRequest,
) -> DropOutcome {
    let DropRequest {
        source,
        target_path,
        destination,
    } = request;

    match store.path_exists(&destination).await {
        Ok(false) => {}
        Ok(true) => {
            warn!(%destination, "Drop destination already exists");
            notifier.notify(Notice::warning(format!(
                "'{destination}' already exists; nothing was moved"
            )));
            return DropOutcome::Collision { destination };
        }
        Err(err) => {
            notifier.notify(Notice::error(format!("Could not check '{destination}': {err}")));
            return DropOutcome::Failed(err.to_string());
        }
    }

    let result = match source.kind {
        NodeKind::Leaf => {
            store
                .move_leaf(&source.id, &source.path, &target_path)
                .await
        }
        NodeKind::Folder => store.rename_or_move_folder(&source.path, &destination).await,
    };

    match result {
        Ok(true) => {
            if source.kind == NodeKind::Folder {
                let (old, new) = (source.path.clone(), destination.clone());
                handle
                    .update(|sidebar| sidebar.expansion.rekey_subtree(&old, &new))
                    .await;
            }
            info!(from = %source.path, name = %source.name, to = %target_path, "Moved");
            DropOutcome::Moved {
                from: source.path,
                to: destination,
            }
        }
        Ok(false) => {
            notifier.notify(Notice::error(format!("Could not move '{}'", source.name)));
            DropOutcome::Failed(format!("store declined moving '{}'", source.name))
        }
        Err(err) => {
            warn!(error = %err, name = %source.name, "Move failed");
            notifier.notify(Notice::error(format!(
                "Could not move '{}': {err}",
                source.name
            )));
            DropOutcome::Failed(err.to_string())
        }
    }
}
