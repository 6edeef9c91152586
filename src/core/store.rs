//! Contract between the sidebar and the chat data store.
//!
//! The store owns the persisted hierarchy; the sidebar only reads snapshots
//! and asks for structural changes. Every mutation that succeeds is followed
//! by a [`HierarchyChange`] broadcast, which is what drives re-rendering.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::core::hierarchy::HierarchyNode;
use crate::core::sidebar::accordion::{PanelItem, PanelKey};

/// Structural change announced by the store after it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyChange {
    FolderCreated { path: String },
    FolderDeleted { path: String },
    FolderMoved { old_path: String, new_path: String },
    LeafMoved { id: String, new_parent_path: String },
    ActiveLeafChanged { id: Option<String> },
    Reloaded,
}

#[derive(Debug)]
pub enum StoreError {
    /// A filesystem operation failed.
    Io {
        path: PathBuf,
        source: io::Error,
    },
    /// The named folder or leaf does not exist.
    NotFound(String),
    /// The request was malformed (empty name, separator in a name, ...).
    Invalid(String),
    /// The panel has no backing data in this store.
    Unsupported(String),
    /// The blocking worker running the operation panicked or was cancelled.
    Worker(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "Storage error at {}: {}", path.display(), source)
            }
            StoreError::NotFound(what) => write!(f, "Not found: {what}"),
            StoreError::Invalid(reason) => write!(f, "Invalid request: {reason}"),
            StoreError::Unsupported(what) => write!(f, "Unsupported: {what}"),
            StoreError::Worker(reason) => write!(f, "Store worker failed: {reason}"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Data store collaborator.
///
/// Mutations return `Ok(false)` when the store declined the operation and
/// `Err` when it failed outright; callers treat both as "nothing changed".
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn fetch_hierarchy(&self) -> Result<Vec<HierarchyNode>, StoreError>;

    async fn active_leaf_id(&self) -> Result<Option<String>, StoreError>;

    async fn set_active_leaf(&self, id: Option<String>) -> Result<(), StoreError>;

    async fn move_leaf(
        &self,
        id: &str,
        old_path: &str,
        new_parent_path: &str,
    ) -> Result<bool, StoreError>;

    /// Renames or moves a folder; a move is a path change.
    async fn rename_or_move_folder(&self, old_path: &str, new_path: &str)
        -> Result<bool, StoreError>;

    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<bool, StoreError>;

    async fn delete_folder(&self, path: &str) -> Result<bool, StoreError>;

    async fn path_exists(&self, path: &str) -> Result<bool, StoreError>;

    async fn populate_panel(&self, key: PanelKey) -> Result<Vec<PanelItem>, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<HierarchyChange>;
}
