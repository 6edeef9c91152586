//! Context actions on folder and leaf rows: create, rename, delete, open.
//!
//! Same discipline as drops: validate locally, check for collisions, let the
//! store do the work, and touch the expansion store only after the store
//! reported success.

use tracing::{info, warn};

use super::SidebarHandle;
use crate::core::hierarchy::{join_path, parent_path};
use crate::core::message::{Notice, Notifier};
use crate::core::store::{ChatStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOpOutcome {
    Done,
    Unchanged,
    InvalidName(String),
    Collision(String),
    Failed(String),
}

/// Folder names are single path segments.
pub fn validate_folder_name(name: &str) -> Result<&str, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Folder name cannot be empty".to_string());
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err("Folder name cannot contain path separators".to_string());
    }
    if trimmed == "." || trimmed == ".." {
        return Err(format!("'{trimmed}' is not a usable folder name"));
    }
    Ok(trimmed)
}

fn report_failure(notifier: &dyn Notifier, action: &str, result: Result<bool, StoreError>) -> FolderOpOutcome {
    match result {
        Ok(_) => {
            notifier.notify(Notice::error(format!("Could not {action}")));
            FolderOpOutcome::Failed(format!("store declined to {action}"))
        }
        Err(err) => {
            warn!(error = %err, action, "Folder operation failed");
            notifier.notify(Notice::error(format!("Could not {action}: {err}")));
            FolderOpOutcome::Failed(err.to_string())
        }
    }
}

async fn ensure_free(
    store: &dyn ChatStore,
    notifier: &dyn Notifier,
    path: &str,
) -> Option<FolderOpOutcome> {
    match store.path_exists(path).await {
        Ok(false) => None,
        Ok(true) => {
            notifier.notify(Notice::warning(format!("'{path}' already exists")));
            Some(FolderOpOutcome::Collision(path.to_string()))
        }
        Err(err) => {
            notifier.notify(Notice::error(format!("Could not check '{path}': {err}")));
            Some(FolderOpOutcome::Failed(err.to_string()))
        }
    }
}

pub async fn rename_folder(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    notifier: &dyn Notifier,
    path: &str,
    new_name: &str,
) -> FolderOpOutcome {
    let name = match validate_folder_name(new_name) {
        Ok(name) => name,
        Err(reason) => {
            notifier.notify(Notice::warning(reason.clone()));
            return FolderOpOutcome::InvalidName(reason);
        }
    };
    let destination = join_path(parent_path(path), name);
    if destination == path {
        return FolderOpOutcome::Unchanged;
    }
    if let Some(outcome) = ensure_free(store, notifier, &destination).await {
        return outcome;
    }

    match store.rename_or_move_folder(path, &destination).await {
        Ok(true) => {
            handle
                .update(|sidebar| sidebar.expansion.rekey_subtree(path, &destination))
                .await;
            info!(from = %path, to = %destination, "Folder renamed");
            FolderOpOutcome::Done
        }
        other => report_failure(notifier, &format!("rename '{path}'"), other),
    }
}

pub async fn create_folder(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    notifier: &dyn Notifier,
    parent: &str,
    name: &str,
) -> FolderOpOutcome {
    let name = match validate_folder_name(name) {
        Ok(name) => name,
        Err(reason) => {
            notifier.notify(Notice::warning(reason.clone()));
            return FolderOpOutcome::InvalidName(reason);
        }
    };
    let path = join_path(parent, name);
    if let Some(outcome) = ensure_free(store, notifier, &path).await {
        return outcome;
    }

    match store.create_folder(parent, name).await {
        Ok(true) => {
            // Show the new folder where it landed.
            handle
                .update(|sidebar| sidebar.reveal_folder(parent))
                .await;
            info!(%path, "Folder created");
            FolderOpOutcome::Done
        }
        other => report_failure(notifier, &format!("create '{path}'"), other),
    }
}

pub async fn delete_folder(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    notifier: &dyn Notifier,
    path: &str,
) -> FolderOpOutcome {
    if path.is_empty() {
        return FolderOpOutcome::Unchanged;
    }
    match store.delete_folder(path).await {
        Ok(true) => {
            handle
                .update(|sidebar| sidebar.expansion.prune_subtree(path))
                .await;
            info!(%path, "Folder deleted");
            FolderOpOutcome::Done
        }
        other => report_failure(notifier, &format!("delete '{path}'"), other),
    }
}

/// Makes `id` the active chat. The highlight follows with the store's
/// change broadcast.
pub async fn open_leaf(store: &dyn ChatStore, notifier: &dyn Notifier, id: &str) -> FolderOpOutcome {
    match store.set_active_leaf(Some(id.to_string())).await {
        Ok(()) => FolderOpOutcome::Done,
        Err(err) => {
            notifier.notify(Notice::error(format!("Could not open chat: {err}")));
            FolderOpOutcome::Failed(err.to_string())
        }
    }
}
