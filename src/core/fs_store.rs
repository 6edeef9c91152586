//! Directory-backed [`ChatStore`].
//!
//! Folders are directories below the chat root and leaves are `*.json` chat
//! files. Paths handed across the trait are relative to the chat root and
//! use `/` separators regardless of platform. Filesystem work runs on the
//! blocking pool.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::core::hierarchy::{
    file_name, is_descendant, join_path, parent_path, rebase_path, FolderNode, HierarchyNode,
    LeafNode,
};
use crate::core::sidebar::accordion::{PanelItem, PanelKey};
use crate::core::store::{ChatStore, HierarchyChange, StoreError};

const CHAT_EXTENSION: &str = "json";
const ROLE_EXTENSION: &str = "md";

/// Only the `id` of a chat file matters here.
#[derive(Debug, Deserialize)]
struct ChatHeader {
    id: Option<String>,
}

/// Leaf ids and where they currently live, as `folder/stem` paths.
///
/// A file keeps the id it was first given for as long as the store lives,
/// so ids survive moves even for files with no usable `id` field.
#[derive(Debug, Default)]
struct LeafIndex {
    by_id: HashMap<String, String>,
    by_path: HashMap<String, String>,
}

impl LeafIndex {
    fn insert(&mut self, id: String, leaf_path: String) {
        self.by_path.insert(leaf_path.clone(), id.clone());
        self.by_id.insert(id, leaf_path);
    }

    fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    fn path_of(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    fn id_at(&self, leaf_path: &str) -> Option<&str> {
        self.by_path.get(leaf_path).map(String::as_str)
    }

    fn relocate(&mut self, id: &str, new_leaf_path: String) {
        if let Some(old) = self.by_id.get(id) {
            self.by_path.remove(old);
        }
        self.insert(id.to_string(), new_leaf_path);
    }

    /// Moves every leaf inside the folder `old_root` under `new_root`.
    fn rebase(&mut self, old_root: &str, new_root: &str) {
        let moved: Vec<(String, String)> = self
            .by_id
            .iter()
            .filter(|(_, path)| is_descendant(path, old_root))
            .filter_map(|(id, path)| {
                rebase_path(path, old_root, new_root).map(|new_path| (id.clone(), new_path))
            })
            .collect();
        for (id, new_path) in moved {
            self.relocate(&id, new_path);
        }
    }

    fn remove_inside(&mut self, root: &str) {
        self.by_id.retain(|_, path| !is_descendant(path, root));
        self.by_path.retain(|path, _| !is_descendant(path, root));
    }

    /// An id for `leaf_path` that no other leaf holds.
    fn fallback_id(&self, leaf_path: &str) -> String {
        let mut candidate = leaf_path.to_string();
        let mut n = 2;
        while self.contains_id(&candidate) {
            candidate = format!("{leaf_path}#{n}");
            n += 1;
        }
        candidate
    }
}

/// A chat file found while walking, before ids are settled.
#[derive(Debug)]
struct ChatFile {
    leaf_path: String,
    declared_id: Option<String>,
}

/// Settles ids for one walk. Files the previous index already knows keep
/// their id; the rest take their declared id when it is free and a
/// path-derived one otherwise.
fn assign_ids(previous: &LeafIndex, files: &[ChatFile]) -> LeafIndex {
    let mut next = LeafIndex::default();
    for file in files {
        if let Some(id) = previous.id_at(&file.leaf_path) {
            if !next.contains_id(id) {
                next.insert(id.to_string(), file.leaf_path.clone());
            }
        }
    }
    for file in files {
        if next.id_at(&file.leaf_path).is_some() {
            continue;
        }
        let id = match &file.declared_id {
            Some(id) if !next.contains_id(id) => id.clone(),
            Some(id) => {
                warn!(%id, path = %file.leaf_path, "Duplicate chat id; using a path-based id");
                next.fallback_id(&file.leaf_path)
            }
            None => next.fallback_id(&file.leaf_path),
        };
        next.insert(id, file.leaf_path.clone());
    }
    next
}

fn fill_ids(nodes: &mut [HierarchyNode], index: &LeafIndex) {
    for node in nodes {
        match node {
            HierarchyNode::Folder(folder) => fill_ids(&mut folder.children, index),
            HierarchyNode::Leaf(leaf) => {
                let leaf_path = join_path(&leaf.path, &leaf.name);
                if let Some(id) = index.id_at(&leaf_path) {
                    leaf.id = id.to_string();
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn io_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `<path>.json`, keeping any dots already in the name.
fn chat_file(path: PathBuf) -> PathBuf {
    let mut name = OsString::from(path);
    name.push(".");
    name.push(CHAT_EXTENSION);
    PathBuf::from(name)
}

fn is_chat_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == CHAT_EXTENSION)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn declared_id(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .and_then(|contents| serde_json::from_str::<ChatHeader>(&contents).ok())
        .and_then(|header| header.id)
        .filter(|id| !id.trim().is_empty())
}

fn modified_at(path: &Path) -> String {
    match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(time) => DateTime::<Utc>::from(time).to_rfc3339(),
        Err(_) => String::new(),
    }
}

/// Walks `dir`, returning nodes with empty leaf ids and recording every chat
/// file in walk order. Symlinked folders are skipped so a link back up the
/// tree cannot recurse forever.
fn read_folder(
    dir: &Path,
    relative: &str,
    files: &mut Vec<ChatFile>,
) -> Result<Vec<HierarchyNode>, StoreError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|err| io_error(dir, err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| io_error(dir, err))?;
    entries.sort_by_key(|entry| {
        let name = entry.file_name().to_string_lossy().into_owned();
        (name.to_lowercase(), name)
    });

    let mut folders = Vec::new();
    let mut leaves = Vec::new();
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(|err| io_error(&path, err))?;
        if path.is_dir() {
            if file_type.is_symlink() {
                debug!(path = %path.display(), "Skipping symlinked folder");
                continue;
            }
            let child_path = join_path(relative, &name);
            let children = read_folder(&path, &child_path, files)?;
            folders.push(FolderNode::new(child_path, children));
        } else if is_chat_file(&path) {
            let stem = file_stem(&path);
            files.push(ChatFile {
                leaf_path: join_path(relative, &stem),
                declared_id: declared_id(&path),
            });
            leaves.push(LeafNode {
                id: String::new(),
                path: relative.to_string(),
                name: stem,
                last_modified_at: modified_at(&path),
            });
        }
    }

    Ok(folders
        .into_iter()
        .map(HierarchyNode::Folder)
        .chain(leaves.into_iter().map(HierarchyNode::Leaf))
        .collect())
}

/// State shared with blocking-pool workers.
struct StoreInner {
    chat_root: PathBuf,
    role_root: PathBuf,
    models: Vec<String>,
    active: Mutex<Option<String>>,
    index: Mutex<LeafIndex>,
    changes: broadcast::Sender<HierarchyChange>,
}

impl StoreInner {
    /// Resolves a relative tree path, refusing anything that would escape
    /// the chat root.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        let mut resolved = self.chat_root.clone();
        for segment in relative.split('/').filter(|segment| !segment.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(StoreError::Invalid(format!("bad path segment in '{relative}'")));
            }
            resolved.push(segment);
        }
        Ok(resolved)
    }

    fn announce(&self, change: HierarchyChange) {
        debug!(?change, "Store change");
        // No receivers is fine; nobody is listening yet.
        let _ = self.changes.send(change);
    }

    fn read_hierarchy(&self) -> Result<Vec<HierarchyNode>, StoreError> {
        if !self.chat_root.is_dir() {
            *lock(&self.index) = LeafIndex::default();
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        let mut nodes = read_folder(&self.chat_root, "", &mut files)?;
        let mut index = lock(&self.index);
        let settled = assign_ids(&index, &files);
        *index = settled;
        fill_ids(&mut nodes, &index);
        Ok(nodes)
    }

    /// Where leaf `id` lives, provided it is still in `folder`. Rescans once
    /// when the index does not agree.
    fn locate_leaf(&self, id: &str, folder: &str) -> Result<String, StoreError> {
        let lookup = |index: &LeafIndex| {
            index
                .path_of(id)
                .filter(|leaf_path| parent_path(leaf_path) == folder)
                .map(str::to_owned)
        };
        let known = lookup(&lock(&self.index));
        if let Some(leaf_path) = known {
            return Ok(leaf_path);
        }
        self.read_hierarchy()?;
        lookup(&lock(&self.index))
            .ok_or_else(|| StoreError::NotFound(format!("chat '{id}' in '{folder}'")))
    }

    fn set_active_leaf(&self, id: Option<String>) -> Result<(), StoreError> {
        if let Some(id) = &id {
            self.read_hierarchy()?;
            if !lock(&self.index).contains_id(id) {
                return Err(StoreError::NotFound(format!("chat '{id}'")));
            }
        }
        *lock(&self.active) = id.clone();
        self.announce(HierarchyChange::ActiveLeafChanged { id });
        Ok(())
    }

    fn move_leaf(&self, id: &str, old_path: &str, new_parent_path: &str) -> Result<bool, StoreError> {
        let leaf_path = self.locate_leaf(id, old_path)?;
        let source = chat_file(self.resolve(&leaf_path)?);
        let target_dir = self.resolve(new_parent_path)?;
        if !target_dir.is_dir() {
            return Err(StoreError::NotFound(format!("folder '{new_parent_path}'")));
        }
        let new_leaf_path = join_path(new_parent_path, file_name(&leaf_path));
        let destination = chat_file(self.resolve(&new_leaf_path)?);
        if destination.exists() {
            return Ok(false);
        }
        fs::rename(&source, &destination).map_err(|err| io_error(&source, err))?;
        lock(&self.index).relocate(id, new_leaf_path);
        info!(%id, from = %old_path, to = %new_parent_path, "Chat moved");
        self.announce(HierarchyChange::LeafMoved {
            id: id.to_string(),
            new_parent_path: new_parent_path.to_string(),
        });
        Ok(true)
    }

    fn rename_or_move_folder(&self, old_path: &str, new_path: &str) -> Result<bool, StoreError> {
        if old_path.is_empty() || new_path.is_empty() {
            return Err(StoreError::Invalid("the top level cannot be moved".into()));
        }
        let source = self.resolve(old_path)?;
        let destination = self.resolve(new_path)?;
        if !source.is_dir() {
            return Err(StoreError::NotFound(format!("folder '{old_path}'")));
        }
        if destination.exists() || destination.starts_with(&source) {
            return Ok(false);
        }
        fs::rename(&source, &destination).map_err(|err| io_error(&source, err))?;
        lock(&self.index).rebase(old_path, new_path);
        info!(from = %old_path, to = %new_path, "Folder moved");
        self.announce(HierarchyChange::FolderMoved {
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
        });
        Ok(true)
    }

    fn create_folder(&self, parent_path: &str, name: &str) -> Result<bool, StoreError> {
        if name.trim().is_empty() || name.contains('/') {
            return Err(StoreError::Invalid(format!("folder name '{name}'")));
        }
        let path = join_path(parent_path, name);
        let dir = self.resolve(&path)?;
        if dir.exists() {
            return Ok(false);
        }
        fs::create_dir_all(&dir).map_err(|err| io_error(&dir, err))?;
        info!(%path, "Folder created");
        self.announce(HierarchyChange::FolderCreated { path });
        Ok(true)
    }

    fn delete_folder(&self, path: &str) -> Result<bool, StoreError> {
        if path.is_empty() {
            return Err(StoreError::Invalid("the top level cannot be deleted".into()));
        }
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).map_err(|err| io_error(&dir, err))?;
        lock(&self.index).remove_inside(path);
        info!(%path, "Folder deleted");
        self.announce(HierarchyChange::FolderDeleted {
            path: path.to_string(),
        });
        Ok(true)
    }

    fn path_exists(&self, path: &str) -> Result<bool, StoreError> {
        let resolved = self.resolve(path)?;
        Ok(resolved.is_dir() || chat_file(resolved).is_file())
    }

    fn list_roles(&self) -> Result<Vec<PanelItem>, StoreError> {
        if !self.role_root.is_dir() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&self.role_root).map_err(|err| io_error(&self.role_root, err))?;
        let mut roles = Vec::new();
        for entry in entries {
            let path = entry.map_err(|err| io_error(&self.role_root, err))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == ROLE_EXTENSION) {
                roles.push(file_stem(&path));
            }
        }
        roles.sort_by_key(|role| role.to_lowercase());
        Ok(roles.into_iter().map(PanelItem::new).collect())
    }
}

pub struct FsChatStore {
    inner: Arc<StoreInner>,
}

impl FsChatStore {
    pub fn new(chat_root: PathBuf, role_root: PathBuf, models: Vec<String>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(StoreInner {
                chat_root,
                role_root,
                models,
                active: Mutex::new(None),
                index: Mutex::new(LeafIndex::default()),
                changes,
            }),
        }
    }

    /// Creates the chat root if it is missing.
    pub fn ensure_root(&self) -> Result<(), StoreError> {
        let root = &self.inner.chat_root;
        fs::create_dir_all(root).map_err(|err| io_error(root, err))
    }

    /// Reads the whole hierarchy on the calling thread.
    pub fn read_hierarchy(&self) -> Result<Vec<HierarchyNode>, StoreError> {
        self.inner.read_hierarchy()
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&StoreInner) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || work(&inner))
            .await
            .map_err(|err| StoreError::Worker(err.to_string()))?
    }
}

#[async_trait]
impl ChatStore for FsChatStore {
    async fn fetch_hierarchy(&self) -> Result<Vec<HierarchyNode>, StoreError> {
        self.blocking(StoreInner::read_hierarchy).await
    }

    async fn active_leaf_id(&self) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.inner.active).clone())
    }

    async fn set_active_leaf(&self, id: Option<String>) -> Result<(), StoreError> {
        self.blocking(move |store| store.set_active_leaf(id)).await
    }

    async fn move_leaf(
        &self,
        id: &str,
        old_path: &str,
        new_parent_path: &str,
    ) -> Result<bool, StoreError> {
        let (id, old_path, new_parent_path) =
            (id.to_string(), old_path.to_string(), new_parent_path.to_string());
        self.blocking(move |store| store.move_leaf(&id, &old_path, &new_parent_path))
            .await
    }

    async fn rename_or_move_folder(
        &self,
        old_path: &str,
        new_path: &str,
    ) -> Result<bool, StoreError> {
        let (old_path, new_path) = (old_path.to_string(), new_path.to_string());
        self.blocking(move |store| store.rename_or_move_folder(&old_path, &new_path))
            .await
    }

    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<bool, StoreError> {
        let (parent_path, name) = (parent_path.to_string(), name.to_string());
        self.blocking(move |store| store.create_folder(&parent_path, &name))
            .await
    }

    async fn delete_folder(&self, path: &str) -> Result<bool, StoreError> {
        let path = path.to_string();
        self.blocking(move |store| store.delete_folder(&path)).await
    }

    async fn path_exists(&self, path: &str) -> Result<bool, StoreError> {
        let path = path.to_string();
        self.blocking(move |store| store.path_exists(&path)).await
    }

    async fn populate_panel(&self, key: PanelKey) -> Result<Vec<PanelItem>, StoreError> {
        match key {
            PanelKey::Models => Ok(self.inner.models.iter().map(PanelItem::new).collect()),
            PanelKey::Roles => self.blocking(StoreInner::list_roles).await,
            PanelKey::Chats => Err(StoreError::Unsupported(
                "the chats panel is drawn from the hierarchy".into(),
            )),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<HierarchyChange> {
        self.inner.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_chat(root: &Path, relative: &str, id: Option<&str>) {
        let path = root.join(format!("{relative}.json"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let body = match id {
            Some(id) => format!(r#"{{"id":"{id}","messages":[]}}"#),
            None => r#"{"messages":[]}"#.to_string(),
        };
        fs::write(path, body).unwrap();
    }

    fn store(dir: &TempDir) -> FsChatStore {
        FsChatStore::new(
            dir.path().join("chats"),
            dir.path().join("roles"),
            vec!["gpt-4o".into(), "claude".into()],
        )
    }

    #[tokio::test]
    async fn reads_folders_before_leaves_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "zeta", Some("z"));
        write_chat(&chats, "Work/standup", Some("s"));
        write_chat(&chats, "alpha", None);
        fs::create_dir_all(chats.join("Archive")).unwrap();

        let nodes = store(&dir).fetch_hierarchy().await.unwrap();
        let names: Vec<&str> = nodes.iter().map(HierarchyNode::name).collect();
        assert_eq!(names, vec!["Archive", "Work", "alpha", "zeta"]);

        match &nodes[1] {
            HierarchyNode::Folder(folder) => {
                assert_eq!(folder.path, "Work");
                match &folder.children[0] {
                    HierarchyNode::Leaf(leaf) => {
                        assert_eq!(leaf.id, "s");
                        assert_eq!(leaf.path, "Work");
                        assert!(DateTime::parse_from_rfc3339(&leaf.last_modified_at).is_ok());
                    }
                    other => panic!("expected leaf, got {other:?}"),
                }
            }
            other => panic!("expected folder, got {other:?}"),
        }
        match &nodes[2] {
            HierarchyNode::Leaf(leaf) => assert_eq!(leaf.id, "alpha"),
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_root_is_an_empty_hierarchy() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).fetch_hierarchy().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn moves_leaf_and_announces_it() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "A/x", Some("x"));
        fs::create_dir_all(chats.join("A/B")).unwrap();
        let store = store(&dir);
        let mut changes = store.subscribe();

        assert!(store.move_leaf("x", "A", "A/B").await.unwrap());

        assert!(chats.join("A/B/x.json").is_file());
        assert!(!chats.join("A/x.json").exists());
        assert_eq!(
            changes.try_recv().unwrap(),
            HierarchyChange::LeafMoved {
                id: "x".into(),
                new_parent_path: "A/B".into()
            }
        );
    }

    #[tokio::test]
    async fn folder_move_declines_collisions_and_self_nesting() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        fs::create_dir_all(chats.join("A/B")).unwrap();
        fs::create_dir_all(chats.join("C/A")).unwrap();
        let store = store(&dir);

        assert!(!store.rename_or_move_folder("A", "C/A").await.unwrap());
        assert!(!store.rename_or_move_folder("A", "A/B/A").await.unwrap());
        assert!(store.rename_or_move_folder("A", "C/Renamed").await.unwrap());
        assert!(chats.join("C/Renamed/B").is_dir());
    }

    #[tokio::test]
    async fn path_exists_sees_folders_and_chats() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "A/note", Some("n"));
        let store = store(&dir);

        assert!(store.path_exists("A").await.unwrap());
        assert!(store.path_exists("A/note").await.unwrap());
        assert!(!store.path_exists("B").await.unwrap());
        assert!(store.path_exists("../escape").await.is_err());
    }

    #[tokio::test]
    async fn create_and_delete_folders() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_root().unwrap();

        assert!(store.create_folder("", "Projects").await.unwrap());
        assert!(!store.create_folder("", "Projects").await.unwrap());
        assert!(store.create_folder("Projects", "Rust").await.unwrap());
        assert!(store.path_exists("Projects/Rust").await.unwrap());

        assert!(store.delete_folder("Projects").await.unwrap());
        assert!(!store.path_exists("Projects").await.unwrap());
        assert!(store.delete_folder("").await.is_err());
    }

    #[tokio::test]
    async fn active_leaf_must_exist() {
        let dir = TempDir::new().unwrap();
        write_chat(&dir.path().join("chats"), "x", Some("x"));
        let store = store(&dir);

        assert!(store.set_active_leaf(Some("missing".into())).await.is_err());
        store.set_active_leaf(Some("x".into())).await.unwrap();
        assert_eq!(store.active_leaf_id().await.unwrap().as_deref(), Some("x"));
    }

    fn leaf_ids(nodes: &[HierarchyNode]) -> Vec<String> {
        let mut ids = Vec::new();
        for node in nodes {
            match node {
                HierarchyNode::Leaf(leaf) => ids.push(leaf.id.clone()),
                HierarchyNode::Folder(folder) => ids.extend(leaf_ids(&folder.children)),
            }
        }
        ids
    }

    #[tokio::test]
    async fn duplicate_ids_fall_back_to_paths() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "a", Some("same"));
        write_chat(&chats, "b", Some("same"));
        fs::create_dir_all(chats.join("T")).unwrap();
        let store = store(&dir);

        let ids = leaf_ids(&store.fetch_hierarchy().await.unwrap());
        assert_eq!(ids, vec!["same".to_string(), "b".to_string()]);
        assert_eq!(leaf_ids(&store.fetch_hierarchy().await.unwrap()), ids);

        assert!(store.move_leaf("same", "", "T").await.unwrap());
        assert!(store.move_leaf("b", "", "T").await.unwrap());
        assert!(chats.join("T/a.json").is_file());
        assert!(chats.join("T/b.json").is_file());
        assert_eq!(leaf_ids(&store.fetch_hierarchy().await.unwrap()), ids);
    }

    #[tokio::test]
    async fn chat_without_id_keeps_it_across_moves() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "A/x", None);
        fs::create_dir_all(chats.join("T")).unwrap();
        let store = store(&dir);

        assert_eq!(leaf_ids(&store.fetch_hierarchy().await.unwrap()), vec!["A/x"]);
        store.set_active_leaf(Some("A/x".into())).await.unwrap();
        assert!(store.move_leaf("A/x", "A", "T").await.unwrap());

        let nodes = store.fetch_hierarchy().await.unwrap();
        assert_eq!(leaf_ids(&nodes), vec!["A/x"]);
        let moved = crate::core::hierarchy::find_leaf(&nodes, "A/x").unwrap();
        assert_eq!(moved.path, "T");
        assert_eq!(store.active_leaf_id().await.unwrap().as_deref(), Some("A/x"));
    }

    #[tokio::test]
    async fn leaf_ids_follow_folder_renames() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "A/x", None);
        let store = store(&dir);
        store.fetch_hierarchy().await.unwrap();

        assert!(store.rename_or_move_folder("A", "B").await.unwrap());
        assert!(store.move_leaf("A/x", "B", "").await.unwrap());
        assert!(chats.join("x.json").is_file());
    }

    #[tokio::test]
    async fn dotted_chat_names_keep_their_extension() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "B/notes.v2", Some("n2"));
        write_chat(&chats, "C/notes", Some("n1"));
        let store = store(&dir);

        assert!(store.path_exists("B/notes.v2").await.unwrap());
        assert!(!store.path_exists("C/notes.v2").await.unwrap());

        store.fetch_hierarchy().await.unwrap();
        assert!(store.move_leaf("n2", "B", "C").await.unwrap());
        assert!(chats.join("C/notes.v2.json").is_file());
        assert!(chats.join("C/notes.json").is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_folders_are_skipped() {
        let dir = TempDir::new().unwrap();
        let chats = dir.path().join("chats");
        write_chat(&chats, "A/x", Some("x"));
        std::os::unix::fs::symlink(&chats, chats.join("A/loop")).unwrap();

        let nodes = store(&dir).fetch_hierarchy().await.unwrap();

        assert_eq!(crate::core::hierarchy::count_nodes(&nodes), 2);
        assert_eq!(leaf_ids(&nodes), vec!["x"]);
    }

    #[tokio::test]
    async fn panels_list_models_and_roles() {
        let dir = TempDir::new().unwrap();
        let roles = dir.path().join("roles");
        fs::create_dir_all(&roles).unwrap();
        fs::write(roles.join("reviewer.md"), "Be terse.").unwrap();
        fs::write(roles.join("notes.txt"), "ignored").unwrap();
        let store = store(&dir);

        let models = store.populate_panel(PanelKey::Models).await.unwrap();
        assert_eq!(models.len(), 2);
        let roles = store.populate_panel(PanelKey::Roles).await.unwrap();
        assert_eq!(roles, vec![PanelItem::new("reviewer")]);
        assert!(store.populate_panel(PanelKey::Chats).await.is_err());
    }
}
