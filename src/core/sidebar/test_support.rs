use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, oneshot};

use super::accordion::{PanelItem, PanelKey};
use super::{Sidebar, SidebarHandle};
use crate::core::expansion::ExpansionStore;
use crate::core::hierarchy::{FolderNode, HierarchyNode, LeafNode};
use crate::core::store::{ChatStore, HierarchyChange, StoreError};

/// In-memory store that records calls and can hold fetches on a gate.
pub struct FakeStore {
    pub hierarchy: Mutex<Vec<HierarchyNode>>,
    pub active: Mutex<Option<String>>,
    pub existing: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
    pub gates: Mutex<VecDeque<oneshot::Receiver<Vec<HierarchyNode>>>>,
    pub fail_fetch: Mutex<bool>,
    pub mutation_result: Mutex<Option<bool>>,
    pub panel_items: Mutex<Option<Vec<PanelItem>>>,
    tx: broadcast::Sender<HierarchyChange>,
}

impl FakeStore {
    pub fn new(hierarchy: Vec<HierarchyNode>) -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            hierarchy: Mutex::new(hierarchy),
            active: Mutex::new(None),
            existing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(VecDeque::new()),
            fail_fetch: Mutex::new(false),
            mutation_result: Mutex::new(Some(true)),
            panel_items: Mutex::new(Some(vec![PanelItem::new("gpt-4o")])),
            tx,
        }
    }

    pub fn with_existing(self, paths: &[&str]) -> Self {
        self.existing
            .lock()
            .unwrap()
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    /// Next fetch waits for this gate and returns what is sent through it.
    pub fn push_gate(&self) -> oneshot::Sender<Vec<HierarchyNode>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that change the store, ignoring reads.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !call.starts_with("fetch")
                    && !call.starts_with("active")
                    && !call.starts_with("exists")
                    && !call.starts_with("panel")
            })
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutation(&self) -> Result<bool, StoreError> {
        match *self.mutation_result.lock().unwrap() {
            Some(result) => Ok(result),
            None => Err(StoreError::Invalid("simulated failure".into())),
        }
    }
}

#[async_trait]
impl ChatStore for FakeStore {
    async fn fetch_hierarchy(&self) -> Result<Vec<HierarchyNode>, StoreError> {
        self.record("fetch".into());
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            return gate
                .await
                .map_err(|_| StoreError::NotFound("gate dropped".into()));
        }
        if *self.fail_fetch.lock().unwrap() {
            return Err(StoreError::Invalid("fetch exploded".into()));
        }
        Ok(self.hierarchy.lock().unwrap().clone())
    }

    async fn active_leaf_id(&self) -> Result<Option<String>, StoreError> {
        self.record("active".into());
        Ok(self.active.lock().unwrap().clone())
    }

    async fn set_active_leaf(&self, id: Option<String>) -> Result<(), StoreError> {
        self.record(format!("set_active {id:?}"));
        *self.active.lock().unwrap() = id;
        Ok(())
    }

    async fn move_leaf(
        &self,
        id: &str,
        old_path: &str,
        new_parent_path: &str,
    ) -> Result<bool, StoreError> {
        self.record(format!("move_leaf {id} {old_path} -> {new_parent_path}"));
        self.mutation()
    }

    async fn rename_or_move_folder(
        &self,
        old_path: &str,
        new_path: &str,
    ) -> Result<bool, StoreError> {
        self.record(format!("rename_folder {old_path} -> {new_path}"));
        self.mutation()
    }

    async fn create_folder(&self, parent_path: &str, name: &str) -> Result<bool, StoreError> {
        self.record(format!("create_folder {parent_path} {name}"));
        self.mutation()
    }

    async fn delete_folder(&self, path: &str) -> Result<bool, StoreError> {
        self.record(format!("delete_folder {path}"));
        self.mutation()
    }

    async fn path_exists(&self, path: &str) -> Result<bool, StoreError> {
        self.record(format!("exists {path}"));
        Ok(self.existing.lock().unwrap().contains(path))
    }

    async fn populate_panel(&self, key: PanelKey) -> Result<Vec<PanelItem>, StoreError> {
        self.record(format!("panel {}", key.as_str()));
        self.panel_items
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StoreError::Unsupported(key.as_str().into()))
    }

    fn subscribe(&self) -> broadcast::Receiver<HierarchyChange> {
        self.tx.subscribe()
    }
}

pub fn leaf(id: &str, path: &str) -> HierarchyNode {
    HierarchyNode::Leaf(LeafNode {
        id: id.to_string(),
        path: path.to_string(),
        name: id.to_string(),
        last_modified_at: "2024-05-06T07:08:09Z".to_string(),
    })
}

pub fn folder(path: &str, children: Vec<HierarchyNode>) -> HierarchyNode {
    HierarchyNode::Folder(FolderNode::new(path, children))
}

/// `A -> [A/B -> [], x]`
pub fn scenario_hierarchy() -> Vec<HierarchyNode> {
    vec![folder("A", vec![folder("A/B", vec![]), leaf("x", "A")])]
}

pub fn new_handle() -> SidebarHandle {
    SidebarHandle::new(Sidebar::new(ExpansionStore::new()))
}
