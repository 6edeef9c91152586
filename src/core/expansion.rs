use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::hierarchy::{is_within, rebase_path};

/// Folder fold state keyed by folder path.
///
/// Outlives every render pass. Unknown paths read as collapsed.
#[derive(Debug, Clone, Default)]
pub struct ExpansionStore {
    entries: HashMap<String, bool>,
}

/// On-disk form of [`ExpansionStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSnapshot {
    #[serde(default)]
    pub expanded: BTreeMap<String, bool>,
}

impl ExpansionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> bool {
        self.entries.get(path).copied().unwrap_or(false)
    }

    pub fn set(&mut self, path: &str, expanded: bool) {
        self.entries.insert(path.to_string(), expanded);
    }

    /// Flips the stored value and returns the new one.
    pub fn toggle(&mut self, path: &str) -> bool {
        let next = !self.get(path);
        self.set(path, next);
        next
    }

    /// Moves the value stored under `old_path` to `new_path`. No-op when absent.
    pub fn rekey(&mut self, old_path: &str, new_path: &str) {
        if old_path == new_path {
            return;
        }
        if let Some(value) = self.entries.remove(old_path) {
            self.entries.insert(new_path.to_string(), value);
        }
    }

    /// Re-keys `old_root` and every entry below it onto `new_root`.
    pub fn rekey_subtree(&mut self, old_root: &str, new_root: &str) {
        if old_root == new_root {
            return;
        }
        let moved: Vec<(String, String)> = self
            .entries
            .keys()
            .filter_map(|key| rebase_path(key, old_root, new_root).map(|new| (key.clone(), new)))
            .collect();
        let mut values = Vec::with_capacity(moved.len());
        for (old, new) in moved {
            if let Some(value) = self.entries.remove(&old) {
                values.push((new, value));
            }
        }
        self.entries.extend(values);
    }

    /// Drops `path` and every entry below it.
    pub fn prune_subtree(&mut self, path: &str) {
        self.entries.retain(|key, _| !is_within(key, path));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> ExpansionSnapshot {
        ExpansionSnapshot {
            expanded: self
                .entries
                .iter()
                .map(|(key, value)| (key.clone(), *value))
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: ExpansionSnapshot) -> Self {
        Self {
            entries: snapshot.expanded.into_iter().collect(),
        }
    }
}
