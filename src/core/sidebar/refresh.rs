//! Fetch → render → restore-scroll, guarded by a generation counter.
//!
//! Each refresh takes a new generation before it suspends on the store. When
//! the fetch comes back, the result is only rendered if no later refresh has
//! started in the meantime, so overlapping refreshes can never paint older
//! content over newer content. Stale fetches are dropped, not cancelled.

use futures_util::future::try_join;
use tracing::{debug, warn};

use super::{Sidebar, SidebarHandle};
use crate::core::hierarchy::{find_leaf, HierarchyNode};
use crate::core::store::{ChatStore, StoreError};
use crate::ui::hierarchy::{active_ancestor_paths, HierarchyRenderer};
use crate::ui::tree_pane::Placeholder;

/// What a refresh captured before suspending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub scroll_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered,
    /// A newer refresh started while this one was fetching.
    Stale,
    Failed(String),
}

type Fetched = (Vec<HierarchyNode>, Option<String>);

impl Sidebar {
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        let ticket = RefreshTicket {
            generation: self.generation,
            scroll_offset: self.pane.scroll_offset(),
        };
        self.pane.clear();
        ticket
    }

    pub fn is_current_generation(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn finish_refresh(
        &mut self,
        ticket: RefreshTicket,
        fetched: Result<Fetched, StoreError>,
    ) -> RefreshOutcome {
        let outcome = if !self.is_current_generation(ticket.generation) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale chat tree refresh"
            );
            RefreshOutcome::Stale
        } else {
            match fetched {
                Ok((nodes, active_id)) => self.render_fetched(nodes, active_id),
                Err(err) => {
                    warn!(error = %err, "Chat tree fetch failed");
                    let message = err.to_string();
                    self.pane.set_placeholder(Placeholder::Error(message.clone()));
                    RefreshOutcome::Failed(message)
                }
            }
        };

        if self.pane.is_attached() {
            self.pane.schedule_scroll_restore(ticket.scroll_offset);
        }
        outcome
    }

    fn render_fetched(
        &mut self,
        nodes: Vec<HierarchyNode>,
        active_id: Option<String>,
    ) -> RefreshOutcome {
        let active_path = active_id
            .as_deref()
            .and_then(|id| find_leaf(&nodes, id))
            .map(|leaf| leaf.path.clone());
        let ancestors = active_ancestor_paths(active_path.as_deref());

        let renderer =
            HierarchyRenderer::new(&self.expansion, active_id.as_deref(), &ancestors);
        match renderer.render_root(&nodes, &mut self.pane) {
            Ok(()) => {
                self.drag.restore_markers(&mut self.pane);
                debug!(rows = self.pane.rows().len(), "Chat tree rendered");
                self.active_leaf_id = active_id;
                self.hierarchy = nodes;
                RefreshOutcome::Rendered
            }
            Err(err) => {
                warn!(error = %err, "Chat tree snapshot is inconsistent");
                let message = err.to_string();
                self.pane.set_placeholder(Placeholder::Error(message.clone()));
                RefreshOutcome::Failed(message)
            }
        }
    }
}

/// Rebuilds the chat tree from the store.
///
/// Never fails: fetch and render errors end up as an error placeholder.
pub async fn refresh(handle: &SidebarHandle, store: &dyn ChatStore) -> RefreshOutcome {
    let ticket = handle.update(|sidebar| sidebar.begin_refresh()).await;
    debug!(generation = ticket.generation, "Refreshing chat tree");

    let fetched = try_join(store.fetch_hierarchy(), store.active_leaf_id()).await;

    handle
        .update(|sidebar| sidebar.finish_refresh(ticket, fetched))
        .await
}
