//! Mutually exclusive sidebar sections.
//!
//! At most one panel is `Expanding` or `Expanded` at any time. Opening a
//! panel collapses its siblings synchronously and then populates it
//! asynchronously; the result is tagged with a ticket so a population that
//! finishes after its panel was collapsed is dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::refresh::{refresh, RefreshOutcome};
use super::SidebarHandle;
use crate::core::store::ChatStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKey {
    Chats,
    Models,
    Roles,
}

impl PanelKey {
    pub const ALL: [PanelKey; 3] = [PanelKey::Chats, PanelKey::Models, PanelKey::Roles];

    pub fn title(self) -> &'static str {
        match self {
            PanelKey::Chats => "Chats",
            PanelKey::Models => "Models",
            PanelKey::Roles => "Roles",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PanelKey::Chats => "chats",
            PanelKey::Models => "models",
            PanelKey::Roles => "roles",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chats" => Some(PanelKey::Chats),
            "models" => Some(PanelKey::Models),
            "roles" => Some(PanelKey::Roles),
            _ => None,
        }
    }

    /// Header action hints, shown only while the panel is open.
    pub fn actions(self) -> &'static [&'static str] {
        match self {
            PanelKey::Chats => &["g refresh", "n new folder"],
            PanelKey::Models | PanelKey::Roles => &["g reload"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelItem {
    pub label: String,
    pub detail: Option<String>,
}

impl PanelItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Collapsed,
    Expanding { ticket: u64 },
    /// `settled` flips once the first frame after opening was painted.
    Expanded { settled: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelContent {
    Hidden,
    Loading,
    Items(Vec<PanelItem>),
    /// Content lives in the tree pane.
    Tree,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct AccordionPanel {
    pub key: PanelKey,
    pub phase: PanelPhase,
    pub content: PanelContent,
    pub actions_visible: bool,
    /// Panel-scoped listeners (store change notifications) are live.
    pub listening: bool,
}

impl AccordionPanel {
    fn new(key: PanelKey) -> Self {
        Self {
            key,
            phase: PanelPhase::Collapsed,
            content: PanelContent::Hidden,
            actions_visible: false,
            listening: false,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.phase, PanelPhase::Collapsed)
    }

    pub fn icon(&self) -> &'static str {
        if self.is_open() {
            "▾"
        } else {
            "▸"
        }
    }

    fn collapse(&mut self) {
        self.phase = PanelPhase::Collapsed;
        self.content = PanelContent::Hidden;
        self.actions_visible = false;
        self.listening = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderClick {
    /// Unknown panel, or a repeat click while it is still populating.
    Ignored,
    Collapsed,
    /// The panel is populating; report back with this ticket.
    Expanding { ticket: u64 },
}

#[derive(Debug, Clone)]
pub struct AccordionController {
    panels: Vec<AccordionPanel>,
    next_ticket: u64,
}

impl AccordionController {
    pub fn new(keys: &[PanelKey]) -> Self {
        Self {
            panels: keys.iter().copied().map(AccordionPanel::new).collect(),
            next_ticket: 0,
        }
    }

    pub fn panels(&self) -> &[AccordionPanel] {
        &self.panels
    }

    pub fn panel(&self, key: PanelKey) -> Option<&AccordionPanel> {
        self.panels.iter().find(|panel| panel.key == key)
    }

    fn panel_mut(&mut self, key: PanelKey) -> Option<&mut AccordionPanel> {
        self.panels.iter_mut().find(|panel| panel.key == key)
    }

    /// Open (`Expanding` or `Expanded`).
    pub fn is_expanded(&self, key: PanelKey) -> bool {
        self.panel(key).is_some_and(AccordionPanel::is_open)
    }

    pub fn is_listening(&self, key: PanelKey) -> bool {
        self.panel(key).is_some_and(|panel| panel.listening)
    }

    pub fn open_panel(&self) -> Option<PanelKey> {
        self.panels
            .iter()
            .find(|panel| panel.is_open())
            .map(|panel| panel.key)
    }

    pub fn click_header(&mut self, key: PanelKey) -> HeaderClick {
        let Some(phase) = self.panel(key).map(|panel| panel.phase) else {
            return HeaderClick::Ignored;
        };
        match phase {
            PanelPhase::Expanding { .. } => {
                debug!(panel = key.as_str(), "Ignoring header click while populating");
                HeaderClick::Ignored
            }
            PanelPhase::Expanded { .. } => {
                if let Some(panel) = self.panel_mut(key) {
                    panel.collapse();
                }
                debug!(panel = key.as_str(), "Panel collapsed");
                HeaderClick::Collapsed
            }
            PanelPhase::Collapsed => {
                for sibling in self.panels.iter_mut().filter(|panel| panel.key != key) {
                    if sibling.is_open() {
                        sibling.collapse();
                    }
                }
                self.next_ticket += 1;
                let ticket = self.next_ticket;
                if let Some(panel) = self.panel_mut(key) {
                    panel.phase = PanelPhase::Expanding { ticket };
                    panel.content = PanelContent::Loading;
                    panel.actions_visible = true;
                    panel.listening = true;
                }
                debug!(panel = key.as_str(), ticket, "Panel expanding");
                HeaderClick::Expanding { ticket }
            }
        }
    }

    /// Lands a population result. Failures still open the panel, showing
    /// the error inline. Returns false for a result whose ticket is stale.
    pub fn complete(
        &mut self,
        key: PanelKey,
        ticket: u64,
        result: Result<PanelContent, String>,
    ) -> bool {
        let Some(panel) = self.panel_mut(key) else {
            return false;
        };
        if panel.phase != (PanelPhase::Expanding { ticket }) {
            debug!(panel = key.as_str(), ticket, "Dropping stale panel population");
            return false;
        }
        panel.content = match result {
            Ok(content) => content,
            Err(message) => {
                warn!(panel = key.as_str(), error = %message, "Panel population failed");
                PanelContent::Error(message)
            }
        };
        panel.phase = PanelPhase::Expanded { settled: false };
        true
    }

    /// Applies the "fully open" state on paint.
    pub fn settle(&mut self) {
        for panel in &mut self.panels {
            if let PanelPhase::Expanded { settled: false } = panel.phase {
                panel.phase = PanelPhase::Expanded { settled: true };
            }
        }
    }
}

/// Handles a header click end to end, including population.
///
/// The Chats panel populates by refreshing the tree; the others ask the
/// store for their items.
pub async fn toggle_panel(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    key: PanelKey,
) -> HeaderClick {
    let click = handle
        .update(|sidebar| sidebar.accordion.click_header(key))
        .await;
    if let HeaderClick::Expanding { ticket } = click {
        let content = populate(handle, store, key).await;
        handle
            .update(|sidebar| sidebar.accordion.complete(key, ticket, content))
            .await;
    }
    click
}

/// Re-populates an open panel in place, e.g. after a store change.
pub async fn reload_panel(handle: &SidebarHandle, store: &dyn ChatStore, key: PanelKey) {
    if !handle.read(|sidebar| sidebar.is_panel_expanded(key)).await {
        return;
    }
    let content = populate(handle, store, key).await;
    handle
        .update(|sidebar| {
            if let Some(panel) = sidebar.accordion.panel_mut(key) {
                if matches!(panel.phase, PanelPhase::Expanded { .. }) {
                    panel.content = content.unwrap_or_else(PanelContent::Error);
                }
            }
        })
        .await;
}

async fn populate(
    handle: &SidebarHandle,
    store: &dyn ChatStore,
    key: PanelKey,
) -> Result<PanelContent, String> {
    match key {
        PanelKey::Chats => {
            // A failed refresh leaves its error placeholder in the pane.
            if let RefreshOutcome::Failed(message) = refresh(handle, store).await {
                debug!(error = %message, "Chats panel opened on a failed refresh");
            }
            Ok(PanelContent::Tree)
        }
        PanelKey::Models | PanelKey::Roles => store
            .populate_panel(key)
            .await
            .map(PanelContent::Items)
            .map_err(|err| err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_count(controller: &AccordionController) -> usize {
        controller
            .panels()
            .iter()
            .filter(|panel| panel.is_open())
            .count()
    }

    #[test]
    fn opening_collapses_siblings() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        let HeaderClick::Expanding { ticket } = accordion.click_header(PanelKey::Models) else {
            panic!("expected expanding");
        };
        assert!(accordion.complete(PanelKey::Models, ticket, Ok(PanelContent::Items(vec![]))));

        accordion.click_header(PanelKey::Roles);
        assert!(!accordion.is_expanded(PanelKey::Models));
        assert!(accordion.is_expanded(PanelKey::Roles));
        let models = accordion.panel(PanelKey::Models).expect("models");
        assert!(!models.actions_visible);
        assert!(!models.listening);
        assert_eq!(models.content, PanelContent::Hidden);
    }

    #[test]
    fn repeat_click_while_populating_is_ignored() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        accordion.click_header(PanelKey::Chats);
        assert_eq!(accordion.click_header(PanelKey::Chats), HeaderClick::Ignored);
        assert!(matches!(
            accordion.panel(PanelKey::Chats).map(|p| p.phase),
            Some(PanelPhase::Expanding { .. })
        ));
    }

    #[test]
    fn expanded_click_collapses_immediately() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        let HeaderClick::Expanding { ticket } = accordion.click_header(PanelKey::Roles) else {
            panic!("expected expanding");
        };
        accordion.complete(PanelKey::Roles, ticket, Ok(PanelContent::Items(vec![])));
        assert_eq!(accordion.click_header(PanelKey::Roles), HeaderClick::Collapsed);
        assert_eq!(open_count(&accordion), 0);
    }

    #[test]
    fn failure_still_opens_with_inline_error() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        let HeaderClick::Expanding { ticket } = accordion.click_header(PanelKey::Roles) else {
            panic!("expected expanding");
        };
        assert!(accordion.complete(PanelKey::Roles, ticket, Err("disk gone".into())));
        let panel = accordion.panel(PanelKey::Roles).expect("roles");
        assert_eq!(panel.phase, PanelPhase::Expanded { settled: false });
        assert_eq!(panel.content, PanelContent::Error("disk gone".into()));
        accordion.settle();
        assert_eq!(
            accordion.panel(PanelKey::Roles).map(|p| p.phase),
            Some(PanelPhase::Expanded { settled: true })
        );
    }

    #[test]
    fn late_population_for_collapsed_panel_is_dropped() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        let HeaderClick::Expanding { ticket } = accordion.click_header(PanelKey::Models) else {
            panic!("expected expanding");
        };
        accordion.click_header(PanelKey::Roles);
        assert!(!accordion.complete(
            PanelKey::Models,
            ticket,
            Ok(PanelContent::Items(vec![PanelItem::new("late")]))
        ));
        assert!(!accordion.is_expanded(PanelKey::Models));
        assert_eq!(open_count(&accordion), 1);
    }

    #[test]
    fn at_most_one_panel_open_for_any_click_sequence() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        let mut pending: Vec<(PanelKey, u64)> = Vec::new();
        // Deterministic pseudo-random walk over clicks and completions.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let key = PanelKey::ALL[(seed % 3) as usize];
            if seed % 5 == 0 {
                if let Some((key, ticket)) = pending.pop() {
                    accordion.complete(key, ticket, Ok(PanelContent::Items(vec![])));
                }
            } else if let HeaderClick::Expanding { ticket } = accordion.click_header(key) {
                pending.push((key, ticket));
            }
            assert!(open_count(&accordion) <= 1);
        }
    }

    #[test]
    fn panel_keys_parse_case_insensitively() {
        assert_eq!(PanelKey::parse(" Models "), Some(PanelKey::Models));
        assert_eq!(PanelKey::parse("nope"), None);
        for key in PanelKey::ALL {
            assert_eq!(PanelKey::parse(key.as_str()), Some(key));
        }
    }
}
