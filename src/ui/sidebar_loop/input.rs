//! Key and mouse handling.
//!
//! Everything here runs synchronously under the sidebar lock. Anything that
//! has to await the store comes back as a [`HostCommand`] for the event loop
//! to spawn. Drop decisions are taken here, before the drag ends, so the
//! session they are checked against is still the one the user dragged.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::debug;

use crate::core::sidebar::{DropTarget, PanelKey, Sidebar};
use crate::ui::layout::{Hit, SidebarLayout};
use crate::ui::tree_pane::RowKey;

use super::prompt::{Prompt, PromptKind, PromptOutcome};
use super::state::{HostCommand, HostState, PressedRow};

const WHEEL_STEP: i32 = 3;

fn chats_open(sidebar: &Sidebar) -> bool {
    sidebar.is_panel_expanded(PanelKey::Chats)
}

fn body_height(host: &HostState) -> usize {
    host.layout
        .as_ref()
        .map(SidebarLayout::body_height)
        .unwrap_or(0)
}

/// Scrolls just enough to bring the selected row into view.
fn scroll_selection_into_view(sidebar: &mut Sidebar, viewport: usize) {
    let pane = &mut sidebar.pane;
    let Some(idx) = pane.selected().and_then(|key| pane.row_index(key)) else {
        return;
    };
    let Some(position) = pane.visible_indices().iter().position(|v| *v == idx) else {
        return;
    };
    let line = position + usize::from(pane.drop_zones_active());
    let offset = pane.scroll_offset();
    if line < offset {
        pane.set_scroll_offset(line);
    } else if viewport > 0 && line >= offset + viewport {
        pane.set_scroll_offset(line + 1 - viewport);
    }
}

/// Folder a new folder should go into, judged from the selection.
fn selection_parent(sidebar: &Sidebar) -> String {
    match sidebar.pane.selected_row() {
        Some(row) if row.is_folder() => row.path.clone(),
        Some(row) => row.path.clone(),
        None => String::new(),
    }
}

/// Activates a row: folders fold or unfold, leaves open.
fn activate_row(sidebar: &mut Sidebar, key: &RowKey) -> Option<HostCommand> {
    match key {
        RowKey::Folder(path) => {
            sidebar.toggle_folder(path);
            None
        }
        RowKey::Leaf(id) => Some(HostCommand::OpenLeaf { id: id.clone() }),
    }
}

fn submit_prompt(kind: PromptKind, text: String) -> Option<HostCommand> {
    match kind {
        PromptKind::NewFolder { parent } => Some(HostCommand::CreateFolder { parent, name: text }),
        PromptKind::Rename { path } => Some(HostCommand::RenameFolder { path, name: text }),
        PromptKind::ConfirmDelete { path } => Some(HostCommand::DeleteFolder { path }),
    }
}

pub fn handle_key(sidebar: &mut Sidebar, host: &mut HostState, key: KeyEvent) -> Vec<HostCommand> {
    if let Some(prompt) = host.prompt.as_mut() {
        return match prompt.handle_key(&key) {
            PromptOutcome::Continue => Vec::new(),
            PromptOutcome::Cancelled => {
                host.prompt = None;
                Vec::new()
            }
            PromptOutcome::Submit(text) => host
                .prompt
                .take()
                .and_then(|prompt| submit_prompt(prompt.kind, text))
                .into_iter()
                .collect(),
        };
    }

    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let mut commands = Vec::new();
    match key.code {
        KeyCode::Char('q') => host.exit_requested = true,
        KeyCode::Char('c') if control => host.exit_requested = true,
        KeyCode::Char(digit @ '1'..='3') => {
            let index = (digit as usize) - ('1' as usize);
            commands.push(HostCommand::TogglePanel(PanelKey::ALL[index]));
        }
        KeyCode::Esc => {
            if sidebar.drag.is_dragging() {
                sidebar.end_drag();
                host.pointer.reset();
            }
            host.notice = None;
        }
        KeyCode::Char('g') => match sidebar.accordion.open_panel() {
            Some(PanelKey::Chats) => commands.push(HostCommand::Refresh),
            Some(other) => commands.push(HostCommand::ReloadPanel(other)),
            None => {}
        },
        _ if !chats_open(sidebar) => {}
        KeyCode::Up | KeyCode::Char('k') => {
            sidebar.pane.move_selection(-1);
            scroll_selection_into_view(sidebar, body_height(host));
        }
        KeyCode::Down | KeyCode::Char('j') => {
            sidebar.pane.move_selection(1);
            scroll_selection_into_view(sidebar, body_height(host));
        }
        KeyCode::PageUp => sidebar.pane.scroll_by(-(body_height(host).max(1) as i32)),
        KeyCode::PageDown => sidebar.pane.scroll_by(body_height(host).max(1) as i32),
        KeyCode::Left => {
            if let Some(row) = sidebar.pane.selected_row() {
                if row.is_folder() && row.expanded {
                    let path = row.path.clone();
                    sidebar.toggle_folder(&path);
                } else if let Some(parent) = row.parent {
                    let key = sidebar.pane.rows()[parent].key.clone();
                    sidebar.pane.select(Some(key));
                    scroll_selection_into_view(sidebar, body_height(host));
                }
            }
        }
        KeyCode::Right => {
            if let Some(row) = sidebar.pane.selected_row() {
                if row.is_folder() && !row.expanded {
                    let path = row.path.clone();
                    sidebar.toggle_folder(&path);
                }
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(key) = sidebar.pane.selected().cloned() {
                commands.extend(activate_row(sidebar, &key));
            }
        }
        KeyCode::Char('n') => {
            let parent = selection_parent(sidebar);
            host.prompt = Some(Prompt::new(PromptKind::NewFolder { parent }, ""));
        }
        KeyCode::Char('r') => {
            if let Some(row) = sidebar.pane.selected_row().filter(|row| row.is_folder()) {
                host.prompt = Some(Prompt::new(
                    PromptKind::Rename {
                        path: row.path.clone(),
                    },
                    row.name.clone(),
                ));
            }
        }
        KeyCode::Char('d') => {
            if let Some(row) = sidebar.pane.selected_row().filter(|row| row.is_folder()) {
                host.prompt = Some(Prompt::new(
                    PromptKind::ConfirmDelete {
                        path: row.path.clone(),
                    },
                    "",
                ));
            }
        }
        _ => {}
    }
    commands
}

/// Drop target under a body line, if the line is one.
fn target_at_line(sidebar: &Sidebar, line: usize) -> Option<DropTarget> {
    if sidebar.pane.is_root_zone_line(line) {
        return Some(DropTarget::Root);
    }
    let idx = sidebar.pane.row_at_line(line)?;
    let row = &sidebar.pane.rows()[idx];
    row.is_folder().then(|| DropTarget::Folder(row.path.clone()))
}

/// Moves the hover highlight to `target`, leaving the previous one.
///
/// Entering is re-applied on every motion, since a refresh may have
/// rebuilt the rows underneath an unchanged hover.
fn update_hover(sidebar: &mut Sidebar, host: &mut HostState, target: Option<DropTarget>) {
    if host.pointer.hover != target {
        match host.pointer.hover.take() {
            Some(DropTarget::Root) => sidebar.drag.on_drag_leave_root(&mut sidebar.pane),
            Some(DropTarget::Folder(path)) => {
                sidebar.drag.on_drag_leave_target(&mut sidebar.pane, &path)
            }
            None => {}
        }
    }
    match &target {
        Some(DropTarget::Root) => {
            sidebar.drag.on_drag_enter_root(&mut sidebar.pane);
        }
        Some(DropTarget::Folder(path)) => {
            sidebar.drag.on_drag_enter_target(&mut sidebar.pane, path);
        }
        None => {}
    }
    host.pointer.hover = target;
}

pub fn handle_mouse(
    sidebar: &mut Sidebar,
    host: &mut HostState,
    mouse: MouseEvent,
) -> Vec<HostCommand> {
    let Some(layout) = host.layout.clone() else {
        return Vec::new();
    };
    let hit = layout.hit(mouse.column, mouse.row);
    let mut commands = Vec::new();

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            host.pointer.reset();
            match hit {
                Hit::Header(key) => commands.push(HostCommand::TogglePanel(key)),
                Hit::Body {
                    key: PanelKey::Chats,
                    line,
                } => {
                    if let Some(idx) = sidebar.pane.row_at_line(line) {
                        let key = sidebar.pane.rows()[idx].key.clone();
                        sidebar.pane.select(Some(key.clone()));
                        host.pointer.pressed = Some(PressedRow {
                            key,
                            column: mouse.column,
                            row: mouse.row,
                        });
                    }
                }
                _ => {}
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(pressed) = host.pointer.pressed.clone() else {
                return commands;
            };
            if !host.pointer.is_dragging() {
                if (pressed.column, pressed.row) == (mouse.column, mouse.row) {
                    return commands;
                }
                host.pointer.payload = sidebar.start_drag(&pressed.key);
                if !host.pointer.is_dragging() {
                    host.pointer.reset();
                    return commands;
                }
            }
            let target = match hit {
                Hit::Body {
                    key: PanelKey::Chats,
                    line,
                } => target_at_line(sidebar, line),
                _ => None,
            };
            update_hover(sidebar, host, target);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let pointer = std::mem::take(&mut host.pointer);
            if pointer.is_dragging() {
                if let Some(target) = &pointer.hover {
                    let decision = sidebar.drag.on_drop(target, pointer.payload.as_ref());
                    debug!(?decision, "Drop decided");
                    commands.push(HostCommand::Drop(decision));
                }
                sidebar.end_drag();
            } else if let Some(pressed) = pointer.pressed {
                commands.extend(activate_row(sidebar, &pressed.key));
            }
        }
        MouseEventKind::ScrollUp => {
            if matches!(hit, Hit::Body { .. }) {
                sidebar.pane.scroll_by(-WHEEL_STEP);
            }
        }
        MouseEventKind::ScrollDown => {
            if matches!(hit, Hit::Body { .. }) {
                sidebar.pane.scroll_by(WHEEL_STEP);
            }
        }
        _ => {}
    }
    commands
}
