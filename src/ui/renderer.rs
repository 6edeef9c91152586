use crate::core::message::NoticeKind;
use crate::core::sidebar::accordion::{AccordionPanel, PanelContent};
use crate::core::sidebar::Sidebar;
use crate::ui::layout::SidebarLayout;
use crate::ui::sidebar_loop::HostState;
use crate::ui::tree_pane::{TreePane, TreeRow};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ROOT_ZONE_LABEL: &str = "⤒ Move to top level";
const ACTIONS_GLYPH: &str = "⋯";

pub fn ui(f: &mut Frame, sidebar: &Sidebar, host: &HostState, layout: &SidebarLayout) {
    for (key, rect) in &layout.headers {
        if let Some(panel) = sidebar.accordion.panel(*key) {
            f.render_widget(Paragraph::new(header_line(panel, rect.width)), *rect);
        }
    }

    if let Some((key, rect)) = layout.body {
        if let Some(panel) = sidebar.accordion.panel(key) {
            let lines = match &panel.content {
                PanelContent::Tree => tree_lines(&sidebar.pane, rect),
                other => panel_lines(other, rect),
            };
            f.render_widget(Paragraph::new(lines), rect);
        }
    }

    if let (Some(prompt), Some(rect)) = (&host.prompt, layout.prompt) {
        let label = format!("{}: ", prompt.label());
        let text = prompt.text();
        let line = Line::from(vec![
            Span::styled(label.clone(), Style::default().fg(Color::Cyan)),
            Span::raw(text.to_string()),
        ]);
        f.render_widget(Paragraph::new(line), rect);
        let cursor_x = rect.x + (label.width() + prompt.width_before_cursor()) as u16;
        f.set_cursor_position((cursor_x.min(rect.x + rect.width.saturating_sub(1)), rect.y));
    }

    f.render_widget(Paragraph::new(status_line(sidebar, host)), layout.status);
}

fn header_line(panel: &AccordionPanel, width: u16) -> Line<'static> {
    let mut title_style = Style::default().add_modifier(Modifier::BOLD);
    if panel.is_open() {
        title_style = title_style.fg(Color::Cyan);
    }
    let title = format!("{} {}", panel.icon(), panel.key.title());
    let mut spans = vec![Span::styled(title.clone(), title_style)];

    if panel.actions_visible {
        let hints = panel.key.actions().join(" · ");
        let room = (width as usize).saturating_sub(title.width() + 2);
        if room > 0 {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                truncate_to_width(&hints, room),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    Line::from(spans)
}

fn panel_lines(content: &PanelContent, rect: Rect) -> Vec<Line<'static>> {
    let width = rect.width as usize;
    match content {
        PanelContent::Hidden | PanelContent::Tree => Vec::new(),
        PanelContent::Loading => vec![Line::styled(
            "  Loading…",
            Style::default().fg(Color::DarkGray),
        )],
        PanelContent::Error(message) => vec![Line::styled(
            truncate_to_width(&format!("  ⚠ {message}"), width),
            Style::default().fg(Color::Red),
        )],
        PanelContent::Items(items) if items.is_empty() => vec![Line::styled(
            "  (nothing here)",
            Style::default().fg(Color::DarkGray),
        )],
        PanelContent::Items(items) => items
            .iter()
            .take(rect.height as usize)
            .map(|item| {
                let label = format!("  {}", item.label);
                match &item.detail {
                    Some(detail) => Line::from(vec![
                        Span::raw(truncate_to_width(&label, width)),
                        Span::styled(
                            truncate_to_width(
                                &format!(" {detail}"),
                                width.saturating_sub(label.width()),
                            ),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]),
                    None => Line::raw(truncate_to_width(&label, width)),
                }
            })
            .collect(),
    }
}

/// Lines for the tree body, already scrolled and clipped to `rect`.
pub fn tree_lines(pane: &TreePane, rect: Rect) -> Vec<Line<'static>> {
    let width = rect.width as usize;
    let mut lines = Vec::new();

    if pane.drop_zones_active() {
        let style = if pane.root_zone_highlighted() {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::styled(truncate_to_width(ROOT_ZONE_LABEL, width), style));
    }

    if pane.rows().is_empty() {
        if let Some(placeholder) = pane.placeholder() {
            let style = match placeholder {
                crate::ui::tree_pane::Placeholder::Error(_) => Style::default().fg(Color::Red),
                _ => Style::default().fg(Color::DarkGray),
            };
            lines.push(Line::styled(
                truncate_to_width(&format!("  {}", placeholder.text()), width),
                style,
            ));
        }
    } else {
        let selected = pane.selected();
        for idx in pane.visible_indices() {
            let row = &pane.rows()[idx];
            lines.push(row_line(row, selected == Some(&row.key), width));
        }
    }

    lines
        .into_iter()
        .skip(pane.scroll_offset())
        .take(rect.height as usize)
        .collect()
}

fn row_style(row: &TreeRow, selected: bool) -> Style {
    let mut style = Style::default();
    if row.markers.active {
        style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
    } else if row.markers.active_ancestor {
        style = style.fg(Color::Cyan);
    }
    if row.markers.dragging {
        style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
    }
    if row.markers.drop_target {
        style = style.bg(Color::Blue).fg(Color::White);
    } else if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

fn row_line(row: &TreeRow, selected: bool, width: usize) -> Line<'static> {
    let head = format!("{}{} {}", row.indent, row.icon.glyph(), row.label);
    let mut spans = vec![Span::styled(
        truncate_to_width(&head, width),
        row_style(row, selected),
    )];
    let mut used = head.width().min(width);

    if let Some(detail) = &row.detail {
        let text = format!("  {detail}");
        if used + text.width() <= width {
            used += text.width();
            spans.push(Span::styled(text, Style::default().fg(Color::DarkGray)));
        }
    }

    if selected && !row.actions.is_empty() {
        let hints: Vec<&str> = row.actions.iter().map(|action| action.hint()).collect();
        let strip = format!(" {ACTIONS_GLYPH} {}", hints.join(" "));
        let room = width.saturating_sub(used);
        if room > 1 {
            spans.push(Span::styled(
                truncate_to_width(&strip, room),
                Style::default().fg(Color::Yellow),
            ));
        }
    }

    Line::from(spans)
}

fn status_line(sidebar: &Sidebar, host: &HostState) -> Line<'static> {
    if let Some(notice) = &host.notice {
        let color = match notice.kind {
            NoticeKind::Info => Color::Green,
            NoticeKind::Warning => Color::Yellow,
            NoticeKind::Error => Color::Red,
        };
        return Line::styled(notice.message.clone(), Style::default().fg(color));
    }
    if let Some(session) = sidebar.drag.session() {
        return Line::styled(
            format!("Moving '{}': release on a folder, Esc to cancel", session.name),
            Style::default().fg(Color::Yellow),
        );
    }
    Line::styled(
        "1/2/3 panels · ↑↓ move · ⏎ open · g refresh · q quit",
        Style::default().fg(Color::DarkGray),
    )
}

/// Cuts `text` to at most `max_width` terminal columns, ending in `…` when
/// anything was dropped.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
