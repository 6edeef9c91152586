//! Vertical layout of the sidebar and pointer hit-testing against it.
//!
//! Every panel gets a one-line header. The open panel's body takes the
//! remaining height below its header; the status line and, while a prompt
//! is open, the prompt line sit at the bottom.

use ratatui::layout::{Position, Rect};

use crate::core::sidebar::accordion::{AccordionController, PanelKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarLayout {
    pub headers: Vec<(PanelKey, Rect)>,
    pub body: Option<(PanelKey, Rect)>,
    pub prompt: Option<Rect>,
    pub status: Rect,
}

/// What sits under a terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Header(PanelKey),
    /// A line inside the open panel's body, relative to its top.
    Body { key: PanelKey, line: usize },
    Nothing,
}

fn line(area: Rect, y: u16) -> Rect {
    Rect::new(area.x, y, area.width, 1)
}

impl SidebarLayout {
    pub fn compute(area: Rect, accordion: &AccordionController, prompt_open: bool) -> Self {
        let footer = 1 + u16::from(prompt_open);
        let bottom = area.y + area.height;
        let status = line(area, bottom.saturating_sub(1).max(area.y));
        let prompt = prompt_open.then(|| line(area, bottom.saturating_sub(2).max(area.y)));

        let panel_count = accordion.panels().len() as u16;
        let available = area.height.saturating_sub(footer);
        let body_height = available.saturating_sub(panel_count);

        let mut headers = Vec::with_capacity(accordion.panels().len());
        let mut body = None;
        let mut y = area.y;
        for panel in accordion.panels() {
            if y >= area.y + available {
                break;
            }
            headers.push((panel.key, line(area, y)));
            y += 1;
            if panel.is_open() && body_height > 0 {
                body = Some((panel.key, Rect::new(area.x, y, area.width, body_height)));
                y += body_height;
            }
        }

        Self {
            headers,
            body,
            prompt,
            status,
        }
    }

    pub fn body_height(&self) -> usize {
        self.body.map(|(_, rect)| rect.height as usize).unwrap_or(0)
    }

    pub fn hit(&self, column: u16, row: u16) -> Hit {
        let position = Position::new(column, row);
        if let Some((key, _)) = self
            .headers
            .iter()
            .find(|(_, rect)| rect.contains(position))
        {
            return Hit::Header(*key);
        }
        match self.body {
            Some((key, rect)) if rect.contains(position) => Hit::Body {
                key,
                line: (row - rect.y) as usize,
            },
            _ => Hit::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sidebar::accordion::HeaderClick;

    #[test]
    fn collapsed_panels_stack_headers() {
        let accordion = AccordionController::new(&PanelKey::ALL);
        let layout = SidebarLayout::compute(Rect::new(0, 0, 30, 20), &accordion, false);

        assert_eq!(layout.headers.len(), 3);
        assert_eq!(layout.headers[2].1.y, 2);
        assert!(layout.body.is_none());
        assert_eq!(layout.status.y, 19);
        assert_eq!(layout.hit(5, 1), Hit::Header(PanelKey::Models));
        assert_eq!(layout.hit(5, 10), Hit::Nothing);
    }

    #[test]
    fn open_panel_body_fills_remaining_height() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        assert!(matches!(
            accordion.click_header(PanelKey::Chats),
            HeaderClick::Expanding { .. }
        ));
        let layout = SidebarLayout::compute(Rect::new(0, 0, 30, 20), &accordion, true);

        // 20 rows: status + prompt + 3 headers leaves 15 for the body.
        assert_eq!(layout.body_height(), 15);
        assert_eq!(layout.headers[1].1.y, 16);
        assert_eq!(layout.prompt.map(|rect| rect.y), Some(18));
        assert_eq!(
            layout.hit(3, 4),
            Hit::Body {
                key: PanelKey::Chats,
                line: 3
            }
        );
    }

    #[test]
    fn tiny_terminal_does_not_overflow() {
        let mut accordion = AccordionController::new(&PanelKey::ALL);
        accordion.click_header(PanelKey::Roles);
        let layout = SidebarLayout::compute(Rect::new(0, 0, 10, 3), &accordion, false);

        assert_eq!(layout.headers.len(), 2);
        assert!(layout.body.is_none());
    }
}
