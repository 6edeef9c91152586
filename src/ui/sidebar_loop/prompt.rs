//! Single-line prompt for folder names and delete confirmation.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    NewFolder { parent: String },
    Rename { path: String },
    ConfirmDelete { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Continue,
    Submit(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    text: String,
    /// Cursor position in chars.
    cursor: usize,
}

impl Prompt {
    pub fn new(kind: PromptKind, initial: impl Into<String>) -> Self {
        let text = initial.into();
        let cursor = text.chars().count();
        Self { kind, text, cursor }
    }

    pub fn label(&self) -> String {
        match &self.kind {
            PromptKind::NewFolder { parent } if parent.is_empty() => "New folder".to_string(),
            PromptKind::NewFolder { parent } => format!("New folder in {parent}"),
            PromptKind::Rename { path } => format!("Rename {path}"),
            PromptKind::ConfirmDelete { path } => format!("Delete {path} and its contents? (y/n)"),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width_before_cursor(&self) -> usize {
        let prefix: String = self.text.chars().take(self.cursor).collect();
        prefix.width()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PromptOutcome {
        if let PromptKind::ConfirmDelete { .. } = self.kind {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => PromptOutcome::Submit("y".into()),
                _ => PromptOutcome::Cancelled,
            };
        }

        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => return PromptOutcome::Submit(self.text.clone()),
            KeyCode::Esc => return PromptOutcome::Cancelled,
            KeyCode::Char('c') if control => return PromptOutcome::Cancelled,
            KeyCode::Char('u') if control => {
                self.text.clear();
                self.cursor = 0;
            }
            KeyCode::Char('a') if control => self.cursor = 0,
            KeyCode::Char('e') if control => self.cursor = self.text.chars().count(),
            KeyCode::Char(c) if !control => {
                let at = self.byte_index(self.cursor);
                self.text.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                let at = self.byte_index(self.cursor - 1);
                self.text.remove(at);
                self.cursor -= 1;
            }
            KeyCode::Delete if self.cursor < self.text.chars().count() => {
                let at = self.byte_index(self.cursor);
                self.text.remove(at);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.text.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.chars().count(),
            _ => {}
        }
        PromptOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(prompt: &mut Prompt, code: KeyCode) -> PromptOutcome {
        prompt.handle_key(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn edits_in_the_middle_of_multibyte_text() {
        let mut prompt = Prompt::new(PromptKind::Rename { path: "a".into() }, "héllo");
        press(&mut prompt, KeyCode::Left);
        press(&mut prompt, KeyCode::Left);
        press(&mut prompt, KeyCode::Backspace);
        press(&mut prompt, KeyCode::Char('L'));
        assert_eq!(prompt.text(), "héLlo");
        assert_eq!(prompt.width_before_cursor(), 3);
        assert_eq!(
            press(&mut prompt, KeyCode::Enter),
            PromptOutcome::Submit("héLlo".into())
        );
    }

    #[test]
    fn escape_cancels() {
        let mut prompt = Prompt::new(PromptKind::NewFolder { parent: String::new() }, "");
        assert_eq!(press(&mut prompt, KeyCode::Esc), PromptOutcome::Cancelled);
    }

    #[test]
    fn delete_confirmation_needs_y() {
        let kind = PromptKind::ConfirmDelete { path: "A".into() };
        let mut prompt = Prompt::new(kind.clone(), "");
        assert_eq!(
            press(&mut prompt, KeyCode::Char('y')),
            PromptOutcome::Submit("y".into())
        );
        let mut prompt = Prompt::new(kind, "");
        assert_eq!(press(&mut prompt, KeyCode::Char('n')), PromptOutcome::Cancelled);
    }
}
