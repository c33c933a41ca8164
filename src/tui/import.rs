use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::{style, visible_range};
use crate::model::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerStatus {
    Active,
    Imported,
    Cancelled,
}

/// Checklist of hosts discovered in the ssh client config.
pub struct ImportPicker {
    candidates: Vec<Host>,
    selected: Vec<bool>,
    cursor: usize,
    source_label: String,
}

impl ImportPicker {
    /// Every candidate starts selected.
    pub fn new(candidates: Vec<Host>, source_label: impl Into<String>) -> Self {
        let selected = vec![true; candidates.len()];
        Self {
            candidates,
            selected,
            cursor: 0,
            source_label: source_label.into(),
        }
    }

    #[cfg(test)]
    pub fn candidates(&self) -> &[Host] {
        &self.candidates
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerStatus {
        match key.code {
            KeyCode::Esc => return PickerStatus::Cancelled,
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.candidates.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') => {
                if let Some(sel) = self.selected.get_mut(self.cursor) {
                    *sel = !*sel;
                }
            }
            KeyCode::Enter if !self.candidates.is_empty() => return PickerStatus::Imported,
            _ => {}
        }
        PickerStatus::Active
    }

    pub fn selected_hosts(&self) -> Vec<Host> {
        self.candidates
            .iter()
            .zip(&self.selected)
            .filter(|(_, sel)| **sel)
            .map(|(h, _)| h.clone())
            .collect()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if self.candidates.is_empty() {
            let lines = vec![
                Line::styled(format!(" No hosts found in {}", self.source_label), style::title()),
                Line::raw(""),
                Line::styled(" Press Esc to go back", style::help()),
            ];
            frame.render_widget(Paragraph::new(lines), area);
            return;
        }

        let mut lines = vec![
            Line::styled(format!(" Import from {}", self.source_label), style::title()),
            Line::raw(""),
        ];
        // title, blank, blank, help
        let room = (area.height as usize).saturating_sub(4);
        let (start, end) = visible_range(self.candidates.len(), self.cursor, room);
        if start > 0 {
            lines.push(Line::styled(format!("   ↑ {} more", start), style::muted()));
        }
        for i in start..end {
            let host = &self.candidates[i];
            let on = i == self.cursor;
            let cursor = if on {
                Span::styled("> ", style::selected())
            } else {
                Span::raw("  ")
            };
            let check = if self.selected[i] {
                Span::styled("[x]", style::success())
            } else {
                Span::raw("[ ]")
            };
            let name = if on {
                Span::styled(host.name.clone(), style::selected())
            } else {
                Span::raw(host.name.clone())
            };
            let desc = format!("{}@{}:{}", host.user, host.host, host.port);
            lines.push(Line::from(vec![
                cursor,
                check,
                Span::raw(" "),
                name,
                Span::raw("  "),
                Span::styled(desc, style::help()),
            ]));
        }
        if end < self.candidates.len() {
            lines.push(Line::styled(
                format!("   ↓ {} more", self.candidates.len() - end),
                style::muted(),
            ));
        }
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            " Space: toggle | Enter: import selected | Esc: cancel",
            style::help(),
        ));
        frame.render_widget(Paragraph::new(lines), area);
    }
}
