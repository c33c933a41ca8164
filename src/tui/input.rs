use crossterm::event::{Event, KeyEvent};
use ratatui::text::Span;
use tui_input::backend::crossterm::{EventHandler, to_input_request};
use tui_input::{Input, InputRequest};

use super::style;

const CHAR_LIMIT: usize = 256;

/// Single-line text input capped at `CHAR_LIMIT` chars.
#[derive(Debug, Clone)]
pub struct TextField {
    input: Input,
    placeholder: &'static str,
}

impl TextField {
    pub fn new(placeholder: &'static str) -> Self {
        Self {
            input: Input::default(),
            placeholder,
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.chars().take(CHAR_LIMIT).collect());
    }

    /// Apply an editing key. Returns false when the key is not an edit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let event = Event::Key(key);
        match to_input_request(&event) {
            None => false,
            Some(InputRequest::InsertChar(_))
                if self.input.value().chars().count() >= CHAR_LIMIT =>
            {
                true
            }
            Some(_) => {
                self.input.handle_event(&event);
                true
            }
        }
    }

    pub fn spans(&self, focused: bool) -> Vec<Span<'static>> {
        let value = self.input.value();
        if value.is_empty() {
            if focused {
                return vec![
                    Span::styled(" ", style::cursor()),
                    Span::styled(self.placeholder, style::muted()),
                ];
            }
            return vec![Span::styled(self.placeholder, style::muted())];
        }
        if !focused {
            return vec![Span::raw(value.to_string())];
        }
        let at = value
            .char_indices()
            .nth(self.input.cursor())
            .map_or(value.len(), |(i, _)| i);
        let (before, rest) = value.split_at(at);
        let mut chars = rest.chars();
        let under = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
        vec![
            Span::raw(before.to_string()),
            Span::styled(under, style::cursor()),
            Span::raw(chars.as_str().to_string()),
        ]
    }
}
