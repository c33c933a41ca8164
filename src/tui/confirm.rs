use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::style;

/// Yes/no prompt. Answers once; keys after the answer are ignored.
pub struct Confirm {
    prompt: String,
    answer: Option<bool>,
}

impl Confirm {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: None,
        }
    }

    /// `Some(confirmed)` once the user has answered.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<bool> {
        if self.answer.is_some() {
            return self.answer;
        }
        self.answer = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
            _ => None,
        };
        self.answer
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(self.prompt.clone(), style::danger()),
            Span::raw(" "),
            Span::styled("[y/n]", style::help()),
        ]);
        frame.render_widget(Paragraph::new(vec![Line::raw(""), line]), area);
    }
}
