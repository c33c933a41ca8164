use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::form::{FormKey, FormStatus, field_line, form_key, non_empty, parse_port, parse_port_opt};
use super::input::TextField;
use super::style;
use crate::model::{DEFAULT_SSH_PORT, ForwardMode, Tunnel};

// Focus positions. MODE is the selector and has no text field behind it.
const NAME: usize = 0;
const SSH_HOST: usize = 1;
const SSH_USER: usize = 2;
const SSH_PORT: usize = 3;
const SSH_KEY: usize = 4;
const MODE: usize = 5;
const LOCAL_PORT: usize = 6;
const REMOTE_HOST: usize = 7;
const REMOTE_PORT: usize = 8;
const FOCUS_COUNT: usize = 9;

const LABELS: [&str; FOCUS_COUNT] = [
    "Name:",
    "SSH Host:",
    "SSH User:",
    "SSH Port:",
    "SSH Key:",
    "Type:",
    "Local Port:",
    "Remote Host:",
    "Remote Port:",
];

/// Text field slot behind a focus position.
fn slot(focus: usize) -> Option<usize> {
    match focus {
        MODE => None,
        f if f > MODE => Some(f - 1),
        f => Some(f),
    }
}

/// Add/edit form for a saved tunnel.
pub struct TunnelForm {
    title: &'static str,
    fields: [TextField; FOCUS_COUNT - 1],
    mode: ForwardMode,
    focused: usize,
    index: Option<usize>,
}

impl TunnelForm {
    pub fn new() -> Self {
        Self {
            title: "Add Tunnel",
            fields: [
                TextField::new("my-tunnel"),
                TextField::new("server.example.com"),
                TextField::new("root"),
                TextField::new("22"),
                TextField::new("~/.ssh/id_rsa (optional)"),
                TextField::new("8080"),
                TextField::new("db.internal (not needed for dynamic)"),
                TextField::new("5432 (not needed for dynamic)"),
            ],
            mode: ForwardMode::Local,
            focused: NAME,
            index: None,
        }
    }

    pub fn edit(tunnel: &Tunnel, index: usize) -> Self {
        let mut form = Self::new();
        form.title = "Edit Tunnel";
        form.index = Some(index);
        form.mode = tunnel.mode;
        form.field_mut(NAME).set_value(&tunnel.name);
        form.field_mut(SSH_HOST).set_value(&tunnel.ssh_host);
        form.field_mut(SSH_USER).set_value(tunnel.ssh_user.as_deref().unwrap_or(""));
        form.field_mut(SSH_PORT).set_value(&tunnel.ssh_port.to_string());
        form.field_mut(SSH_KEY).set_value(tunnel.ssh_key.as_deref().unwrap_or(""));
        if tunnel.local_port > 0 {
            form.field_mut(LOCAL_PORT).set_value(&tunnel.local_port.to_string());
        }
        form.field_mut(REMOTE_HOST).set_value(tunnel.remote_host.as_deref().unwrap_or(""));
        if let Some(port) = tunnel.remote_port {
            form.field_mut(REMOTE_PORT).set_value(&port.to_string());
        }
        form
    }

    fn field(&self, focus: usize) -> &TextField {
        // every caller passes a text position
        &self.fields[slot(focus).unwrap_or(0)]
    }

    fn field_mut(&mut self, focus: usize) -> &mut TextField {
        &mut self.fields[slot(focus).unwrap_or(0)]
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[cfg(test)]
    pub fn focused(&self) -> usize {
        self.focused
    }

    #[cfg(test)]
    pub fn mode(&self) -> ForwardMode {
        self.mode
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormStatus {
        match form_key(&key) {
            FormKey::Cancel => return FormStatus::Cancelled,
            FormKey::Commit => return FormStatus::Committed,
            FormKey::Next => self.focused = (self.focused + 1) % FOCUS_COUNT,
            FormKey::Prev => self.focused = (self.focused + FOCUS_COUNT - 1) % FOCUS_COUNT,
            FormKey::Enter => {
                if self.focused == FOCUS_COUNT - 1 {
                    return FormStatus::Committed;
                }
                self.focused += 1;
            }
            FormKey::Other => match slot(self.focused) {
                None => match key.code {
                    KeyCode::Left => self.mode = self.mode.prev(),
                    KeyCode::Right => self.mode = self.mode.next(),
                    _ => {}
                },
                Some(i) => {
                    self.fields[i].handle_key(key);
                }
            },
        }
        FormStatus::Active
    }

    pub fn to_tunnel(&self) -> Tunnel {
        Tunnel {
            name: self.field(NAME).value().trim().to_string(),
            ssh_host: self.field(SSH_HOST).value().trim().to_string(),
            ssh_user: non_empty(self.field(SSH_USER).value()),
            ssh_port: parse_port(self.field(SSH_PORT).value(), DEFAULT_SSH_PORT),
            ssh_key: non_empty(self.field(SSH_KEY).value()),
            mode: self.mode,
            local_port: parse_port(self.field(LOCAL_PORT).value(), 0),
            remote_host: non_empty(self.field(REMOTE_HOST).value()),
            remote_port: parse_port_opt(self.field(REMOTE_PORT).value()),
        }
    }

    fn mode_selector(&self) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        for (i, mode) in ForwardMode::ALL.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            let s = if *mode == self.mode { style::selected() } else { style::help() };
            spans.push(Span::styled(format!("[ {} ]", mode), s));
        }
        spans
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = LABELS.iter().map(|l| l.len()).max().unwrap_or(0);
        let mut lines = vec![
            Line::styled(format!(" {}", self.title), style::tunnel_title()),
            Line::raw(""),
        ];
        for (focus, label) in LABELS.iter().enumerate() {
            let focused = focus == self.focused;
            let value = match slot(focus) {
                None => self.mode_selector(),
                Some(i) => self.fields[i].spans(focused),
            };
            lines.push(field_line(label, width, focused, style::tunnel_label(), value));
        }
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            " Tab/↑↓: navigate | ←/→: change type | Enter: next/save | Ctrl+S: save | Esc: cancel",
            style::help(),
        ));
        frame.render_widget(Paragraph::new(lines), area);
    }
}
