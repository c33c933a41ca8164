use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::input::TextField;
use super::style;
use crate::model::{DEFAULT_SSH_PORT, Host};

/// Where a form stands after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Active,
    Committed,
    Cancelled,
}

/// Keys every form interprets the same way.
pub(crate) enum FormKey {
    Cancel,
    Commit,
    Next,
    Prev,
    Enter,
    Other,
}

pub(crate) fn form_key(key: &KeyEvent) -> FormKey {
    match key.code {
        KeyCode::Esc => FormKey::Cancel,
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => FormKey::Commit,
        KeyCode::Tab | KeyCode::Down => FormKey::Next,
        KeyCode::BackTab | KeyCode::Up => FormKey::Prev,
        KeyCode::Enter => FormKey::Enter,
        _ => FormKey::Other,
    }
}

/// Positive port number, or `default` for anything else.
pub(crate) fn parse_port(raw: &str, default: u16) -> u16 {
    parse_port_opt(raw).unwrap_or(default)
}

pub(crate) fn parse_port_opt(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|p| *p > 0)
}

pub(crate) fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

/// `> Label: value` row shared by both forms.
pub(crate) fn field_line(
    label: &str,
    width: usize,
    focused: bool,
    label_style: Style,
    value: Vec<Span<'static>>,
) -> Line<'static> {
    let cursor = if focused {
        Span::styled("> ", style::selected())
    } else {
        Span::raw("  ")
    };
    let mut spans = vec![cursor, Span::styled(format!("{:<width$} ", label), label_style)];
    spans.extend(value);
    Line::from(spans)
}

const NAME: usize = 0;
const HOST: usize = 1;
const USER: usize = 2;
const PORT: usize = 3;
const KEY: usize = 4;
const TAGS: usize = 5;
const FIELD_COUNT: usize = 6;

const LABELS: [&str; FIELD_COUNT] = ["Name:", "Host:", "User:", "Port:", "Key:", "Tags:"];

/// Add/edit form for a saved host.
pub struct HostForm {
    title: &'static str,
    fields: [TextField; FIELD_COUNT],
    focused: usize,
    /// Collection index of the host being edited; `None` when adding.
    index: Option<usize>,
}

impl HostForm {
    pub fn new() -> Self {
        Self {
            title: "Add Server",
            fields: [
                TextField::new("my-server"),
                TextField::new("192.168.1.1"),
                TextField::new("root"),
                TextField::new("22"),
                TextField::new("~/.ssh/id_rsa (optional)"),
                TextField::new("web, prod (optional, comma-separated)"),
            ],
            focused: NAME,
            index: None,
        }
    }

    pub fn edit(host: &Host, index: usize) -> Self {
        let mut form = Self::new();
        form.title = "Edit Server";
        form.index = Some(index);
        form.fields[NAME].set_value(&host.name);
        form.fields[HOST].set_value(&host.host);
        form.fields[USER].set_value(&host.user);
        form.fields[PORT].set_value(&host.port.to_string());
        form.fields[KEY].set_value(host.key.as_deref().unwrap_or(""));
        form.fields[TAGS].set_value(&host.tags.join(", "));
        form
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[cfg(test)]
    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormStatus {
        match form_key(&key) {
            FormKey::Cancel => return FormStatus::Cancelled,
            FormKey::Commit => return FormStatus::Committed,
            FormKey::Next => self.focused = (self.focused + 1) % FIELD_COUNT,
            FormKey::Prev => self.focused = (self.focused + FIELD_COUNT - 1) % FIELD_COUNT,
            FormKey::Enter => {
                if self.focused == FIELD_COUNT - 1 {
                    return FormStatus::Committed;
                }
                self.focused += 1;
            }
            FormKey::Other => {
                self.fields[self.focused].handle_key(key);
            }
        }
        FormStatus::Active
    }

    pub fn to_host(&self) -> Host {
        Host {
            name: self.fields[NAME].value().trim().to_string(),
            host: self.fields[HOST].value().trim().to_string(),
            user: self.fields[USER].value().trim().to_string(),
            port: parse_port(self.fields[PORT].value(), DEFAULT_SSH_PORT),
            key: non_empty(self.fields[KEY].value()),
            tags: parse_tags(self.fields[TAGS].value()),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = LABELS.iter().map(|l| l.len()).max().unwrap_or(0);
        let mut lines = vec![Line::styled(format!(" {}", self.title), style::title()), Line::raw("")];
        for (i, field) in self.fields.iter().enumerate() {
            let focused = i == self.focused;
            lines.push(field_line(LABELS[i], width, focused, style::label(), field.spans(focused)));
        }
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            " Tab/Shift+Tab: navigate | Enter: next/save | Ctrl+S: save | Esc: cancel",
            style::help(),
        ));
        frame.render_widget(Paragraph::new(lines), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(form: &mut HostForm, code: KeyCode) -> FormStatus {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(form: &mut HostForm, s: &str) {
        for c in s.chars() {
            press(form, KeyCode::Char(c));
        }
    }

    #[test]
    fn parse_port_falls_back() {
        assert_eq!(parse_port(" 2222 ", 22), 2222);
        assert_eq!(parse_port("0", 22), 22);
        assert_eq!(parse_port("-5", 22), 22);
        assert_eq!(parse_port("ssh", 22), 22);
        assert_eq!(parse_port("70000", 22), 22);
        assert_eq!(parse_port("", 22), 22);
    }

    #[test]
    fn parse_tags_trims_and_drops_empty() {
        assert_eq!(parse_tags(" web, prod ,, db "), vec!["web", "prod", "db"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = HostForm::new();
        press(&mut form, KeyCode::BackTab);
        assert_eq!(form.focused(), TAGS);
        press(&mut form, KeyCode::Tab);
        assert_eq!(form.focused(), NAME);
        press(&mut form, KeyCode::Up);
        press(&mut form, KeyCode::Down);
        press(&mut form, KeyCode::Down);
        assert_eq!(form.focused(), HOST);
    }

    #[test]
    fn enter_advances_then_commits_on_last_field() {
        let mut form = HostForm::new();
        for _ in 0..FIELD_COUNT - 1 {
            assert_eq!(press(&mut form, KeyCode::Enter), FormStatus::Active);
        }
        assert_eq!(form.focused(), TAGS);
        assert_eq!(press(&mut form, KeyCode::Enter), FormStatus::Committed);
    }

    #[test]
    fn typed_values_become_host() {
        let mut form = HostForm::new();
        type_str(&mut form, " web1 ");
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "10.0.0.1");
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "deploy");
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "abc");
        press(&mut form, KeyCode::Tab);
        press(&mut form, KeyCode::Tab);
        type_str(&mut form, "web, prod");
        let status = form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(status, FormStatus::Committed);

        let host = form.to_host();
        assert_eq!(host.name, "web1");
        assert_eq!(host.host, "10.0.0.1");
        assert_eq!(host.user, "deploy");
        assert_eq!(host.port, 22);
        assert_eq!(host.key, None);
        assert_eq!(host.tags, vec!["web", "prod"]);
        assert_eq!(form.index(), None);
    }

    #[test]
    fn edit_round_trips() {
        let host = Host {
            name: "db1".into(),
            host: "db.internal".into(),
            user: "pg".into(),
            port: 2200,
            key: Some("/keys/db".into()),
            tags: vec!["prod".into(), "db".into()],
        };
        let form = HostForm::edit(&host, 3);
        assert_eq!(form.index(), Some(3));
        assert_eq!(form.to_host(), host);
    }

    #[test]
    fn escape_cancels() {
        let mut form = HostForm::new();
        type_str(&mut form, "x");
        assert_eq!(press(&mut form, KeyCode::Esc), FormStatus::Cancelled);
    }
}
