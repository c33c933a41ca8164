use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use super::style;
use crate::model::{Host, Tunnel};

/// Something the list presenter can show and filter.
pub trait ListEntry {
    fn title(&self) -> &str;
    fn description(&self) -> Vec<Span<'static>>;
    fn filter_value(&self) -> String;
}

impl ListEntry for Host {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Vec<Span<'static>> {
        let mut spans = vec![Span::raw(format!("{}:{}", self.target(), self.port))];
        if !self.tags.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format!("[{}]", self.tags.join(", ")), style::tag()));
        }
        spans
    }

    fn filter_value(&self) -> String {
        format!("{} {}", self.name, self.tags.join(" "))
    }
}

impl ListEntry for Tunnel {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Vec<Span<'static>> {
        let user = match self.ssh_user.as_deref() {
            Some(u) if !u.is_empty() => u,
            _ => "~",
        };
        vec![Span::raw(format!(
            "{}  {}  via {}@{}",
            self.mode, self, user, self.ssh_host
        ))]
    }

    fn filter_value(&self) -> String {
        format!("{} {}", self.name, self.ssh_host)
    }
}

/// A row of the list: a snapshot of a record plus its collection index.
#[derive(Debug, Clone)]
pub struct ListItem<T> {
    pub entry: T,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Unfiltered,
    /// Query is being typed; domain keys go into the query.
    Filtering,
    Applied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListAction {
    None,
    Activate,
    Add,
    Edit,
    Delete,
    Import,
    SwitchDomain,
    Quit,
}

// title, status, blank
const HEADER_ROWS: usize = 3;
// pagination
const FOOTER_ROWS: usize = 1;
// title, description, gap
const ROWS_PER_ITEM: usize = 3;

pub struct ListView<T> {
    title: &'static str,
    title_style: Style,
    allow_import: bool,
    items: Vec<ListItem<T>>,
    /// Positions in `items` that pass the filter, in list order.
    visible: Vec<usize>,
    /// Position in `visible`.
    cursor: usize,
    filter: FilterState,
    query: Input,
    width: u16,
    height: u16,
    matcher: SkimMatcherV2,
}

impl<T: ListEntry> ListView<T> {
    pub fn new(title: &'static str, title_style: Style, allow_import: bool) -> Self {
        Self {
            title,
            title_style,
            allow_import,
            items: Vec::new(),
            visible: Vec::new(),
            cursor: 0,
            filter: FilterState::Unfiltered,
            query: Input::default(),
            width: 80,
            height: 20,
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Replace the snapshot. The filter survives; the cursor is clamped.
    pub fn set_items(&mut self, items: Vec<ListItem<T>>) {
        self.items = items;
        self.refilter();
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    #[cfg(test)]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[cfg(test)]
    pub fn items(&self) -> &[ListItem<T>] {
        &self.items
    }

    #[cfg(test)]
    pub fn visible_items(&self) -> impl Iterator<Item = &ListItem<T>> {
        self.visible.iter().map(|&i| &self.items[i])
    }

    pub fn selected(&self) -> Option<&ListItem<T>> {
        self.visible.get(self.cursor).map(|&i| &self.items[i])
    }

    #[cfg(test)]
    pub fn filter_state(&self) -> FilterState {
        self.filter
    }

    #[cfg(test)]
    pub fn query(&self) -> &str {
        self.query.value()
    }

    fn refilter(&mut self) {
        let query = self.query.value();
        self.visible = if query.is_empty() {
            (0..self.items.len()).collect()
        } else {
            self.items
                .iter()
                .enumerate()
                .filter(|(_, item)| {
                    self.matcher
                        .fuzzy_match(&item.entry.filter_value(), query)
                        .is_some()
                })
                .map(|(i, _)| i)
                .collect()
        };
        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
    }

    fn clear_filter(&mut self) {
        self.filter = FilterState::Unfiltered;
        self.query.reset();
        self.refilter();
    }

    fn items_per_page(&self) -> usize {
        let rows = (self.height as usize).saturating_sub(HEADER_ROWS + FOOTER_ROWS);
        (rows / ROWS_PER_ITEM).max(1)
    }

    fn move_by(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    fn navigate(&mut self, key: &KeyEvent) {
        let page = self.items_per_page() as isize;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
            KeyCode::PageUp | KeyCode::Left | KeyCode::Char('h') => self.move_by(-page),
            KeyCode::PageDown | KeyCode::Right | KeyCode::Char('l') => self.move_by(page),
            KeyCode::Home | KeyCode::Char('g') => self.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => self.cursor = self.visible.len().saturating_sub(1),
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.clear_filter(),
            KeyCode::Enter => {
                self.filter = if self.query.value().is_empty() {
                    FilterState::Unfiltered
                } else {
                    FilterState::Applied
                };
            }
            KeyCode::Up | KeyCode::Down => self.navigate(&key),
            _ => {
                let before = self.query.value().len();
                self.query.handle_event(&Event::Key(key));
                if self.query.value().len() != before {
                    self.cursor = 0;
                    self.refilter();
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ListAction {
        if self.filter == FilterState::Filtering {
            self.handle_filter_key(key);
            return ListAction::None;
        }
        let has_selection = self.selected().is_some();
        match key.code {
            KeyCode::Enter if has_selection => return ListAction::Activate,
            KeyCode::Char('a') => return ListAction::Add,
            KeyCode::Char('e') if has_selection => return ListAction::Edit,
            KeyCode::Char('d') if has_selection => return ListAction::Delete,
            KeyCode::Char('i') if self.allow_import => return ListAction::Import,
            KeyCode::Tab => return ListAction::SwitchDomain,
            KeyCode::Char('q') => return ListAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return ListAction::Quit;
            }
            KeyCode::Char('/') => {
                self.filter = FilterState::Filtering;
                self.query.reset();
                self.refilter();
            }
            KeyCode::Esc if self.filter == FilterState::Applied => self.clear_filter(),
            _ => self.navigate(&key),
        }
        ListAction::None
    }

    fn status_line(&self) -> Line<'static> {
        match self.filter {
            FilterState::Filtering => Line::from(vec![
                Span::styled(" Filter: ", style::label()),
                Span::raw(self.query.value().to_string()),
                Span::styled(" ", style::cursor()),
            ]),
            FilterState::Applied => Line::styled(
                format!(
                    " \"{}\" {} of {} • esc to clear",
                    self.query.value(),
                    self.visible.len(),
                    self.items.len()
                ),
                style::muted(),
            ),
            FilterState::Unfiltered => {
                let n = self.items.len();
                let noun = if n == 1 { "item" } else { "items" };
                Line::styled(format!(" {n} {noun}"), style::muted())
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::styled(format!(" {} ", self.title), self.title_style),
            self.status_line(),
            Line::raw(""),
        ];

        if self.visible.is_empty() {
            let msg = if self.items.is_empty() {
                " No items."
            } else {
                " Nothing matched."
            };
            lines.push(Line::styled(msg, style::muted()));
        } else {
            let per_page = self.items_per_page();
            let page = self.cursor / per_page;
            let pages = self.visible.len().div_ceil(per_page);
            let start = page * per_page;
            let end = (start + per_page).min(self.visible.len());
            for pos in start..end {
                let entry = &self.items[self.visible[pos]].entry;
                if pos == self.cursor {
                    let bar = Span::styled("│ ", style::selected());
                    lines.push(Line::from(vec![
                        bar.clone(),
                        Span::styled(entry.title().to_string(), style::selected()),
                    ]));
                    let mut desc = vec![bar];
                    desc.extend(
                        entry
                            .description()
                            .into_iter()
                            .map(|s| Span::styled(s.content, style::selected())),
                    );
                    lines.push(Line::from(desc));
                } else {
                    lines.push(Line::raw(format!("  {}", entry.title())));
                    let mut desc = vec![Span::raw("  ")];
                    desc.extend(
                        entry
                            .description()
                            .into_iter()
                            .map(|s| {
                                if s.style == Style::default() {
                                    s.style(style::help())
                                } else {
                                    s
                                }
                            }),
                    );
                    lines.push(Line::from(desc));
                }
                lines.push(Line::raw(""));
            }
            if pages > 1 {
                let dots: String = (0..pages).map(|p| if p == page { '•' } else { '·' }).collect();
                lines.push(Line::styled(format!("  {dots}"), style::muted()));
            }
        }
        frame.render_widget(Paragraph::new(lines), area);
    }
}
