use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};

use super::confirm::Confirm;
use super::form::{FormStatus, HostForm};
use super::import::{ImportPicker, PickerStatus};
use super::list::{ListAction, ListItem, ListView};
use super::style;
use super::tunnel_form::TunnelForm;
use crate::history::Recency;
use crate::model::{Host, Tunnel};
use crate::ssh_config::HostSource;
use crate::store::Store;

/// Lists never shrink below this many rows.
const MIN_LIST_HEIGHT: u16 = 10;
const DEFAULT_WIDTH: u16 = 80;

const HOST_HELP: &str =
    " Tab: tunnel mode | /: search | a: add | e: edit | d: delete | i: import | enter: connect | q: quit";
const TUNNEL_HELP: &str =
    " Tab: ssh mode | /: search | a: add | e: edit | d: delete | enter: run tunnel | q: quit";

pub enum Msg {
    Key(KeyEvent),
    Resize(u16, u16),
}

pub enum Control {
    Continue,
    Exit(Selection),
}

/// What the interactive session hands back when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Quit,
    Connect(Host),
    RunTunnel(Tunnel),
}

enum View {
    HostList,
    HostForm(HostForm),
    HostConfirm { confirm: Confirm, index: usize },
    HostImport(ImportPicker),
    TunnelList,
    TunnelForm(TunnelForm),
    TunnelConfirm { confirm: Confirm, index: usize },
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    HostList,
    HostForm,
    HostConfirm,
    HostImport,
    TunnelList,
    TunnelForm,
    TunnelConfirm,
}

pub struct App<'a> {
    store: &'a mut dyn Store,
    recency: &'a dyn Recency,
    importer: &'a dyn HostSource,
    import_label: String,
    hosts: Vec<Host>,
    tunnels: Vec<Tunnel>,
    host_list: ListView<Host>,
    tunnel_list: ListView<Tunnel>,
    view: View,
    /// Blocking error; the next key dismisses it.
    error: Option<String>,
}

impl<'a> App<'a> {
    pub fn new(
        store: &'a mut dyn Store,
        recency: &'a dyn Recency,
        importer: &'a dyn HostSource,
        import_label: impl Into<String>,
        hosts: Vec<Host>,
        tunnels: Vec<Tunnel>,
    ) -> Self {
        let mut app = Self {
            store,
            recency,
            importer,
            import_label: import_label.into(),
            hosts,
            tunnels,
            host_list: ListView::new("SSHH", style::title(), true),
            tunnel_list: ListView::new("SSHH — Tunnels", style::tunnel_title(), false),
            view: View::HostList,
            error: None,
        };
        app.rebuild_hosts();
        app.rebuild_tunnels();
        app
    }

    #[cfg(test)]
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    #[cfg(test)]
    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    #[cfg(test)]
    pub fn host_list(&self) -> &ListView<Host> {
        &self.host_list
    }

    #[cfg(test)]
    pub fn tunnel_list(&self) -> &ListView<Tunnel> {
        &self.tunnel_list
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[cfg(test)]
    pub fn view_kind(&self) -> ViewKind {
        match self.view {
            View::HostList => ViewKind::HostList,
            View::HostForm(_) => ViewKind::HostForm,
            View::HostConfirm { .. } => ViewKind::HostConfirm,
            View::HostImport(_) => ViewKind::HostImport,
            View::TunnelList => ViewKind::TunnelList,
            View::TunnelForm(_) => ViewKind::TunnelForm,
            View::TunnelConfirm { .. } => ViewKind::TunnelConfirm,
        }
    }

    pub fn update(&mut self, msg: Msg) -> Control {
        let key = match msg {
            Msg::Resize(w, h) => {
                self.resize(w, h);
                return Control::Continue;
            }
            Msg::Key(key) => key,
        };
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Control::Exit(Selection::Quit);
        }
        if self.error.take().is_some() {
            return Control::Continue;
        }
        match self.view {
            View::HostList => return self.on_host_list(key),
            View::TunnelList => return self.on_tunnel_list(key),
            View::HostForm(_) => self.on_host_form(key),
            View::TunnelForm(_) => self.on_tunnel_form(key),
            View::HostConfirm { .. } | View::TunnelConfirm { .. } => self.on_confirm(key),
            View::HostImport(_) => self.on_import(key),
        }
        Control::Continue
    }

    /// Resize both lists, visible or not.
    fn resize(&mut self, width: u16, height: u16) {
        let w = if width == 0 { DEFAULT_WIDTH } else { width };
        let h = height.saturating_sub(2).max(MIN_LIST_HEIGHT);
        self.host_list.set_size(w, h);
        self.tunnel_list.set_size(w, h);
    }

    fn on_host_list(&mut self, key: KeyEvent) -> Control {
        match self.host_list.handle_key(key) {
            ListAction::Activate => {
                if let Some(item) = self.host_list.selected() {
                    return Control::Exit(Selection::Connect(item.entry.clone()));
                }
            }
            ListAction::Add => self.view = View::HostForm(HostForm::new()),
            ListAction::Edit => {
                if let Some(item) = self.host_list.selected() {
                    self.view = View::HostForm(HostForm::edit(&item.entry, item.index));
                }
            }
            ListAction::Delete => {
                if let Some(item) = self.host_list.selected() {
                    let confirm = Confirm::new(format!("Delete server {:?}?", item.entry.name));
                    self.view = View::HostConfirm {
                        confirm,
                        index: item.index,
                    };
                }
            }
            ListAction::Import => self.view = View::HostImport(self.import_picker()),
            ListAction::SwitchDomain => self.view = View::TunnelList,
            ListAction::Quit => return Control::Exit(Selection::Quit),
            ListAction::None => {}
        }
        Control::Continue
    }

    fn on_tunnel_list(&mut self, key: KeyEvent) -> Control {
        match self.tunnel_list.handle_key(key) {
            ListAction::Activate => {
                if let Some(item) = self.tunnel_list.selected() {
                    return Control::Exit(Selection::RunTunnel(item.entry.clone()));
                }
            }
            ListAction::Add => self.view = View::TunnelForm(TunnelForm::new()),
            ListAction::Edit => {
                if let Some(item) = self.tunnel_list.selected() {
                    self.view = View::TunnelForm(TunnelForm::edit(&item.entry, item.index));
                }
            }
            ListAction::Delete => {
                if let Some(item) = self.tunnel_list.selected() {
                    let confirm = Confirm::new(format!("Delete tunnel {:?}?", item.entry.name));
                    self.view = View::TunnelConfirm {
                        confirm,
                        index: item.index,
                    };
                }
            }
            ListAction::SwitchDomain => self.view = View::HostList,
            ListAction::Quit => return Control::Exit(Selection::Quit),
            ListAction::Import | ListAction::None => {}
        }
        Control::Continue
    }

    fn on_host_form(&mut self, key: KeyEvent) {
        let View::HostForm(form) = &mut self.view else {
            return;
        };
        match form.handle_key(key) {
            FormStatus::Active => {}
            FormStatus::Cancelled => self.view = View::HostList,
            FormStatus::Committed => {
                let host = form.to_host();
                let index = form.index();
                self.view = View::HostList;
                if host.name.is_empty() || host.host.is_empty() {
                    tracing::debug!("discarding host form without name or address");
                    return;
                }
                if name_taken(self.hosts.iter().map(|h| h.name.as_str()), &host.name, index) {
                    self.reject_duplicate("host", &host.name);
                    return;
                }
                match index {
                    Some(i) => self.update_host(i, host),
                    None => self.add_host(host),
                }
            }
        }
    }

    fn on_tunnel_form(&mut self, key: KeyEvent) {
        let View::TunnelForm(form) = &mut self.view else {
            return;
        };
        match form.handle_key(key) {
            FormStatus::Active => {}
            FormStatus::Cancelled => self.view = View::TunnelList,
            FormStatus::Committed => {
                let tunnel = form.to_tunnel();
                let index = form.index();
                self.view = View::TunnelList;
                if tunnel.name.is_empty() || tunnel.ssh_host.is_empty() {
                    tracing::debug!("discarding tunnel form without name or ssh host");
                    return;
                }
                if name_taken(self.tunnels.iter().map(|t| t.name.as_str()), &tunnel.name, index) {
                    self.reject_duplicate("tunnel", &tunnel.name);
                    return;
                }
                match index {
                    Some(i) => self.update_tunnel(i, tunnel),
                    None => self.add_tunnel(tunnel),
                }
            }
        }
    }

    fn on_confirm(&mut self, key: KeyEvent) {
        match &mut self.view {
            View::HostConfirm { confirm, index } => {
                let index = *index;
                if let Some(yes) = confirm.handle_key(key) {
                    self.view = View::HostList;
                    if yes {
                        self.delete_host(index);
                    }
                }
            }
            View::TunnelConfirm { confirm, index } => {
                let index = *index;
                if let Some(yes) = confirm.handle_key(key) {
                    self.view = View::TunnelList;
                    if yes {
                        self.delete_tunnel(index);
                    }
                }
            }
            _ => {}
        }
    }

    fn on_import(&mut self, key: KeyEvent) {
        let View::HostImport(picker) = &mut self.view else {
            return;
        };
        match picker.handle_key(key) {
            PickerStatus::Active => {}
            PickerStatus::Cancelled => self.view = View::HostList,
            PickerStatus::Imported => {
                let selected = picker.selected_hosts();
                self.view = View::HostList;
                self.import_hosts(selected);
            }
        }
    }

    /// Discovered hosts whose names are not already saved.
    fn import_picker(&self) -> ImportPicker {
        let discovered = match self.importer.discover() {
            Ok(hosts) => hosts,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "host discovery failed");
                Vec::new()
            }
        };
        let mut seen: HashSet<String> = self.hosts.iter().map(|h| h.name.clone()).collect();
        let candidates = discovered
            .into_iter()
            .filter(|h| seen.insert(h.name.clone()))
            .collect();
        ImportPicker::new(candidates, self.import_label.clone())
    }

    fn add_host(&mut self, host: Host) {
        tracing::info!(name = %host.name, "adding host");
        self.hosts.push(host);
        self.persist();
        self.rebuild_hosts();
    }

    fn update_host(&mut self, index: usize, host: Host) {
        let Some(slot) = self.hosts.get_mut(index) else {
            tracing::warn!(index, "host to update no longer exists");
            return;
        };
        tracing::info!(name = %host.name, index, "updating host");
        *slot = host;
        self.persist();
        self.rebuild_hosts();
    }

    fn delete_host(&mut self, index: usize) {
        if index >= self.hosts.len() {
            tracing::warn!(index, "host to delete no longer exists");
            return;
        }
        let removed = self.hosts.remove(index);
        tracing::info!(name = %removed.name, "deleted host");
        self.persist();
        self.rebuild_hosts();
    }

    fn import_hosts(&mut self, hosts: Vec<Host>) {
        if hosts.is_empty() {
            return;
        }
        tracing::info!(count = hosts.len(), "importing hosts");
        self.hosts.extend(hosts);
        self.persist();
        self.rebuild_hosts();
    }

    fn add_tunnel(&mut self, tunnel: Tunnel) {
        tracing::info!(name = %tunnel.name, "adding tunnel");
        self.tunnels.push(tunnel);
        self.persist();
        self.rebuild_tunnels();
    }

    fn update_tunnel(&mut self, index: usize, tunnel: Tunnel) {
        let Some(slot) = self.tunnels.get_mut(index) else {
            tracing::warn!(index, "tunnel to update no longer exists");
            return;
        };
        tracing::info!(name = %tunnel.name, index, "updating tunnel");
        *slot = tunnel;
        self.persist();
        self.rebuild_tunnels();
    }

    fn delete_tunnel(&mut self, index: usize) {
        if index >= self.tunnels.len() {
            tracing::warn!(index, "tunnel to delete no longer exists");
            return;
        }
        let removed = self.tunnels.remove(index);
        tracing::info!(name = %removed.name, "deleted tunnel");
        self.persist();
        self.rebuild_tunnels();
    }

    fn reject_duplicate(&mut self, kind: &str, name: &str) {
        tracing::warn!(kind, name, "rejecting duplicate name");
        self.error = Some(format!("a {kind} named {name:?} already exists"));
    }

    /// Save both collections. A failure is shown but memory is kept as is.
    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.hosts, &self.tunnels) {
            let msg = format!("{e:#}");
            tracing::error!(error = %msg, "save failed");
            self.error = Some(msg);
        }
    }

    fn rebuild_hosts(&mut self) {
        let items = self
            .recency
            .recent_order(&self.hosts)
            .into_iter()
            .map(|index| ListItem {
                entry: self.hosts[index].clone(),
                index,
            })
            .collect();
        self.host_list.set_items(items);
    }

    fn rebuild_tunnels(&mut self) {
        let items = self
            .tunnels
            .iter()
            .enumerate()
            .map(|(index, t)| ListItem {
                entry: t.clone(),
                index,
            })
            .collect();
        self.tunnel_list.set_items(items);
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        if let Some(ref err) = self.error {
            let lines = vec![
                Line::styled(format!("Error: {err}"), style::danger()),
                Line::raw(""),
                Line::styled("Press any key to continue", style::help()),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
            return;
        }

        match &self.view {
            View::HostList | View::TunnelList => {
                let [body, help] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
                if matches!(self.view, View::HostList) {
                    self.host_list.render(frame, body);
                    frame.render_widget(Paragraph::new(Line::styled(HOST_HELP, style::help())), help);
                } else {
                    self.tunnel_list.render(frame, body);
                    frame.render_widget(Paragraph::new(Line::styled(TUNNEL_HELP, style::help())), help);
                }
            }
            View::HostForm(form) => form.render(frame, area),
            View::TunnelForm(form) => form.render(frame, area),
            View::HostConfirm { confirm, .. } | View::TunnelConfirm { confirm, .. } => {
                confirm.render(frame, area)
            }
            View::HostImport(picker) => picker.render(frame, area),
        }
    }
}

/// Whether `name` is used by any record other than the one at `editing`.
fn name_taken<'n>(
    names: impl Iterator<Item = &'n str>,
    name: &str,
    editing: Option<usize>,
) -> bool {
    names
        .enumerate()
        .any(|(i, existing)| Some(i) != editing && existing == name)
}
