use ratatui::style::{Color, Modifier, Style};

// ANSI 256 for broad terminal support
const PRIMARY: Color = Color::Indexed(39);
const TUNNEL: Color = Color::Indexed(170);
const SECONDARY: Color = Color::Indexed(245);
const ACCENT: Color = Color::Indexed(214);
const DANGER: Color = Color::Indexed(196);
const SUCCESS: Color = Color::Indexed(40);
const MUTED: Color = Color::Indexed(240);

pub fn title() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn tunnel_title() -> Style {
    Style::default().fg(TUNNEL).add_modifier(Modifier::BOLD)
}

pub fn help() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn selected() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn label() -> Style {
    Style::default().fg(PRIMARY)
}

pub fn tunnel_label() -> Style {
    Style::default().fg(TUNNEL)
}

pub fn danger() -> Style {
    Style::default().fg(DANGER).add_modifier(Modifier::BOLD)
}

pub fn success() -> Style {
    Style::default().fg(SUCCESS)
}

pub fn tag() -> Style {
    Style::default().fg(ACCENT)
}

pub fn cursor() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}
