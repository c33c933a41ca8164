pub mod app;
pub mod confirm;
pub mod form;
pub mod import;
pub mod input;
pub mod list;
pub mod style;
pub mod tunnel_form;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub use app::{App, Control, Msg, Selection};

/// Run the interactive session until the user quits or picks something.
pub fn run(app: &mut App) -> Result<Selection> {
    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    // Restore the terminal if anything panics while it is in raw mode
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));

    let result = event_loop(&mut terminal, app);

    terminal::disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<Selection> {
    let (w, h) = terminal::size().context("Failed to read terminal size")?;
    app.update(Msg::Resize(w, h));

    loop {
        terminal
            .draw(|frame| app.render(frame))
            .context("Failed to draw frame")?;

        let msg = match event::read().context("Failed to read event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Msg::Key(key),
            Event::Resize(w, h) => Msg::Resize(w, h),
            _ => continue,
        };
        if let Control::Exit(selection) = app.update(msg) {
            return Ok(selection);
        }
    }
}

/// Window of `max_height` rows around `cursor`, leaving two rows for
/// scroll indicators when the list does not fit.
pub(crate) fn visible_range(total: usize, cursor: usize, max_height: usize) -> (usize, usize) {
    if total <= max_height {
        return (0, total);
    }
    let window = max_height.saturating_sub(2);
    if window == 0 {
        return (0, 0);
    }
    let half = window / 2;
    let mut start = cursor.saturating_sub(half);
    if start + window > total {
        start = total - window;
    }
    (start, start + window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_without_scrolling() {
        assert_eq!(visible_range(3, 2, 10), (0, 3));
    }

    #[test]
    fn window_follows_cursor() {
        assert_eq!(visible_range(20, 0, 7), (0, 5));
        assert_eq!(visible_range(20, 10, 7), (8, 13));
        assert_eq!(visible_range(20, 19, 7), (15, 20));
    }

    #[test]
    fn no_room() {
        assert_eq!(visible_range(20, 5, 2), (0, 0));
    }
}
