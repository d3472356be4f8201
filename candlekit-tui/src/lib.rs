//! candlekit TUI: interactive terminal viewer for distribution plots.
//!
//! [`show_distribution`] takes over the terminal, draws the histogram and
//! density curve, and blocks until the user presses `q`, `Esc` or `Ctrl-C`.

mod chart;
pub mod theme;

pub use chart::DistributionView;

use std::io::{self, stdout};
use std::sync::Once;
use std::time::Duration;

use anyhow::Result;
use candlekit_core::plot::DistributionPlot;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::theme::Theme;

static PANIC_HOOK: Once = Once::new();

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stderr(), LeaveAlternateScreen);
            default_hook(info);
        }));
    });
}

/// True for the keys that dismiss the viewer.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Show `plot` full-screen and block until dismissed.
pub fn show_distribution(plot: &DistributionPlot) -> Result<()> {
    install_panic_hook();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_viewer(&mut terminal, plot);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_viewer(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    plot: &DistributionPlot,
) -> Result<()> {
    let theme = Theme::default();
    loop {
        terminal.draw(|f| f.render_widget(DistributionView::new(plot, &theme), f.area()))?;

        // Redraws on resize come from the next loop iteration.
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&press(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = press(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(!is_quit_key(&key));
    }

    #[test]
    fn draws_on_test_backend() {
        let plot = DistributionPlot::new(&[1.0, 2.0, 2.5, 3.0, 4.5], 4).unwrap();
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        terminal
            .draw(|f| f.render_widget(DistributionView::new(&plot, &theme), f.area()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let first_row: String = (0..80)
            .map(|x| buffer.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert!(first_row.contains("Distribution with KDE"));
    }
}
