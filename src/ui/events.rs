use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use super::app::App;

/// Handle keyboard events and update app state
pub fn handle_events(app: &mut App) -> anyhow::Result<()> {
    // Poll for events with timeout
    if event::poll(Duration::from_millis(50))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                handle_key_event(app, key);
            }
        }
    }
    Ok(())
}

/// Process individual key press
fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Check for Ctrl+C
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Navigate parameters (vim-style: h=left, l=right)
        KeyCode::Char('l') | KeyCode::Right => app.next_parameter(),
        KeyCode::Char('h') | KeyCode::Left => app.prev_parameter(),

        // Adjust values (vim-style: k=up, j=down)
        KeyCode::Char('k') | KeyCode::Up => app.increase_value(),
        KeyCode::Char('j') | KeyCode::Down => app.decrease_value(),

        KeyCode::Char('p') => app.next_preset(),
        KeyCode::Char(' ') => app.toggle_fairing(),
        KeyCode::Char('s') => app.next_sync(),
        KeyCode::Char('r') => app.reset_meters(),

        _ => {}
    }
}
