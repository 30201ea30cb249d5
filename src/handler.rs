use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        other => app.apply(other),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
            app.show_details = false;
        }

        // Outlet selection
        KeyCode::Char('n') | KeyCode::Char('j') | KeyCode::Tab => app.map.select_next(),
        KeyCode::Char('p') | KeyCode::Char('k') | KeyCode::BackTab => app.map.select_prev(),
        KeyCode::Enter => app.toggle_details(),
        KeyCode::Esc => {
            if app.show_details {
                app.show_details = false;
            } else {
                app.map.clear_selection();
            }
        }
        KeyCode::Char('o') => {
            if let Some(outlet) = app.map.selected_outlet() {
                open_link(&outlet.waze_link);
            }
        }

        // Viewport
        KeyCode::Char('+') | KeyCode::Char('=') => app.map.zoom_in(),
        KeyCode::Char('-') => app.map.zoom_out(),
        KeyCode::Left => app.map.pan(-1.0, 0.0),
        KeyCode::Right => app.map.pan(1.0, 0.0),
        KeyCode::Up => app.map.pan(0.0, 1.0),
        KeyCode::Down => app.map.pan(0.0, -1.0),
        KeyCode::Char('c') => app.map.center_on_selected(),
        KeyCode::Char('0') => app.map.reset_viewport(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Refused while empty or busy; the keystroke is simply dropped.
            app.submit_query();
        }
        KeyCode::Backspace => app.panel.form.backspace(),
        KeyCode::Delete => app.panel.form.delete(),
        KeyCode::Left => app.panel.form.move_left(),
        KeyCode::Right => app.panel.form.move_right(),
        KeyCode::Home => app.panel.form.move_home(),
        KeyCode::End => app.panel.form.move_end(),
        KeyCode::Char(c) => app.panel.form.insert(c),
        _ => {}
    }
}

/// Hand a URL to the platform opener without waiting for it.
fn open_link(url: &str) {
    use std::process::{Command, Stdio};

    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        Command::new("xdg-open")
    };

    let spawned = command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(_) => tracing::info!(%url, "opened outlet link"),
        Err(e) => tracing::warn!(%url, error = %e, "could not open outlet link"),
    }
}
