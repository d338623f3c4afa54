use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Position;

use crate::app::{App, View};
use crate::ui::common::tab_at;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Dispatch a terminal event.
pub fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        // Terminal will redraw on next iteration
        _ => {}
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If a detail overlay is shown, handle overlay-specific keys
    if app.overlay_open() {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Enter => app.go_back(),
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('t') => app.cycle_time_range(),
            KeyCode::Char('r') => app.reload(),
            KeyCode::Char('?') => app.toggle_help(),
            _ => {}
        }
        return;
    }

    // If filter input is active, handle text input
    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    if app.current_view == View::Map && handle_map_key(app, key) {
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        // Direct view access
        KeyCode::Char('1') => app.set_view(View::Dashboard),
        KeyCode::Char('2') => app.set_view(View::Services),
        KeyCode::Char('3') => app.set_view(View::Map),
        KeyCode::Char('4') => app.set_view(View::Traces),

        // Navigation; the dashboard is a grid
        KeyCode::Up | KeyCode::Char('k') if app.current_view == View::Dashboard => {
            app.select_dashboard_row(false)
        }
        KeyCode::Down | KeyCode::Char('j') if app.current_view == View::Dashboard => {
            app.select_dashboard_row(true)
        }
        KeyCode::Left | KeyCode::Char('h') => app.select_prev(),
        KeyCode::Right | KeyCode::Char('l') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Open detail overlay
        KeyCode::Enter => app.enter_detail(),

        // Go back (Esc and Backspace)
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Reload
        KeyCode::Char('r') => app.reload(),

        // Time range
        KeyCode::Char('t') => app.cycle_time_range(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Sorting (Services and Traces views)
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.toggle_sort_direction(),

        // Traces service filter
        KeyCode::Char('f') if app.current_view == View::Traces => app.cycle_trace_filter(),

        // Filter (start typing to filter)
        KeyCode::Char('/') if app.current_view != View::Map => app.start_filter(),

        // Clear filter
        KeyCode::Char('c') => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        // Export
        KeyCode::Char('e') => {
            let export_path = app.export_path.clone();
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Keys specific to the dependency map. Returns whether the key was handled.
fn handle_map_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.graph.pan(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.graph.pan(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.graph.pan(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.graph.pan(0, 1),
        KeyCode::Char('+') | KeyCode::Char('=') => app.graph.zoom_in(),
        KeyCode::Char('-') => app.graph.zoom_out(),
        KeyCode::Char('0') => app.graph.reset_view(),
        KeyCode::Char('n') => app.graph.focus_next(),
        KeyCode::Char('N') => app.graph.focus_prev(),
        _ => return false,
    }
    true
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm filter
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Cancel filter (keep text but exit input mode)
        KeyCode::Esc => {
            app.cancel_filter();
        }

        // Backspace
        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        // Type characters
        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    // Right-click goes back
    if mouse.kind == MouseEventKind::Down(MouseButton::Right) {
        app.go_back();
        return;
    }

    // Overlays are modal
    if app.show_help || app.overlay_open() {
        return;
    }

    let pos = Position::new(mouse.column, mouse.row);

    // Tab clicks (row 1, after header)
    if mouse.kind == MouseEventKind::Down(MouseButton::Left) && mouse.row == 1 {
        if let Some(view) = tab_at(mouse.column) {
            app.set_view(view);
        }
        return;
    }

    match app.current_view {
        View::Map => {
            app.graph
                .handle_mouse(mouse, |id| app.context.select_service(id.to_string()));
        }
        View::Dashboard => match mouse.kind {
            MouseEventKind::ScrollUp => app.select_dashboard_row(false),
            MouseEventKind::ScrollDown => app.select_dashboard_row(true),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = app.dashboard.card_at(pos) {
                    if app.dashboard.selected == index {
                        app.enter_detail();
                    } else {
                        app.dashboard.selected = index;
                    }
                }
            }
            _ => {}
        },
        View::Services => match mouse.kind {
            MouseEventKind::ScrollUp => app.select_prev(),
            MouseEventKind::ScrollDown => app.select_next(),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(column) = app.services.header_at(pos) {
                    app.sort_services_by(column);
                } else if let Some(row) = app.services.row_at(mouse.row) {
                    if row < app.table_services().len() {
                        if app.services.selected == row {
                            app.enter_detail();
                        } else {
                            app.services.selected = row;
                        }
                    }
                }
            }
            _ => {}
        },
        View::Traces => match mouse.kind {
            MouseEventKind::ScrollUp => app.select_prev(),
            MouseEventKind::ScrollDown => app.select_next(),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(column) = app.traces.header_at(pos) {
                    app.sort_traces_by(column);
                } else if let Some(row) = app.traces.row_at(mouse.row) {
                    if row < app.table_traces().len() {
                        if app.traces.selected == row {
                            app.enter_detail();
                        } else {
                            app.traces.selected = row;
                        }
                    }
                }
            }
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_app, StubFetcher};
    use crate::ui::services::ServiceColumn;
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_help_swallows_next_key() {
        let mut app = test_app(Arc::new(StubFetcher::new()));
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[tokio::test]
    async fn test_number_keys_switch_views() {
        let mut app = test_app(Arc::new(StubFetcher::new()));
        handle_key_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.current_view, View::Map);
        handle_key_event(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.current_view, View::Services);
        handle_key_event(&mut app, key(KeyCode::Tab));
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Traces);
    }

    #[tokio::test]
    async fn test_sort_keys() {
        let mut app = test_app(Arc::new(StubFetcher::new()));
        app.set_view(View::Services);
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.services.sort.column, ServiceColumn::Status);
        assert!(app.services.sort.ascending);
        handle_key_event(&mut app, key(KeyCode::Char('S')));
        assert!(!app.services.sort.ascending);
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.services.sort.column, ServiceColumn::P50);
        assert!(app.services.sort.ascending);
    }

    #[tokio::test]
    async fn test_filter_input_mode() {
        let mut app = test_app(Arc::new(StubFetcher::new()));
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        assert!(app.filter_active);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.running);
        assert_eq!(app.filter_text, "q");
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(!app.filter_active);
        handle_key_event(&mut app, key(KeyCode::Char('c')));
        assert!(app.filter_text.is_empty());
    }

    #[tokio::test]
    async fn test_map_keys_zoom_and_pan() {
        let mut app = test_app(Arc::new(StubFetcher::new()));
        app.set_view(View::Map);
        handle_key_event(&mut app, key(KeyCode::Char('+')));
        assert!(app.graph.viewport.zoom() > 1.0);
        handle_key_event(&mut app, key(KeyCode::Left));
        assert!(app.graph.viewport.center_x < 0.0);
        handle_key_event(&mut app, key(KeyCode::Char('0')));
        assert_eq!(app.graph.viewport.zoom(), 1.0);
        assert_eq!(app.current_view, View::Map);
    }

    #[tokio::test]
    async fn test_escape_closes_overlay_before_leaving_view() {
        let mut app = test_app(Arc::new(StubFetcher::new()));
        app.set_view(View::Traces);
        app.context.select_trace("t-1");
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(!app.overlay_open());
        assert_eq!(app.current_view, View::Traces);
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.current_view, View::Dashboard);
    }

    #[tokio::test]
    async fn test_tab_click_switches_view() {
        let mut app = test_app(Arc::new(StubFetcher::new()));
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 17,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click);
        assert_eq!(app.current_view, View::Services);
    }
}
