use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, Focus};
use crate::tui::AppEvent;

/// Rows moved per mouse wheel notch
const WHEEL_ROWS: u32 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(width, _) => app.width = width,
        AppEvent::Tick => app.tick(Instant::now()),
        AppEvent::ResponseReady(ticket) => app.on_response(ticket),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any focus
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('n') if ctrl => {
            app.new_chat();
            return;
        }
        KeyCode::Char('b') if ctrl => {
            app.toggle_sidebar();
            return;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.cycle_focus();
            return;
        }
        _ => {}
    }

    match app.focus {
        Focus::Input => handle_input(app, key),
        Focus::Thread if app.is_welcome() => handle_welcome(app, key),
        Focus::Thread => handle_thread(app, key),
        Focus::Sidebar => handle_sidebar(app, key),
    }
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Shift/Alt+Enter inserts a newline, plain Enter sends
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.insert_char('\n');
        }
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::Esc => {
            if app.sidebar_open && app.is_narrow() {
                app.close_sidebar();
            } else {
                app.cycle_focus();
            }
        }
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.insert_char('\n');
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_input();
        }
        KeyCode::Char(c) => app.insert_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        _ => {}
    }
}

fn handle_welcome(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => app.suggestion_next(),
        KeyCode::Char('k') | KeyCode::Up => app.suggestion_prev(),
        KeyCode::Enter => {
            app.pick_suggestion(app.suggestion_idx);
        }
        KeyCode::Char('i') | KeyCode::Esc => app.focus = Focus::Input,
        _ => {}
    }
}

fn handle_thread(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Reply selection
        KeyCode::Char('j') | KeyCode::Down => app.select_next_reply(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev_reply(),

        // Action row
        KeyCode::Char('l') | KeyCode::Right => app.action_next(),
        KeyCode::Char('h') | KeyCode::Left => app.action_prev(),
        KeyCode::Enter => app.activate_action(Instant::now()),
        KeyCode::Char('c') if !ctrl => {
            if let Some(idx) = app.selected_reply {
                app.copy_reply(idx, Instant::now());
            }
        }

        // Half-page scroll
        KeyCode::Char('d') if ctrl => {
            let rows = app.viewport.half_page();
            app.viewport.scroll_down(rows);
        }
        KeyCode::Char('u') if ctrl => {
            let rows = app.viewport.half_page();
            app.viewport.scroll_up(rows);
        }
        KeyCode::PageDown => {
            let rows = app.viewport.half_page();
            app.viewport.scroll_down(rows);
        }
        KeyCode::PageUp => {
            let rows = app.viewport.half_page();
            app.viewport.scroll_up(rows);
        }
        KeyCode::Char('g') | KeyCode::Home => app.viewport.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.viewport.scroll_to_bottom(),

        KeyCode::Char('i') | KeyCode::Esc => app.focus = Focus::Input,
        _ => {}
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.new_chat(),
        KeyCode::Esc | KeyCode::Char('q') => app.close_sidebar(),
        _ => {}
    }
}

fn is_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (col, row) = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.viewport.scroll_up(WHEEL_ROWS),
        MouseEventKind::ScrollDown => app.viewport.scroll_down(WHEEL_ROWS),
        MouseEventKind::Down(MouseButton::Left) => {
            let in_sidebar = app.sidebar_area.is_some_and(|r| is_in_rect(col, row, r));

            // Clicking outside the overlaid sidebar dismisses it
            if app.sidebar_open && app.is_narrow() && !in_sidebar {
                app.close_sidebar();
                return;
            }

            if in_sidebar {
                app.focus = Focus::Sidebar;
            } else if app.thread_area.is_some_and(|r| is_in_rect(col, row, r)) {
                app.focus = Focus::Thread;
            } else {
                app.focus = Focus::Input;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epsilon_core::{Config, Controller, DelayWindow};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn app(width: u16) -> (App, epsilon_core::Completions) {
        let (controller, completions) =
            Controller::new(DelayWindow::default(), StdRng::seed_from_u64(3));
        (App::new(controller, &Config::new(), width), completions)
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_sends_and_shift_enter_adds_newline() {
        let (mut app, mut completions) = app(120);
        type_text(&mut app, "line one");
        handle_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::SHIFT)).unwrap();
        type_text(&mut app, "two");
        assert_eq!(app.input, "line one\ntwo");

        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.input.is_empty());
        assert_eq!(app.controller.session().messages()[0].content, "line one\ntwo");

        let ticket = completions.recv().await.unwrap();
        handle_event(&mut app, AppEvent::ResponseReady(ticket)).unwrap();
        assert_eq!(app.controller.session().messages().len(), 2);
    }

    #[test]
    fn test_enter_on_blank_input_does_nothing() {
        let (mut app, _rx) = app(120);
        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.is_welcome());
        assert_eq!(app.input, "   ");
    }

    #[tokio::test]
    async fn test_welcome_enter_picks_selected_suggestion() {
        let (mut app, _rx) = app(120);
        handle_event(&mut app, key(KeyCode::Tab)).unwrap();
        assert_eq!(app.focus, Focus::Thread);
        handle_event(&mut app, key(KeyCode::Char('j'))).unwrap();
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();

        let messages = app.controller.session().messages();
        assert_eq!(messages[0].content, epsilon_core::SUGGESTIONS[1].prompt);
        assert!(app.controller.session().is_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ctrl_n_while_typing_restores_welcome() {
        let (mut app, mut completions) = app(120);
        type_text(&mut app, "hello");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        handle_event(&mut app, key_with(KeyCode::Char('n'), KeyModifiers::CONTROL)).unwrap();
        assert!(app.is_welcome());

        let late = tokio::time::timeout(std::time::Duration::from_secs(5), completions.recv()).await;
        assert!(late.is_err());
    }

    #[test]
    fn test_click_outside_narrow_sidebar_closes_it() {
        let (mut app, _rx) = app(80);
        handle_event(&mut app, key_with(KeyCode::Char('b'), KeyModifiers::CONTROL)).unwrap();
        assert!(app.sidebar_open);
        app.sidebar_area = Some(Rect::new(0, 0, 28, 30));

        let click = |column, row| {
            AppEvent::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                modifiers: KeyModifiers::NONE,
            })
        };

        handle_event(&mut app, click(10, 5)).unwrap();
        assert!(app.sidebar_open);
        handle_event(&mut app, click(60, 5)).unwrap();
        assert!(!app.sidebar_open);
    }

    #[test]
    fn test_resize_updates_width() {
        let (mut app, _rx) = app(120);
        handle_event(&mut app, AppEvent::Resize(90, 40)).unwrap();
        assert!(app.is_narrow());
    }
}
