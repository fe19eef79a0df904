use std::time::Instant;

use epsilon_core::markup::plain_text;
use epsilon_core::{
    ChatRole, Config, Controller, MessageAction, RenderOptions, Ticket, Toasts,
    Viewport, SUGGESTIONS,
};
use ratatui::layout::Rect;

/// Below this terminal width the sidebar overlays the chat instead of
/// pushing it aside, and starting a new chat closes it
pub const NARROW_WIDTH: u16 = 100;

/// Input box grows with its content up to this many text rows
pub const MAX_INPUT_ROWS: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    /// Welcome suggestions, or the message thread once a chat has started
    Thread,
    Sidebar,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: Focus,
    pub controller: Controller,
    pub render_options: RenderOptions,

    // Input box
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars

    // Layout state
    pub width: u16,
    pub sidebar_open: bool,

    // Welcome screen
    pub suggestion_idx: usize,

    // Thread state
    pub viewport: Viewport,
    pub selected_reply: Option<usize>, // index into session messages
    pub selected_action: usize,
    pub reveal_selected: bool,
    /// (first row, height) of each message in the rendered thread
    pub message_rows: Vec<(u32, u32)>,

    // Transient feedback
    pub toasts: Toasts,
    pub animation_frame: u8, // 0-2 for typing dots

    // Panel areas for mouse hit-testing (updated during render)
    pub sidebar_area: Option<Rect>,
    pub thread_area: Option<Rect>,

    clipboard: Option<arboard::Clipboard>,
}

impl App {
    pub fn new(controller: Controller, config: &Config, width: u16) -> Self {
        Self {
            should_quit: false,
            focus: Focus::Input,
            controller,
            render_options: config.render_options(),

            input: String::new(),
            input_cursor: 0,

            width,
            sidebar_open: false,

            suggestion_idx: 0,

            viewport: Viewport::default(),
            selected_reply: None,
            selected_action: 0,
            reveal_selected: false,
            message_rows: Vec::new(),

            toasts: Toasts::new(config.toast_timings()),
            animation_frame: 0,

            sidebar_area: None,
            thread_area: None,

            clipboard: None,
        }
    }

    pub fn is_narrow(&self) -> bool {
        self.width < NARROW_WIDTH
    }

    pub fn is_welcome(&self) -> bool {
        self.controller.session().messages().is_empty()
    }

    /// Send button state: non-blank input and no reply in flight
    pub fn can_send(&self) -> bool {
        self.controller.can_send(&self.input)
    }

    // Sending

    pub fn submit(&mut self) -> bool {
        match self.controller.send(&self.input) {
            Ok(_) => {
                self.clear_input();
                self.selected_reply = None;
                self.focus = Focus::Input;
                true
            }
            Err(_) => false,
        }
    }

    /// Fill the input with the suggestion's prompt, then send it
    pub fn pick_suggestion(&mut self, idx: usize) -> bool {
        let Some(suggestion) = SUGGESTIONS.get(idx) else {
            return false;
        };
        self.set_input(suggestion.prompt);
        self.submit()
    }

    pub fn suggestion_next(&mut self) {
        self.suggestion_idx = (self.suggestion_idx + 1) % SUGGESTIONS.len();
    }

    pub fn suggestion_prev(&mut self) {
        self.suggestion_idx = (self.suggestion_idx + SUGGESTIONS.len() - 1) % SUGGESTIONS.len();
    }

    pub fn on_response(&mut self, ticket: Ticket) {
        self.controller.complete(ticket);
    }

    pub fn new_chat(&mut self) {
        self.controller.new_chat();
        self.clear_input();
        self.selected_reply = None;
        self.selected_action = 0;
        self.suggestion_idx = 0;
        self.viewport = Viewport::default();
        self.message_rows.clear();
        self.focus = Focus::Input;
        if self.is_narrow() {
            self.sidebar_open = false;
        }
    }

    // Sidebar

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
        self.focus = if self.sidebar_open { Focus::Sidebar } else { Focus::Input };
    }

    pub fn close_sidebar(&mut self) {
        if self.sidebar_open {
            self.sidebar_open = false;
            if self.focus == Focus::Sidebar {
                self.focus = Focus::Input;
            }
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Thread,
            Focus::Thread if self.sidebar_open => Focus::Sidebar,
            Focus::Thread | Focus::Sidebar => Focus::Input,
        };
        if self.focus == Focus::Thread && self.selected_reply.is_none() {
            self.selected_reply = self.reply_indices().last().copied();
            self.reveal_selected = true;
        }
    }

    /// Tick animation frame and expire toasts (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        if self.controller.session().is_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.toasts.prune(now);
    }

    // Reply selection and actions

    pub fn reply_indices(&self) -> Vec<usize> {
        self.controller
            .session()
            .messages()
            .iter()
            .enumerate()
            .filter(|(_, m)| m.role == ChatRole::Assistant)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn select_next_reply(&mut self) {
        let replies = self.reply_indices();
        self.selected_reply = match self.selected_reply {
            None => replies.first().copied(),
            Some(current) => replies
                .iter()
                .copied()
                .find(|&i| i > current)
                .or(Some(current)),
        };
        self.reveal_selected = true;
    }

    pub fn select_prev_reply(&mut self) {
        let replies = self.reply_indices();
        self.selected_reply = match self.selected_reply {
            None => replies.last().copied(),
            Some(current) => replies
                .iter()
                .rev()
                .copied()
                .find(|&i| i < current)
                .or(Some(current)),
        };
        self.reveal_selected = true;
    }

    pub fn action_next(&mut self) {
        self.selected_action = (self.selected_action + 1) % MessageAction::ALL.len();
    }

    pub fn action_prev(&mut self) {
        self.selected_action =
            (self.selected_action + MessageAction::ALL.len() - 1) % MessageAction::ALL.len();
    }

    pub fn activate_action(&mut self, now: Instant) {
        let Some(idx) = self.selected_reply else {
            return;
        };
        match MessageAction::ALL[self.selected_action] {
            MessageAction::Copy => self.copy_reply(idx, now),
            other => tracing::debug!(action = other.title(), "action not available"),
        }
    }

    /// Copy the rendered text of an assistant message and confirm with a toast
    pub fn copy_reply(&mut self, idx: usize, now: Instant) {
        let Some(message) = self.controller.session().messages().get(idx) else {
            return;
        };
        let text = plain_text(&message.content);

        if self.clipboard.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
            }
        }

        let copied = match self.clipboard.as_mut() {
            Some(clipboard) => match clipboard.set_text(text) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "copy failed");
                    false
                }
            },
            None => false,
        };

        if copied {
            tracing::info!(message = idx, "reply copied");
            self.toasts.show("Copied to clipboard", now);
        } else {
            self.toasts.show("Copy failed", now);
        }
    }

    // Input editing

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.input_cursor = self.input.chars().count();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.input_cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.input_cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.input_cursor = (self.input_cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Hard-wrap the input at `width` columns.
/// Returns the visual rows and the cursor's (row, column) within them.
pub fn wrap_input(input: &str, cursor: usize, width: usize) -> (Vec<String>, (usize, usize)) {
    let width = width.max(1);
    let mut rows = vec![String::new()];
    let mut col = 0;
    let mut cursor_pos = (0, 0);

    for (i, c) in input.chars().enumerate() {
        if i == cursor {
            cursor_pos = (rows.len() - 1, col);
        }
        if c == '\n' {
            rows.push(String::new());
            col = 0;
            continue;
        }
        if col == width {
            rows.push(String::new());
            col = 0;
            if i == cursor {
                cursor_pos = (rows.len() - 1, 0);
            }
        }
        if let Some(row) = rows.last_mut() {
            row.push(c);
        }
        col += 1;
    }

    if cursor >= input.chars().count() {
        cursor_pos = if col == width {
            rows.push(String::new());
            (rows.len() - 1, 0)
        } else {
            (rows.len() - 1, col)
        };
    }

    (rows, cursor_pos)
}

/// Text rows the input box needs, clamped to `1..=MAX_INPUT_ROWS`
pub fn input_rows(input: &str, width: usize) -> u16 {
    let (rows, _) = wrap_input(input, input.chars().count(), width);
    (rows.len() as u16).clamp(1, MAX_INPUT_ROWS)
}
