//! Terminal implementation of [`View`].

use std::io::Write;

use crate::{
    auth::AuthMode,
    formatter::MessageFormatter,
    session::RoomName,
    status::StatusKind,
    view::{RenderedMessage, View},
};

/// Prompt shown by the line editor
pub const PROMPT: &str = "> ";

/// Redisplay the prompt after printing asynchronously received output
pub fn redisplay_prompt() {
    print!("{}", PROMPT);
    std::io::stdout().flush().ok();
}

/// Writes views to stdout, one block per effect
#[derive(Debug, Default)]
pub struct TerminalView;

impl TerminalView {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, text: &str) {
        print!("\r{}", text);
        redisplay_prompt();
    }
}

impl View for TerminalView {
    fn show_auth(&mut self, mode: AuthMode) {
        self.emit(&MessageFormatter::format_auth_view(mode));
    }

    fn show_chat(&mut self, room: &RoomName, user: &str) {
        self.emit(&MessageFormatter::format_chat_view(room, user));
    }

    fn clear_messages(&mut self) {
        self.emit(&MessageFormatter::format_pane_cleared());
    }

    fn append_message(&mut self, message: &RenderedMessage) {
        self.emit(&MessageFormatter::format_chat_message(message));
    }

    fn show_status(&mut self, text: &str, kind: StatusKind) {
        self.emit(&MessageFormatter::format_status(text, kind));
    }

    fn clear_status(&mut self) {
        // Printed lines cannot be retracted; the next status replaces it.
        tracing::debug!("Status line cleared");
    }
}
