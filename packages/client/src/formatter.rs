//! Message formatting utilities for terminal display.

use crate::{
    auth::AuthMode,
    session::RoomName,
    status::StatusKind,
    view::{RenderedMessage, SenderKind},
};

const RULE: &str = "============================================================";

/// Message formatter for terminal display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the unauthenticated screen with the active form highlighted
    pub fn format_auth_view(mode: AuthMode) -> String {
        let (login_tab, register_tab) = match mode {
            AuthMode::Login => ("[Login]", " Register "),
            AuthMode::Register => (" Login ", "[Register]"),
        };
        let usage = match mode {
            AuthMode::Login => "/login <username> <password>",
            AuthMode::Register => "/register <username> <password>  (password min 6 chars)",
        };

        let mut output = String::new();
        output.push_str(&format!("\n{}\n", RULE));
        output.push_str(&format!("{}  {}\n", login_tab, register_tab));
        output.push_str(&format!("{}\n", usage));
        output.push_str("Switch forms with /login or /register, exit with /quit\n");
        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// Format the room screen header
    pub fn format_chat_view(room: &RoomName, user: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n", RULE));
        output.push_str(&format!("Room: {} | User: {}\n", room, user));
        output.push_str("Type a message and press Enter. /join <room>, /logout, /quit\n");
        output.push_str("Start a message with // to send a leading slash\n");
        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// Separator printed when the message pane is reset
    pub fn format_pane_cleared() -> String {
        "\n------------------------------------------------------------\n".to_string()
    }

    /// Format a chat message. Own messages carry no sender label.
    pub fn format_chat_message(message: &RenderedMessage) -> String {
        match (message.kind, message.sender.as_deref()) {
            (SenderKind::Other, Some(sender)) => {
                format!("[{}] @{}: {}\n", message.timestamp, sender, message.content)
            }
            _ => format!("[{}] > {}\n", message.timestamp, message.content),
        }
    }

    /// Format a status line entry
    pub fn format_status(text: &str, kind: StatusKind) -> String {
        let marker = match kind {
            StatusKind::Loading => "...",
            StatusKind::Success => "ok",
            StatusKind::Error => "!!",
        };
        format!("({}) {}\n", marker, text)
    }
}
