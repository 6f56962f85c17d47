//! Rendering seam between the session controller and the terminal.

use crate::{auth::AuthMode, protocol::ListItem, session::RoomName, status::StatusKind};

/// Label shown for items that arrive without an owner
pub const ANONYMOUS_SENDER: &str = "anonymous";

/// Who wrote a rendered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    /// The current user
    User,
    Other,
}

/// A chat message ready for display.
///
/// All text is already escaped. `sender` is `None` exactly when
/// `kind` is [`SenderKind::User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub kind: SenderKind,
    pub sender: Option<String>,
    pub content: String,
    /// Local wall-clock time of rendering, `HH:MM`
    pub timestamp: String,
}

impl RenderedMessage {
    /// Build from an inbound list item. Items that are not chat messages yield `None`.
    pub fn from_item(item: &ListItem, own: bool, timestamp: String) -> Option<Self> {
        let content = escape_text(item.data.message_text()?);
        let (kind, sender) = if own {
            (SenderKind::User, None)
        } else {
            let owner = item.owner.as_deref().unwrap_or(ANONYMOUS_SENDER);
            (SenderKind::Other, Some(escape_text(owner)))
        };
        Some(Self {
            kind,
            sender,
            content,
            timestamp,
        })
    }
}

/// Effects the controller can have on the screen.
pub trait View: Send {
    /// Show the unauthenticated screen with the given form active
    fn show_auth(&mut self, mode: AuthMode);

    /// Show the authenticated room screen
    fn show_chat(&mut self, room: &RoomName, user: &str);

    /// Empty the message pane
    fn clear_messages(&mut self);

    /// Append one message at the bottom of the pane
    fn append_message(&mut self, message: &RenderedMessage);

    fn show_status(&mut self, text: &str, kind: StatusKind);

    fn clear_status(&mut self);
}

/// Neutralize terminal control sequences in server-supplied text.
///
/// Control characters (including ESC and newlines) are written as visible
/// escapes so that a message cannot move the cursor, recolor or clear the
/// screen, or fake extra lines.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            escaped.extend(c.escape_default());
        } else {
            escaped.push(c);
        }
    }
    escaped
}
