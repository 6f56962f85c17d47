//! Client-local session state.

use std::fmt;

use crate::error::ClientError;

/// Room every session starts in and returns to on logout
pub const DEFAULT_ROOM: &str = "global";

/// Room name value object.
///
/// A room is nothing more than its name; the gateway lists belonging to it
/// are derived from the name, so it must be a single non-empty path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(name: impl Into<String>) -> Result<Self, ClientError> {
        let name = name.into();
        if name.is_empty() || name.contains('/') || name.chars().any(char::is_whitespace) {
            return Err(ClientError::InvalidRoomName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `chat/<room>/messages`
    pub fn messages_list(&self) -> String {
        format!("chat/{}/messages", self.0)
    }

    /// `chat/<room>/members`
    pub fn members_list(&self) -> String {
        format!("chat/{}/members", self.0)
    }
}

impl Default for RoomName {
    fn default() -> Self {
        Self(DEFAULT_ROOM.to_string())
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session fields owned by the controller.
///
/// `token` mirrors the token store; `current_user` is only ever set from a
/// server `authenticated` verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub current_user: Option<String>,
    pub current_room: RoomName,
}

impl Session {
    /// Start a session from a previously stored token
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    /// Whether an inbound item was written by the current user
    pub fn is_own(&self, owner: Option<&str>) -> bool {
        match (self.current_user.as_deref(), owner) {
            (Some(user), Some(owner)) => user == owner,
            _ => false,
        }
    }

    /// Drop token and identity and go back to the default room
    pub fn reset(&mut self) {
        self.token = None;
        self.current_user = None;
        self.current_room = RoomName::default();
    }
}
