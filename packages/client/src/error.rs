//! Error types for the tsudoi chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Nothing to send on: the link is absent, connecting or closed
    #[error("Not connected to the gateway")]
    NotConnected,

    /// Inbound frame is not a valid protocol message
    #[error("Failed to decode server message: {0}")]
    Decode(#[source] serde_json::Error),

    /// Outbound message could not be serialized
    #[error("Failed to encode client message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Token file could not be read or written
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Room names become part of list names and must stay a single path segment
    #[error("Invalid room name '{0}'")]
    InvalidRoomName(String),

    /// Origin must be an http(s) URL with a host
    #[error("Invalid origin '{0}'")]
    InvalidOrigin(String),

    /// Gateway address could not be built or parsed
    #[error("Invalid gateway URL: {0}")]
    InvalidGatewayUrl(#[from] url::ParseError),

    /// Reconnection cap reached
    #[error("Failed to reconnect after {0} attempts")]
    ReconnectExhausted(u32),
}
