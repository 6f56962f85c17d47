//! Gateway wire protocol.
//!
//! Every frame is a JSON text message tagged by its `type` field. Outbound
//! requests and inbound events are closed sum types; inbound kinds this
//! client does not know decode to [`ServerMessage::Unknown`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Payload stored in a gateway list, tagged by `type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemData {
    /// Chat message in `chat/<room>/messages`
    Message { message: String },
    /// Membership event in `chat/<room>/members`
    Join {
        username: String,
        #[serde(rename = "joinedAt")]
        joined_at: i64,
    },
    /// Membership event in `chat/<room>/members`
    Leave {
        username: String,
        #[serde(rename = "leftAt")]
        left_at: i64,
    },
    /// Any item kind written by other clients, or one missing its fields
    #[default]
    #[serde(other)]
    Other,
}

impl ItemData {
    /// Text of a chat message, if this item is one
    pub fn message_text(&self) -> Option<&str> {
        match self {
            ItemData::Message { message } => Some(message),
            _ => None,
        }
    }
}

/// Item as sent with `list:append`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundItem {
    pub data: ItemData,
    pub public: bool,
}

/// Item as delivered by the gateway.
///
/// Lists are written by every client, so payloads are decoded leniently: a
/// payload that does not match a known kind becomes [`ItemData::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListItem {
    #[serde(default, deserialize_with = "lenient_item_data")]
    pub data: ItemData,
    #[serde(default, deserialize_with = "lenient_owner")]
    pub owner: Option<String>,
}

fn lenient_item_data<'de, D>(deserializer: D) -> Result<ItemData, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(ItemData::deserialize(value).unwrap_or_else(|e| {
        tracing::debug!("Unrecognized item payload: {}", e);
        ItemData::Other
    }))
}

fn lenient_owner<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(owner) => Ok(Some(owner)),
        _ => Ok(None),
    }
}

/// Decode each item on its own, dropping entries that are not objects
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<ListItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Value::deserialize(deserializer)? {
        Value::Array(values) => values,
        _ => return Ok(Vec::new()),
    };
    Ok(values
        .into_iter()
        .filter_map(|value| match ListItem::deserialize(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!("Skipping malformed list item: {}", e);
                None
            }
        })
        .collect())
}

/// Client → gateway requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "login")]
    Login {
        username: String,
        password: String,
        persistent: bool,
    },
    #[serde(rename = "register")]
    Register {
        username: String,
        password: String,
        persistent: bool,
    },
    #[serde(rename = "list:getLatest")]
    GetLatest {
        list: String,
        count: u32,
        persistent: bool,
    },
    #[serde(rename = "list:append")]
    Append {
        list: String,
        item: OutboundItem,
        persistent: bool,
    },
}

impl ClientMessage {
    /// Login request. Account operations are always persistent.
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Login {
            username: username.into(),
            password: password.into(),
            persistent: true,
        }
    }

    /// Registration request. Account operations are always persistent.
    pub fn register(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Register {
            username: username.into(),
            password: password.into(),
            persistent: true,
        }
    }

    /// Request the latest `count` items of a list
    pub fn get_latest(list: impl Into<String>, count: u32) -> Self {
        Self::GetLatest {
            list: list.into(),
            count,
            persistent: false,
        }
    }

    /// Append a public, non-persistent item to a list
    pub fn append(list: impl Into<String>, data: ItemData) -> Self {
        Self::Append {
            list: list.into(),
            item: OutboundItem { data, public: true },
            persistent: false,
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(ClientError::Encode)
    }
}

/// Gateway → client events
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "registered")]
    Registered,
    #[serde(rename = "authenticated")]
    Authenticated {
        username: String,
        #[serde(default)]
        token: Option<String>,
    },
    #[serde(rename = "list:latestResult")]
    LatestResult {
        #[serde(default, deserialize_with = "lenient_items")]
        items: Vec<ListItem>,
    },
    #[serde(rename = "list:appended")]
    Appended { list: String, item: ListItem },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Decode a JSON text frame
    pub fn decode(text: &str) -> Result<Self, ClientError> {
        serde_json::from_str(text).map_err(ClientError::Decode)
    }
}
