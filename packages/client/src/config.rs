//! Client configuration and gateway address resolution.

use std::{path::PathBuf, time::Duration};

use url::Url;

use crate::{error::ClientError, reconnect::ReconnectPolicy};

/// Hosts treated as a local development deployment
pub const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Gateway used when running against a local deployment
pub const LOCAL_GATEWAY_HOST: &str = "localhost:3000";

/// Gateway used for every other deployment
pub const REMOTE_GATEWAY_HOST: &str = "storage-service-kvn1.onrender.com";

/// Default origin when none is given
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Number of messages requested when joining a room
pub const DEFAULT_HISTORY_COUNT: u32 = 50;

/// Delay after which a loading status clears itself
pub const DEFAULT_STATUS_CLEAR_DELAY: Duration = Duration::from_millis(5000);

/// Where the client runs from: the host it considers itself served from and
/// whether that origin uses a secure transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub host: String,
    pub secure: bool,
}

impl Deployment {
    /// Parse an origin such as `https://chat.example.com` or `http://localhost:8000`.
    pub fn from_origin(origin: &str) -> Result<Self, ClientError> {
        let invalid = || ClientError::InvalidOrigin(origin.to_string());
        let url = Url::parse(origin).map_err(|_| invalid())?;

        let secure = match url.scheme() {
            "https" => true,
            "http" => false,
            _ => return Err(invalid()),
        };
        let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;

        Ok(Self {
            host: host.to_string(),
            secure,
        })
    }

    /// Whether the host is one of [`LOCAL_HOSTS`]
    pub fn is_local(&self) -> bool {
        LOCAL_HOSTS.contains(&self.host.as_str())
    }
}

/// Runtime configuration of the session controller
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub deployment: Deployment,
    /// Explicit gateway base URL (`ws://host:port`), bypassing deployment detection
    pub gateway_override: Option<Url>,
    pub reconnect: ReconnectPolicy,
    pub status_clear_delay: Duration,
    pub history_count: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            deployment: Deployment {
                host: "localhost".to_string(),
                secure: false,
            },
            gateway_override: None,
            reconnect: ReconnectPolicy::default(),
            status_clear_delay: DEFAULT_STATUS_CLEAR_DELAY,
            history_count: DEFAULT_HISTORY_COUNT,
        }
    }
}

/// Build the gateway URL for the next connection attempt.
///
/// The scheme follows the deployment's transport security and the host is
/// picked from the local allow-list. A stored token is passed, form-encoded,
/// as the `token` query parameter.
pub fn resolve_gateway_url(
    config: &ClientConfig,
    token: Option<&str>,
) -> Result<Url, ClientError> {
    let mut url = match &config.gateway_override {
        Some(url) => url.clone(),
        None => {
            let scheme = if config.deployment.secure { "wss" } else { "ws" };
            let host = if config.deployment.is_local() {
                LOCAL_GATEWAY_HOST
            } else {
                REMOTE_GATEWAY_HOST
            };
            Url::parse(&format!("{}://{}/", scheme, host))?
        }
    };

    if let Some(token) = token {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}

/// Default location of the token file (`<data dir>/tsudoi/token`)
pub fn default_token_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tsudoi")
        .join("token")
}
