//! Terminal chat client with token persistence and automatic reconnection.
//!
//! Connects to the list-storage gateway, shows a login/registration form,
//! then joins the "global" room. Reconnects every 3 seconds after a
//! disconnect unless configured otherwise.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-client
//! cargo run --bin tsudoi-client -- --origin https://chat.example.com
//! cargo run --bin tsudoi-client -- --gateway ws://127.0.0.1:3000
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use tsudoi_client::{
    config::{
        ClientConfig, DEFAULT_HISTORY_COUNT, DEFAULT_ORIGIN, Deployment, default_token_path,
    },
    reconnect::ReconnectPolicy,
    token_store::FileTokenStore,
};
use tsudoi_shared::logger::setup_logger;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "tsudoi-client")]
#[command(about = "Terminal chat client for list-storage gateways", long_about = None)]
struct Args {
    /// Origin the client is deployed under; selects the gateway host and scheme
    #[arg(short = 'o', long, default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Gateway base URL, overriding the origin-based choice
    #[arg(short = 'g', long)]
    gateway: Option<Url>,

    /// File holding the gateway token between runs
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Delay before reconnecting after a disconnect
    #[arg(long, default_value_t = 3000)]
    reconnect_interval_ms: u64,

    /// Give up after this many consecutive failed reconnects (default: never)
    #[arg(long)]
    max_reconnect_attempts: Option<u32>,

    /// Delay after which a loading status clears itself
    #[arg(long, default_value_t = 5000)]
    status_clear_ms: u64,

    /// Number of messages loaded when joining a room
    #[arg(long, default_value_t = DEFAULT_HISTORY_COUNT)]
    history: u32,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let deployment = match Deployment::from_origin(&args.origin) {
        Ok(deployment) => deployment,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let config = ClientConfig {
        deployment,
        gateway_override: args.gateway,
        reconnect: ReconnectPolicy::new(
            Duration::from_millis(args.reconnect_interval_ms),
            args.max_reconnect_attempts,
        ),
        status_clear_delay: Duration::from_millis(args.status_clear_ms),
        history_count: args.history,
    };
    let store = FileTokenStore::new(args.token_file.unwrap_or_else(default_token_path));

    // Run the client
    if let Err(e) = tsudoi_client::run_client(config, Box::new(store)).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
