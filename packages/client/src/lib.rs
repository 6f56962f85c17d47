//! Terminal chat client for list-storage gateways.
//!
//! The client keeps one WebSocket connection to a gateway that provides
//! authentication and named append-only lists. Chat rooms are a naming
//! convention over those lists: `chat/<room>/messages` holds the messages
//! and `chat/<room>/members` the join/leave events.
//!
//! All state lives in a single [`SessionController`] driven by one event
//! loop (see [`run_client`]).

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod formatter;
pub mod input;
pub mod protocol;
pub mod reconnect;
pub mod session;
pub mod status;
pub mod terminal;
pub mod token_store;
pub mod transport;
pub mod view;

mod runner;

#[cfg(test)]
mod testing;

pub use controller::SessionController;
pub use runner::run_client;
