//! Events consumed by the session controller's loop, and timer scheduling.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::status::StatusTicket;

/// Identity of one connection attempt.
///
/// Events carry the id of the link that produced them so that a replaced
/// link cannot affect the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Socket lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    /// Text frame received
    Frame(String),
    /// Transport-level failure; a `Closed` follows
    TransportError(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connection {
        id: ConnectionId,
        event: ConnectionEvent,
    },
    /// A line typed by the user
    Input(String),
    /// A loading status reached its auto-clear delay
    StatusExpired(StatusTicket),
    /// The reconnect delay elapsed
    ReconnectDue,
    /// User asked to exit (Ctrl+C, Ctrl+D)
    Quit,
}

pub type EventSender = mpsc::UnboundedSender<Event>;

/// Delivers an event back to the loop after a delay
pub trait Scheduler: Send {
    fn schedule(&mut self, delay: Duration, event: Event);
}

/// Spawns a sleeping task per timer. Timers are never cancelled.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    events: EventSender,
}

impl TokioScheduler {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration, event: Event) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(event).is_err() {
                tracing::debug!("Event loop gone, dropping timer event");
            }
        });
    }
}
