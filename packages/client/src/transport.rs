//! WebSocket transport.
//!
//! Each link is a spawned task owning the socket. Inbound frames and
//! lifecycle changes are posted to the event loop; outbound frames arrive
//! through the link's own channel.

use futures_util::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::AbortHandle};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::event::{ConnectionEvent, ConnectionId, Event, EventSender};

/// Handle to one live connection.
///
/// Dropping the link tears the connection down without a `Closed` event;
/// that is how a reconnect replaces the previous link.
#[derive(Debug)]
pub struct Link {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<String>,
    task: Option<AbortHandle>,
}

impl Link {
    pub fn new(
        id: ConnectionId,
        sender: mpsc::UnboundedSender<String>,
        task: Option<AbortHandle>,
    ) -> Self {
        Self { id, sender, task }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a text frame. Fails once the connection task has ended.
    pub fn send(&self, frame: String) -> Result<(), String> {
        self.sender.send(frame).map_err(|e| e.to_string())
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Opens links to the gateway
pub trait Transport: Send {
    fn open(&mut self, url: &str, id: ConnectionId) -> Link;
}

/// `tokio-tungstenite` client transport
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    events: EventSender,
}

impl WebSocketTransport {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, url: &str, id: ConnectionId) -> Link {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(url.to_string(), id, rx, self.events.clone()));
        Link::new(id, tx, Some(task.abort_handle()))
    }
}

fn notify(events: &EventSender, id: ConnectionId, event: ConnectionEvent) {
    if events.send(Event::Connection { id, event }).is_err() {
        tracing::debug!("Event loop gone, dropping connection event");
    }
}

async fn run_connection(
    url: String,
    id: ConnectionId,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: EventSender,
) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            notify(&events, id, ConnectionEvent::TransportError(e.to_string()));
            notify(&events, id, ConnectionEvent::Closed);
            return;
        }
    };
    notify(&events, id, ConnectionEvent::Opened);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    notify(&events, id, ConnectionEvent::Frame(text.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Gateway closed the connection");
                    break;
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("Ignoring {} bytes of binary data", data.len());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    notify(&events, id, ConnectionEvent::TransportError(e.to_string()));
                    break;
                }
            },
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        notify(&events, id, ConnectionEvent::TransportError(e.to_string()));
                        break;
                    }
                }
                None => {
                    write.close().await.ok();
                    break;
                }
            },
        }
    }

    notify(&events, id, ConnectionEvent::Closed);
}
