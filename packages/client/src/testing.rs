//! Recording doubles for controller tests.

use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::mpsc;
use tsudoi_shared::time::FixedClock;

use crate::{
    auth::AuthMode,
    config::ClientConfig,
    controller::SessionController,
    error::ClientError,
    event::{ConnectionEvent, ConnectionId, Event, Scheduler},
    session::RoomName,
    status::StatusKind,
    token_store::TokenStore,
    transport::{Link, Transport},
    view::{RenderedMessage, View},
};

/// One recorded view effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    ShowAuth(AuthMode),
    ShowChat { room: String, user: String },
    ClearMessages,
    Append(RenderedMessage),
    Status(String, StatusKind),
    ClearStatus,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    calls: Arc<Mutex<Vec<ViewCall>>>,
}

impl RecordingView {
    /// Take all calls recorded so far
    pub fn take(&self) -> Vec<ViewCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn push(&self, call: ViewCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl View for RecordingView {
    fn show_auth(&mut self, mode: AuthMode) {
        self.push(ViewCall::ShowAuth(mode));
    }

    fn show_chat(&mut self, room: &RoomName, user: &str) {
        self.push(ViewCall::ShowChat {
            room: room.to_string(),
            user: user.to_string(),
        });
    }

    fn clear_messages(&mut self) {
        self.push(ViewCall::ClearMessages);
    }

    fn append_message(&mut self, message: &RenderedMessage) {
        self.push(ViewCall::Append(message.clone()));
    }

    fn show_status(&mut self, text: &str, kind: StatusKind) {
        self.push(ViewCall::Status(text.to_string(), kind));
    }

    fn clear_status(&mut self) {
        self.push(ViewCall::ClearStatus);
    }
}

/// Records opened URLs and keeps the outbound side of every link
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    opened: Arc<Mutex<Vec<(String, ConnectionId)>>>,
    outbound: Arc<Mutex<Vec<mpsc::UnboundedReceiver<String>>>>,
}

impl RecordingTransport {
    pub fn opened(&self) -> Vec<(String, ConnectionId)> {
        self.opened.lock().unwrap().clone()
    }

    /// Drain every frame sent on any link, decoded as JSON
    pub fn sent(&self) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        for rx in self.outbound.lock().unwrap().iter_mut() {
            while let Ok(frame) = rx.try_recv() {
                frames.push(serde_json::from_str(&frame).unwrap());
            }
        }
        frames
    }
}

impl Transport for RecordingTransport {
    fn open(&mut self, url: &str, id: ConnectionId) -> Link {
        let (tx, rx) = mpsc::unbounded_channel();
        self.opened.lock().unwrap().push((url.to_string(), id));
        self.outbound.lock().unwrap().push(rx);
        Link::new(id, tx, None)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    scheduled: Arc<Mutex<Vec<(Duration, Event)>>>,
}

impl RecordingScheduler {
    /// Take all timers scheduled so far
    pub fn take(&self) -> Vec<(Duration, Event)> {
        std::mem::take(&mut *self.scheduled.lock().unwrap())
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule(&mut self, delay: Duration, event: Event) {
        self.scheduled.lock().unwrap().push((delay, event));
    }
}

/// Token store whose contents the test can inspect after handing it over
#[derive(Debug, Clone, Default)]
pub struct SharedTokenStore {
    token: Arc<Mutex<Option<String>>>,
}

impl SharedTokenStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Arc::new(Mutex::new(token.map(str::to_string))),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

impl TokenStore for SharedTokenStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.get())
    }

    fn save(&mut self, token: &str) -> Result<(), ClientError> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ClientError> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

pub const FIXED_NOW: i64 = 1_700_000_000_000;

/// Controller wired to recording doubles
pub struct Harness {
    pub controller: SessionController,
    pub view: RecordingView,
    pub transport: RecordingTransport,
    pub scheduler: RecordingScheduler,
    pub store: SharedTokenStore,
}

impl Harness {
    pub fn new(token: Option<&str>) -> Self {
        Self::with_config(token, ClientConfig::default())
    }

    pub fn with_config(token: Option<&str>, config: ClientConfig) -> Self {
        let store = SharedTokenStore::new(token);
        let mut harness = Self::with_store(Box::new(store.clone()), config);
        harness.store = store;
        harness
    }

    pub fn with_store(store: Box<dyn TokenStore>, config: ClientConfig) -> Self {
        let view = RecordingView::default();
        let transport = RecordingTransport::default();
        let scheduler = RecordingScheduler::default();
        let controller = SessionController::new(
            config,
            store,
            Box::new(view.clone()),
            Box::new(transport.clone()),
            Box::new(scheduler.clone()),
            Box::new(FixedClock::new(FIXED_NOW)),
        );
        Self {
            controller,
            view,
            transport,
            scheduler,
            store: SharedTokenStore::default(),
        }
    }

    /// Connect and deliver `Opened` for the new link
    pub fn open(&mut self) {
        self.controller.connect().unwrap();
        self.deliver(ConnectionEvent::Opened).unwrap();
    }

    /// Deliver a connection event for the current link
    pub fn deliver(&mut self, event: ConnectionEvent) -> Result<ControlFlow<()>, ClientError> {
        let id = self.controller.connection_id();
        self.controller.handle(Event::Connection { id, event })
    }

    /// Deliver an inbound JSON message on the current link
    pub fn receive(&mut self, message: serde_json::Value) {
        self.deliver(ConnectionEvent::Frame(message.to_string()))
            .unwrap();
    }

    pub fn input(&mut self, line: &str) -> ControlFlow<()> {
        self.controller
            .handle(Event::Input(line.to_string()))
            .unwrap()
    }

    /// Open, authenticate as `user`, and discard everything recorded so far
    pub fn authenticated(user: &str) -> Self {
        let mut harness = Self::new(Some("stored-token"));
        harness.open();
        harness.receive(serde_json::json!({"type": "authenticated", "username": user}));
        harness.transport.sent();
        harness.view.take();
        harness.scheduler.take();
        harness
    }
}
