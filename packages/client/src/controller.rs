//! Session controller.
//!
//! Owns the connection handle, the session state, the status line and the
//! view. Every input (socket events, timer expiries, typed lines) arrives as
//! an [`Event`] on a single loop, so no state here is shared or locked.

use std::ops::ControlFlow;

use tsudoi_shared::time::{Clock, format_local_hh_mm};

use crate::{
    auth::{AuthMode, validate_login, validate_registration},
    config::{ClientConfig, resolve_gateway_url},
    error::ClientError,
    event::{ConnectionEvent, ConnectionId, Event, Scheduler},
    input::{Command, parse_command},
    protocol::{ClientMessage, ItemData, ListItem, ServerMessage},
    session::{RoomName, Session},
    status::{StatusKind, StatusLine, StatusTicket},
    token_store::TokenStore,
    transport::{Link, Transport},
    view::{RenderedMessage, View, escape_text},
};

/// Lifecycle of the single gateway connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Absent,
    Connecting,
    Open,
    Closed,
}

/// What the user currently sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Connected or connecting, waiting for an auth verdict
    Blank,
    Auth(AuthMode),
    Chat,
}

pub struct SessionController {
    config: ClientConfig,
    session: Session,
    state: ConnectionState,
    link: Option<Link>,
    connection_id: ConnectionId,
    reconnect_pending: bool,
    /// Consecutive attempts that closed before opening
    failed_attempts: u32,
    screen: Screen,
    status: StatusLine,
    store: Box<dyn TokenStore>,
    view: Box<dyn View>,
    transport: Box<dyn Transport>,
    scheduler: Box<dyn Scheduler>,
    clock: Box<dyn Clock>,
}

impl SessionController {
    /// Create a controller, restoring the token from `store`.
    ///
    /// Nothing is connected until [`SessionController::connect`] is called.
    pub fn new(
        config: ClientConfig,
        store: Box<dyn TokenStore>,
        view: Box<dyn View>,
        transport: Box<dyn Transport>,
        scheduler: Box<dyn Scheduler>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to load stored token: {}", e);
                None
            }
        };

        Self {
            config,
            session: Session::with_token(token),
            state: ConnectionState::Absent,
            link: None,
            connection_id: ConnectionId::default(),
            reconnect_pending: false,
            failed_attempts: 0,
            screen: Screen::Blank,
            status: StatusLine::new(),
            store,
            view,
            transport,
            scheduler,
            clock,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Handle one event from the loop.
    ///
    /// Returns `Break` when the user asked to quit. Errors are per-event and
    /// leave the controller usable, except [`ClientError::ReconnectExhausted`].
    pub fn handle(&mut self, event: Event) -> Result<ControlFlow<()>, ClientError> {
        match event {
            Event::Connection { id, event } => self.on_connection_event(id, event)?,
            Event::Input(line) => return Ok(self.on_input(&line)),
            Event::StatusExpired(ticket) => self.on_status_expired(ticket),
            Event::ReconnectDue => self.on_reconnect_due()?,
            Event::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    // ========================================
    // Connection manager
    // ========================================

    /// Open a new connection, replacing the current one if any
    pub fn connect(&mut self) -> Result<(), ClientError> {
        if let Some(previous) = self.link.take() {
            tracing::debug!("Replacing connection {:?}", previous.id());
        }

        let url = resolve_gateway_url(&self.config, self.session.token.as_deref())?;
        let mut shown = url.clone();
        shown.set_query(None);
        tracing::info!(
            "Connecting to {} ({})",
            shown,
            if self.session.token.is_some() {
                "with stored token"
            } else {
                "no stored token"
            }
        );

        self.connection_id = self.connection_id.next();
        self.state = ConnectionState::Connecting;
        self.link = Some(self.transport.open(url.as_str(), self.connection_id));
        Ok(())
    }

    fn on_connection_event(
        &mut self,
        id: ConnectionId,
        event: ConnectionEvent,
    ) -> Result<(), ClientError> {
        if id != self.connection_id {
            tracing::debug!("Ignoring {:?} from replaced connection {:?}", event, id);
            return Ok(());
        }

        match event {
            ConnectionEvent::Opened => self.on_open(),
            ConnectionEvent::Frame(text) => {
                tracing::debug!("Received message: {}", text);
                let message = ServerMessage::decode(&text)?;
                self.dispatch(message);
            }
            ConnectionEvent::TransportError(e) => {
                tracing::warn!("WebSocket error: {}", e);
            }
            ConnectionEvent::Closed => self.on_close()?,
        }
        Ok(())
    }

    fn on_open(&mut self) {
        tracing::info!("Connected to gateway");
        self.state = ConnectionState::Open;
        self.failed_attempts = 0;

        if self.session.token.is_some() {
            tracing::info!("Token exists, waiting for server auth response");
        } else {
            self.show_auth(AuthMode::Login);
        }
    }

    fn on_close(&mut self) -> Result<(), ClientError> {
        tracing::info!("Disconnected from gateway");
        if self.state == ConnectionState::Connecting {
            self.failed_attempts += 1;
        }
        self.state = ConnectionState::Closed;
        self.link = None;
        // The token survives: it is what the next attempt authenticates with.
        self.session.current_user = None;

        if self.reconnect_pending {
            tracing::debug!("Reconnect already scheduled");
            return Ok(());
        }
        if !self.config.reconnect.should_attempt(self.failed_attempts) {
            tracing::error!(
                "Failed to reconnect after {} attempts. Giving up.",
                self.failed_attempts
            );
            return Err(ClientError::ReconnectExhausted(self.failed_attempts));
        }

        self.reconnect_pending = true;
        tracing::info!(
            "Reconnecting in {} ms",
            self.config.reconnect.interval.as_millis()
        );
        self.scheduler
            .schedule(self.config.reconnect.interval, Event::ReconnectDue);
        Ok(())
    }

    fn on_reconnect_due(&mut self) -> Result<(), ClientError> {
        self.reconnect_pending = false;
        self.connect()
    }

    fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        let link = match (&self.link, self.state) {
            (Some(link), ConnectionState::Open) => link,
            _ => return Err(ClientError::NotConnected),
        };
        let frame = message.to_json()?;
        link.send(frame).map_err(ClientError::Connection)
    }

    fn send_or_log(&self, message: ClientMessage) {
        if let Err(e) = self.send(message) {
            tracing::warn!("Failed to send message: {}", e);
        }
    }

    // ========================================
    // Protocol dispatcher
    // ========================================

    fn dispatch(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Registered => {
                self.set_status("Registration successful! Please login.", StatusKind::Success);
            }
            ServerMessage::Authenticated { username, token } => {
                self.on_authenticated(username, token);
            }
            ServerMessage::LatestResult { items } => {
                if self.screen != Screen::Chat {
                    tracing::debug!("History received outside the chat view, ignoring");
                    return;
                }
                self.view.clear_messages();
                for item in &items {
                    self.render_item(item);
                }
            }
            ServerMessage::Appended { list, item } => {
                if self.screen == Screen::Chat && list == self.session.current_room.messages_list()
                {
                    self.render_item(&item);
                } else {
                    tracing::debug!("Not rendering append to '{}'", list);
                }
            }
            ServerMessage::Error { message } => {
                tracing::warn!(
                    "Authentication error ({}), clearing token",
                    message.as_deref().unwrap_or("no details")
                );
                self.clear_token();
                self.session.current_user = None;
                self.show_auth(AuthMode::Login);
                if let Some(message) = message {
                    self.set_status(escape_text(&message), StatusKind::Error);
                }
            }
            ServerMessage::Unknown => {
                tracing::debug!("Ignoring unknown message kind");
            }
        }
    }

    fn on_authenticated(&mut self, username: String, token: Option<String>) {
        tracing::info!("Authenticated as '{}'", username);
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if let Err(e) = self.store.save(&token) {
                tracing::warn!("Failed to persist token: {}", e);
            }
            self.session.token = Some(token);
        }
        self.session.current_user = Some(username);
        self.session.current_room = RoomName::default();

        self.screen = Screen::Chat;
        self.status.reset();
        self.render_chat_view();
        self.join_room(RoomName::default());
    }

    fn render_item(&mut self, item: &ListItem) {
        let own = self.session.is_own(item.owner.as_deref());
        let timestamp = format_local_hh_mm(self.clock.now_millis());
        match RenderedMessage::from_item(item, own, timestamp) {
            Some(message) => self.view.append_message(&message),
            None => tracing::debug!("Skipping non-message item"),
        }
    }

    // ========================================
    // Auth forms
    // ========================================

    fn show_auth(&mut self, mode: AuthMode) {
        self.screen = Screen::Auth(mode);
        self.status.reset();
        self.view.show_auth(mode);
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        let text = text.into();
        if let Some(ticket) = self.status.set(text.clone(), kind) {
            self.scheduler
                .schedule(self.config.status_clear_delay, Event::StatusExpired(ticket));
        }
        self.view.show_status(&text, kind);
    }

    fn on_status_expired(&mut self, ticket: StatusTicket) {
        if self.status.expire(ticket) {
            self.view.clear_status();
        }
    }

    fn submit_login(&mut self, username: &str, password: &str) {
        match validate_login(username, password) {
            Ok(credentials) => {
                self.set_status("Logging in...", StatusKind::Loading);
                self.send_or_log(ClientMessage::login(
                    credentials.username,
                    credentials.password,
                ));
            }
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    fn submit_registration(&mut self, username: &str, password: &str) {
        match validate_registration(username, password) {
            Ok(credentials) => {
                self.set_status("Registering...", StatusKind::Loading);
                self.send_or_log(ClientMessage::register(
                    credentials.username,
                    credentials.password,
                ));
            }
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    // ========================================
    // Chat view
    // ========================================

    fn render_chat_view(&mut self) {
        let user = self.session.current_user.clone().unwrap_or_default();
        self.view
            .show_chat(&self.session.current_room, &escape_text(&user));
    }

    /// Request the room's recent history and announce the join
    fn join_room(&mut self, room: RoomName) {
        self.session.current_room = room;
        let room = &self.session.current_room;

        self.send_or_log(ClientMessage::get_latest(
            room.messages_list(),
            self.config.history_count,
        ));

        match &self.session.current_user {
            Some(user) => self.send_or_log(ClientMessage::append(
                room.members_list(),
                ItemData::Join {
                    username: user.clone(),
                    joined_at: self.clock.now_millis(),
                },
            )),
            None => tracing::warn!("Joining '{}' without an identity", room),
        }
    }

    fn announce_leave(&self) {
        if self.state != ConnectionState::Open {
            return;
        }
        if let Some(user) = &self.session.current_user {
            self.send_or_log(ClientMessage::append(
                self.session.current_room.members_list(),
                ItemData::Leave {
                    username: user.clone(),
                    left_at: self.clock.now_millis(),
                },
            ));
        }
    }

    fn switch_room(&mut self, room: RoomName) {
        if room != self.session.current_room {
            self.announce_leave();
        }
        self.session.current_room = room.clone();
        self.render_chat_view();
        self.join_room(room);
    }

    fn send_chat(&mut self, text: &str) {
        let message = text.trim();
        if message.is_empty() {
            return;
        }
        self.send_or_log(ClientMessage::append(
            self.session.current_room.messages_list(),
            ItemData::Message {
                message: message.to_string(),
            },
        ));
    }

    /// Leave the room, forget the credential and return to the login form
    pub fn logout(&mut self) {
        self.announce_leave();
        self.clear_token();
        self.session.reset();
        self.show_auth(AuthMode::Login);
    }

    fn clear_token(&mut self) {
        self.session.token = None;
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to remove stored token: {}", e);
        }
    }

    // ========================================
    // Input
    // ========================================

    fn on_input(&mut self, line: &str) -> ControlFlow<()> {
        let in_chat = self.screen == Screen::Chat;

        match parse_command(line) {
            Command::Quit => return ControlFlow::Break(()),
            Command::ShowLogin | Command::ShowRegister | Command::Login { .. } | Command::Register { .. }
                if in_chat =>
            {
                self.set_status("Already logged in. Use /logout first", StatusKind::Error);
            }
            Command::ShowLogin => self.show_auth(AuthMode::Login),
            Command::ShowRegister => self.show_auth(AuthMode::Register),
            Command::Login { username, password } => self.submit_login(&username, &password),
            Command::Register { username, password } => {
                self.submit_registration(&username, &password)
            }
            Command::Join(name) => {
                if !in_chat {
                    self.set_status("Please login first", StatusKind::Error);
                    return ControlFlow::Continue(());
                }
                match RoomName::new(name) {
                    Ok(room) => self.switch_room(room),
                    Err(e) => self.set_status(e.to_string(), StatusKind::Error),
                }
            }
            Command::Logout => self.logout(),
            Command::Help => match self.screen {
                Screen::Chat => self.render_chat_view(),
                Screen::Auth(mode) => self.view.show_auth(mode),
                Screen::Blank => tracing::info!("Waiting for the gateway"),
            },
            Command::Say(text) => {
                if in_chat {
                    self.send_chat(&text);
                } else if !text.trim().is_empty() {
                    self.set_status(
                        "Please login first (/login <username> <password>)",
                        StatusKind::Error,
                    );
                }
            }
            Command::Unknown(name) => {
                self.set_status(format!("Unknown command: /{}", name), StatusKind::Error);
            }
        }
        ControlFlow::Continue(())
    }
}
