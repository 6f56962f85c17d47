//! End-to-end tests of the session controller against an in-process stub gateway.

use std::{
    ops::ControlFlow,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tsudoi_client::{
    SessionController,
    auth::AuthMode,
    config::ClientConfig,
    controller::{ConnectionState, Screen},
    event::{Event, TokioScheduler},
    reconnect::ReconnectPolicy,
    session::RoomName,
    status::StatusKind,
    token_store::{FileTokenStore, MemoryTokenStore, TokenStore},
    transport::WebSocketTransport,
    view::{RenderedMessage, View},
};
use tsudoi_shared::time::SystemClock;
use url::Url;

const VALID_TOKEN: &str = "valid-token";
const ISSUED_TOKEN: &str = "issued-token";

// ========================================
// Stub gateway
// ========================================

#[derive(Clone)]
struct GatewayState {
    frames: mpsc::UnboundedSender<String>,
    connections: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
    drop_first: bool,
}

#[derive(Deserialize)]
struct ConnectQuery {
    token: Option<String>,
}

struct Gateway {
    url: String,
    frames: mpsc::UnboundedReceiver<String>,
    connections: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
}

async fn start_gateway(drop_first: bool) -> Gateway {
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let state = GatewayState {
        frames: frames_tx,
        connections: Arc::new(AtomicUsize::new(0)),
        tokens: Arc::new(Mutex::new(Vec::new())),
        drop_first,
    };
    let connections = state.connections.clone();
    let tokens = state.tokens.clone();

    let app = Router::new()
        .route("/", get(gateway_handler))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Gateway {
        url: format!("ws://{}", addr),
        frames: frames_rx,
        connections,
        tokens,
    }
}

async fn gateway_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<ConnectQuery>,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    let index = state.connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| serve_socket(socket, query.token, index, state))
}

async fn send_json(socket: &mut WebSocket, value: Value) -> bool {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .is_ok()
}

async fn serve_socket(
    mut socket: WebSocket,
    token: Option<String>,
    index: usize,
    state: GatewayState,
) {
    state.tokens.lock().unwrap().push(token.clone());

    if state.drop_first && index == 0 {
        socket.send(Message::Close(None)).await.ok();
        return;
    }

    if token.as_deref() == Some(VALID_TOKEN)
        && !send_json(
            &mut socket,
            json!({"type": "authenticated", "username": "alice"}),
        )
        .await
    {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let request: Value = serde_json::from_str(text.as_str()).unwrap();
        state.frames.send(text.to_string()).ok();

        let reply = match request["type"].as_str() {
            Some("login") => json!({
                "type": "authenticated",
                "username": request["username"],
                "token": ISSUED_TOKEN
            }),
            Some("list:getLatest") => json!({
                "type": "list:latestResult",
                "list": request["list"],
                "items": [
                    {"data": {"type": "message", "message": "earlier"}, "owner": "bob"}
                ]
            }),
            _ => continue,
        };
        if !send_json(&mut socket, reply).await {
            return;
        }
    }
}

// ========================================
// Client side
// ========================================

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Auth(AuthMode),
    Chat(String, String),
    Cleared,
    Message(RenderedMessage),
    Status(String, StatusKind),
}

#[derive(Clone, Default)]
struct SharedView(Arc<Mutex<Vec<Seen>>>);

impl SharedView {
    fn seen(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }
}

impl View for SharedView {
    fn show_auth(&mut self, mode: AuthMode) {
        self.0.lock().unwrap().push(Seen::Auth(mode));
    }

    fn show_chat(&mut self, room: &RoomName, user: &str) {
        self.0
            .lock()
            .unwrap()
            .push(Seen::Chat(room.to_string(), user.to_string()));
    }

    fn clear_messages(&mut self) {
        self.0.lock().unwrap().push(Seen::Cleared);
    }

    fn append_message(&mut self, message: &RenderedMessage) {
        self.0.lock().unwrap().push(Seen::Message(message.clone()));
    }

    fn show_status(&mut self, text: &str, kind: StatusKind) {
        self.0
            .lock()
            .unwrap()
            .push(Seen::Status(text.to_string(), kind));
    }

    fn clear_status(&mut self) {}
}

struct Client {
    controller: SessionController,
    events: mpsc::UnboundedReceiver<Event>,
    view: SharedView,
}

fn start_client(gateway_url: &str, store: Box<dyn TokenStore>) -> Client {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let view = SharedView::default();
    let config = ClientConfig {
        gateway_override: Some(Url::parse(gateway_url).unwrap()),
        reconnect: ReconnectPolicy::new(Duration::from_millis(50), Some(10)),
        ..ClientConfig::default()
    };
    let mut controller = SessionController::new(
        config,
        store,
        Box::new(view.clone()),
        Box::new(WebSocketTransport::new(events_tx.clone())),
        Box::new(TokioScheduler::new(events_tx)),
        Box::new(SystemClock),
    );
    controller.connect().unwrap();
    Client {
        controller,
        events: events_rx,
        view,
    }
}

impl Client {
    /// Pump events until `done` holds, collecting frames seen by the gateway
    async fn run_until(
        &mut self,
        gateway: &mut Gateway,
        frames: &mut Vec<Value>,
        done: impl Fn(&SessionController, &[Value]) -> bool,
    ) {
        let deadline = tokio::time::sleep(Duration::from_secs(5));
        tokio::pin!(deadline);

        while !done(&self.controller, frames.as_slice()) {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    let flow = self.controller.handle(event).unwrap();
                    assert_eq!(flow, ControlFlow::Continue(()));
                }
                Some(frame) = gateway.frames.recv() => {
                    frames.push(serde_json::from_str(&frame).unwrap());
                }
                _ = &mut deadline => panic!("timed out; frames so far: {:?}", frames),
            }
        }
    }
}

#[tokio::test]
async fn test_stored_token_joins_default_room() {
    // テスト項目: 保存済みトークンで接続すると認証後に global ルームへ参加する
    // given (前提条件):
    let mut gateway = start_gateway(false).await;
    let store = MemoryTokenStore::new(Some(VALID_TOKEN.to_string()));
    let mut client = start_client(&gateway.url, Box::new(store));
    let mut frames = Vec::new();

    // when (操作):
    client
        .run_until(&mut gateway, &mut frames, |_, frames| frames.len() >= 2)
        .await;

    // then (期待する結果):
    assert_eq!(
        gateway.tokens.lock().unwrap().clone(),
        vec![Some(VALID_TOKEN.to_string())]
    );
    assert_eq!(frames[0]["type"], "list:getLatest");
    assert_eq!(frames[0]["list"], "chat/global/messages");
    assert_eq!(frames[0]["count"], 50);
    assert_eq!(frames[1]["type"], "list:append");
    assert_eq!(frames[1]["list"], "chat/global/members");
    assert_eq!(frames[1]["item"]["data"]["username"], "alice");
    assert_eq!(client.controller.screen(), Screen::Chat);
    assert_eq!(
        client.view.seen()[0],
        Seen::Chat("global".to_string(), "alice".to_string())
    );
}

#[tokio::test]
async fn test_login_persists_issued_token_and_loads_history() {
    // テスト項目: ログイン成功で発行トークンがファイルに保存され、履歴が表示される
    // given (前提条件):
    let mut gateway = start_gateway(false).await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    let mut client = start_client(&gateway.url, Box::new(FileTokenStore::new(&token_path)));
    let mut frames = Vec::new();
    client
        .run_until(&mut gateway, &mut frames, |controller, _| {
            controller.screen() == Screen::Auth(AuthMode::Login)
        })
        .await;

    // when (操作):
    client
        .controller
        .handle(Event::Input("/login alice secret1".to_string()))
        .unwrap();
    client
        .run_until(&mut gateway, &mut frames, |_, frames| frames.len() >= 3)
        .await;
    let view = client.view.clone();
    client
        .run_until(&mut gateway, &mut frames, move |_, _| {
            view.seen().iter().any(|s| matches!(s, Seen::Message(_)))
        })
        .await;

    // then (期待する結果):
    assert_eq!(frames[0]["type"], "login");
    assert_eq!(frames[0]["persistent"], true);
    assert_eq!(
        std::fs::read_to_string(&token_path).unwrap(),
        ISSUED_TOKEN
    );
    let seen = client.view.seen();
    let cleared_at = seen.iter().position(|s| *s == Seen::Cleared).unwrap();
    let Seen::Message(message) = &seen[cleared_at + 1] else {
        panic!("expected a message after the pane was cleared: {:?}", seen);
    };
    assert_eq!(message.sender.as_deref(), Some("bob"));
    assert_eq!(message.content, "earlier");
}

#[tokio::test]
async fn test_dropped_connection_is_reestablished() {
    // テスト項目: ゲートウェイに切断されても一定間隔後に再接続される
    // given (前提条件):
    let mut gateway = start_gateway(true).await;
    let mut client = start_client(&gateway.url, Box::new(MemoryTokenStore::default()));
    let mut frames = Vec::new();
    let connections = gateway.connections.clone();
    let tokens = gateway.tokens.clone();

    // when (操作):
    client
        .run_until(&mut gateway, &mut frames, move |controller, _| {
            connections.load(Ordering::SeqCst) >= 2
                && tokens.lock().unwrap().len() >= 2
                && controller.connection_state() == ConnectionState::Open
        })
        .await;

    // then (期待する結果):
    assert_eq!(gateway.tokens.lock().unwrap().clone(), vec![None, None]);
    assert_eq!(
        client.controller.screen(),
        Screen::Auth(AuthMode::Login)
    );
}
