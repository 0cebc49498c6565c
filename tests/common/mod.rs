//! Shared utilities for integration tests: a mock League client.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use lcu_bridge::discovery::{build_basic_auth, StaticLocator};
use lcu_bridge::routing::HandlerError;
use lcu_bridge::{BridgeConfig, Event, Handler};

pub const TOKEN: &str = "test-token";

/// Behaviour of the mock.
#[derive(Clone)]
pub struct MockOptions {
    /// Status returned by the probe path.
    pub probe_status: StatusCode,
    /// Frames pushed right after the subscription arrives.
    pub frames: Vec<String>,
    /// Close the first event channel connection after pushing the frames.
    pub close_first_connection: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            probe_status: StatusCode::OK,
            frames: Vec::new(),
            close_first_connection: false,
        }
    }
}

struct MockState {
    options: MockOptions,
    auth: String,
    subscriptions: Mutex<Vec<String>>,
    connections: AtomicUsize,
}

/// Handle to a running mock.
pub struct MockClient {
    pub port: u16,
    state: Arc<MockState>,
}

impl MockClient {
    pub fn locator(&self) -> Arc<StaticLocator> {
        Arc::new(StaticLocator::from_credentials(self.port, TOKEN))
    }

    /// Frames received on the event channel, in order.
    pub fn subscriptions(&self) -> Vec<String> {
        self.state.subscriptions.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }
}

/// Start the mock on an ephemeral port.
pub async fn start_mock_client(options: MockOptions) -> MockClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    serve(listener, options)
}

/// Start the mock on a fixed port.
pub async fn start_mock_client_on(port: u16, options: MockOptions) -> MockClient {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await.unwrap();
    serve(listener, options)
}

/// A port with nothing listening on it (at the time of the call).
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn serve(listener: TcpListener, options: MockOptions) -> MockClient {
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(MockState {
        options,
        auth: build_basic_auth("riot", TOKEN),
        subscriptions: Mutex::new(Vec::new()),
        connections: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/", get(event_channel))
        .route("/riotclient/ux-state", get(probe))
        .route("/lol-summoner/v1/current-summoner", get(current_summoner))
        .route("/echo", post(echo))
        .with_state(Arc::clone(&state));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockClient { port, state }
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == state.auth)
}

async fn probe(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    (state.options.probe_status, Json(json!("ShowMain"))).into_response()
}

async fn current_summoner(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"displayName": "Tester", "summonerLevel": 30})).into_response()
}

async fn echo(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let query: serde_json::Map<String, Value> = query.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
    Json(json!({"body": body, "query": query})).into_response()
}

async fn event_channel(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| push_events(socket, state))
}

async fn push_events(mut socket: WebSocket, state: Arc<MockState>) {
    let connection = state.connections.fetch_add(1, Ordering::SeqCst) + 1;

    // Nothing is pushed before the subscription.
    match socket.recv().await {
        Some(Ok(Message::Text(text))) => state.subscriptions.lock().unwrap().push(text.as_str().to_string()),
        _ => return,
    }

    for frame in &state.options.frames {
        if socket.send(Message::Text(frame.clone().into())).await.is_err() {
            return;
        }
    }

    if state.options.close_first_connection && connection == 1 {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    // Hold the connection until the bridge closes it.
    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            state.subscriptions.lock().unwrap().push(text.as_str().to_string());
        }
    }
}

/// Config pointing at the mock: plain transports, short retry delays.
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.connection.tls = false;
    config.discovery.retry_delay_ms = 10;
    config.http.probe_retry_delay_ms = 20;
    config.websocket.close_timeout_ms = 1000;
    config
}

/// A handler forwarding every event it sees into a channel.
pub fn recording_handler() -> (Handler, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = Handler::new(move |event: Event| {
        let tx = tx.clone();
        async move {
            tx.send(event)?;
            Ok::<(), HandlerError>(())
        }
    });
    (handler, rx)
}

/// Wait for an event on `uri`, discarding others.
pub async fn wait_for_uri(rx: &mut mpsc::UnboundedReceiver<Event>, uri: &str) -> Option<Event> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            if event.uri() == uri {
                return Some(event);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Collect whatever arrives within `window`.
pub async fn drain(rx: &mut mpsc::UnboundedReceiver<Event>, window: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(window, rx.recv()).await {
        events.push(event);
    }
    events
}

pub fn event_frame(uri: &str, kind: &str, data: Value) -> String {
    json!([8, "OnJsonApiEvent", {"uri": uri, "eventType": kind, "data": data}]).to_string()
}
