//! Event channel: the service's WebSocket push feed.
//!
//! # Responsibilities
//! - Perform the authenticated handshake (self-signed certificate accepted)
//! - Send the subscription frame
//! - Run the receive loop that feeds decoded events into the router
//! - Emit the pre-shutdown event when the peer goes away

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, Stream, StreamExt};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};

use crate::client::ClientError;
use crate::config::BridgeConfig;
use crate::discovery::Credentials;
use crate::events::{decode_frame, subscribe_frame, Event, EventKind, FrameError};
use crate::observability::metrics;
use crate::routing::EventRouter;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the WebSocket to the service. The subscription is not sent yet.
pub async fn connect(config: &BridgeConfig, credentials: &Credentials) -> Result<WsStream, ClientError> {
    let scheme = if config.connection.tls { "wss" } else { "ws" };
    let url = format!("{}://{}:{}", scheme, config.connection.host, credentials.port);

    let mut request = url.as_str().into_client_request()?;
    let headers = request.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&credentials.auth_header(&config.connection.username))?,
    );

    let max_size = config.websocket.max_message_size;
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(max_size))
        .max_frame_size(Some(max_size));

    let connector = if config.connection.tls {
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()?;
        Connector::NativeTls(tls)
    } else {
        Connector::Plain
    };

    let (stream, response) = connect_async_tls_with_config(request, Some(ws_config), false, Some(connector)).await?;
    tracing::debug!(url = %url, status = %response.status(), "Event channel handshake complete");
    Ok(stream)
}

/// A subscribed event channel with its receive loop running.
pub struct EventChannel {
    sink: SplitSink<WsStream, Message>,
    task: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
}

impl EventChannel {
    /// Send the subscription on `stream`.
    ///
    /// Returns the write half and the read half ready for [`EventChannel::spawn`].
    pub async fn subscribe(
        stream: WsStream,
        subscription: &str,
    ) -> Result<(SplitSink<WsStream, Message>, futures_util::stream::SplitStream<WsStream>), ClientError> {
        let (mut sink, stream) = stream.split();
        let frame = subscribe_frame(subscription);
        sink.send(Message::text(frame)).await?;
        tracing::info!(subscription, "Subscribed to event channel");
        Ok((sink, stream))
    }

    /// Spawn the receive loop over `stream`.
    pub fn spawn<S>(
        sink: SplitSink<WsStream, Message>,
        stream: S,
        router: Arc<EventRouter>,
        shutdown_uri: String,
    ) -> Self
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin + Send + 'static,
    {
        let alive = Arc::new(AtomicBool::new(true));
        let closing = Arc::new(AtomicBool::new(false));
        metrics::record_event_channel_alive(true);

        let task = tokio::spawn(receive_loop(
            stream,
            router,
            shutdown_uri,
            Arc::clone(&alive),
            Arc::clone(&closing),
        ));

        Self {
            sink,
            task,
            alive,
            closing,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Close the socket and wait for the receive loop to exit.
    ///
    /// A loop that is still running after `timeout` is aborted. Returns
    /// true if the loop exited on its own. Call at most once.
    pub async fn close(&mut self, timeout: Duration) -> bool {
        self.closing.store(true, Ordering::SeqCst);
        let deadline = tokio::time::Instant::now() + timeout;

        match tokio::time::timeout_at(deadline, self.sink.close()).await {
            Ok(Err(e)) => tracing::debug!(error = %e, "Event channel close handshake failed"),
            Err(_) => tracing::debug!("Sending the close frame timed out"),
            Ok(Ok(())) => {}
        }

        let exited = match tokio::time::timeout_at(deadline, &mut self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Receive loop ended abnormally");
                true
            }
            Err(_) => {
                tracing::warn!(?timeout, "Receive loop did not exit in time, aborting");
                self.task.abort();
                false
            }
        };

        self.alive.store(false, Ordering::SeqCst);
        metrics::record_event_channel_alive(false);
        exited
    }

    /// True once the receive loop task has completed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        // No-op when the loop already finished.
        self.task.abort();
    }
}

/// Why the receive loop stopped reading.
enum LoopEnd {
    Closed,
    Transport(WsError),
    Frame(FrameError),
}

/// Read frames until the stream fails, ends, or delivers an undecodable frame.
///
/// Empty frames and non-event envelopes are skipped. When the loop ends
/// without a local close, `shutdown_uri` is dispatched as an Update.
pub(crate) async fn receive_loop<S>(
    mut stream: S,
    router: Arc<EventRouter>,
    shutdown_uri: String,
    alive: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
) where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    tracing::debug!("Receive loop started");

    let end = loop {
        let handled = match stream.next().await {
            Some(Ok(Message::Text(text))) => handle_frame(&router, text.as_str()),
            Some(Ok(Message::Binary(bytes))) => std::str::from_utf8(&bytes)
                .map_err(FrameError::from)
                .and_then(|text| handle_frame(&router, text)),
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!(?frame, "Event channel close frame received");
                Ok(())
            }
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => break LoopEnd::Transport(e),
            None => break LoopEnd::Closed,
        };
        if let Err(e) = handled {
            metrics::record_frame_rejected();
            break LoopEnd::Frame(e);
        }
    };

    let local = closing.load(Ordering::SeqCst);
    match (&end, local) {
        (_, true) => tracing::debug!("Event channel closed locally"),
        (LoopEnd::Transport(e), false) => tracing::error!(error = %e, "Event channel failed"),
        (LoopEnd::Frame(e), false) => tracing::error!(error = %e, "Undecodable frame on event channel"),
        (LoopEnd::Closed, false) => tracing::warn!("Event channel closed by peer"),
    }

    if !local {
        router.dispatch(Event::synthetic(shutdown_uri, EventKind::Update));
    }

    alive.store(false, Ordering::SeqCst);
    metrics::record_event_channel_alive(false);
    tracing::debug!("Receive loop exited");
}

fn handle_frame(router: &EventRouter, text: &str) -> Result<(), FrameError> {
    if text.is_empty() {
        tracing::info!("Got empty frame on event channel");
        return Ok(());
    }

    match decode_frame(text)? {
        Some(event) => {
            metrics::record_event_received();
            tracing::trace!(uri = event.uri(), kind = %event.kind(), "Event received");
            router.dispatch(event);
        }
        None => tracing::trace!("Ignoring non-event frame"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KindSet;
    use crate::routing::Handler;
    use futures_util::stream;
    use std::future::Future;
    use std::sync::Mutex;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    fn recording_router() -> (Arc<EventRouter>, mpsc::UnboundedReceiver<(String, EventKind)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let router = Arc::new(EventRouter::new());
        let handler = Handler::new(move |event: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((event.uri().to_string(), event.kind()));
                Ok(())
            }
        });
        router.register("/", KindSet::ALL, &handler).unwrap();
        (router, rx)
    }

    async fn run(frames: Vec<Result<Message, WsError>>, closing: bool) -> (Vec<(String, EventKind)>, bool) {
        let (router, mut rx) = recording_router();
        let alive = Arc::new(AtomicBool::new(true));
        receive_loop(
            stream::iter(frames),
            router,
            "/riotclient/pre-shutdown/begin".to_string(),
            Arc::clone(&alive),
            Arc::new(AtomicBool::new(closing)),
        )
        .await;

        let mut seen = Vec::new();
        while let Ok(Some(item)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
            seen.push(item);
        }
        (seen, alive.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_frames_are_dispatched_and_noise_skipped() {
        let frames = vec![
            Ok(Message::text("")),
            Ok(Message::text(r#"[0,"session-id",1,"server"]"#)),
            Ok(Message::text(r#"[8,"OnJsonApiEvent",{"uri":"/a","eventType":"Create","data":1}]"#)),
            Ok(Message::Ping(Vec::new().into())),
            Ok(Message::binary(
                br#"[8,"OnJsonApiEvent",{"uri":"/b","eventType":"Delete","data":null}]"#.to_vec(),
            )),
        ];
        let (seen, alive) = run(frames, false).await;

        assert!(!alive);
        assert!(seen.contains(&("/a".to_string(), EventKind::Create)));
        assert!(seen.contains(&("/b".to_string(), EventKind::Delete)));
        // Stream ended without a local close.
        assert!(seen.contains(&("/riotclient/pre-shutdown/begin".to_string(), EventKind::Update)));
        assert_eq!(seen.len(), 3);
    }

    async fn run_until_exit(first: Message) -> (Vec<(String, EventKind)>, bool) {
        let (router, mut rx) = recording_router();
        let alive = Arc::new(AtomicBool::new(true));
        let frames = vec![
            Ok(first),
            Ok(Message::text(r#"[8,"OnJsonApiEvent",{"uri":"/after","eventType":"Update","data":{}}]"#)),
        ];
        // The peer never hangs up, so only the bad frame can end the loop.
        let stream = stream::iter(frames).chain(stream::pending());

        tokio::time::timeout(
            Duration::from_secs(1),
            receive_loop(
                stream,
                router,
                "/riotclient/pre-shutdown/begin".to_string(),
                Arc::clone(&alive),
                Arc::new(AtomicBool::new(false)),
            ),
        )
        .await
        .expect("receive loop exited");

        let mut seen = Vec::new();
        while let Ok(Some(item)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
            seen.push(item);
        }
        (seen, alive.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_undecodable_frame_ends_loop() {
        let (seen, alive) = run_until_exit(Message::text("{not json")).await;
        assert!(!alive);
        assert_eq!(seen, vec![("/riotclient/pre-shutdown/begin".to_string(), EventKind::Update)]);

        let (seen, alive) = run_until_exit(Message::text(r#"[8,"OnJsonApiEvent",{"uri":"/x","eventType":"All"}]"#)).await;
        assert!(!alive);
        assert_eq!(seen, vec![("/riotclient/pre-shutdown/begin".to_string(), EventKind::Update)]);

        let (seen, alive) = run_until_exit(Message::binary(vec![0xff, 0xfe])).await;
        assert!(!alive);
        assert_eq!(seen, vec![("/riotclient/pre-shutdown/begin".to_string(), EventKind::Update)]);
    }

    #[tokio::test]
    async fn test_read_error_emits_pre_shutdown() {
        let frames = vec![
            Ok(Message::text(r#"[8,"OnJsonApiEvent",{"uri":"/a","eventType":"Update","data":{}}]"#)),
            Err(WsError::ConnectionClosed),
            Ok(Message::text(r#"[8,"OnJsonApiEvent",{"uri":"/never","eventType":"Update","data":{}}]"#)),
        ];
        let (seen, alive) = run(frames, false).await;

        assert!(!alive);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], ("/riotclient/pre-shutdown/begin".to_string(), EventKind::Update));
    }

    #[tokio::test]
    async fn test_local_close_is_silent() {
        let (seen, alive) = run(vec![Err(WsError::ConnectionClosed)], true).await;
        assert!(!alive);
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_slow_handler_does_not_block_loop() {
        let router = Arc::new(EventRouter::new());
        let finished = Arc::new(Mutex::new(Vec::new()));
        let gate = Arc::new(tokio::sync::Notify::new());

        let slow = {
            let gate = Arc::clone(&gate);
            let finished = Arc::clone(&finished);
            Handler::new(move |event: Event| {
                let gate = Arc::clone(&gate);
                let finished = Arc::clone(&finished);
                async move {
                    gate.notified().await;
                    finished.lock().unwrap().push(event.uri().to_string());
                    Ok(())
                }
            })
        };
        router.register("/slow", KindSet::ALL, &slow).unwrap();

        let frames = vec![
            Ok(Message::text(r#"[8,"OnJsonApiEvent",{"uri":"/slow","eventType":"Update","data":1}]"#)),
            Ok(Message::text(r#"[8,"OnJsonApiEvent",{"uri":"/slow","eventType":"Update","data":2}]"#)),
        ];
        let alive = Arc::new(AtomicBool::new(true));
        // Completes even though no handler has finished.
        tokio::time::timeout(
            Duration::from_secs(1),
            receive_loop(
                stream::iter(frames),
                Arc::clone(&router),
                "/shutdown".to_string(),
                Arc::clone(&alive),
                Arc::new(AtomicBool::new(true)),
            ),
        )
        .await
        .unwrap();
        assert!(finished.lock().unwrap().is_empty());

        // Let both handlers park on the gate before opening it.
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_waiters();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(finished.lock().unwrap().len(), 2);
    }

    async fn local_channel<F, Fut>(peer: F) -> EventChannel
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            peer(ws).await;
        });

        let mut config = BridgeConfig::default();
        config.connection.tls = false;
        let credentials = Credentials {
            port,
            token: "tok".to_string(),
        };
        let stream = connect(&config, &credentials).await.unwrap();
        let (sink, stream) = EventChannel::subscribe(stream, "OnJsonApiEvent").await.unwrap();
        EventChannel::spawn(sink, stream, Arc::new(EventRouter::new()), "/shutdown".to_string())
    }

    #[tokio::test]
    async fn test_close_waits_for_receive_loop() {
        let mut channel = local_channel(|mut ws| async move {
            // Reading answers the close handshake.
            while let Some(Ok(_)) = ws.next().await {}
        })
        .await;
        assert!(channel.is_alive());
        assert!(!channel.is_finished());

        assert!(channel.close(Duration::from_secs(5)).await);
        assert!(channel.is_finished());
        assert!(!channel.is_alive());
    }

    #[tokio::test]
    async fn test_close_aborts_loop_when_peer_is_silent() {
        let mut channel = local_channel(|ws| async move {
            // Never reads, so the close frame is never answered.
            std::future::pending::<()>().await;
            drop(ws);
        })
        .await;

        let started = tokio::time::Instant::now();
        assert!(!channel.close(Duration::from_millis(50)).await);
        assert!(started.elapsed() < Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(channel.is_finished());
        assert!(!channel.is_alive());
    }
}
