//! Lifecycle manager tying discovery, both channels and the router together.

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::client::http::{RequestChannel, RequestOptions};
use crate::client::state::ConnectionState;
use crate::client::websocket::{self, EventChannel};
use crate::client::ClientError;
use crate::config::BridgeConfig;
use crate::discovery::{Credentials, ProcessLocator, SystemLocator};
use crate::events::{Event, EventKind};
use crate::observability::metrics;
use crate::resilience::Backoff;
use crate::routing::EventRouter;

/// The service instance the bridge is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub pid: u32,
    pub port: u16,
    credentials: Credentials,
}

impl Session {
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Connects to the local service and streams its events into an [`EventRouter`].
///
/// ```no_run
/// # async fn demo() -> Result<(), lcu_bridge::client::ClientError> {
/// use std::sync::Arc;
/// use lcu_bridge::{Bridge, BridgeConfig, EventRouter};
///
/// let router = Arc::new(EventRouter::new());
/// let mut bridge = Bridge::new(BridgeConfig::default(), router);
/// bridge.start().await?;
/// bridge.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Bridge {
    config: BridgeConfig,
    router: Arc<EventRouter>,
    locator: Arc<dyn ProcessLocator>,
    state: ConnectionState,
    session: Option<Session>,
    http: Option<RequestChannel>,
    ws: Option<EventChannel>,
}

impl Bridge {
    /// Bridge that finds the service by scanning the process table.
    pub fn new(config: BridgeConfig, router: Arc<EventRouter>) -> Self {
        let locator = Arc::new(SystemLocator::new(config.discovery.process_names.clone()));
        Self::with_locator(config, router, locator)
    }

    pub fn with_locator(config: BridgeConfig, router: Arc<EventRouter>, locator: Arc<dyn ProcessLocator>) -> Self {
        Self {
            config,
            router,
            locator,
            state: ConnectionState::Stopped,
            session: None,
            http: None,
            ws: None,
        }
    }

    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Current state. A running bridge whose receive loop has ended reports
    /// `HttpReady`: requests still work, events no longer arrive.
    pub fn state(&self) -> ConnectionState {
        if self.state == ConnectionState::Running && !self.is_event_channel_alive() {
            return ConnectionState::HttpReady;
        }
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_http_alive(&self) -> bool {
        self.http.is_some()
    }

    /// False once the receive loop has exited, even before `stop`.
    pub fn is_event_channel_alive(&self) -> bool {
        self.ws.as_ref().is_some_and(EventChannel::is_alive)
    }

    /// Discover the service, open both channels and emit the start event.
    ///
    /// Waits indefinitely for the process and for the request channel to
    /// accept connections. Channels that are already alive are left alone,
    /// so calling this again after the event channel died reconnects it.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        tracing::info!("Starting bridge");
        self.set_state(ConnectionState::Connecting);

        let credentials = self.discover().await;

        if let Err(e) = self.start_http(&credentials).await {
            tracing::error!(error = %e, "Request channel failed to start");
            self.session = None;
            self.set_state(ConnectionState::Stopped);
            return Err(e);
        }
        self.set_state(ConnectionState::HttpReady);

        if let Err(e) = self.start_ws(&credentials).await {
            tracing::error!(error = %e, "Event channel failed to start");
            return Err(e);
        }

        self.set_state(ConnectionState::Running);
        self.router
            .dispatch(Event::synthetic(self.config.events.start_uri.clone(), EventKind::Update));
        tracing::info!("Bridge started");
        Ok(())
    }

    /// Close both channels. Safe to call at any time, including twice.
    pub async fn stop(&mut self) {
        if self.state == ConnectionState::Stopped && self.http.is_none() && self.ws.is_none() {
            tracing::debug!("Bridge already stopped");
            return;
        }

        tracing::info!("Stopping bridge");
        self.set_state(ConnectionState::Stopping);

        if self.http.take().is_some() {
            tracing::info!("Request channel closed");
        }

        if let Some(mut ws) = self.ws.take() {
            let timeout = Duration::from_millis(self.config.websocket.close_timeout_ms);
            if !ws.close(timeout).await {
                tracing::warn!("Receive loop was aborted");
            }
            tracing::info!("Event channel closed");
        }

        self.session = None;
        self.set_state(ConnectionState::Stopped);
    }

    /// Send a request over the request channel.
    pub async fn request(&self, method: Method, uri: &str, options: RequestOptions) -> Result<Response, ClientError> {
        self.request_channel()?.request(method, uri, options).await
    }

    /// Send a request and decode its JSON response.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        uri: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        self.request_channel()?.request_json(method, uri, options).await
    }

    fn request_channel(&self) -> Result<&RequestChannel, ClientError> {
        self.http.as_ref().ok_or(ClientError::NotConnected("request channel"))
    }

    async fn discover(&mut self) -> Credentials {
        let backoff = Backoff::from_config(&self.config.retry, self.config.discovery.retry_delay_ms);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            metrics::record_connect_attempt("discovery");

            let locator = Arc::clone(&self.locator);
            let found = match tokio::task::spawn_blocking(move || locator.locate()).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(error = %e, "Process lookup task failed");
                    None
                }
            };

            match found {
                Some(process) => match Credentials::from_args(&process.parsed_args()) {
                    Ok(credentials) => {
                        tracing::info!(pid = process.pid, port = credentials.port, "Found target process");
                        self.session = Some(Session {
                            pid: process.pid,
                            port: credentials.port,
                            credentials: credentials.clone(),
                        });
                        return credentials;
                    }
                    Err(e) => {
                        tracing::warn!(pid = process.pid, error = %e, "Target process has an incomplete command line, retrying");
                    }
                },
                None if attempt == 1 => tracing::warn!("Target process not running, waiting for it"),
                None => tracing::debug!(attempt, "Target process still not running"),
            }

            backoff.wait(attempt).await;
        }
    }

    async fn start_http(&mut self, credentials: &Credentials) -> Result<(), ClientError> {
        if self.http.is_some() {
            tracing::warn!("Request channel already open, skipping");
            return Ok(());
        }

        let channel = RequestChannel::open(&self.config, credentials)?;
        let backoff = Backoff::from_config(&self.config.retry, self.config.http.probe_retry_delay_ms);
        channel.probe(&self.config.http.probe_path, &backoff).await?;
        self.http = Some(channel);
        Ok(())
    }

    async fn start_ws(&mut self, credentials: &Credentials) -> Result<(), ClientError> {
        if self.is_event_channel_alive() {
            tracing::warn!("Event channel already open, skipping");
            return Ok(());
        }
        // A dead channel from an earlier run is discarded.
        self.ws = None;

        metrics::record_connect_attempt("event_channel");
        let stream = websocket::connect(&self.config, credentials).await?;
        let (sink, stream) = EventChannel::subscribe(stream, &self.config.websocket.subscription).await?;
        self.set_state(ConnectionState::WsReady);

        self.ws = Some(EventChannel::spawn(
            sink,
            stream,
            Arc::clone(&self.router),
            self.config.events.shutdown_uri.clone(),
        ));
        Ok(())
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "Bridge state changed");
            self.state = next;
        }
    }
}
