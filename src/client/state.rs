//! Bridge connection state machine.
//!
//! # State Transitions
//! ```text
//! Stopped → Connecting: start() called, discovery running
//! Connecting → HttpReady: request channel answered the probe
//! HttpReady → WsReady: event channel open, subscription sent
//! WsReady → Running: receive loop spawned, start event emitted
//! Running → Stopping → Stopped: stop() called
//! ```

use std::fmt;

/// Lifecycle state of a [`Bridge`](crate::client::Bridge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Stopped,
    Connecting,
    HttpReady,
    WsReady,
    Running,
    Stopping,
}

impl ConnectionState {
    /// Returns true once the request channel is usable.
    pub fn is_http_ready(&self) -> bool {
        matches!(
            self,
            ConnectionState::HttpReady | ConnectionState::WsReady | ConnectionState::Running
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Stopped => "stopped",
            ConnectionState::Connecting => "connecting",
            ConnectionState::HttpReady => "http-ready",
            ConnectionState::WsReady => "ws-ready",
            ConnectionState::Running => "running",
            ConnectionState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}
