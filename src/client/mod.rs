//! Connection lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Bridge::start()
//!     → discovery (ProcessLocator, retried with backoff)
//!     → http.rs (open reqwest client, probe until reachable)
//!     → websocket.rs (handshake, subscribe, spawn receive loop)
//!     → router.dispatch(start event)
//!
//! Receive loop (own task):
//!     frame → events::decode_frame → router.dispatch (handlers spawned, never awaited)
//!     read error / remote close → pre-shutdown event → loop exits
//!
//! Bridge::stop()
//!     → drop request channel
//!     → close event channel, wait for receive loop
//! ```
//!
//! # Design Decisions
//! - `start`/`stop` take `&mut self`, so lifecycle calls cannot interleave
//! - Retry loops have no deadline; cancel by dropping the `start` future
//! - The receive loop never restarts itself; call `start` again to reconnect

pub mod bridge;
pub mod http;
pub mod state;
pub mod websocket;

use thiserror::Error;

pub use bridge::{Bridge, Session};
pub use http::{RequestChannel, RequestOptions};
pub use state::ConnectionState;

/// Errors raised by the request and event channels.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} is not open")]
    NotConnected(&'static str),
}
