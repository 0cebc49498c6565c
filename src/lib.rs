//! Bridge to the League client's local API.
//!
//! Finds the running client process, reads its port and auth token from the
//! command line, then keeps two channels open: a request channel (HTTPS) for
//! calls into the API and an event channel (WSS) whose push events are routed
//! to registered handlers by URI and event kind.
//!
//! ```text
//!   process table ──▶ discovery ──▶ credentials
//!                                       │
//!                       ┌───────────────┴───────────────┐
//!                       ▼                               ▼
//!               request channel                   event channel
//!              (client::http)                  (client::websocket)
//!                       │                               │ frames
//!                 Bridge::request                 events::decode_frame
//!                                                       │ Event
//!                                                       ▼
//!                                         routing::EventRouter::dispatch
//!                                                       │ one task per handler
//!                                                       ▼
//!                                                   handlers
//! ```

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use client::{Bridge, ClientError, ConnectionState, RequestOptions};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use events::{Event, EventKind, KindSet};
pub use routing::{EventHandler, EventRouter, Handler, HandlerResult};
