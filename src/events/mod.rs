//! Event model subsystem.
//!
//! # Data Flow
//! ```text
//! WebSocket text frame
//!     → wire.rs (decode [code, subscription, body] envelope)
//!     → event.rs (immutable Event { uri, kind, payload })
//!     → routing (dispatch to matching handlers)
//!
//! Lifecycle milestones
//!     → Event::synthetic(uri, kind)
//!     → routing (same dispatch path as wire events)
//! ```
//!
//! # Design Decisions
//! - Event kinds are a closed enum, parsed case-insensitively
//! - Kind filters are a bitmask so membership is a single AND
//! - Envelopes that are not `Event` messages decode to `None`, not an error

pub mod event;
pub mod kind;
pub mod wire;

pub use event::Event;
pub use kind::{EventKind, KindSet, ParseKindError};
pub use wire::{decode_frame, subscribe_frame, unsubscribe_frame, EventCode, FrameError};
