//! Event routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (any time):
//!     register(route, kinds, handler)
//!     → route.rs (validate, classify exact vs prefix)
//!     → router.rs (append, or union kinds into the existing (route, handler) entry)
//!
//! Dispatch (per event):
//!     Event { uri, kind }
//!     → router.rs (snapshot matching handlers under the registry lock)
//!     → handler.rs (each handler spawned as its own task)
//! ```
//!
//! # Design Decisions
//! - One registry, one lock: dispatch decisions never see a half-applied change
//! - Registration order is dispatch order; execution is concurrent
//! - No regex, prefix matching only, O(n) scan over a small registry
//! - Handler identity is pointer identity of the shared handler

pub mod handler;
pub mod route;
pub mod router;

pub use handler::{EventHandler, Handler, HandlerError, HandlerResult};
pub use route::Route;
pub use router::{EventRouter, RouterError};
