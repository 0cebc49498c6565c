//! Process lifecycle for the binaries.
//!
//! # Data Flow
//! ```text
//! SIGINT/SIGTERM (signals.rs) ──┐
//!                               ├→ Shutdown::trigger → main loop → Bridge::stop
//! pre-shutdown event (handler) ─┘
//! ```
//!
//! # Design Decisions
//! - First trigger wins; the reason is reported once
//! - A second signal while stopping is not intercepted, so the default
//!   handler terminates the process

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownReason};
pub use signals::wait_for_signal;
