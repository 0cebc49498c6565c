//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Start-up loops (discovery, HTTP probe):
//!     attempt fails (process missing, connection refused)
//!     → backoff.rs (delay for this attempt)
//!     → retry, without an upper bound
//! ```
//!
//! # Design Decisions
//! - Fixed delay by default; exponential with jitter is opt-in
//! - No internal deadline: callers cancel by dropping the start future

pub mod backoff;

pub use backoff::Backoff;
