//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: uri, kind, state, error)
//!     → metrics.rs (counters, gauges)
//!
//! Binaries consume:
//!     → logging.rs (install subscriber: pretty or JSON)
//!     → metrics.rs (optional Prometheus endpoint)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
