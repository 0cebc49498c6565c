//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → handed to Bridge::new and the binaries
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the bridge reads it at start-up only
//! - All fields have defaults to allow minimal configs (or none at all)
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::BridgeConfig;
pub use schema::{
    BackoffStrategy, ConnectionConfig, DiscoveryConfig, EventsConfig, HttpConfig, ObservabilityConfig,
    RetryConfig, WebSocketConfig,
};
