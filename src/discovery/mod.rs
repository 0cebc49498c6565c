//! Target process discovery subsystem.
//!
//! # Data Flow
//! ```text
//! process.rs  (scan OS process table by executable name)
//!     → ProcessHandle { pid, name, args }
//!     → args.rs (--key=value pairs)
//!     → credentials.rs (port + token → Credentials, Basic auth header)
//! ```
//!
//! # Design Decisions
//! - Lookup sits behind the `ProcessLocator` trait so the bridge can be driven
//!   against a fake process in tests
//! - Everything here is stateless; retrying is the bridge's job

pub mod args;
pub mod credentials;
pub mod process;

use thiserror::Error;

pub use args::parse_args;
pub use credentials::{build_basic_auth, Credentials};
pub use process::{ProcessHandle, ProcessLocator, StaticLocator, SystemLocator};

/// Errors turning a discovered process into connection credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("missing command-line argument --{0}")]
    MissingArgument(&'static str),

    #[error("invalid port '{0}'")]
    InvalidPort(String),
}
