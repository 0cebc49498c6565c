//! Crate-level error type.

use thiserror::Error;

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::events::FrameError;
use crate::routing::RouterError;

/// Any error surfaced by the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
