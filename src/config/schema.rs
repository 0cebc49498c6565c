//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// How to find the target process.
    pub discovery: DiscoveryConfig,

    /// Host, scheme and credentials shared by both channels.
    pub connection: ConnectionConfig,

    /// Request channel settings.
    pub http: HttpConfig,

    /// Event channel settings.
    pub websocket: WebSocketConfig,

    /// Sentinel URIs for synthetic lifecycle events.
    pub events: EventsConfig,

    /// Delay policy for the discovery and probe retry loops.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Process discovery configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Executable names to look for, in order of preference.
    pub process_names: Vec<String>,

    /// Delay between discovery attempts in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            process_names: vec!["LeagueClientUx.exe".to_string(), "LeagueClientUx".to_string()],
            retry_delay_ms: 500,
        }
    }
}

/// Connection settings shared by the request and event channels.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Host the service listens on.
    pub host: String,

    /// Basic-auth username paired with the discovered token.
    pub username: String,

    /// Use `https`/`wss` (with certificate checks disabled). When false the
    /// bridge speaks plain `http`/`ws`.
    pub tls: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            username: "riot".to_string(),
            tls: true,
        }
    }
}

/// Request channel configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Known-good path probed until the service answers.
    pub probe_path: String,

    /// Delay between refused probe attempts in milliseconds.
    pub probe_retry_delay_ms: u64,

    /// Optional per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            probe_path: "/riotclient/ux-state".to_string(),
            probe_retry_delay_ms: 500,
            request_timeout_secs: None,
        }
    }
}

/// Event channel configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Maximum message and frame size in bytes.
    pub max_message_size: usize,

    /// Subscription requested right after the handshake.
    pub subscription: String,

    /// How long `stop()` waits for the receive task after closing, in milliseconds.
    pub close_timeout_ms: u64,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: 10 * 1024 * 1024,
            subscription: "OnJsonApiEvent".to_string(),
            close_timeout_ms: 5000,
        }
    }
}

/// URIs of the synthetic events emitted by the bridge itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Emitted once `start()` reaches `Running`.
    pub start_uri: String,

    /// Emitted when the event channel ends without a local `stop()`.
    pub shutdown_uri: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            start_uri: "/moonblade/start".to_string(),
            shutdown_uri: "/riotclient/pre-shutdown/begin".to_string(),
        }
    }
}

/// Retry delay strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Always wait the configured delay.
    #[default]
    Fixed,
    /// Double the delay each attempt, capped at `max_delay_ms`, with jitter.
    Exponential,
}

/// Retry configuration for the start-up loops.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub strategy: BackoffStrategy,

    /// Cap for the exponential strategy in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Fixed,
            max_delay_ms: 5000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
