//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (delays > 0, sizes > 0)
//! - Check that URIs and paths are absolute
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.discovery.process_names.iter().all(|name| name.trim().is_empty()) {
        errors.push(ValidationError::new(
            "discovery.process_names",
            "at least one process name is required",
        ));
    }
    if config.discovery.retry_delay_ms == 0 {
        errors.push(ValidationError::new("discovery.retry_delay_ms", "must be greater than 0"));
    }

    if config.connection.host.trim().is_empty() {
        errors.push(ValidationError::new("connection.host", "cannot be empty"));
    }
    if config.connection.username.is_empty() {
        errors.push(ValidationError::new("connection.username", "cannot be empty"));
    }

    check_absolute(&mut errors, "http.probe_path", &config.http.probe_path);
    if config.http.probe_retry_delay_ms == 0 {
        errors.push(ValidationError::new("http.probe_retry_delay_ms", "must be greater than 0"));
    }
    if config.http.request_timeout_secs == Some(0) {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
    }

    if config.websocket.max_message_size == 0 {
        errors.push(ValidationError::new("websocket.max_message_size", "must be greater than 0"));
    }
    if config.websocket.subscription.is_empty() {
        errors.push(ValidationError::new("websocket.subscription", "cannot be empty"));
    }

    check_absolute(&mut errors, "events.start_uri", &config.events.start_uri);
    check_absolute(&mut errors, "events.shutdown_uri", &config.events.shutdown_uri);

    if config.retry.max_delay_ms == 0 {
        errors.push(ValidationError::new("retry.max_delay_ms", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_absolute(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::new(field, format!("'{}' must start with '/'", value)));
    }
}
