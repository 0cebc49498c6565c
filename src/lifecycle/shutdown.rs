//! Shutdown coordination.

use std::fmt;
use tokio::sync::watch;

/// Why the process is going down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or SIGTERM.
    Signal,
    /// The service announced it is shutting down.
    ServiceExit,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal => f.write_str("signal"),
            ShutdownReason::ServiceExit => f.write_str("service exit"),
        }
    }
}

/// One-shot shutdown latch shared between signal handling and event handlers.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<Option<ShutdownReason>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Request shutdown. Returns false if it was already requested.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        })
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn triggered(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            if rx.changed().await.is_err() {
                // Sender lives in `self`, so this cannot close while we wait.
                return ShutdownReason::Signal;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
