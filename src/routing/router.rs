//! Handler registry and dispatch.
//!
//! # Responsibilities
//! - Store registrations in registration order
//! - Merge re-registrations of the same (route, handler) pair
//! - Remove kinds, and drop entries whose kind set becomes empty
//! - Match events and spawn every matching handler
//!
//! # Design Decisions
//! - A single `std::sync::Mutex` guards the registry; it is never held across an await
//! - Dispatch clones the matching handlers out of the lock, then spawns them
//! - Handler failures are logged inside the handler's own task

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::events::{Event, EventKind, KindSet, ParseKindError};
use crate::observability::metrics;
use crate::routing::handler::{Handler, HandlerResult};
use crate::routing::route::Route;

/// Errors returned synchronously by registration and synthesis calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("invalid route '{route}': {reason}")]
    InvalidRoute { route: String, reason: &'static str },

    #[error(transparent)]
    InvalidEventKind(#[from] ParseKindError),
}

#[derive(Debug)]
struct Registration {
    route: Route,
    kinds: KindSet,
    handler: Handler,
}

/// The registry mapping routes and event kinds to handlers.
///
/// Shared as `Arc<EventRouter>` between the caller (who registers handlers)
/// and the bridge (which dispatches events).
#[derive(Debug, Default)]
pub struct EventRouter {
    registry: Mutex<Vec<Registration>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for `kinds` on `route`.
    ///
    /// An empty kind set means every kind. Registering a handler again on the
    /// same route widens its kind set instead of adding a second entry.
    pub fn register(&self, route: &str, kinds: KindSet, handler: &Handler) -> Result<(), RouterError> {
        let route = Route::new(route)?;
        let kinds = normalize(kinds);

        let mut registry = self.registry();
        match registry
            .iter_mut()
            .find(|entry| entry.route == route && entry.handler == *handler)
        {
            Some(entry) => {
                entry.kinds = entry.kinds.union(kinds);
                tracing::debug!(route = %route, kinds = ?entry.kinds, handler = ?handler, "Merged handler registration");
            }
            None => {
                tracing::debug!(route = %route, kinds = ?kinds, handler = ?handler, "Registered handler");
                registry.push(Registration {
                    route,
                    kinds,
                    handler: handler.clone(),
                });
            }
        }
        Ok(())
    }

    /// Like [`register`](Self::register), with kinds given by name
    /// (`"Update"`, `"all"`, ...).
    pub fn register_named<I, S>(&self, route: &str, kinds: I, handler: &Handler) -> Result<(), RouterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kinds = KindSet::parse(kinds)?;
        self.register(route, kinds, handler)
    }

    /// Remove `kinds` from the entries on `route`.
    ///
    /// With `handler == None` every handler on the route is affected. Entries
    /// left without kinds are deleted. Returns the number of deleted entries;
    /// nothing matching is not an error.
    pub fn unregister(&self, route: &str, kinds: KindSet, handler: Option<&Handler>) -> usize {
        let kinds = normalize(kinds);
        let mut registry = self.registry();
        let before = registry.len();

        registry.retain_mut(|entry| {
            if entry.route.as_str() != route || handler.is_some_and(|h| *h != entry.handler) {
                return true;
            }
            entry.kinds = entry.kinds.difference(kinds);
            !entry.kinds.is_empty()
        });

        let removed = before - registry.len();
        if removed > 0 {
            tracing::debug!(route, removed, "Removed handler registrations");
        }
        removed
    }

    /// Handlers that would receive `event`, in registration order.
    fn matching(&self, event: &Event) -> Vec<Handler> {
        self.registry()
            .iter()
            .filter(|entry| entry.kinds.contains(event.kind()) && entry.route.matches(event.uri()))
            .map(|entry| entry.handler.clone())
            .collect()
    }

    /// Schedule every matching handler as an independent task.
    ///
    /// Returns as soon as the handlers are spawned. The join handles may be
    /// dropped; each task logs its own failure. Must be called from within a
    /// Tokio runtime.
    pub fn dispatch(&self, event: Event) -> Vec<JoinHandle<HandlerResult>> {
        let handlers = self.matching(&event);
        if handlers.is_empty() {
            tracing::trace!(uri = %event.uri(), kind = %event.kind(), "No handler for event");
            return Vec::new();
        }

        metrics::record_event_dispatched(handlers.len());
        handlers
            .into_iter()
            .map(|handler| {
                let event = event.clone();
                tokio::spawn(async move {
                    let uri = event.uri().to_string();
                    let result = handler.call(event).await;
                    if let Err(e) = &result {
                        metrics::record_handler_failure();
                        tracing::warn!(uri = %uri, handler = ?handler, error = %e, "Event handler failed");
                    }
                    result
                })
            })
            .collect()
    }

    /// Build an event locally and dispatch it as if it came from the wire.
    pub fn synthesize(
        &self,
        payload: Option<Value>,
        kind: &str,
        uri: &str,
    ) -> Result<Vec<JoinHandle<HandlerResult>>, RouterError> {
        let kind: EventKind = kind.parse()?;
        Ok(self.dispatch(Event::new(uri, kind, payload)))
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }

    /// Kinds currently registered for `handler` on `route`, if any.
    pub fn kinds_for(&self, route: &str, handler: &Handler) -> Option<KindSet> {
        self.registry()
            .iter()
            .find(|entry| entry.route.as_str() == route && entry.handler == *handler)
            .map(|entry| entry.kinds)
    }

    /// Remove every registration.
    pub fn clear(&self) {
        self.registry().clear();
    }
}

fn normalize(kinds: KindSet) -> KindSet {
    if kinds.is_empty() {
        KindSet::ALL
    } else {
        kinds
    }
}
