//! Handler abstraction.
//!
//! Any `Fn(Event) -> impl Future<Output = HandlerResult>` is a handler, as is
//! any type implementing [`EventHandler`] directly (for handlers that carry
//! state and want to be registered from an `Arc` they also keep elsewhere).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::events::Event;

/// Error type handlers may fail with.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// Boxed future returned by [`EventHandler::handle`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Asynchronous event callback.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: Event) -> HandlerFuture;
}

impl<F, Fut> EventHandler for F
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, event: Event) -> HandlerFuture {
        Box::pin(self(event))
    }
}

/// A shareable handler with identity.
///
/// Clones compare equal; two separately constructed handlers never do, even if
/// they wrap the same function. Keep a clone to unregister later.
#[derive(Clone)]
pub struct Handler(Arc<dyn EventHandler>);

impl Handler {
    pub fn new(handler: impl EventHandler) -> Self {
        Self(Arc::new(handler))
    }

    /// Address-based identifier, stable for the lifetime of the handler.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn call(&self, event: Event) -> HandlerFuture {
        self.0.handle(event)
    }
}

impl<T: EventHandler> From<Arc<T>> for Handler {
    fn from(handler: Arc<T>) -> Self {
        Self(handler)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:#x})", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn noop(_event: Event) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn test_handler_identity() {
        let a = Handler::new(noop);
        let b = Handler::new(noop);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    struct Counter(AtomicUsize);

    impl EventHandler for Counter {
        fn handle(&self, _event: Event) -> HandlerFuture {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_stateful_handler_from_arc() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let handler = Handler::from(Arc::clone(&counter));
        assert_eq!(handler, Handler::from(Arc::clone(&counter)));

        handler.call(Event::synthetic("/x", EventKind::Update)).await.unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
