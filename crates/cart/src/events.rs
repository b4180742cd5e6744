//! Cross-component add-to-cart triggers.
//!
//! Listing surfaces outside the cart's own subtree (product grids, quick
//! order forms) need to trigger a bulk add without holding a reference to
//! the store. [`AddToCartEvents`] is an explicit registry scoped to the
//! store's lifetime - created alongside it, dropped with it - replacing the
//! process-global bus this pattern is usually built on.
//!
//! Semantics are single-handler: `register` replaces whatever handler was
//! active before, so re-registering on every change of the handler's
//! captured state is cheap and leaves exactly one receiver.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use tidepool_core::RegionId;

use crate::types::BulkAddItem;

/// Payload for an add-to-cart trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToCartPayload {
    /// Variants and quantities to add.
    pub items: Vec<BulkAddItem>,
    /// Region the dispatching surface priced against.
    pub region_id: RegionId,
}

/// Boxed async handler invoked per dispatch.
pub type AddToCartHandler =
    Arc<dyn Fn(AddToCartPayload) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Registry holding the single active add-to-cart handler.
#[derive(Default)]
pub struct AddToCartEvents {
    handler: Mutex<Option<AddToCartHandler>>,
}

impl AddToCartEvents {
    /// An empty registry with no handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler, replacing any previously registered one.
    pub fn register<F, Fut>(&self, handler: F)
    where
        F: Fn(AddToCartPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: AddToCartHandler = Arc::new(move |payload| Box::pin(handler(payload)));
        *self.lock() = Some(boxed);
    }

    /// Remove the active handler.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Whether a handler is currently registered.
    #[must_use]
    pub fn has_handler(&self) -> bool {
        self.lock().is_some()
    }

    /// Invoke the active handler with the payload.
    ///
    /// Returns `false` when no handler is registered, so dispatchers can
    /// fall back (e.g. to a direct store call). The handler future is
    /// awaited outside the registry lock; a handler may re-register safely.
    pub async fn dispatch(&self, payload: AddToCartPayload) -> bool {
        let handler = self.lock().clone();
        match handler {
            Some(handler) => {
                handler(payload).await;
                true
            }
            None => {
                tracing::debug!("add-to-cart dispatch with no registered handler");
                false
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<AddToCartHandler>> {
        // A panicked handler registration cannot leave partial state behind;
        // take the guard even if the lock is poisoned.
        self.handler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload() -> AddToCartPayload {
        AddToCartPayload {
            items: Vec::new(),
            region_id: RegionId::new("reg_1"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_without_handler_reports_false() {
        let events = AddToCartEvents::new();
        assert!(!events.dispatch(payload()).await);
    }

    #[tokio::test]
    async fn test_dispatch_invokes_handler() {
        let events = AddToCartEvents::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&calls);
        events.register(move |_payload| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert!(events.dispatch(payload()).await);
        assert!(events.dispatch(payload()).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_register_replaces_previous_handler() {
        let events = AddToCartEvents::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&first);
        events.register(move |_payload| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        let seen = Arc::clone(&second);
        events.register(move |_payload| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        events.dispatch(payload()).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_removes_handler() {
        let events = AddToCartEvents::new();
        events.register(|_payload| async {});
        assert!(events.has_handler());

        events.clear();
        assert!(!events.has_handler());
        assert!(!events.dispatch(payload()).await);
    }
}
