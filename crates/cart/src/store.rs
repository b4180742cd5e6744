//! The optimistic cart store.
//!
//! Holds the working cart between backend confirmations. Every mutating
//! operation follows the same protocol:
//!
//! 1. take the state lock, deep-copy a snapshot of the working cart,
//! 2. apply the mutation synchronously and recompute the subtotal,
//! 3. release the lock and dispatch exactly one backend call,
//! 4. on rejection, restore the working cart from *this operation's own*
//!    snapshot and emit an error notification.
//!
//! Step 2 completes before the first await point, so consumers never
//! observe a partially applied mutation and mutations apply in the order
//! their triggering actions occur even when confirmations race. Restoring
//! an operation's own snapshot keeps the effects of operations that applied
//! before it; a later authoritative [`refresh`](CartStore::refresh)
//! reconverges everything.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tidepool_core::{LineItemId, Price};
use tracing::{debug, warn};

use crate::backend::CartBackend;
use crate::events::AddToCartEvents;
use crate::notify::{Notification, NotificationSink};
use crate::types::{BulkAddItem, Cart, CartLine, CartLineInput};

/// Optimistic cart store.
///
/// Cheaply cloneable via `Arc`; the working cart is owned exclusively by
/// the store and consumers only ever read copies.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: Mutex<Cart>,
    backend: Arc<dyn CartBackend>,
    notifier: Arc<dyn NotificationSink>,
}

impl CartStore {
    /// Create a store over an authoritative cart.
    #[must_use]
    pub fn new(
        cart: Cart,
        backend: Arc<dyn CartBackend>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                state: Mutex::new(cart),
                backend,
                notifier,
            }),
        }
    }

    /// Replace the working cart with fresh authoritative data.
    ///
    /// Supersedes any optimistic state still pending from earlier
    /// mutations; in-flight calls cannot be canceled, but their failure
    /// handlers restore snapshots that the next refresh overwrites again.
    pub fn refresh(&self, cart: Cart) {
        debug!(cart_id = %cart.id, "refreshing cart from authoritative data");
        *self.lock_state() = cart;
    }

    /// An independent copy of the working cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.lock_state().clone()
    }

    /// The line items ordered for display (most recently created first).
    #[must_use]
    pub fn line_items(&self) -> Vec<CartLine> {
        self.lock_state().sorted_lines()
    }

    /// The current cart subtotal.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lock_state().subtotal
    }

    /// Add variants to the cart in bulk.
    ///
    /// Each variant merges into an existing line for the same variant
    /// (confirmed or optimistic) or becomes a new provisional line under an
    /// optimistic ID. The backend call carries the real variant IDs and the
    /// cart's country context. On rejection the cart reverts to its state
    /// at the start of this call.
    pub async fn add_lines_bulk(&self, items: Vec<BulkAddItem>) {
        if items.is_empty() {
            return;
        }

        let (snapshot, cart_id, country_code) = {
            let mut cart = self.lock_state();
            let snapshot = cart.clone();
            let now = Utc::now();
            let currency_code = cart.currency_code;

            for item in &items {
                match cart.find_line_by_variant_mut(&item.variant.id) {
                    Some(line) => {
                        let merged = line.quantity + item.quantity;
                        line.set_quantity(merged);
                    }
                    None => cart.push_line(CartLine::optimistic(
                        &item.variant,
                        item.quantity,
                        currency_code,
                        now,
                    )),
                }
            }
            cart.recompute_subtotal();

            (snapshot, cart.id.clone(), cart.country_code.clone())
        };

        let lines: Vec<CartLineInput> = items
            .iter()
            .map(|item| CartLineInput {
                variant_id: item.variant.id.clone(),
                quantity: item.quantity,
            })
            .collect();

        debug!(cart_id = %cart_id, lines = lines.len(), "dispatching bulk add");
        match self
            .inner
            .backend
            .add_lines_bulk(&cart_id, lines, &country_code)
            .await
        {
            Ok(()) => {
                self.inner
                    .notifier
                    .notify(Notification::success("Added to cart"));
            }
            Err(err) => {
                warn!(cart_id = %cart_id, error = %err, "bulk add rejected, reverting");
                self.revert_to(snapshot);
                self.inner
                    .notifier
                    .notify(Notification::error("Could not add items to cart"));
            }
        }
    }

    /// Delete a line item.
    ///
    /// A missing ID is a silent no-op. On rejection the cart reverts to its
    /// state at the start of this call.
    pub async fn delete_line(&self, line_id: &LineItemId) {
        let (snapshot, cart_id) = {
            let mut cart = self.lock_state();
            if !cart.contains_line(line_id) {
                return;
            }
            let snapshot = cart.clone();
            cart.remove_line(line_id);
            cart.recompute_subtotal();
            (snapshot, cart.id.clone())
        };

        debug!(cart_id = %cart_id, line_id = %line_id, "dispatching line delete");
        if let Err(err) = self.inner.backend.delete_line(&cart_id, line_id).await {
            warn!(cart_id = %cart_id, line_id = %line_id, error = %err, "delete rejected, reverting");
            self.revert_to(snapshot);
            self.inner
                .notifier
                .notify(Notification::error("Could not remove item from cart"));
        }
    }

    /// Set a line item's quantity; 0 removes the line.
    ///
    /// A missing ID is a silent no-op. The backend call is issued only for
    /// IDs the backend has confirmed: an optimistic line has no server-side
    /// counterpart to update yet, so the mutation stays local until the
    /// pending add settles. Revert applies only when a call was issued.
    pub async fn update_line_quantity(&self, line_id: &LineItemId, quantity: u32) {
        let (snapshot, cart_id) = {
            let mut cart = self.lock_state();
            if !cart.contains_line(line_id) {
                return;
            }
            let snapshot = cart.clone();
            if quantity == 0 {
                cart.remove_line(line_id);
            } else if let Some(line) = cart.lines.iter_mut().find(|line| &line.id == line_id) {
                line.set_quantity(quantity);
            }
            cart.recompute_subtotal();
            (snapshot, cart.id.clone())
        };

        if line_id.is_optimistic() {
            debug!(line_id = %line_id, "line not confirmed yet, skipping remote update");
            return;
        }

        debug!(cart_id = %cart_id, line_id = %line_id, quantity, "dispatching quantity update");
        if let Err(err) = self
            .inner
            .backend
            .update_line(&cart_id, line_id, quantity)
            .await
        {
            warn!(cart_id = %cart_id, line_id = %line_id, error = %err, "update rejected, reverting");
            self.revert_to(snapshot);
            self.inner
                .notifier
                .notify(Notification::error("Could not update item quantity"));
        }
    }

    /// Register this store's bulk add as the active add-to-cart handler.
    ///
    /// Call again after the store identity changes (e.g. a new cart) to
    /// replace the previous registration.
    pub fn register_on(&self, events: &AddToCartEvents) {
        let store = self.clone();
        events.register(move |payload| {
            let store = store.clone();
            async move {
                debug!(region_id = %payload.region_id, "add-to-cart event received");
                store.add_lines_bulk(payload.items).await;
            }
        });
    }

    fn revert_to(&self, snapshot: Cart) {
        *self.lock_state() = snapshot;
    }

    fn lock_state(&self) -> MutexGuard<'_, Cart> {
        // Mutations leave the cart internally consistent at every point; a
        // poisoned lock still holds a usable cart.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::notify::NotificationKind;
    use crate::types::ProductVariant;
    use async_trait::async_trait;
    use rust_decimal::dec;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tidepool_core::{CartId, CurrencyCode, RegionId, VariantId};

    /// Records backend calls; each operation can be switched to fail.
    #[derive(Default)]
    struct StubBackend {
        fail_add: AtomicBool,
        fail_update: AtomicBool,
        fail_delete: AtomicBool,
        calls: Mutex<Vec<String>>,
    }

    impl StubBackend {
        fn record(&self, call: String) {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl CartBackend for StubBackend {
        async fn add_lines_bulk(
            &self,
            _cart_id: &CartId,
            lines: Vec<CartLineInput>,
            country_code: &str,
        ) -> Result<(), BackendError> {
            let summary = lines
                .iter()
                .map(|l| format!("{}x{}", l.variant_id, l.quantity))
                .collect::<Vec<_>>()
                .join(",");
            self.record(format!("add[{summary}]@{country_code}"));
            if self.fail_add.load(Ordering::SeqCst) {
                return Err(BackendError::new("add rejected"));
            }
            Ok(())
        }

        async fn update_line(
            &self,
            _cart_id: &CartId,
            line_id: &LineItemId,
            quantity: u32,
        ) -> Result<(), BackendError> {
            self.record(format!("update[{line_id}={quantity}]"));
            if self.fail_update.load(Ordering::SeqCst) {
                return Err(BackendError::new("update rejected"));
            }
            Ok(())
        }

        async fn delete_line(
            &self,
            _cart_id: &CartId,
            line_id: &LineItemId,
        ) -> Result<(), BackendError> {
            self.record(format!("delete[{line_id}]"));
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(BackendError::new("delete rejected"));
            }
            Ok(())
        }
    }

    /// Collects notifications for assertions.
    #[derive(Default)]
    struct RecordingSink {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        fn kinds(&self) -> Vec<NotificationKind> {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|n| n.kind)
                .collect()
        }
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, notification: Notification) {
            self.notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification);
        }
    }

    fn variant(id: &str, amount: rust_decimal::Decimal) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            title: format!("Variant {id}"),
            sku: None,
            calculated_price: Some(Price::new(amount, CurrencyCode::USD)),
            product: None,
        }
    }

    fn empty_cart() -> Cart {
        Cart::empty(
            CartId::new("cart_1"),
            RegionId::new("reg_us"),
            "us",
            CurrencyCode::USD,
        )
    }

    fn store_with(
        cart: Cart,
    ) -> (CartStore, Arc<StubBackend>, Arc<RecordingSink>) {
        let backend = Arc::new(StubBackend::default());
        let sink = Arc::new(RecordingSink::default());
        let store = CartStore::new(
            cart,
            Arc::clone(&backend) as Arc<dyn CartBackend>,
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
        );
        (store, backend, sink)
    }

    #[tokio::test]
    async fn test_bulk_add_merges_duplicate_variant() {
        let (store, backend, _sink) = store_with(empty_cart());

        store
            .add_lines_bulk(vec![BulkAddItem {
                variant: variant("v1", dec!(50)),
                quantity: 2,
            }])
            .await;
        store
            .add_lines_bulk(vec![BulkAddItem {
                variant: variant("v1", dec!(50)),
                quantity: 3,
            }])
            .await;

        let cart = store.snapshot();
        assert_eq!(cart.lines.len(), 1);
        let line = &cart.lines[0];
        assert_eq!(line.quantity, 5);
        assert_eq!(line.id.as_str(), "__optimistic__-v1");
        assert_eq!(cart.subtotal.amount, dec!(250));

        // Both backend calls carried the variant ID, not the optimistic ID.
        assert_eq!(backend.calls(), vec!["add[v1x2]@us", "add[v1x3]@us"]);
    }

    #[tokio::test]
    async fn test_bulk_add_empty_is_noop() {
        let (store, backend, _sink) = store_with(empty_cart());
        store.add_lines_bulk(Vec::new()).await;
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_add_failure_reverts_and_notifies() {
        let (store, backend, sink) = store_with(empty_cart());
        backend.fail_add.store(true, Ordering::SeqCst);

        store
            .add_lines_bulk(vec![BulkAddItem {
                variant: variant("v1", dec!(50)),
                quantity: 2,
            }])
            .await;

        let cart = store.snapshot();
        assert!(cart.lines.is_empty());
        assert_eq!(cart.subtotal.amount, dec!(0));
        assert_eq!(sink.kinds(), vec![NotificationKind::Error]);
    }

    #[tokio::test]
    async fn test_update_missing_line_is_silent_noop() {
        let (store, backend, sink) = store_with(empty_cart());

        store
            .update_line_quantity(&LineItemId::new("li_5"), 4)
            .await;

        assert!(store.snapshot().lines.is_empty());
        assert!(backend.calls().is_empty());
        assert!(sink.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_update_optimistic_line_skips_remote_call() {
        let (store, backend, _sink) = store_with(empty_cart());
        store
            .add_lines_bulk(vec![BulkAddItem {
                variant: variant("v1", dec!(50)),
                quantity: 2,
            }])
            .await;

        let optimistic_id = LineItemId::new("__optimistic__-v1");
        store.update_line_quantity(&optimistic_id, 7).await;

        let cart = store.snapshot();
        assert_eq!(cart.lines[0].quantity, 7);
        assert_eq!(cart.subtotal.amount, dec!(350));
        // Only the add reached the backend.
        assert_eq!(backend.calls(), vec!["add[v1x2]@us"]);
    }

    #[tokio::test]
    async fn test_update_confirmed_line_issues_remote_call() {
        let mut cart = empty_cart();
        let mut line =
            CartLine::optimistic(&variant("v1", dec!(50)), 2, CurrencyCode::USD, Utc::now());
        line.id = LineItemId::new("li_1");
        cart.push_line(line);
        cart.recompute_subtotal();

        let (store, backend, _sink) = store_with(cart);
        store.update_line_quantity(&LineItemId::new("li_1"), 5).await;

        let cart = store.snapshot();
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.subtotal.amount, dec!(250));
        assert_eq!(backend.calls(), vec!["update[li_1=5]"]);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let mut cart = empty_cart();
        let mut keep =
            CartLine::optimistic(&variant("v1", dec!(50)), 1, CurrencyCode::USD, Utc::now());
        keep.id = LineItemId::new("li_1");
        let mut gone =
            CartLine::optimistic(&variant("v2", dec!(20)), 2, CurrencyCode::USD, Utc::now());
        gone.id = LineItemId::new("li_2");
        cart.push_line(keep);
        cart.push_line(gone);
        cart.recompute_subtotal();

        let (store, backend, _sink) = store_with(cart);
        store.update_line_quantity(&LineItemId::new("li_2"), 0).await;

        let cart = store.snapshot();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].id.as_str(), "li_1");
        assert_eq!(cart.subtotal.amount, dec!(50));
        assert_eq!(backend.calls(), vec!["update[li_2=0]"]);
    }

    #[tokio::test]
    async fn test_delete_missing_line_is_silent_noop() {
        let (store, backend, sink) = store_with(empty_cart());
        store.delete_line(&LineItemId::new("li_missing")).await;
        assert!(backend.calls().is_empty());
        assert!(sink.kinds().is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_restores_exact_pre_state() {
        let mut cart = empty_cart();
        let mut line =
            CartLine::optimistic(&variant("v1", dec!(50)), 1, CurrencyCode::USD, Utc::now());
        line.id = LineItemId::new("li_1");
        cart.push_line(line);
        cart.recompute_subtotal();
        let expected = cart.clone();

        let (store, backend, sink) = store_with(cart);
        backend.fail_delete.store(true, Ordering::SeqCst);

        store.delete_line(&LineItemId::new("li_1")).await;

        assert_eq!(store.snapshot(), expected);
        assert_eq!(sink.kinds(), vec![NotificationKind::Error]);
    }

    #[tokio::test]
    async fn test_refresh_supersedes_optimistic_state() {
        let (store, _backend, _sink) = store_with(empty_cart());
        store
            .add_lines_bulk(vec![BulkAddItem {
                variant: variant("v1", dec!(50)),
                quantity: 2,
            }])
            .await;

        // Backend confirmed the add and issued a real line ID.
        let mut confirmed = empty_cart();
        let mut line =
            CartLine::optimistic(&variant("v1", dec!(50)), 2, CurrencyCode::USD, Utc::now());
        line.id = LineItemId::new("li_1");
        confirmed.push_line(line);
        confirmed.recompute_subtotal();

        store.refresh(confirmed);

        let cart = store.snapshot();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].id.as_str(), "li_1");
        assert!(!cart.lines[0].id.is_optimistic());
    }

    #[tokio::test]
    async fn test_register_on_routes_event_to_bulk_add() {
        let (store, backend, _sink) = store_with(empty_cart());
        let events = AddToCartEvents::new();
        store.register_on(&events);

        let dispatched = events
            .dispatch(crate::events::AddToCartPayload {
                items: vec![BulkAddItem {
                    variant: variant("v1", dec!(50)),
                    quantity: 1,
                }],
                region_id: RegionId::new("reg_us"),
            })
            .await;

        assert!(dispatched);
        assert_eq!(store.snapshot().lines.len(), 1);
        assert_eq!(backend.calls(), vec!["add[v1x1]@us"]);
    }

    #[tokio::test]
    async fn test_subtotal_always_sum_of_lines() {
        let (store, _backend, _sink) = store_with(empty_cart());

        store
            .add_lines_bulk(vec![
                BulkAddItem {
                    variant: variant("v1", dec!(19.99)),
                    quantity: 2,
                },
                BulkAddItem {
                    variant: variant("v2", dec!(5)),
                    quantity: 4,
                },
            ])
            .await;

        let check = |store: &CartStore| {
            let cart = store.snapshot();
            let expected = cart
                .lines
                .iter()
                .fold(Price::zero(cart.currency_code), |acc, line| {
                    acc.plus(&line.unit_price.times(line.quantity))
                });
            assert_eq!(cart.subtotal, expected);
        };
        check(&store);

        store
            .update_line_quantity(&LineItemId::new("__optimistic__-v1"), 1)
            .await;
        check(&store);

        store
            .delete_line(&LineItemId::new("__optimistic__-v2"))
            .await;
        check(&store);
        assert_eq!(store.subtotal().amount, dec!(19.99));
    }
}
