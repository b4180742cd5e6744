//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tidepool_cart::{AddToCartEvents, CartBackend, CartStore, LogNotifier, NotificationSink};
use tidepool_core::CartId;

use crate::commerce::{CommerceClient, CommerceError};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// commerce client, the per-cart optimistic stores, and the add-to-cart
/// event registry.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    notifier: Arc<dyn NotificationSink>,
    events: AddToCartEvents,
    carts: Mutex<HashMap<CartId, CartStore>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let commerce = CommerceClient::new(&config.commerce);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                notifier: Arc::new(LogNotifier),
                events: AddToCartEvents::new(),
                carts: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the add-to-cart event registry.
    ///
    /// The registry holds one active handler: the store most recently
    /// touched through [`AppState::cart_store`] owns the trigger.
    #[must_use]
    pub fn events(&self) -> &AddToCartEvents {
        &self.inner.events
    }

    /// Get the optimistic store for a cart, fetching the authoritative cart
    /// on first touch.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError` when the authoritative cart cannot be
    /// fetched.
    pub async fn cart_store(&self, cart_id: &CartId) -> Result<CartStore, CommerceError> {
        if let Some(store) = self.lock_carts().get(cart_id) {
            return Ok(store.clone());
        }

        let cart = self.inner.commerce.get_cart(cart_id).await?;
        let store = CartStore::new(
            cart,
            Arc::new(self.inner.commerce.clone()) as Arc<dyn CartBackend>,
            Arc::clone(&self.inner.notifier),
        );

        // A racing request may have built the store already; keep the first
        // and only register the kept store on the event registry.
        let store = {
            let mut carts = self.lock_carts();
            carts.entry(cart_id.clone()).or_insert(store).clone()
        };
        store.register_on(&self.inner.events);
        Ok(store)
    }

    /// Re-fetch the authoritative cart and supersede any optimistic state.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError` when the authoritative cart cannot be
    /// fetched.
    pub async fn refresh_cart(&self, cart_id: &CartId) -> Result<CartStore, CommerceError> {
        let store = self.cart_store(cart_id).await?;
        let cart = self.inner.commerce.get_cart(cart_id).await?;
        store.refresh(cart);
        Ok(store)
    }

    fn lock_carts(&self) -> std::sync::MutexGuard<'_, HashMap<CartId, CartStore>> {
        self.inner
            .carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
