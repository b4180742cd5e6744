//! Integration tests for Tidepool.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tidepool-integration-tests
//! ```
//!
//! This crate's library is test support: a scriptable [`MockBackend`] that
//! records every call and can be told to reject or hold individual
//! operations, and a [`RecordingSink`] that collects the notifications a
//! store emits. The tests in `tests/` drive the optimistic cart store
//! against these doubles; no live services are required.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use tidepool_cart::{
    BackendError, CartBackend, CartLineInput, Notification, NotificationSink, ProductVariant,
};
use tidepool_core::{CartId, CurrencyCode, LineItemId, Price, VariantId};

/// Scriptable cart backend.
///
/// Records each call as a compact string. Each operation can be switched
/// to fail, and adds can be held at a gate so tests can interleave other
/// operations while an add is in flight.
#[derive(Debug)]
pub struct MockBackend {
    fail_add: AtomicBool,
    fail_update: AtomicBool,
    fail_delete: AtomicBool,
    hold_adds: AtomicBool,
    add_gate: Semaphore,
    calls: Mutex<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            fail_add: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            hold_adds: AtomicBool::new(false),
            add_gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent add calls fail.
    pub fn reject_adds(&self) {
        self.fail_add.store(true, Ordering::SeqCst);
    }

    /// Make subsequent update calls fail.
    pub fn reject_updates(&self) {
        self.fail_update.store(true, Ordering::SeqCst);
    }

    /// Make subsequent delete calls fail.
    pub fn reject_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Hold add calls at a gate until [`MockBackend::release_adds`].
    pub fn hold_adds(&self) {
        self.hold_adds.store(true, Ordering::SeqCst);
    }

    /// Release every held and future add call.
    pub fn release_adds(&self) {
        self.hold_adds.store(false, Ordering::SeqCst);
        self.add_gate.add_permits(1024);
    }

    /// The calls recorded so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl CartBackend for MockBackend {
    async fn add_lines_bulk(
        &self,
        _cart_id: &CartId,
        lines: Vec<CartLineInput>,
        country_code: &str,
    ) -> Result<(), BackendError> {
        let summary = lines
            .iter()
            .map(|line| format!("{}x{}", line.variant_id, line.quantity))
            .collect::<Vec<_>>()
            .join(",");
        self.record(format!("add[{summary}]@{country_code}"));

        if self.hold_adds.load(Ordering::SeqCst) {
            let _permit = self.add_gate.acquire().await.ok();
        }

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

/// Notification sink that collects everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The notifications received so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification);
    }
}

/// A USD variant priced at `amount`.
#[must_use]
pub fn usd_variant(id: &str, amount: Decimal) -> ProductVariant {
    ProductVariant {
        id: VariantId::new(id),
        title: format!("Variant {id}"),
        sku: None,
        calculated_price: Some(Price::new(amount, CurrencyCode::USD)),
        product: None,
    }
}
