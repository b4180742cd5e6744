//! Tidepool Cart - Optimistic cart state layer.
//!
//! This crate holds the working copy of a shopping cart between
//! confirmations from the commerce backend. Mutations apply to the local
//! cart instantly; the matching remote mutation is dispatched afterwards,
//! and a rejected remote call reverts the local cart to the snapshot taken
//! immediately before that mutation.
//!
//! # Architecture
//!
//! - [`store::CartStore`] - the reconciliation state machine
//! - [`backend::CartBackend`] - seam to the authoritative commerce backend
//! - [`events::AddToCartEvents`] - registry for cross-component add-to-cart
//!   triggers
//! - [`notify::NotificationSink`] - fire-and-forget user-facing toasts
//!
//! The store never propagates a remote failure to its caller; all failure
//! signaling goes through the notification sink, and consumers of the cart
//! view never observe a partially applied mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = CartStore::new(cart, backend, notifier);
//!
//! store
//!     .add_lines_bulk(vec![BulkAddItem { variant, quantity: 2 }])
//!     .await;
//!
//! // Instantly reflects the add; reverted later if the backend rejects it.
//! let lines = store.line_items();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod events;
pub mod notify;
pub mod store;
pub mod types;

pub use backend::{BackendError, CartBackend};
pub use events::{AddToCartEvents, AddToCartPayload};
pub use notify::{LogNotifier, Notification, NotificationKind, NotificationSink};
pub use store::CartStore;
pub use types::*;
