//! Seam to the authoritative commerce backend.
//!
//! The store only needs three mutations; everything else about the backend
//! (transport, auth, retry policy) stays behind this trait. The storefront
//! crate provides the HTTP implementation; tests provide scriptable mocks.

use async_trait::async_trait;
use thiserror::Error;
use tidepool_core::{CartId, LineItemId};

use crate::types::CartLineInput;

/// Error returned by the backend for a rejected cart mutation.
///
/// Network failures and backend-reported business errors both land here;
/// the store recovers from either the same way (revert and notify), so the
/// distinction only survives in the message and source chain.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BackendError {
    /// A backend error with a message only.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// A backend error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The user-presentable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Authoritative cart mutations on the commerce backend.
///
/// Implementations must be safe to call concurrently; the store may have
/// several mutations in flight at once and their confirmations race.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Add lines to the cart in one call.
    ///
    /// `lines` carry real variant IDs, never optimistic line IDs.
    async fn add_lines_bulk(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
        country_code: &str,
    ) -> Result<(), BackendError>;

    /// Set the quantity of an existing backend line.
    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
        quantity: u32,
    ) -> Result<(), BackendError>;

    /// Delete a backend line.
    async fn delete_line(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
    ) -> Result<(), BackendError>;
}
