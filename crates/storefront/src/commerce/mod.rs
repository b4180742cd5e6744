//! Commerce backend API client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local sync, direct API calls
//! - Plain REST with JSON bodies via `reqwest`
//! - In-memory caching via `moka` for region lookups (5 minute TTL)
//! - Implements [`tidepool_cart::CartBackend`], so the optimistic store
//!   dispatches its confirmations through this client
//!
//! # Example
//!
//! ```rust,ignore
//! use tidepool_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce);
//!
//! // Fetch the authoritative cart
//! let cart = client.get_cart(&cart_id).await?;
//!
//! // Mutations go through the CartBackend trait
//! client.add_lines_bulk(&cart_id, lines, "us").await?;
//! ```

mod client;
mod conversions;
pub mod types;

pub use client::CommerceClient;
pub use types::Region;

use thiserror::Error;
use tidepool_cart::BackendError;

/// Errors that can occur when interacting with the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend reported an error for the request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl From<CommerceError> for BackendError {
    fn from(err: CommerceError) -> Self {
        let message = match &err {
            CommerceError::Api { message, .. } => message.clone(),
            CommerceError::NotFound(what) => format!("not found: {what}"),
            CommerceError::RateLimited(_) => "the backend is busy, try again shortly".to_string(),
            CommerceError::Http(_) | CommerceError::Parse(_) => {
                "could not reach the commerce backend".to_string()
            }
        };
        Self::with_source(message, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("cart_123".to_string());
        assert_eq!(err.to_string(), "Not found: cart_123");

        let err = CommerceError::Api {
            status: 422,
            message: "Variant out of stock".to_string(),
        };
        assert_eq!(err.to_string(), "API error (422): Variant out of stock");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CommerceError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_backend_error_carries_api_message() {
        let err = CommerceError::Api {
            status: 400,
            message: "Quantity must be positive".to_string(),
        };
        let backend: BackendError = err.into();
        assert_eq!(backend.to_string(), "Quantity must be positive");
    }
}
