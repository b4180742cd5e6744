//! Commerce store API client implementation.
//!
//! Plain REST over `reqwest`; region lookups are cached with `moka`
//! (5-minute TTL). Cart mutations implement [`CartBackend`], which is the
//! seam the optimistic store dispatches through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::instrument;

use tidepool_cart::{BackendError, Cart, CartBackend, CartLineInput};
use tidepool_core::{CartId, LineItemId};

use crate::config::CommerceApiConfig;

use super::CommerceError;
use super::conversions::{convert_cart, convert_region};
use super::types::{
    ApiErrorBody, BulkLineItemInput, BulkLineItemsRequest, CartEnvelope, Region, RegionsEnvelope,
    UpdateLineItemRequest,
};

/// Header carrying the publishable API key.
const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// Cache key for the region list; regions change rarely.
const REGIONS_CACHE_KEY: &str = "regions";

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce store API.
///
/// Provides the authoritative cart reads and the mutations the optimistic
/// store confirms against. Region lookups are cached for 5 minutes.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    publishable_key: String,
    regions: Cache<&'static str, Vec<Region>>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    #[must_use]
    pub fn new(config: &CommerceApiConfig) -> Self {
        let regions = Cache::builder()
            .max_capacity(8)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                publishable_key: config.publishable_key.expose_secret().to_string(),
                regions,
            }),
        }
    }

    /// Fetch the authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError` when the request fails, the cart does not
    /// exist, or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Cart, CommerceError> {
        let url = format!("{}/store/carts/{cart_id}", self.inner.base_url);
        let response = self.request(self.inner.client.get(&url)).await?;
        let envelope: CartEnvelope = Self::parse(&response)?;
        Ok(convert_cart(envelope.cart))
    }

    /// List the regions the backend serves. Cached for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError` when the request fails or the response
    /// cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_regions(&self) -> Result<Vec<Region>, CommerceError> {
        if let Some(regions) = self.inner.regions.get(REGIONS_CACHE_KEY).await {
            return Ok(regions);
        }

        let url = format!("{}/store/regions", self.inner.base_url);
        let response = self.request(self.inner.client.get(&url)).await?;
        let envelope: RegionsEnvelope = Self::parse(&response)?;
        let regions: Vec<Region> = envelope.regions.into_iter().map(convert_region).collect();

        self.inner
            .regions
            .insert(REGIONS_CACHE_KEY, regions.clone())
            .await;
        Ok(regions)
    }

    /// Send a request with the publishable key attached and return the body
    /// of a successful response.
    async fn request(&self, builder: reqwest::RequestBuilder) -> Result<String, CommerceError> {
        let response = builder
            .header(PUBLISHABLE_KEY_HEADER, &self.inner.publishable_key)
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map_or_else(|_| body.chars().take(200).collect::<String>(), |e| e.message);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound(message));
        }

        tracing::error!(
            status = %status,
            message = %message,
            "commerce API returned non-success status"
        );
        Err(CommerceError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Parse a response body, logging the payload on failure.
    fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, CommerceError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }
}

// =============================================================================
// CartBackend
// =============================================================================

#[async_trait]
impl CartBackend for CommerceClient {
    async fn add_lines_bulk(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
        country_code: &str,
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}/store/carts/{cart_id}/line-items/bulk",
            self.inner.base_url
        );
        let body = BulkLineItemsRequest {
            line_items: lines
                .into_iter()
                .map(|line| BulkLineItemInput {
                    variant_id: line.variant_id.into_inner(),
                    quantity: line.quantity,
                })
                .collect(),
            country_code: country_code.to_string(),
        };

        self.request(self.inner.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn update_line(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}/store/carts/{cart_id}/line-items/{line_id}",
            self.inner.base_url
        );
        let body = UpdateLineItemRequest { quantity };

        self.request(self.inner.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn delete_line(
        &self,
        cart_id: &CartId,
        line_id: &LineItemId,
    ) -> Result<(), BackendError> {
        let url = format!(
            "{}/store/carts/{cart_id}/line-items/{line_id}",
            self.inner.base_url
        );

        self.request(self.inner.client.delete(&url)).await?;
        Ok(())
    }
}
