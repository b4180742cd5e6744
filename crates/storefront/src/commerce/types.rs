//! Wire types for the commerce store API.
//!
//! These mirror the backend's JSON bodies; `conversions` turns them into
//! the domain types the rest of the storefront works with. Monetary
//! amounts arrive as decimal strings and deserialize into `Decimal`
//! without precision loss.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidepool_core::{CurrencyCode, RegionId};

// =============================================================================
// Responses
// =============================================================================

/// Envelope for cart responses.
#[derive(Debug, Clone, Deserialize)]
pub struct CartEnvelope {
    /// The cart.
    pub cart: ApiCart,
}

/// A cart as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCart {
    /// Cart ID.
    pub id: String,
    /// Region the cart prices against.
    pub region: ApiRegion,
    /// Line items.
    #[serde(default)]
    pub items: Vec<ApiLineItem>,
}

/// A cart line item as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiLineItem {
    /// Line item ID.
    pub id: String,
    /// Variant ID.
    pub variant_id: String,
    /// Variant title.
    pub title: String,
    /// SKU.
    pub sku: Option<String>,
    /// Quantity.
    pub quantity: u32,
    /// Price per unit, as a decimal string.
    pub unit_price: Decimal,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Parent product info.
    pub product: Option<ApiLineItemProduct>,
}

/// Product info embedded in a line item.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiLineItemProduct {
    /// Product ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Thumbnail image URL.
    pub thumbnail: Option<String>,
}

/// A region as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRegion {
    /// Region ID.
    pub id: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// Countries served by this region.
    #[serde(default)]
    pub countries: Vec<ApiCountry>,
}

/// A country entry within a region.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCountry {
    /// Two-letter ISO country code.
    pub iso_2: String,
}

/// Envelope for region list responses.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionsEnvelope {
    /// The regions.
    pub regions: Vec<ApiRegion>,
}

/// Error body the backend returns on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable error message.
    pub message: String,
}

// =============================================================================
// Requests
// =============================================================================

/// Body for the bulk line-item add endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BulkLineItemsRequest {
    /// Lines to add; variant IDs, never optimistic line IDs.
    pub line_items: Vec<BulkLineItemInput>,
    /// ISO country code for pricing context.
    pub country_code: String,
}

/// One line of a bulk add request.
#[derive(Debug, Clone, Serialize)]
pub struct BulkLineItemInput {
    /// Product variant ID.
    pub variant_id: String,
    /// Quantity to add.
    pub quantity: u32,
}

/// Body for the line-item update endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateLineItemRequest {
    /// New quantity.
    pub quantity: u32,
}

// =============================================================================
// Domain-facing region
// =============================================================================

/// A region resolved for storefront use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    /// Region ID.
    pub id: RegionId,
    /// Region currency.
    pub currency_code: CurrencyCode,
    /// Two-letter ISO codes of the countries this region serves.
    pub countries: Vec<String>,
}
