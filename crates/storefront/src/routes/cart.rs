//! Cart route handlers.
//!
//! Mutations apply optimistically: the response body reflects the local
//! cart immediately after the mutation, before the backend has confirmed
//! it. Lines still awaiting confirmation are flagged `pending`; a rejected
//! confirmation reverts them and surfaces a notification out of band.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tidepool_cart::{BulkAddItem, Cart, CartLine, CartMerchandiseProduct, ProductVariant};
use tidepool_core::{CartId, CurrencyCode, LineItemId, Price, ProductId, VariantId};

use crate::error::{AppError, Result};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: String,
    pub variant_id: String,
    pub title: String,
    pub sku: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    /// Whether the line is still awaiting backend confirmation.
    pub pending: bool,
    pub product_handle: Option<String>,
    pub product_title: Option<String>,
    pub thumbnail: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: String,
    pub currency_code: &'static str,
    pub subtotal: Decimal,
    pub item_count: u32,
    pub items: Vec<CartItemView>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id.to_string(),
            currency_code: cart.currency_code.code(),
            subtotal: cart.subtotal.amount,
            item_count: cart.total_quantity(),
            items: cart.sorted_lines().iter().map(CartItemView::from).collect(),
        }
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            variant_id: line.merchandise.id.to_string(),
            title: line.merchandise.title.clone(),
            sku: line.merchandise.sku.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.amount,
            line_total: line.total.amount,
            pending: line.id.is_optimistic(),
            product_handle: line.merchandise.product.as_ref().map(|p| p.handle.clone()),
            product_title: line.merchandise.product.as_ref().map(|p| p.title.clone()),
            thumbnail: line
                .merchandise
                .product
                .as_ref()
                .and_then(|p| p.thumbnail.clone()),
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

/// Bulk add request body.
#[derive(Debug, Deserialize)]
pub struct AddLineItemsForm {
    pub items: Vec<AddLineItemForm>,
}

/// One variant to add, with the data needed to render it before the
/// backend confirms the line.
#[derive(Debug, Deserialize)]
pub struct AddLineItemForm {
    pub variant_id: String,
    pub quantity: u32,
    pub title: String,
    pub sku: Option<String>,
    /// Region-calculated unit price; a missing price renders as 0 until the
    /// authoritative cart supersedes it.
    pub unit_price: Option<Decimal>,
    pub product: Option<ProductForm>,
}

/// Product info accompanying an added variant.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub thumbnail: Option<String>,
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateLineItemForm {
    pub quantity: u32,
}

impl AddLineItemForm {
    /// Build the store-facing input, pricing in the cart's currency.
    pub(crate) fn into_bulk_item(self, currency_code: CurrencyCode) -> BulkAddItem {
        BulkAddItem {
            variant: ProductVariant {
                id: VariantId::new(self.variant_id),
                title: self.title,
                sku: self.sku,
                calculated_price: self
                    .unit_price
                    .map(|amount| Price::new(amount, currency_code)),
                product: self.product.map(|p| CartMerchandiseProduct {
                    id: ProductId::new(p.id),
                    handle: p.handle,
                    title: p.title,
                    thumbnail: p.thumbnail,
                }),
            },
            quantity: self.quantity,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(&CartId::new(cart_id)).await?;
    Ok(Json(CartView::from(&store.snapshot())))
}

/// Add items to the cart in bulk.
///
/// The optimistic application never fails; the response reflects the cart
/// with the items applied. A backend rejection later reverts them.
#[instrument(skip(state, form))]
pub async fn add(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
    Json(form): Json<AddLineItemsForm>,
) -> Result<Json<CartView>> {
    if form.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".to_string()));
    }

    let store = state.cart_store(&CartId::new(cart_id)).await?;
    let currency_code = store.snapshot().currency_code;
    let items = form
        .items
        .into_iter()
        .map(|item| item.into_bulk_item(currency_code))
        .collect();

    store.add_lines_bulk(items).await;
    Ok(Json(CartView::from(&store.snapshot())))
}

/// Update a line item's quantity; 0 removes the line.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path((cart_id, line_id)): Path<(String, String)>,
    Json(form): Json<UpdateLineItemForm>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(&CartId::new(cart_id)).await?;
    store
        .update_line_quantity(&LineItemId::new(line_id), form.quantity)
        .await;
    Ok(Json(CartView::from(&store.snapshot())))
}

/// Remove a line item.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path((cart_id, line_id)): Path<(String, String)>,
) -> Result<Json<CartView>> {
    let store = state.cart_store(&CartId::new(cart_id)).await?;
    store.delete_line(&LineItemId::new(line_id)).await;
    Ok(Json(CartView::from(&store.snapshot())))
}

/// Re-fetch the authoritative cart, superseding optimistic state.
#[instrument(skip(state))]
pub async fn refresh(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>> {
    let store = state.refresh_cart(&CartId::new(cart_id)).await?;
    Ok(Json(CartView::from(&store.snapshot())))
}
