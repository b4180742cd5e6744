//! Quick order: the cross-component add-to-cart trigger.
//!
//! Listing surfaces post here instead of addressing a cart directly; the
//! payload is dispatched through the add-to-cart event registry and lands
//! in whichever cart store currently owns the trigger.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use tidepool_cart::AddToCartPayload;
use tidepool_core::RegionId;

use crate::error::{AppError, Result};
use crate::state::AppState;

use super::cart::AddLineItemForm;

/// Quick order request body.
#[derive(Debug, Deserialize)]
pub struct QuickOrderForm {
    /// Region the listing surface priced against.
    pub region_id: String,
    pub items: Vec<AddLineItemForm>,
}

/// Dispatch items to the active cart via the event registry.
///
/// Returns 202 when a cart store received the payload; 409 when no cart is
/// active to receive it.
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<QuickOrderForm>,
) -> Result<StatusCode> {
    if form.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".to_string()));
    }

    // Price in the region's currency; the listing surface only knows amounts.
    let regions = state.commerce().list_regions().await?;
    let region = regions
        .into_iter()
        .find(|region| region.id.as_str() == form.region_id)
        .ok_or_else(|| AppError::NotFound(format!("region {}", form.region_id)))?;

    let payload = AddToCartPayload {
        items: form
            .items
            .into_iter()
            .map(|item| item.into_bulk_item(region.currency_code))
            .collect(),
        region_id: RegionId::new(form.region_id),
    };

    if state.events().dispatch(payload).await {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(AppError::Conflict(
            "no active cart to receive the order".to_string(),
        ))
    }
}
