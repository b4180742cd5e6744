//! Region route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::commerce::Region;
use crate::error::Result;
use crate::state::AppState;

/// List the regions the backend serves.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Region>>> {
    let regions = state.commerce().list_regions().await?;
    Ok(Json(regions))
}
