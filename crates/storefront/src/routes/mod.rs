//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                  - Health check
//!
//! # Cart
//! GET    /store/carts/{cart_id}                        - Cart view
//! POST   /store/carts/{cart_id}/line-items             - Bulk add items
//! POST   /store/carts/{cart_id}/line-items/{line_id}   - Update quantity
//! DELETE /store/carts/{cart_id}/line-items/{line_id}   - Remove item
//! POST   /store/carts/{cart_id}/refresh                - Re-fetch authoritative cart
//!
//! # Regions
//! GET  /store/regions                           - Region list
//!
//! # Quick order (add-to-cart event trigger)
//! POST /store/quick-order                       - Dispatch items to the active cart
//! ```

pub mod cart;
pub mod quick_order;
pub mod regions;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/{cart_id}", get(cart::show))
        .route("/{cart_id}/line-items", post(cart::add))
        .route(
            "/{cart_id}/line-items/{line_id}",
            post(cart::update).delete(cart::remove),
        )
        .route("/{cart_id}/refresh", post(cart::refresh))
}

/// Create the complete application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/store/carts", cart_routes())
        .route("/store/regions", get(regions::index))
        .route("/store/quick-order", post(quick_order::submit))
}
