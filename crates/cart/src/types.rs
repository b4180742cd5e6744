//! Domain types for the cart.
//!
//! These types model the cart as the store works with it: typed IDs from
//! `tidepool-core`, decimal prices, and the fields the optimistic overlay
//! needs (per-line unit price for recomputation, creation timestamps for
//! display ordering).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tidepool_core::{CartId, CurrencyCode, LineItemId, Price, ProductId, RegionId, VariantId};

// =============================================================================
// Merchandise Types
// =============================================================================

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Thumbnail image URL.
    pub thumbnail: Option<String>,
}

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title.
    pub title: String,
    /// SKU.
    pub sku: Option<String>,
    /// Parent product info.
    pub product: Option<CartMerchandiseProduct>,
}

/// A product variant as supplied by a listing surface, with enough data to
/// synthesize a provisional cart line before the backend confirms it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title.
    pub title: String,
    /// SKU.
    pub sku: Option<String>,
    /// Region-calculated price; absent when pricing has not resolved yet.
    pub calculated_price: Option<Price>,
    /// Parent product info.
    pub product: Option<CartMerchandiseProduct>,
}

// =============================================================================
// Line Items
// =============================================================================

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line item ID: issued by the backend, or optimistic (see
    /// [`LineItemId::is_optimistic`]).
    pub id: LineItemId,
    /// Product variant.
    pub merchandise: CartMerchandise,
    /// Quantity. 0 never survives a mutation; it means "remove".
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Price,
    /// Computed `unit_price * quantity`.
    pub subtotal: Price,
    /// Computed line total.
    pub total: Price,
    /// Creation timestamp, used for display ordering.
    pub created_at: Option<DateTime<Utc>>,
}

impl CartLine {
    /// Synthesize a provisional line for a variant the backend has not
    /// confirmed yet.
    ///
    /// Priced from the variant's calculated price, falling back to zero when
    /// pricing is unavailable.
    #[must_use]
    pub fn optimistic(
        variant: &ProductVariant,
        quantity: u32,
        currency_code: CurrencyCode,
        created_at: DateTime<Utc>,
    ) -> Self {
        let unit_price = variant
            .calculated_price
            .unwrap_or_else(|| Price::zero(currency_code));
        let subtotal = unit_price.times(quantity);

        Self {
            id: LineItemId::optimistic(&variant.id),
            merchandise: CartMerchandise {
                id: variant.id.clone(),
                title: variant.title.clone(),
                sku: variant.sku.clone(),
                product: variant.product.clone(),
            },
            quantity,
            unit_price,
            subtotal,
            total: subtotal,
            created_at: Some(created_at),
        }
    }

    /// Replace the quantity and recompute the line cost from the unit price.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.subtotal = self.unit_price.times(quantity);
        self.total = self.subtotal;
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart.
///
/// The authoritative copy originates from the backend; the store derives its
/// optimistic overlay from it. The displayed subtotal is always recomputed
/// as the sum of `unit_price * quantity` over the current lines - never
/// incrementally adjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Region the cart prices against.
    pub region_id: RegionId,
    /// ISO country code forwarded with add-to-cart calls.
    pub country_code: String,
    /// Cart currency.
    pub currency_code: CurrencyCode,
    /// Subtotal over all lines.
    pub subtotal: Price,
    /// Cart lines, in backend order; see [`Cart::sorted_lines`] for display.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart for a region.
    #[must_use]
    pub fn empty(
        id: CartId,
        region_id: RegionId,
        country_code: impl Into<String>,
        currency_code: CurrencyCode,
    ) -> Self {
        Self {
            id,
            region_id,
            country_code: country_code.into(),
            currency_code,
            subtotal: Price::zero(currency_code),
            lines: Vec::new(),
        }
    }

    /// Whether a line with this ID is present.
    #[must_use]
    pub fn contains_line(&self, id: &LineItemId) -> bool {
        self.lines.iter().any(|line| &line.id == id)
    }

    /// Find a line by ID.
    #[must_use]
    pub fn find_line(&self, id: &LineItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }

    /// Find a line by its variant, confirmed or optimistic.
    pub fn find_line_by_variant_mut(&mut self, variant_id: &VariantId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.merchandise.id == variant_id)
    }

    /// Append a line.
    pub fn push_line(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    /// Remove a line by ID. Missing IDs are ignored.
    pub fn remove_line(&mut self, id: &LineItemId) {
        self.lines.retain(|line| &line.id != id);
    }

    /// Recompute the subtotal as the sum of `unit_price * quantity` over all
    /// current lines.
    pub fn recompute_subtotal(&mut self) {
        let mut subtotal = Price::zero(self.currency_code);
        for line in &self.lines {
            subtotal = subtotal.plus(&line.unit_price.times(line.quantity));
        }
        self.subtotal = subtotal;
    }

    /// Lines ordered for display: most recently created first, lines without
    /// a timestamp after all timestamped lines, ties keeping insertion order.
    #[must_use]
    pub fn sorted_lines(&self) -> Vec<CartLine> {
        let mut lines = self.lines.clone();
        lines.sort_by(|a, b| match (&a.created_at, &b.created_at) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        lines
    }

    /// Total quantity across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

// =============================================================================
// Mutation Inputs
// =============================================================================

/// One entry of a bulk add: a variant (with embedded product info) and the
/// quantity to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAddItem {
    /// The variant to add.
    pub variant: ProductVariant,
    /// Quantity to add.
    pub quantity: u32,
}

/// Input for adding a line on the backend.
///
/// Carries the real variant ID - never an optimistic line ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub variant_id: VariantId,
    /// Quantity to add.
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::dec;

    fn variant(id: &str, price: Option<Price>) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            title: format!("Variant {id}"),
            sku: None,
            calculated_price: price,
            product: None,
        }
    }

    fn test_cart() -> Cart {
        Cart::empty(
            CartId::new("cart_1"),
            RegionId::new("reg_1"),
            "us",
            CurrencyCode::USD,
        )
    }

    #[test]
    fn test_optimistic_line_priced_from_variant() {
        let v = variant("v1", Some(Price::new(dec!(50), CurrencyCode::USD)));
        let line = CartLine::optimistic(&v, 2, CurrencyCode::USD, Utc::now());

        assert_eq!(line.id.as_str(), "__optimistic__-v1");
        assert_eq!(line.subtotal.amount, dec!(100));
        assert_eq!(line.total.amount, dec!(100));
    }

    #[test]
    fn test_optimistic_line_falls_back_to_zero_price() {
        let v = variant("v1", None);
        let line = CartLine::optimistic(&v, 3, CurrencyCode::USD, Utc::now());

        assert_eq!(line.unit_price.amount, dec!(0));
        assert_eq!(line.subtotal.amount, dec!(0));
    }

    #[test]
    fn test_recompute_subtotal_sums_lines() {
        let mut cart = test_cart();
        let now = Utc::now();
        cart.push_line(CartLine::optimistic(
            &variant("v1", Some(Price::new(dec!(50), CurrencyCode::USD))),
            2,
            CurrencyCode::USD,
            now,
        ));
        cart.push_line(CartLine::optimistic(
            &variant("v2", Some(Price::new(dec!(19.99), CurrencyCode::USD))),
            1,
            CurrencyCode::USD,
            now,
        ));
        cart.recompute_subtotal();

        assert_eq!(cart.subtotal.amount, dec!(119.99));
    }

    #[test]
    fn test_remove_missing_line_is_noop() {
        let mut cart = test_cart();
        cart.remove_line(&LineItemId::new("li_missing"));
        assert!(cart.lines.is_empty());
    }

    #[test]
    fn test_sorted_lines_most_recent_first() {
        let mut cart = test_cart();
        let older = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single();
        let newer = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).single();

        let mut first = CartLine::optimistic(
            &variant("v1", None),
            1,
            CurrencyCode::USD,
            Utc::now(),
        );
        first.created_at = older;
        let mut second = CartLine::optimistic(
            &variant("v2", None),
            1,
            CurrencyCode::USD,
            Utc::now(),
        );
        second.created_at = newer;
        let mut untimestamped = CartLine::optimistic(
            &variant("v3", None),
            1,
            CurrencyCode::USD,
            Utc::now(),
        );
        untimestamped.created_at = None;

        cart.push_line(untimestamped);
        cart.push_line(first);
        cart.push_line(second);

        let sorted = cart.sorted_lines();
        let ids: Vec<&str> = sorted.iter().map(|l| l.merchandise.id.as_str()).collect();
        assert_eq!(ids, vec!["v2", "v1", "v3"]);
    }

    #[test]
    fn test_total_quantity() {
        let mut cart = test_cart();
        let now = Utc::now();
        cart.push_line(CartLine::optimistic(&variant("v1", None), 2, CurrencyCode::USD, now));
        cart.push_line(CartLine::optimistic(&variant("v2", None), 3, CurrencyCode::USD, now));
        assert_eq!(cart.total_quantity(), 5);
    }
}
