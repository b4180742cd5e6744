//! Conversions from wire types into domain types.

use tracing::warn;

use tidepool_cart::{Cart, CartLine, CartMerchandise, CartMerchandiseProduct};
use tidepool_core::{CartId, CurrencyCode, LineItemId, Price, ProductId, RegionId, VariantId};

use super::types::{ApiCart, ApiLineItem, ApiRegion, Region};

/// Convert a wire cart into the domain cart.
///
/// The subtotal is recomputed locally from the converted lines rather than
/// trusted from the wire, so the displayed value always matches the line
/// list.
pub fn convert_cart(api: ApiCart) -> Cart {
    let currency_code = convert_currency(&api.region.currency_code);
    let country_code = api
        .region
        .countries
        .first()
        .map_or_else(|| "us".to_string(), |c| c.iso_2.to_ascii_lowercase());

    let mut cart = Cart {
        id: CartId::new(api.id),
        region_id: RegionId::new(api.region.id),
        country_code,
        currency_code,
        subtotal: Price::zero(currency_code),
        lines: api
            .items
            .into_iter()
            .map(|item| convert_line(item, currency_code))
            .collect(),
    };
    cart.recompute_subtotal();
    cart
}

fn convert_line(item: ApiLineItem, currency_code: CurrencyCode) -> CartLine {
    let unit_price = Price::new(item.unit_price, currency_code);
    let subtotal = unit_price.times(item.quantity);

    CartLine {
        id: LineItemId::new(item.id),
        merchandise: CartMerchandise {
            id: VariantId::new(item.variant_id),
            title: item.title,
            sku: item.sku,
            product: item.product.map(|p| CartMerchandiseProduct {
                id: ProductId::new(p.id),
                handle: p.handle,
                title: p.title,
                thumbnail: p.thumbnail,
            }),
        },
        quantity: item.quantity,
        unit_price,
        subtotal,
        total: subtotal,
        created_at: item.created_at,
    }
}

/// Convert a wire region into the domain region.
pub fn convert_region(api: ApiRegion) -> Region {
    Region {
        currency_code: convert_currency(&api.currency_code),
        id: RegionId::new(api.id),
        countries: api
            .countries
            .into_iter()
            .map(|c| c.iso_2.to_ascii_lowercase())
            .collect(),
    }
}

fn convert_currency(code: &str) -> CurrencyCode {
    CurrencyCode::from_code(code).unwrap_or_else(|| {
        warn!(code, "unsupported currency code, falling back to USD");
        CurrencyCode::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::types::ApiCountry;
    use rust_decimal::dec;

    fn api_cart() -> ApiCart {
        ApiCart {
            id: "cart_1".to_string(),
            region: ApiRegion {
                id: "reg_us".to_string(),
                currency_code: "usd".to_string(),
                countries: vec![ApiCountry {
                    iso_2: "US".to_string(),
                }],
            },
            items: vec![ApiLineItem {
                id: "li_1".to_string(),
                variant_id: "v1".to_string(),
                title: "Medium".to_string(),
                sku: Some("SHIRT-M".to_string()),
                quantity: 2,
                unit_price: dec!(50),
                created_at: None,
                product: None,
            }],
        }
    }

    #[test]
    fn test_convert_cart_recomputes_subtotal() {
        let cart = convert_cart(api_cart());
        assert_eq!(cart.id.as_str(), "cart_1");
        assert_eq!(cart.country_code, "us");
        assert_eq!(cart.currency_code, CurrencyCode::USD);
        assert_eq!(cart.subtotal.amount, dec!(100));
    }

    #[test]
    fn test_convert_cart_unknown_currency_falls_back() {
        let mut api = api_cart();
        api.region.currency_code = "zzz".to_string();
        let cart = convert_cart(api);
        assert_eq!(cart.currency_code, CurrencyCode::USD);
    }

    #[test]
    fn test_convert_region_lowercases_countries() {
        let region = convert_region(ApiRegion {
            id: "reg_eu".to_string(),
            currency_code: "EUR".to_string(),
            countries: vec![
                ApiCountry {
                    iso_2: "DE".to_string(),
                },
                ApiCountry {
                    iso_2: "FR".to_string(),
                },
            ],
        });
        assert_eq!(region.currency_code, CurrencyCode::EUR);
        assert_eq!(region.countries, vec!["de", "fr"]);
    }
}
