//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_str_id!` macro to create type-safe ID wrappers that
//! prevent accidentally mixing IDs from different entity types. The backend
//! issues opaque string identifiers (e.g. `cart_01HX...`, `li_1`), so the
//! wrappers hold `String` rather than an integer.

/// Reserved prefix marking a line-item ID as locally synthesized.
///
/// IDs carrying this prefix exist only in the optimistic overlay; the
/// backend has not confirmed the row yet and knows nothing about the ID.
pub const OPTIMISTIC_LINE_PREFIX: &str = "__optimistic__-";

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use tidepool_core::define_str_id;
/// define_str_id!(CustomerId);
/// define_str_id!(OrderId);
///
/// let customer_id = CustomerId::new("cus_1");
/// let order_id = OrderId::new("ord_1");
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = order_id;
/// ```
#[macro_export]
macro_rules! define_str_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID, returning the underlying `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

// Define standard entity IDs
define_str_id!(CartId);
define_str_id!(LineItemId);
define_str_id!(VariantId);
define_str_id!(ProductId);
define_str_id!(RegionId);

impl LineItemId {
    /// Synthesize the optimistic ID for a variant.
    ///
    /// The ID is deterministic per variant, so repeated optimistic adds of
    /// the same variant before server confirmation collapse onto the same
    /// provisional row rather than duplicating it.
    #[must_use]
    pub fn optimistic(variant_id: &VariantId) -> Self {
        Self(format!("{OPTIMISTIC_LINE_PREFIX}{variant_id}"))
    }

    /// Whether this ID was locally synthesized and is not yet confirmed by
    /// the backend.
    ///
    /// Mutations that would reference a backend row must branch on this:
    /// there is no server-side line item to address for an optimistic ID.
    #[must_use]
    pub fn is_optimistic(&self) -> bool {
        self.0.starts_with(OPTIMISTIC_LINE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimistic_id_is_deterministic() {
        let variant = VariantId::new("variant_123");
        assert_eq!(
            LineItemId::optimistic(&variant),
            LineItemId::optimistic(&variant)
        );
    }

    #[test]
    fn test_optimistic_id_format() {
        let id = LineItemId::optimistic(&VariantId::new("v1"));
        assert_eq!(id.as_str(), "__optimistic__-v1");
        assert!(id.is_optimistic());
    }

    #[test]
    fn test_backend_id_is_not_optimistic() {
        let id = LineItemId::new("li_01HXAMPLE");
        assert!(!id.is_optimistic());
    }

    #[test]
    fn test_display_roundtrip() {
        let id = CartId::new("cart_1");
        assert_eq!(id.to_string(), "cart_1");
        assert_eq!(CartId::from("cart_1"), id);
    }
}
