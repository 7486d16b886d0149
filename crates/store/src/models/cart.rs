//! Cart domain types and the line identity policy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use jersey_shop_core::ProductId;

use super::catalog::Product;

/// One distinct purchasable selection in the cart.
///
/// Invariant: `quantity >= 1` for any line present in the cart. A line whose
/// quantity reaches 0 is removed by the store, never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product this line refers to.
    pub id: ProductId,
    /// Display name, copied from the product at add time.
    pub name: String,
    /// Unit price at add time. Non-negative.
    pub price: Decimal,
    /// Image reference.
    pub image: String,
    /// Category name.
    pub category: String,
    /// Selected size variant, if the product has sizes.
    #[serde(default)]
    pub size: Option<String>,
    /// Number of units. Always >= 1.
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line: `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A product-like record passed by UI consumers to `add_to_cart`.
///
/// Carries an optional quantity (defaults to 1; an explicit 0 is also
/// treated as 1) and an optional size selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSelection {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
    pub size: Option<String>,
    pub quantity: Option<u32>,
}

impl CartSelection {
    /// Quantity to add, defaulted to 1 when unspecified or zero.
    #[must_use]
    pub fn effective_quantity(&self) -> u32 {
        self.quantity.map_or(1, |q| q.max(1))
    }

    /// Set the selected size variant.
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Set an explicit quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Build the cart line this selection creates when no existing line
    /// matches its identity key.
    #[must_use]
    pub fn into_line(self) -> CartLine {
        let quantity = self.effective_quantity();
        CartLine {
            id: self.id,
            name: self.name,
            price: self.price,
            image: self.image,
            category: self.category,
            size: self.size,
            quantity,
        }
    }
}

impl From<&Product> for CartSelection {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            category: product.category.clone(),
            size: None,
            quantity: None,
        }
    }
}

/// The identity key used to decide whether two cart operations refer to the
/// same line.
///
/// The storefront's history carries two competing policies; both are
/// supported and the caller picks one at store construction:
///
/// - [`ProductOnly`](Self::ProductOnly): one line per product id, size is not
///   distinguishing (the later revision, and the default).
/// - [`ProductAndSize`](Self::ProductAndSize): `(id, size)` pairs are
///   distinct lines (the earlier revision).
///
/// Removal and quantity-update address lines by product id under both
/// policies and touch every matching line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CartKeyPolicy {
    /// Lines are keyed by product id alone.
    #[default]
    ProductOnly,
    /// Lines are keyed by `(product id, size)`.
    ProductAndSize,
}

impl CartKeyPolicy {
    /// Whether an existing line and an incoming selection share an identity key.
    #[must_use]
    pub fn merges_with(self, line: &CartLine, selection: &CartSelection) -> bool {
        match self {
            Self::ProductOnly => line.id == selection.id,
            Self::ProductAndSize => line.id == selection.id && line.size == selection.size,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn selection(id: i32) -> CartSelection {
        CartSelection {
            id: ProductId::new(id),
            name: format!("Home Jersey {id}"),
            price: dec!(49.99),
            image: format!("/images/jersey-{id}.jpg"),
            category: "jerseys".to_string(),
            size: None,
            quantity: None,
        }
    }

    #[test]
    fn test_effective_quantity_defaults_to_one() {
        assert_eq!(selection(1).effective_quantity(), 1);
        assert_eq!(selection(1).with_quantity(3).effective_quantity(), 3);
    }

    #[test]
    fn test_effective_quantity_zero_is_one() {
        // Mirrors the storefront's `quantity || 1` default
        assert_eq!(selection(1).with_quantity(0).effective_quantity(), 1);
    }

    #[test]
    fn test_into_line_preserves_fields() {
        let line = selection(2).with_size("XL").with_quantity(2).into_line();
        assert_eq!(line.id, ProductId::new(2));
        assert_eq!(line.size.as_deref(), Some("XL"));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.line_total(), dec!(99.98));
    }

    #[test]
    fn test_product_only_policy_ignores_size() {
        let line = selection(1).with_size("M").into_line();
        let incoming = selection(1).with_size("XL");
        assert!(CartKeyPolicy::ProductOnly.merges_with(&line, &incoming));
    }

    #[test]
    fn test_product_and_size_policy_distinguishes_sizes() {
        let line = selection(1).with_size("M").into_line();
        let same_size = selection(1).with_size("M");
        let other_size = selection(1).with_size("XL");
        let sizeless = selection(1);

        assert!(CartKeyPolicy::ProductAndSize.merges_with(&line, &same_size));
        assert!(!CartKeyPolicy::ProductAndSize.merges_with(&line, &other_size));
        assert!(!CartKeyPolicy::ProductAndSize.merges_with(&line, &sizeless));
    }

    #[test]
    fn test_policies_never_merge_different_products() {
        let line = selection(1).into_line();
        let incoming = selection(2);
        assert!(!CartKeyPolicy::ProductOnly.merges_with(&line, &incoming));
        assert!(!CartKeyPolicy::ProductAndSize.merges_with(&line, &incoming));
    }

    #[test]
    fn test_line_total_zero_price() {
        let mut line = selection(1).with_quantity(5).into_line();
        line.price = Decimal::ZERO;
        assert_eq!(line.line_total(), Decimal::ZERO);
    }
}
