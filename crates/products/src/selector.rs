//! Stateful wrapper around the resolution functions for a product page.

use rust_decimal::Decimal;

use crate::product::Product;
use crate::selection::Selection;
use crate::variant::{self, PLACEHOLDER_IMAGE, SpecChoice};

/// Tracks one shopper's selection on one product and the image it shows.
///
/// The image is recomputed on every change so that the key changed last can
/// take precedence over older color choices.
#[derive(Debug, Clone)]
pub struct VariantSelector<'a> {
    product: &'a Product,
    selection: Selection,
    image: String,
    placeholder: String,
}

impl<'a> VariantSelector<'a> {
    pub fn new(product: &'a Product) -> Self {
        Self::with_selection(product, Selection::new())
    }

    /// Start from a preselected variant (e.g. carried over from a product card).
    pub fn with_selection(product: &'a Product, selection: Selection) -> Self {
        let image = variant::resolve_image(product, &selection, None);
        Self {
            product,
            selection,
            image,
            placeholder: PLACEHOLDER_IMAGE.to_string(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self.refresh_image(None);
        self
    }

    pub fn select(&mut self, key: &str, value: &str) {
        self.selection.set(key, value);
        self.refresh_image(Some((key, value)));
        tracing::trace!(
            product_id = %self.product.id,
            key,
            value,
            image = %self.image,
            "variant selected"
        );
    }

    pub fn clear(&mut self, key: &str) {
        if self.selection.remove(key).is_some() {
            self.refresh_image(None);
        }
    }

    fn refresh_image(&mut self, last_changed: Option<(&str, &str)>) {
        self.image = variant::resolve_image_or(
            self.product,
            &self.selection,
            last_changed,
            &self.placeholder,
        );
    }

    pub fn product(&self) -> &'a Product {
        self.product
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn into_selection(self) -> Selection {
        self.selection
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn price(&self) -> Decimal {
        variant::resolve_price(self.product, &self.selection)
    }

    pub fn stock(&self) -> Option<i64> {
        variant::resolve_stock(self.product, &self.selection)
    }

    pub fn is_available(&self) -> bool {
        variant::is_available(self.product, &self.selection)
    }

    pub fn option_states(&self) -> Vec<SpecChoice> {
        variant::option_states(self.product, &self.selection)
    }

    /// Largest quantity the shopper may request. Untracked variants are capped
    /// at `untracked_ceiling`.
    pub fn max_quantity(&self, untracked_ceiling: u32) -> u32 {
        match self.stock() {
            Some(count) => u32::try_from(count.max(0)).unwrap_or(u32::MAX),
            None => untracked_ceiling,
        }
    }

    pub fn clamp_quantity(&self, requested: u32, untracked_ceiling: u32) -> u32 {
        requested.min(self.max_quantity(untracked_ceiling))
    }

    /// Whether the current selection can be added to a cart: it must be
    /// available and, when tracked, have at least one unit.
    pub fn can_purchase(&self) -> bool {
        self.is_available() && self.stock().is_none_or(|count| count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SpecOption, SpecificationSchema};
    use crate::stock::VariantStockTable;
    use storefront_core::ProductId;

    fn product() -> Product {
        let schema = SpecificationSchema::new()
            .with_options(
                "Color",
                vec![
                    SpecOption::new("Black").with_image("black.png"),
                    SpecOption::new("White").with_image("white.png"),
                ],
            )
            .with_options("Ram", vec![SpecOption::new("8GB"), SpecOption::new("16GB")]);
        Product::new(ProductId::new(), "Laptop", Decimal::from(1500))
            .with_specifications(schema)
            .with_stock(
                VariantStockTable::new()
                    .with_count("Color: Black | Ram: 8GB", 4)
                    .with_count("Color: White | Ram: 8GB", 0),
            )
    }

    #[test]
    fn select_updates_image_and_stock() {
        let product = product();
        let mut selector = VariantSelector::new(&product);
        assert_eq!(selector.image(), PLACEHOLDER_IMAGE);
        assert_eq!(selector.stock(), None);

        selector.select("Color", "Black");
        selector.select("Ram", "8GB");
        assert_eq!(selector.image(), "black.png");
        assert_eq!(selector.stock(), Some(4));
        assert_eq!(selector.price(), Decimal::from(1500));

        selector.select("Color", "White");
        assert_eq!(selector.image(), "white.png");
        assert!(!selector.can_purchase());
    }

    #[test]
    fn quantity_is_capped_by_stock_or_ceiling() {
        let product = product();
        let mut selector = VariantSelector::new(&product);
        assert_eq!(selector.max_quantity(999), 999);
        assert_eq!(selector.clamp_quantity(5000, 999), 999);

        selector.select("Ram", "8GB");
        selector.select("Color", "Black");
        assert_eq!(selector.clamp_quantity(10, 999), 4);
        assert_eq!(selector.clamp_quantity(2, 999), 2);
    }

    #[test]
    fn clear_recomputes_image() {
        let product = product().with_image("laptop.png");
        let mut selector = VariantSelector::new(&product).with_placeholder("/none.png");
        assert_eq!(selector.image(), "laptop.png");

        selector.select("Color", "White");
        selector.clear("Color");
        assert_eq!(selector.image(), "laptop.png");
        assert!(selector.selection().is_empty());
    }
}
