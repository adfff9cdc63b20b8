use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, ProductId};
use storefront_products::{
    Product, Selection, is_color_like, option_image, resolve_price, resolve_stock,
};

/// One cart (or order) line, frozen when the shopper added it.
///
/// Name, unit price and image are copied from the product at capture time so
/// that later catalog edits do not change what the shopper saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub selection: Selection,
    pub unit_price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl LineSnapshot {
    /// Snapshot `product` with `selection`, resolving the unit price now.
    pub fn capture(
        product: &Product,
        selection: Selection,
        image: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: resolve_price(product, &selection),
            selection,
            image: image.into(),
            quantity,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this line holds the given variant. Selection order is ignored.
    pub fn is_variant(&self, product_id: ProductId, selection: &Selection) -> bool {
        self.product_id == product_id && &self.selection == selection
    }
}

/// A shopper's cart. At most one line per `(product, selection)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<LineSnapshot>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[LineSnapshot] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(LineSnapshot::line_total).sum()
    }

    pub fn find(&self, product_id: ProductId, selection: &Selection) -> Option<&LineSnapshot> {
        self.lines.iter().find(|l| l.is_variant(product_id, selection))
    }

    fn position(&self, product_id: ProductId, selection: &Selection) -> Option<usize> {
        self.lines.iter().position(|l| l.is_variant(product_id, selection))
    }

    /// Add a line, merging its quantity into an existing line for the same
    /// variant. Lines with a zero quantity are ignored.
    pub fn add(&mut self, line: LineSnapshot) {
        if line.quantity == 0 {
            return;
        }
        match self.position(line.product_id, &line.selection) {
            Some(idx) => {
                let existing = &mut self.lines[idx];
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            None => self.lines.push(line),
        }
    }

    pub fn remove(&mut self, product_id: ProductId, selection: &Selection) -> Option<LineSnapshot> {
        let idx = self.position(product_id, selection)?;
        Some(self.lines.remove(idx))
    }

    /// Set the quantity of a line. Zero removes it; a quantity above the
    /// tracked stock of the variant is rejected.
    pub fn update_quantity(
        &mut self,
        product: &Product,
        selection: &Selection,
        quantity: u32,
    ) -> DomainResult<()> {
        let idx = self
            .position(product.id, selection)
            .ok_or_else(DomainError::not_found)?;

        if quantity == 0 {
            self.lines.remove(idx);
            return Ok(());
        }

        if let Some(available) = resolve_stock(product, selection) {
            if i64::from(quantity) > available {
                return Err(DomainError::InsufficientStock {
                    requested: quantity,
                    available,
                });
            }
        }

        self.lines[idx].quantity = quantity;
        Ok(())
    }

    /// Switch one option of a line's variant and re-resolve its price.
    ///
    /// The image only changes when a color-like key is switched to an option
    /// that has one. If the new variant is already in the cart the two lines
    /// are merged.
    pub fn change_variant(
        &mut self,
        product: &Product,
        selection: &Selection,
        key: &str,
        value: &str,
    ) -> DomainResult<()> {
        let idx = self
            .position(product.id, selection)
            .ok_or_else(DomainError::not_found)?;

        let next = selection.clone().with(key, value);
        if next == *selection {
            return Ok(());
        }

        let mut line = self.lines.remove(idx);
        if is_color_like(key) {
            if let Some(image) = option_image(&product.specifications, key, value) {
                line.image = image.to_string();
            }
        }
        line.unit_price = resolve_price(product, &next);
        line.selection = next;

        tracing::debug!(
            product_id = %product.id,
            key,
            value,
            unit_price = %line.unit_price,
            "cart line variant changed"
        );

        self.lines.insert(idx, line);
        self.dedupe_at(idx);
        Ok(())
    }

    /// Fold the line at `idx` into another line for the same variant, if any.
    fn dedupe_at(&mut self, idx: usize) {
        let (product_id, selection) =
            (self.lines[idx].product_id, self.lines[idx].selection.clone());
        let other = self
            .lines
            .iter()
            .enumerate()
            .find(|(i, l)| *i != idx && l.is_variant(product_id, &selection))
            .map(|(i, _)| i);
        if let Some(other) = other {
            let moved = self.lines.remove(idx);
            let target = if other > idx { other - 1 } else { other };
            let kept = &mut self.lines[target];
            kept.quantity = kept.quantity.saturating_add(moved.quantity);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
