//! Catalog browsing: facet values collected from product schemas and the
//! filter a product listing applies.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::attribute::{AttributeKind, classify, same_label};
use crate::product::Product;
use crate::schema::{SpecValues, SpecificationSchema};

/// A spec attribute a listing can be narrowed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    /// Keys classified as Ram or Memory.
    Ram,
    /// Keys classified as Storage, plus "ROM".
    Storage,
}

impl Facet {
    /// Whether schema `key` feeds this facet.
    pub fn covers(self, key: &str) -> bool {
        match (self, classify(key)) {
            (Facet::Ram, AttributeKind::Ram | AttributeKind::Memory) => true,
            (Facet::Storage, AttributeKind::Storage) => true,
            (Facet::Storage, AttributeKind::Other) => same_label(key.trim(), "rom"),
            _ => false,
        }
    }
}

/// Values `schema` offers for `facet`: every option of a selectable key, or
/// the text of a fixed one. Blank values are skipped.
pub fn spec_facet_values(schema: &SpecificationSchema, facet: Facet) -> Vec<&str> {
    let mut values = Vec::new();
    for entry in schema.entries().iter().filter(|e| facet.covers(&e.key)) {
        match &entry.values {
            SpecValues::Fixed(text) => values.push(text.as_str()),
            SpecValues::Options(options) => values.extend(options.iter().map(|o| o.value.as_str())),
        }
    }
    values.into_iter().map(str::trim).filter(|v| !v.is_empty()).collect()
}

/// Distinct values of `facet` across `products`, sorted.
pub fn facet_values<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    facet: Facet,
) -> Vec<String> {
    products
        .into_iter()
        .flat_map(|p| spec_facet_values(&p.specifications, facet))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct non-blank brands across `products`, sorted.
pub fn brands<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<String> {
    products
        .into_iter()
        .filter_map(|p| p.brand.as_deref().map(str::trim))
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Highest base price across `products`; the upper end of a price slider.
pub fn max_price<'a>(products: impl IntoIterator<Item = &'a Product>) -> Option<Decimal> {
    products.into_iter().map(Product::base_price).max()
}

/// Listing filter. Every criterion left empty matches all products; the
/// criteria that are set must all hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category_id: Option<String>,
    /// Case-insensitive substring of name, description, brand or model.
    pub search: String,
    /// Inclusive bounds on the base price.
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub brands: Vec<String>,
    pub ram: Vec<String>,
    pub storage: Vec<String>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brands.push(brand.into());
        self
    }

    pub fn with_facet(mut self, facet: Facet, value: impl Into<String>) -> Self {
        self.facet_mut(facet).push(value.into());
        self
    }

    /// Add `brand` if absent, remove it otherwise. Returns whether it is now
    /// selected.
    pub fn toggle_brand(&mut self, brand: &str) -> bool {
        toggle(&mut self.brands, brand)
    }

    /// Like [`toggle_brand`](Self::toggle_brand), for a facet value.
    pub fn toggle_facet(&mut self, facet: Facet, value: &str) -> bool {
        toggle(self.facet_mut(facet), value)
    }

    pub fn facet(&self, facet: Facet) -> &[String] {
        match facet {
            Facet::Ram => &self.ram,
            Facet::Storage => &self.storage,
        }
    }

    fn facet_mut(&mut self, facet: Facet) -> &mut Vec<String> {
        match facet {
            Facet::Ram => &mut self.ram,
            Facet::Storage => &mut self.storage,
        }
    }

    /// Whether any criterion narrows the listing.
    pub fn is_active(&self) -> bool {
        self.category_id.is_some()
            || !self.search.trim().is_empty()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || !self.brands.is_empty()
            || !self.ram.is_empty()
            || !self.storage.is_empty()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.matches_category(product)
            && self.matches_search(product)
            && self.matches_price(product)
            && self.matches_brand(product)
            && self.matches_facet(product, Facet::Ram)
            && self.matches_facet(product, Facet::Storage)
    }

    /// Products that pass the filter, in input order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    fn matches_category(&self, product: &Product) -> bool {
        self.category_id
            .as_deref()
            .is_none_or(|id| product.category_id.as_deref() == Some(id))
    }

    fn matches_search(&self, product: &Product) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(product.name.as_str()),
            product.description.as_deref(),
            product.brand.as_deref(),
            product.model.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_price(&self, product: &Product) -> bool {
        let price = product.base_price();
        self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }

    fn matches_brand(&self, product: &Product) -> bool {
        self.brands.is_empty()
            || product
                .brand
                .as_deref()
                .is_some_and(|brand| self.brands.iter().any(|b| b == brand))
    }

    fn matches_facet(&self, product: &Product, facet: Facet) -> bool {
        let wanted = self.facet(facet);
        wanted.is_empty()
            || spec_facet_values(&product.specifications, facet)
                .into_iter()
                .any(|value| wanted.iter().any(|w| w == value))
    }
}

fn toggle(list: &mut Vec<String>, value: &str) -> bool {
    match list.iter().position(|v| v == value) {
        Some(i) => {
            list.remove(i);
            false
        }
        None => {
            list.push(value.to_string());
            true
        }
    }
}
