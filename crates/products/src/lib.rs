//! Products domain module (variant resolution).
//!
//! This crate contains the catalog product record, its variant tables and the
//! rules that resolve a shopper's selection into a price, a stock count, an
//! image and an availability flag. Everything here is deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod attribute;
pub mod catalog;
pub mod exceptions;
pub mod pricing;
pub mod product;
pub mod schema;
pub mod selection;
pub mod selector;
pub mod stock;
pub mod variant;

pub use attribute::{AttributeKind, classify, is_color_like, same_label};
pub use catalog::{CatalogFilter, Facet, brands, facet_values, max_price, spec_facet_values};
pub use exceptions::VariantExceptionList;
pub use pricing::{VariantPrice, VariantPricingTable};
pub use product::Product;
pub use schema::{SchemaEncoding, SpecEntry, SpecOption, SpecValues, SpecificationSchema};
pub use selection::Selection;
pub use selector::VariantSelector;
pub use stock::{StockKey, VariantStockTable};
pub use variant::{
    OptionState, PLACEHOLDER_IMAGE, SpecChoice, canonical_stock_key, default_selection,
    is_available, is_option_available, normalize_stock_keys, option_image, option_states,
    pricing_key, resolve_image, resolve_image_or, resolve_price, resolve_stock, restock,
    stock_combinations, withdraw,
};
