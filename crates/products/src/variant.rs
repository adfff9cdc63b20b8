//! Variant resolution: price, stock, image and availability of a selection.
//!
//! Every function here is pure and fails open. Missing tables, a partial
//! selection or malformed data never produce an error; they fall back to the
//! base price, "untracked" stock, the default image and "available".

use rust_decimal::Decimal;

use crate::attribute::{AttributeKind, classify, is_color_like};
use crate::product::Product;
use crate::schema::SpecificationSchema;
use crate::selection::Selection;
use crate::stock::{StockKey, VariantStockTable};

/// Image path used when neither an option nor the product has one.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Non-color selected values joined with `_`, in selection order.
///
/// This is the key format of pricing tables and exception lists.
pub fn pricing_key(selection: &Selection) -> String {
    selection.non_color_values().collect::<Vec<_>>().join("_")
}

/// Effective unit price of `selection`.
///
/// Lookup order: the `{ram}_{storage}` pair when both are selected, then the
/// exact non-color key, then any key holding the same tokens in another
/// order. Falls back to the base price; never negative.
pub fn resolve_price(product: &Product, selection: &Selection) -> Decimal {
    let base = product.base_price();
    let Some(table) = product.pricing() else {
        return base;
    };

    if let (Some(ram), Some(storage)) = (
        selection.value_of_kind(AttributeKind::Ram),
        selection.value_of_kind(AttributeKind::Storage),
    ) {
        if let Some(price) = table.lookup(&format!("{ram}_{storage}")) {
            tracing::trace!(product_id = %product.id, %price, "price resolved by ram/storage pair");
            return price;
        }
    }

    let tokens: Vec<&str> = selection.non_color_values().collect();
    if tokens.is_empty() {
        return base;
    }

    if let Some(price) = table.lookup(&tokens.join("_")) {
        tracing::trace!(product_id = %product.id, %price, "price resolved by exact key");
        return price;
    }

    if let Some(price) = table.lookup_unordered(&tokens) {
        tracing::trace!(product_id = %product.id, %price, "price resolved by unordered tokens");
        return price;
    }

    base
}

/// Tracked stock of `selection`.
///
/// `None` means "untracked": there is no stock table, nothing is selected, or
/// no key matches the selection exactly. Callers must not read it as zero.
pub fn resolve_stock(product: &Product, selection: &Selection) -> Option<i64> {
    product.stock()?.find(selection)
}

/// Image to display for `selection`, using the default placeholder.
pub fn resolve_image(
    product: &Product,
    selection: &Selection,
    last_changed: Option<(&str, &str)>,
) -> String {
    resolve_image_or(product, selection, last_changed, PLACEHOLDER_IMAGE)
}

/// Image to display for `selection`.
///
/// Only color-like keys switch the image. The key changed last wins when its
/// option carries an image; otherwise the last color-like entry (in
/// selection order) with an image is used, then the product image, then
/// `placeholder`.
pub fn resolve_image_or(
    product: &Product,
    selection: &Selection,
    last_changed: Option<(&str, &str)>,
    placeholder: &str,
) -> String {
    let schema = &product.specifications;

    let from_last_change = last_changed
        .filter(|(key, _)| is_color_like(key))
        .and_then(|(key, value)| option_image(schema, key, value));

    let from_selection = || {
        let entries: Vec<(&str, &str)> = selection.iter().collect();
        entries
            .into_iter()
            .rev()
            .filter(|(key, _)| is_color_like(key))
            .find_map(|(key, value)| option_image(schema, key, value))
    };

    from_last_change
        .or_else(from_selection)
        .or_else(|| product.default_image())
        .unwrap_or(placeholder)
        .to_string()
}

/// Image of the option `key = value`, ignoring blank paths. The key is matched
/// case-insensitively when no exact key exists.
pub fn option_image<'a>(
    schema: &'a SpecificationSchema,
    key: &str,
    value: &str,
) -> Option<&'a str> {
    let key = schema.key_like(key)?;
    schema
        .find_option(key, value)?
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Whether `selection` is sellable as far as the exception list goes.
///
/// Unavailable when the non-color composite key, or any single selected
/// value, is listed. Stock is a separate check: an available combination with
/// zero stock still cannot be bought.
pub fn is_available(product: &Product, selection: &Selection) -> bool {
    let Some(exceptions) = product.exceptions().filter(|e| !e.is_empty()) else {
        return true;
    };

    let key = pricing_key(selection);
    if !key.is_empty() && exceptions.contains(&key) {
        return false;
    }
    !selection.values().any(|value| exceptions.contains(value))
}

/// Availability of `selection` once `key` is set to `value`.
pub fn is_option_available(
    product: &Product,
    selection: &Selection,
    key: &str,
    value: &str,
) -> bool {
    is_available(product, &selection.clone().with(key, value))
}

/// One option of a selectable key, as a picker renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionState {
    pub value: String,
    pub color: Option<String>,
    pub selected: bool,
    pub available: bool,
}

/// A selectable key with the state of each of its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecChoice {
    pub key: String,
    pub options: Vec<OptionState>,
}

/// Picker state for every selectable key, in schema order.
pub fn option_states(product: &Product, selection: &Selection) -> Vec<SpecChoice> {
    product
        .specifications
        .selectable()
        .map(|(key, options)| SpecChoice {
            key: key.to_string(),
            options: options
                .iter()
                .map(|opt| OptionState {
                    value: opt.value.clone(),
                    color: opt.color.clone(),
                    selected: selection.get(key) == Some(opt.value.as_str()),
                    available: is_option_available(product, selection, key, &opt.value),
                })
                .collect(),
        })
        .collect()
}

/// Stock key addressed by [`restock`] and [`withdraw`].
pub fn canonical_stock_key(selection: &Selection) -> String {
    StockKey::canonical(selection).to_string()
}

/// Stock table after returning `quantity` units of `selection`.
///
/// Only an existing canonical key is incremented; an unknown key (or a product
/// without a stock table) yields the table unchanged.
pub fn restock(product: &Product, selection: &Selection, quantity: u32) -> VariantStockTable {
    let mut table = product.stock().cloned().unwrap_or_default();
    table.restock(selection, quantity);
    table
}

/// Stock table after taking `quantity` units of `selection`, floored at zero.
///
/// Like [`restock`], an unknown key leaves the table unchanged.
pub fn withdraw(product: &Product, selection: &Selection, quantity: u32) -> VariantStockTable {
    let mut table = product.stock().cloned().unwrap_or_default();
    table.withdraw(selection, quantity);
    table
}

/// Every stock key a schema implies: the cartesian product of its
/// stock-tracked keys (Color, Ram, Storage, Memory) in canonical order.
pub fn stock_combinations(schema: &SpecificationSchema) -> Vec<String> {
    let mut tracked: Vec<(&str, Vec<&str>)> = schema
        .selectable()
        .filter(|(key, _)| classify(key).is_stock_tracked())
        .map(|(key, options)| (key, options.iter().map(|o| o.value.as_str()).collect()))
        .collect();
    if tracked.is_empty() {
        return Vec::new();
    }
    tracked.sort_by_key(|(key, _)| classify(key).stock_rank());

    let mut combos: Vec<Vec<String>> = vec![Vec::new()];
    for (key, values) in &tracked {
        combos = combos
            .iter()
            .flat_map(|prefix| {
                values.iter().map(move |value| {
                    let mut next = prefix.clone();
                    next.push(format!("{key}: {value}"));
                    next
                })
            })
            .collect();
    }
    combos.into_iter().map(|parts| parts.join(" | ")).collect()
}

/// Migration pass over a persisted stock table; see
/// [`VariantStockTable::normalized`].
pub fn normalize_stock_keys(
    schema: &SpecificationSchema,
    table: &VariantStockTable,
) -> VariantStockTable {
    table.normalized(schema)
}

/// First option of every selectable key, in schema order.
pub fn default_selection(schema: &SpecificationSchema) -> Selection {
    schema
        .selectable()
        .filter_map(|(key, options)| options.first().map(|opt| (key, opt.value.as_str())))
        .collect()
}
