//! The product record as read from the record store.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use storefront_core::ProductId;

use crate::exceptions::VariantExceptionList;
use crate::pricing::{VariantPricingTable, decimal_from_json};
use crate::schema::SpecificationSchema;
use crate::stock::VariantStockTable;

/// Catalog product with its variant tables.
///
/// The product owns its schema and all variant tables. Resolution only reads
/// them; the stock table is rewritten by the order placement and
/// cancellation flows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    /// Base price (smallest sellable unit of the store currency).
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Decimal,
    #[serde(default)]
    pub specifications: SpecificationSchema,
    #[serde(default, deserialize_with = "lenient_table")]
    pub variant_pricing: Option<VariantPricingTable>,
    #[serde(default, deserialize_with = "lenient_table")]
    pub variant_stock: Option<VariantStockTable>,
    #[serde(default, deserialize_with = "lenient_table")]
    pub variant_exceptions: Option<VariantExceptionList>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            specifications: SpecificationSchema::default(),
            variant_pricing: None,
            variant_stock: None,
            variant_exceptions: None,
            image: None,
            brand: None,
            model: None,
            description: None,
            category_id: None,
        }
    }

    pub fn with_specifications(mut self, schema: SpecificationSchema) -> Self {
        self.specifications = schema;
        self
    }

    pub fn with_pricing(mut self, table: VariantPricingTable) -> Self {
        self.variant_pricing = Some(table);
        self
    }

    pub fn with_stock(mut self, table: VariantStockTable) -> Self {
        self.variant_stock = Some(table);
        self
    }

    pub fn with_exceptions(mut self, list: VariantExceptionList) -> Self {
        self.variant_exceptions = Some(list);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Base price clamped at zero.
    pub fn base_price(&self) -> Decimal {
        self.price.max(Decimal::ZERO)
    }

    pub fn pricing(&self) -> Option<&VariantPricingTable> {
        self.variant_pricing.as_ref().filter(|t| !t.is_empty())
    }

    pub fn stock(&self) -> Option<&VariantStockTable> {
        self.variant_stock.as_ref()
    }

    pub fn exceptions(&self) -> Option<&VariantExceptionList> {
        self.variant_exceptions.as_ref()
    }

    /// Default image, ignoring blank strings.
    pub fn default_image(&self) -> Option<&str> {
        self.image.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// A missing or unparseable base price reads as zero rather than failing the
/// whole record.
fn lenient_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(decimal_from_json(&raw).unwrap_or(Decimal::ZERO))
}

/// `null` or a blob of the wrong shape reads as "no table".
fn lenient_table<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    let expected_shape = raw.is_object() || raw.is_array();
    Ok(expected_shape
        .then(|| serde_json::from_value(raw).ok())
        .flatten())
}
