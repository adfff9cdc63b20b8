//! Variant pricing tables: `group -> composite key -> price`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Price of one combination.
///
/// The admin surface stores either a bare number or an
/// `{originalPrice, discountedPrice}` pair; the discounted price is what the
/// shopper pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariantPrice {
    Amount(Decimal),
    #[serde(rename_all = "camelCase")]
    Discounted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_price: Option<Decimal>,
        discounted_price: Decimal,
    },
}

impl VariantPrice {
    /// Effective price, if it is usable (strictly positive).
    pub fn effective(&self) -> Option<Decimal> {
        let price = match self {
            VariantPrice::Amount(p) => *p,
            VariantPrice::Discounted {
                discounted_price, ..
            } => *discounted_price,
        };
        (price > Decimal::ZERO).then_some(price)
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(VariantPrice::Discounted {
                original_price: obj.get("originalPrice").and_then(decimal_from_json),
                discounted_price: obj.get("discountedPrice").and_then(decimal_from_json)?,
            }),
            other => decimal_from_json(other).map(VariantPrice::Amount),
        }
    }
}

pub(crate) fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_u64().map(Decimal::from))
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Nested pricing table. Groups and keys iterate in sorted order, so every
/// lookup is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct VariantPricingTable {
    groups: BTreeMap<String, BTreeMap<String, VariantPrice>>,
}

impl VariantPricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        group: impl Into<String>,
        key: impl Into<String>,
        price: VariantPrice,
    ) {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(key.into(), price);
    }

    /// Builder-style insert of a plain amount.
    pub fn with_price(mut self, group: &str, key: &str, price: Decimal) -> Self {
        self.insert(group, key, VariantPrice::Amount(price));
        self
    }

    /// True when no group holds any entry.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(BTreeMap::is_empty)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, VariantPrice>)> {
        self.groups.iter().map(|(g, entries)| (g.as_str(), entries))
    }

    /// Usable price stored under exactly `key`, in any group.
    pub fn lookup(&self, key: &str) -> Option<Decimal> {
        self.groups
            .values()
            .filter_map(|entries| entries.get(key))
            .find_map(VariantPrice::effective)
    }

    /// Usable price whose key, split on `_`, holds the same multiset of
    /// tokens as `tokens`.
    pub fn lookup_unordered(&self, tokens: &[&str]) -> Option<Decimal> {
        if tokens.is_empty() {
            return None;
        }
        let mut wanted: Vec<&str> = tokens.to_vec();
        wanted.sort_unstable();

        self.groups
            .values()
            .flat_map(|entries| entries.iter())
            .filter(|(key, _)| {
                let mut parts: Vec<&str> = key.split('_').collect();
                if parts.len() != wanted.len() {
                    return false;
                }
                parts.sort_unstable();
                parts == wanted
            })
            .find_map(|(_, price)| price.effective())
    }
}

impl Serialize for VariantPricingTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.groups.serialize(serializer)
    }
}

/// Fail-open decoding: malformed groups or entries are skipped.
impl From<Value> for VariantPricingTable {
    fn from(value: Value) -> Self {
        let mut table = VariantPricingTable::new();
        let Value::Object(groups) = value else {
            return table;
        };
        for (group, entries) in &groups {
            let Value::Object(entries) = entries else {
                continue;
            };
            for (key, raw) in entries {
                if let Some(price) = VariantPrice::from_json(raw) {
                    table.insert(group.clone(), key.clone(), price);
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_plain_and_discounted_entries() {
        let table = VariantPricingTable::from(json!({
            "variants": {
                "8GB_128GB": 22000,
                "12GB_256GB": {"originalPrice": 30000, "discountedPrice": 27500},
                "4GB_64GB": "18999.50",
                "broken": {"originalPrice": 100}
            }
        }));

        assert_eq!(table.lookup("8GB_128GB"), Some(Decimal::from(22000)));
        assert_eq!(table.lookup("12GB_256GB"), Some(Decimal::from(27500)));
        assert_eq!(table.lookup("4GB_64GB"), Some(Decimal::new(1899950, 2)));
        assert_eq!(table.lookup("broken"), None);
    }

    #[test]
    fn zero_and_negative_prices_are_not_usable() {
        let table = VariantPricingTable::new()
            .with_price("variants", "a", Decimal::ZERO)
            .with_price("variants", "b", Decimal::from(-5));
        assert_eq!(table.lookup("a"), None);
        assert_eq!(table.lookup("b"), None);
    }

    #[test]
    fn lookup_searches_every_group() {
        let table =
            VariantPricingTable::new().with_price("promo", "8GB_128GB", Decimal::from(21000));
        assert_eq!(table.lookup("8GB_128GB"), Some(Decimal::from(21000)));
    }

    #[test]
    fn unordered_lookup_requires_same_token_multiset() {
        let table = VariantPricingTable::new()
            .with_price("variants", "8GB_128GB_Pro", Decimal::from(25000));

        assert_eq!(
            table.lookup_unordered(&["Pro", "128GB", "8GB"]),
            Some(Decimal::from(25000))
        );
        assert_eq!(table.lookup_unordered(&["128GB", "8GB"]), None);
        assert_eq!(table.lookup_unordered(&["Pro", "128GB", "8GB", "8GB"]), None);
        assert_eq!(table.lookup_unordered(&[]), None);
    }

    #[test]
    fn non_object_blobs_decode_as_empty() {
        assert!(VariantPricingTable::from(json!([1, 2, 3])).is_empty());
        assert!(VariantPricingTable::from(json!({})).is_empty());
        assert!(VariantPricingTable::from(json!({"variants": {}})).is_empty());
    }
}
