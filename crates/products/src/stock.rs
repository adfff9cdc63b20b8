//! Per-variant stock counts keyed by `"Type: Value | Type: Value"`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attribute::{classify, same_label};
use crate::schema::SpecificationSchema;
use crate::selection::Selection;

const PAIR_SEPARATOR: &str = " | ";
const TYPE_SEPARATOR: &str = ": ";

/// A composite stock key split into its `(type, value)` pairs.
///
/// Parsing is lenient: parts without a `": "` separator, or with an empty
/// type or value, are dropped. A type repeated (case-insensitively) keeps its
/// last value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockKey {
    pairs: Vec<(String, String)>,
}

impl StockKey {
    pub fn parse(raw: &str) -> Self {
        let mut key = StockKey { pairs: Vec::new() };
        for part in raw.split(PAIR_SEPARATOR) {
            let Some((ty, value)) = part.split_once(TYPE_SEPARATOR) else {
                continue;
            };
            if ty.is_empty() || value.is_empty() {
                continue;
            }
            key.push(ty, value);
        }
        key
    }

    /// The key `restock`/`withdraw` address: the selection's entries with
    /// their original casing, Color-like first, then Ram, then Storage, then
    /// the rest in selection order.
    pub fn canonical(selection: &Selection) -> Self {
        let mut pairs: Vec<(String, String)> = selection
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        pairs.sort_by_key(|(k, _)| classify(k).stock_rank());
        StockKey { pairs }
    }

    fn push(&mut self, ty: &str, value: &str) {
        match self.pairs.iter_mut().find(|(t, _)| same_label(t, ty)) {
            Some(pair) => pair.1 = value.to_string(),
            None => self.pairs.push((ty.to_string(), value.to_string())),
        }
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Same number of pairs as the selection has entries, and every entry's
    /// type matches case-insensitively with an identical value.
    pub fn matches(&self, selection: &Selection) -> bool {
        self.len() == selection.len()
            && selection.iter().all(|(ty, value)| {
                self.pairs
                    .iter()
                    .any(|(t, v)| same_label(t, ty) && v == value)
            })
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, (ty, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(PAIR_SEPARATOR)?;
            }
            write!(f, "{ty}{TYPE_SEPARATOR}{value}")?;
        }
        Ok(())
    }
}

/// Flat `composite key -> count` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct VariantStockTable(BTreeMap<String, i64>);

impl VariantStockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, key: impl Into<String>, count: i64) -> Self {
        self.0.insert(key.into(), count);
        self
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, count: i64) {
        self.0.insert(key.into(), count);
    }

    pub fn remove(&mut self, key: &str) -> Option<i64> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Count of the first key (in key order) that exactly matches `selection`.
    pub fn find(&self, selection: &Selection) -> Option<i64> {
        self.find_entry(selection).map(|(_, count)| count)
    }

    /// Stored key and count behind [`find`](Self::find). The key may list its
    /// pairs in any order and spell the types in any case.
    pub fn find_entry(&self, selection: &Selection) -> Option<(&str, i64)> {
        if selection.is_empty() {
            return None;
        }
        self.0
            .iter()
            .find(|(key, _)| StockKey::parse(key).matches(selection))
            .map(|(key, count)| (key.as_str(), *count))
    }

    /// Add `quantity` to the canonical key of `selection`. Returns `false`
    /// (and leaves the table alone) when that key is not present.
    pub fn restock(&mut self, selection: &Selection, quantity: u32) -> bool {
        let key = StockKey::canonical(selection).to_string();
        match self.0.get_mut(&key) {
            Some(count) => {
                *count = count.saturating_add(i64::from(quantity));
                tracing::debug!(
                    stock_key = %key,
                    quantity,
                    new_count = *count,
                    "variant restocked"
                );
                true
            }
            None => {
                tracing::warn!(stock_key = %key, "stock key not found; restock skipped");
                false
            }
        }
    }

    /// Subtract `quantity` from the canonical key of `selection`, never going
    /// below zero. Returns `false` when that key is not present.
    pub fn withdraw(&mut self, selection: &Selection, quantity: u32) -> bool {
        let key = StockKey::canonical(selection).to_string();
        match self.0.get_mut(&key) {
            Some(count) => {
                *count = count.saturating_sub(i64::from(quantity)).max(0);
                tracing::debug!(
                    stock_key = %key,
                    quantity,
                    new_count = *count,
                    "variant stock withdrawn"
                );
                true
            }
            None => {
                tracing::warn!(stock_key = %key, "stock key not found; withdraw skipped");
                false
            }
        }
    }

    /// Subtract `quantity` from the stored key that [`find`](Self::find)
    /// resolves for `selection`, never going below zero. Unlike
    /// [`withdraw`](Self::withdraw) the key need not be canonical. Returns
    /// `false` when no key matches.
    pub fn withdraw_matching(&mut self, selection: &Selection, quantity: u32) -> bool {
        let Some(key) = self.find_entry(selection).map(|(key, _)| key.to_string()) else {
            tracing::warn!(?selection, "no stock key matches; withdraw skipped");
            return false;
        };
        if let Some(count) = self.0.get_mut(&key) {
            *count = count.saturating_sub(i64::from(quantity)).max(0);
            tracing::debug!(
                stock_key = %key,
                quantity,
                new_count = *count,
                "variant stock withdrawn"
            );
        }
        true
    }

    /// Add `quantity` to the stored key that [`find`](Self::find) resolves for
    /// `selection`. Returns `false` when no key matches.
    pub fn restock_matching(&mut self, selection: &Selection, quantity: u32) -> bool {
        let Some(key) = self.find_entry(selection).map(|(key, _)| key.to_string()) else {
            tracing::warn!(?selection, "no stock key matches; restock skipped");
            return false;
        };
        if let Some(count) = self.0.get_mut(&key) {
            *count = count.saturating_add(i64::from(quantity));
            tracing::debug!(stock_key = %key, quantity, new_count = *count, "variant restocked");
        }
        true
    }

    /// Rewrite every key into canonical priority order, spelling each type the
    /// way `schema` declares it. Keys that collide after rewriting have their
    /// counts summed; keys that do not parse are kept verbatim.
    pub fn normalized(&self, schema: &SpecificationSchema) -> Self {
        let mut out = VariantStockTable::new();
        for (raw, count) in &self.0 {
            let parsed = StockKey::parse(raw);
            let key = if parsed.is_empty() {
                raw.clone()
            } else {
                let selection: Selection = parsed
                    .pairs()
                    .map(|(ty, value)| (schema.key_like(ty).unwrap_or(ty).to_string(), value))
                    .collect();
                StockKey::canonical(&selection).to_string()
            };
            let slot = out.0.entry(key).or_insert(0);
            *slot = slot.saturating_add(*count);
        }
        out
    }
}

/// Fail-open decoding: entries whose count is not an integer are skipped.
impl From<Value> for VariantStockTable {
    fn from(value: Value) -> Self {
        let Value::Object(entries) = value else {
            return VariantStockTable::new();
        };
        VariantStockTable(
            entries
                .into_iter()
                .filter_map(|(key, raw)| count_from_json(&raw).map(|c| (key, c)))
                .collect(),
        )
    }
}

fn count_from_json(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
