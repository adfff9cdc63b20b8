//! Combinations explicitly marked unavailable, whatever their stock.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Set of blocked option values and `_`-joined non-color composites.
///
/// Kept as an insertion-ordered list without duplicates, the same shape the
/// record store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct VariantExceptionList(Vec<String>);

impl VariantExceptionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.iter().any(|e| e == entry)
    }

    /// Returns `false` if the entry was already present.
    pub fn insert(&mut self, entry: impl Into<String>) -> bool {
        let entry = entry.into();
        if self.contains(&entry) {
            return false;
        }
        self.0.push(entry);
        true
    }

    pub fn remove(&mut self, entry: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|e| e != entry);
        self.0.len() != before
    }

    /// Flip an entry in or out; returns whether it is now present.
    pub fn toggle(&mut self, entry: &str) -> bool {
        if self.remove(entry) {
            false
        } else {
            self.0.push(entry.to_string());
            true
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for VariantExceptionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = VariantExceptionList::new();
        for entry in iter {
            list.insert(entry);
        }
        list
    }
}

/// Fail-open decoding: non-string items are skipped, a non-array is empty.
impl From<Value> for VariantExceptionList {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => VariantExceptionList::new(),
        }
    }
}
