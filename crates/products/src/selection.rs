//! A shopper's (possibly partial) choice of one option value per spec key.

use core::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::attribute::{AttributeKind, classify};

/// Ordered mapping `spec key -> chosen option value`.
///
/// Entries keep the order in which keys were first chosen; re-choosing a key
/// replaces its value in place. That insertion order is significant: pricing
/// keys and exception keys join values in this order.
///
/// Equality ignores order, so `{Ram, Storage}` and `{Storage, Ram}` with the
/// same values identify the same variant (cart line identity).
#[derive(Debug, Clone, Default, Eq)]
pub struct Selection {
    entries: Vec<(String, String)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, keeping the key's original position if it was
    /// already chosen.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`Selection::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    /// Values of every non-color-like entry, in insertion order.
    pub fn non_color_values(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(k, _)| classify(k) != AttributeKind::Color)
            .map(|(_, v)| v)
    }

    /// First value whose key classifies as `kind`.
    pub fn value_of_kind(&self, kind: AttributeKind) -> Option<&str> {
        self.iter().find(|(k, _)| classify(k) == kind).map(|(_, v)| v)
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V> FromIterator<(K, V)> for Selection
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for (k, v) in iter {
            selection.set(k, v);
        }
        selection
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = Selection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of spec key to option value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Selection, A::Error> {
                let mut selection = Selection::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    selection.set(k, v);
                }
                Ok(selection)
            }

            // Cart rows without variants are stored as null.
            fn visit_unit<E>(self) -> Result<Selection, E> {
                Ok(Selection::new())
            }

            fn visit_none<E>(self) -> Result<Selection, E> {
                Ok(Selection::new())
            }
        }

        deserializer.deserialize_any(SelectionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_first_position_and_replaces_value() {
        let mut s = Selection::new().with("Ram", "8GB").with("Storage", "64GB");
        s.set("Ram", "12GB");

        let entries: Vec<_> = s.iter().collect();
        assert_eq!(entries, vec![("Ram", "12GB"), ("Storage", "64GB")]);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = Selection::new().with("Ram", "8GB").with("Storage", "128GB");
        let b = Selection::new().with("Storage", "128GB").with("Ram", "8GB");
        assert_eq!(a, b);
        assert_ne!(a, Selection::new().with("Ram", "8GB"));
    }

    #[test]
    fn non_color_values_skip_color_like_keys() {
        let s = Selection::new()
            .with("Frame Colour", "Red")
            .with("RAM", "8GB")
            .with("Color", "Black")
            .with("Storage", "128GB");
        let values: Vec<_> = s.non_color_values().collect();
        assert_eq!(values, vec!["8GB", "128GB"]);
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let s = Selection::new().with("Storage", "128GB").with("Color", "Black");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"Storage":"128GB","Color":"Black"}"#);

        let back: Selection = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = back.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Storage", "Color"]);
    }

    #[test]
    fn null_decodes_as_empty_selection() {
        let s: Selection = serde_json::from_str("null").unwrap();
        assert!(s.is_empty());
    }
}
