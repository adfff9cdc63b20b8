//! Specification schemas: the ordered set of attributes a product exposes.
//!
//! Schemas are persisted in two shapes. Older records hold a plain object
//! (`key -> string` or `key -> option[]`); newer ones add an `_ordered` array of
//! `{key, values}` because the store does not keep object key order. Both are
//! decoded into [`SchemaEncoding`] and normalized into one
//! [`SpecificationSchema`].

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::attribute::same_label;

const ORDERED_KEY: &str = "_ordered";

/// One selectable option of a spec key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecOption {
    /// User-facing label; also the token used in pricing/stock keys.
    pub value: String,
    /// Swatch color (hex).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Image shown when this option is picked (color-like keys only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl SpecOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            color: None,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::new(s.clone())),
            Value::Object(obj) => {
                let label = scalar_text(obj.get("value")?)?;
                Some(Self {
                    value: label,
                    color: non_empty_text(obj.get("color")),
                    image: non_empty_text(obj.get("image")),
                })
            }
            _ => None,
        }
    }
}

/// Values of one spec key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SpecValues {
    /// A fixed, descriptive attribute ("Brand: Acme"). Not selectable.
    Fixed(String),
    /// A selectable list of options.
    Options(Vec<SpecOption>),
}

impl SpecValues {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(SpecValues::Options(
                items.iter().filter_map(SpecOption::from_json).collect(),
            )),
            Value::Null | Value::Object(_) => None,
            other => scalar_text(other).map(SpecValues::Fixed),
        }
    }

    pub fn options(&self) -> Option<&[SpecOption]> {
        match self {
            SpecValues::Options(opts) => Some(opts),
            SpecValues::Fixed(_) => None,
        }
    }
}

/// One `(key, values)` row of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecEntry {
    pub key: String,
    pub values: SpecValues,
}

/// A schema as it was found in the record, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaEncoding {
    /// Plain object; rows follow document order.
    Plain(Vec<SpecEntry>),
    /// Object carrying an `_ordered` array, which is authoritative.
    Ordered(Vec<SpecEntry>),
    /// Anything else (array, scalar, null): treated as "no specifications".
    Malformed,
}

impl SchemaEncoding {
    pub fn from_json(value: &Value) -> Self {
        let Value::Object(obj) = value else {
            return SchemaEncoding::Malformed;
        };

        match obj.get(ORDERED_KEY) {
            Some(Value::Array(rows)) => {
                SchemaEncoding::Ordered(rows.iter().filter_map(ordered_row).collect())
            }
            _ => SchemaEncoding::Plain(plain_rows(obj)),
        }
    }
}

fn ordered_row(row: &Value) -> Option<SpecEntry> {
    let key = row.get("key")?.as_str()?;
    if key.trim().is_empty() {
        return None;
    }
    let values = SpecValues::from_json(row.get("values")?)?;
    Some(SpecEntry {
        key: key.to_string(),
        values,
    })
}

fn plain_rows(obj: &Map<String, Value>) -> Vec<SpecEntry> {
    obj.iter()
        .filter(|(key, _)| key.as_str() != ORDERED_KEY && !key.trim().is_empty())
        .filter_map(|(key, value)| {
            SpecValues::from_json(value).map(|values| SpecEntry {
                key: key.clone(),
                values,
            })
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalized, ordered specification schema.
///
/// Keys are unique; inserting an existing key replaces its values in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct SpecificationSchema {
    entries: Vec<SpecEntry>,
}

impl SpecificationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, values: SpecValues) {
        let key = key.into();
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.values = values,
            None => self.entries.push(SpecEntry { key, values }),
        }
    }

    /// Builder-style insert of a selectable key.
    pub fn with_options(mut self, key: impl Into<String>, options: Vec<SpecOption>) -> Self {
        self.insert(key, SpecValues::Options(options));
        self
    }

    /// Builder-style insert of a fixed attribute.
    pub fn with_fixed(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, SpecValues::Fixed(value.into()));
        self
    }

    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SpecValues> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.values)
    }

    /// Exact key lookup, falling back to a case-insensitive match.
    pub fn key_like(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .or_else(|| self.entries.iter().find(|e| same_label(&e.key, key)))
            .map(|e| e.key.as_str())
    }

    /// Selectable keys with their options, in schema order.
    pub fn selectable(&self) -> impl Iterator<Item = (&str, &[SpecOption])> {
        self.entries
            .iter()
            .filter_map(|e| e.values.options().map(|opts| (e.key.as_str(), opts)))
    }

    /// First option of `key` whose label is `value` (duplicates are tolerated).
    pub fn find_option(&self, key: &str, value: &str) -> Option<&SpecOption> {
        self.get(key)?
            .options()?
            .iter()
            .find(|opt| opt.value == value)
    }
}

impl From<SchemaEncoding> for SpecificationSchema {
    fn from(encoding: SchemaEncoding) -> Self {
        let rows = match encoding {
            SchemaEncoding::Plain(rows) | SchemaEncoding::Ordered(rows) => rows,
            SchemaEncoding::Malformed => Vec::new(),
        };
        let mut schema = SpecificationSchema::new();
        for row in rows {
            schema.insert(row.key, row.values);
        }
        schema
    }
}

impl From<Value> for SpecificationSchema {
    fn from(value: Value) -> Self {
        SchemaEncoding::from_json(&value).into()
    }
}

/// Written back in the `_ordered` shape so the order survives the store.
impl Serialize for SpecificationSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 1))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.values)?;
        }
        map.serialize_entry(ORDERED_KEY, &self.entries)?;
        map.end()
    }
}
