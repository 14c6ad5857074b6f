//! Note metadata as an insertion-ordered tagged union.
//!
//! Header blocks are decoded with `serde_yaml` and converted into
//! [`Metadata`]; rendering goes the other way. Both directions are total.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// One metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// Explicit `null` / `~`.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Integer(i64),
    /// Floating point scalar (also used for integers outside `i64`).
    Float(f64),
    /// String scalar.
    String(String),
    /// Sequence of values.
    List(Vec<MetadataValue>),
    /// Nested mapping.
    Mapping(Metadata),
}

/// Scalar projection of a metadata value for flat key/value stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlatValue {
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Integer(i64),
    /// Floating point scalar.
    Float(f64),
    /// Text (lists and mappings are rendered to text).
    String(String),
}

/// Insertion-ordered string-keyed metadata map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetadataValue)>,
}

impl MetadataValue {
    /// Convert a decoded YAML value. Tags are unwrapped.
    #[must_use]
    pub fn from_yaml(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => match (number.as_i64(), number.as_f64()) {
                (Some(int), _) => Self::Integer(int),
                (None, Some(float)) => Self::Float(float),
                (None, None) => Self::String(number.to_string()),
            },
            Value::String(text) => Self::String(text),
            Value::Sequence(items) => Self::List(items.into_iter().map(Self::from_yaml).collect()),
            Value::Mapping(map) => Self::Mapping(Metadata::from_yaml_mapping(map)),
            Value::Tagged(tagged) => Self::from_yaml(tagged.value),
        }
    }

    /// Convert back to a YAML value.
    #[must_use]
    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Integer(int) => Value::Number((*int).into()),
            Self::Float(float) => Value::Number((*float).into()),
            Self::String(text) => Value::String(text.clone()),
            Self::List(items) => Value::Sequence(items.iter().map(Self::to_yaml).collect()),
            Self::Mapping(map) => map.to_yaml(),
        }
    }

    /// Borrow the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// Plain-text rendering used when a value must become a single string.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(flag) => flag.to_string(),
            Self::Integer(int) => int.to_string(),
            Self::Float(float) => float.to_string(),
            Self::String(text) => text.clone(),
            Self::List(items) => items
                .iter()
                .filter(|item| !matches!(item, Self::Null))
                .map(Self::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Mapping(map) => serde_json::to_string(map).unwrap_or_default(),
        }
    }

    /// Flatten into a scalar; `Null` is dropped.
    #[must_use]
    pub fn flatten(&self) -> Option<FlatValue> {
        match self {
            Self::Null => None,
            Self::Bool(flag) => Some(FlatValue::Bool(*flag)),
            Self::Integer(int) => Some(FlatValue::Integer(*int)),
            Self::Float(float) => Some(FlatValue::Float(*float)),
            Self::String(text) => Some(FlatValue::String(text.clone())),
            Self::List(_) | Self::Mapping(_) => Some(FlatValue::String(self.to_text())),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Metadata> for MetadataValue {
    fn from(value: Metadata) -> Self {
        Self::Mapping(value)
    }
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Integer(int) => serializer.serialize_i64(*int),
            Self::Float(float) => serializer.serialize_f64(*float),
            Self::String(text) => serializer.serialize_str(text),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(map) => map.serialize(serializer),
        }
    }
}

fn yaml_key_to_string(key: Value) -> String {
    match key {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        Value::Tagged(tagged) => yaml_key_to_string(tagged.value),
        other => serde_yaml::to_string(&other)
            .map(|rendered| rendered.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl Metadata {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a YAML mapping, stringifying non-string keys.
    #[must_use]
    pub fn from_yaml_mapping(map: Mapping) -> Self {
        map.into_iter()
            .map(|(key, value)| (yaml_key_to_string(key), MetadataValue::from_yaml(value)))
            .collect()
    }

    /// Decode a YAML document that must be a mapping (or empty).
    ///
    /// # Errors
    ///
    /// Returns the decoder message when the text is not valid YAML or the
    /// document is a scalar/sequence.
    pub fn from_yaml_str(text: &str) -> Result<Self, String> {
        let value: Value = serde_yaml::from_str(text).map_err(|err| err.to_string())?;
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(map) => Ok(Self::from_yaml_mapping(map)),
            Value::Tagged(tagged) => match tagged.value {
                Value::Mapping(map) => Ok(Self::from_yaml_mapping(map)),
                _ => Err("metadata block is not a mapping".to_string()),
            },
            _ => Err("metadata block is not a mapping".to_string()),
        }
    }

    /// Convert to a YAML mapping value.
    #[must_use]
    pub fn to_yaml(&self) -> Value {
        let mut map = Mapping::new();
        for (key, value) in &self.entries {
            map.insert(Value::String(key.clone()), value.to_yaml());
        }
        Value::Mapping(map)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Insert or replace a key. Replacement keeps the original position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        let key = key.into();
        let value = value.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        let position = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Shallow merge: keys from `other` overwrite, new keys are appended.
    pub fn merge(&mut self, other: &Metadata) {
        for (key, value) in &other.entries {
            self.insert(key.clone(), value.clone());
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// String items of a list-valued key. Scalars and missing keys yield nothing.
    #[must_use]
    pub fn string_list(&self, key: &str) -> Vec<String> {
        let Some(MetadataValue::List(items)) = self.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter(|item| !matches!(item, MetadataValue::Null))
            .map(MetadataValue::to_text)
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

impl FromIterator<(String, MetadataValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, MetadataValue)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (key, value) in iter {
            out.insert(key, value);
        }
        out
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
