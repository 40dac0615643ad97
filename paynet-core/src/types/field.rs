//! The field model shared by requests and responses.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single request or response value.
///
/// Scalars are text, integers or booleans. Composite fields (e.g. address
/// parts) nest as lists or maps and are flattened into bracketed names such as
/// `customerAddress[city]` on the wire.
///
/// ```
/// use paynet_core::types::{FieldMap, FieldValue};
///
/// let value: FieldValue = serde_json::from_value(serde_json::json!({
///     "city": "Leeds",
///     "lines": ["1 Main Street", "Flat 2"],
/// }))
/// .unwrap();
///
/// assert!(!value.is_scalar());
/// let FieldValue::Map(address) = &value else { panic!("expected a map") };
/// assert!(address.get("city").is_some_and(FieldValue::is_scalar));
/// assert_eq!(address.get_text("city"), Some("Leeds"));
/// assert!(matches!(address.get("lines"), Some(FieldValue::List(lines)) if lines.len() == 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Text(String),
    List(Vec<FieldValue>),
    Map(FieldMap),
}

impl FieldValue {
    /// Canonical text of a scalar, `None` for lists and maps.
    ///
    /// Booleans render as `1` / `0`, both when signing and in the form.
    pub fn scalar_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(text) => Some(Cow::Borrowed(text)),
            FieldValue::Integer(value) => Some(Cow::Owned(value.to_string())),
            FieldValue::Boolean(true) => Some(Cow::Borrowed("1")),
            FieldValue::Boolean(false) => Some(Cow::Borrowed("0")),
            FieldValue::List(_) | FieldValue::Map(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            FieldValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether the value is sent as a single field rather than flattened.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldValue::List(_) | FieldValue::Map(_))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Text(value.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(value: FieldMap) -> Self {
        FieldValue::Map(value)
    }
}

impl<V: Into<FieldValue>> From<Vec<V>> for FieldValue {
    fn from(values: Vec<V>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// An insertion-ordered map of field names to values.
///
/// The hosted form renders fields in insertion order. The signer sorts its
/// own copy.
///
/// ```
/// use paynet_core::types::FieldMap;
///
/// let request = FieldMap::new()
///     .with("action", "SALE")
///     .with("amount", 1001)
///     .with("type", 1);
///
/// assert_eq!(request.keys().collect::<Vec<_>>(), ["action", "amount", "type"]);
/// assert_eq!(request.get_text("action"), Some("SALE"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(IndexMap<String, FieldValue>);

impl FieldMap {
    pub fn new() -> Self {
        FieldMap(IndexMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Insert a field at the end, moving it there if it already exists.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        self.0.shift_remove(&key);
        self.0.insert(key, value.into());
    }

    /// Remove a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        self.0.get_mut(key)
    }

    /// The value of `key` if it is a text scalar.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FieldMap(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<FieldValue>> Extend<(K, V)> for FieldMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = indexmap::map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
