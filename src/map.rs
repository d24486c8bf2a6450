//! Encoded form values.
//!
//! This module provides [`FormValues`], a wrapper around [`IndexMap`] from key
//! path to the list of string values written at that path. A key holds more
//! than one value when it repeats (see
//! [`SeqStyle::Repeated`](crate::SeqStyle::Repeated)).
//!
//! Iteration follows first-insertion order, which is traversal order; the
//! query-string rendering sorts keys so the wire form is stable regardless of
//! map iteration order in the source value.
//!
//! ## Examples
//!
//! ```rust
//! use serde_form::FormValues;
//!
//! let mut values = FormValues::new();
//! values.add("name", "Al Smith");
//! values.add("tag", "x");
//! values.add("tag", "y");
//!
//! assert_eq!(values.get("name"), Some("Al Smith"));
//! assert_eq!(values.get_all("tag"), Some(&["x".to_string(), "y".to_string()][..]));
//! assert_eq!(values.to_query_string(), "name=Al+Smith&tag=x&tag=y");
//! ```

use crate::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Native (pre-stringification) values collected during encoding, keyed by
/// the same paths as [`FormValues`].
pub type NativeValues = IndexMap<String, Value>;

/// An ordered map of key paths to form values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(IndexMap<String, Vec<String>>);

impl FormValues {
    #[must_use]
    pub fn new() -> Self {
        FormValues(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        FormValues(IndexMap::with_capacity(capacity))
    }

    /// Appends `value` to the values of `key`.
    ///
    /// Returns `true` if `key` was not present before.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        match self.0.get_mut(&key) {
            Some(values) => {
                values.push(value);
                false
            }
            None => {
                self.0.insert(key, vec![value]);
                true
            }
        }
    }

    /// Replaces all values of `key`.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) -> Option<Vec<String>> {
        self.0.insert(key.into(), values)
    }

    /// Returns the first value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value of `key`.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Removes `key`, preserving the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Vec<String>> {
        self.0.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Vec<String>> {
        self.0.iter()
    }

    /// Every `(key, value)` pair, repeating keys that hold several values.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Renders `key=value` pairs joined by `&`, percent-encoded, keys sorted.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut keys: Vec<&String> = self.0.keys().collect();
        keys.sort();

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for key in keys {
            for value in &self.0[key] {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl From<HashMap<String, Vec<String>>> for FormValues {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        FormValues(map.into_iter().collect())
    }
}

impl From<FormValues> for HashMap<String, Vec<String>> {
    fn from(values: FormValues) -> Self {
        values.0.into_iter().collect()
    }
}

impl IntoIterator for FormValues {
    type Item = (String, Vec<String>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = indexmap::map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Collects pairs, appending repeated keys.
impl FromIterator<(String, String)> for FormValues {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut values = FormValues::new();
        for (k, v) in iter {
            values.add(k, v);
        }
        values
    }
}
