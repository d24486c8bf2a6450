//! Dynamic value representation used by the encoder.
//!
//! Every value handed to the encoder is first turned into a [`Value`] tree by
//! [`ValueSerializer`](crate::ValueSerializer). The tree is already
//! dereferenced (`Box`, `Rc`, references and `Some(_)` are transparent) and
//! classified, so the traversal only has to dispatch on the variant:
//!
//! - [`Value::Struct`] and [`Value::Named`] carry the serde type name, which
//!   is the identity used by the struct cache and the custom type registry.
//! - [`Value::Seq`] and [`Value::Map`] are collections.
//! - [`Value::Bool`], [`Value::Number`] and [`Value::String`] are leaves.
//! - [`Value::None`] contributes nothing.
//! - [`Value::Unsupported`], [`Value::Failed`] and [`Value::DepthExceeded`]
//!   mark a subtree that could not be captured; the traversal reports them as
//!   field errors at their path.
//!
//! ## Examples
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::{to_value, Value};
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! let point = value.as_struct().unwrap();
//! assert_eq!(point.name(), "Point");
//! assert_eq!(point.get("y"), Some(&Value::from(2)));
//! ```

use crate::registry::TypeKey;
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;

/// A dynamically-typed, dereferenced snapshot of a serializable value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Absent value (`None`, `()`); encodes to nothing.
    #[default]
    None,
    Bool(bool),
    Number(Number),
    String(String),
    Seq(Vec<Value>),
    /// Map entries in the order the map serialized them.
    Map(Vec<(Value, Value)>),
    Struct(StructValue),
    /// A present `Option`. Encodes like the wrapped value but is never empty,
    /// so `Some(0)` survives `omitempty`.
    Some(Box<Value>),
    /// A newtype struct, tuple struct, unit struct or unit enum variant,
    /// tagged with its serde type name.
    Named { name: &'static str, value: Box<Value> },
    /// A value with no form representation (enum variants carrying data).
    Unsupported(String),
    /// The value's `Serialize` implementation returned an error.
    Failed(String),
    /// The value is nested deeper than the configured limit.
    DepthExceeded,
}

/// A numeric leaf.
///
/// # Examples
///
/// ```rust
/// use serde_form::Number;
///
/// assert_eq!(Number::Integer(-3).to_string(), "-3");
/// assert_eq!(Number::Unsigned(u64::MAX).to_string(), "18446744073709551615");
/// assert_eq!(Number::Float(1.5).to_string(), "1.5");
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl Number {
    /// Returns `true` for the zero value of the number's kind.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match *self {
            Number::Integer(i) => i == 0,
            Number::Unsigned(u) => u == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Integer(i) => Some(i),
            Number::Unsigned(u) => i64::try_from(u).ok(),
            Number::Float(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::Unsigned(u) => u as f64,
            Number::Float(f) => f,
        }
    }
}

/// Floats print in the shortest form that round-trips, never in exponent
/// notation.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Unsigned(u) => write!(f, "{}", u),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

/// A struct snapshot: serde type name plus fields in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct StructValue {
    name: &'static str,
    fields: Vec<(&'static str, Value)>,
}

impl StructValue {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        StructValue {
            name,
            fields: Vec::new(),
        }
    }

    /// Appends a field, builder style.
    #[must_use]
    pub fn with_field(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    pub(crate) fn push(&mut self, key: &'static str, value: Value) {
        self.fields.push((key, value));
    }

    /// The serde type name of the struct.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[(&'static str, Value)] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(k, v)| if *k == key { Some(v) } else { None })
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns `true` for values that terminate traversal: booleans, numbers
    /// and strings, including when wrapped in [`Value::Named`].
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        match self {
            Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
            Value::Some(value) | Value::Named { value, .. } => value.is_leaf(),
            _ => false,
        }
    }

    /// Returns `true` for the "empty" values skipped by `omitempty` fields:
    /// absent values, `false`, zero, empty strings and collections, and
    /// structs whose fields are all empty. A present `Option` is never empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_form::Value;
    ///
    /// assert!(Value::from(0).is_empty());
    /// assert!(Value::from("").is_empty());
    /// assert!(!Value::from("x").is_empty());
    /// ```
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Value::None => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.is_zero(),
            Value::String(s) => s.is_empty(),
            Value::Seq(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            Value::Struct(s) => s.fields.iter().all(|(_, v)| v.is_empty()),
            Value::Named { value, .. } => value.is_empty(),
            Value::Some(_) => false,
            Value::Unsupported(_) | Value::Failed(_) | Value::DepthExceeded => false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Some(value) | Value::Named { value, .. } => value.as_str(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Some(value) | Value::Named { value, .. } => value.as_bool(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Some(value) | Value::Named { value, .. } => value.as_number(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            Value::Some(value) => value.as_struct(),
            _ => None,
        }
    }

    /// The registry key for this exact value, without unwrapping
    /// [`Value::Named`].
    pub(crate) fn type_key(&self) -> Option<TypeKey> {
        match self {
            Value::Struct(s) => Some(TypeKey::named(s.name)),
            Value::Named { name, .. } => Some(TypeKey::named(*name)),
            Value::Bool(_) => Some(TypeKey::Bool),
            Value::Number(Number::Integer(_)) => Some(TypeKey::Integer),
            Value::Number(Number::Unsigned(_)) => Some(TypeKey::Unsigned),
            Value::Number(Number::Float(_)) => Some(TypeKey::Float),
            Value::String(_) => Some(TypeKey::String),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub(crate) fn kind_name(&self) -> String {
        match self {
            Value::None => "none".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Seq(_) => "sequence".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Struct(s) => format!("struct {}", s.name),
            Value::Named { name, .. } => (*name).to_string(),
            Value::Some(value) => value.kind_name(),
            Value::Unsupported(reason) => reason.clone(),
            Value::Failed(_) => "failed value".to_string(),
            Value::DepthExceeded => "nested value".to_string(),
        }
    }

    /// Renders a leaf as its form string.
    pub(crate) fn leaf_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Some(value) | Value::Named { value, .. } => value.leaf_string(),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Integer(i64::from(value)))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Unsigned(u64::from(value)))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(Number::Unsigned(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Value::Struct(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Seq(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::None, |v| Value::Some(Box::new(v.into())))
    }
}

/// Serializing a [`Value`] replays the shape it was captured from, so native
/// values collected during encoding can be handed to other serde formats.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Unsigned(u)) => serializer.serialize_u64(*u),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Struct(s) => {
                let mut state = serializer.serialize_struct(s.name, s.fields.len())?;
                for (key, value) in &s.fields {
                    state.serialize_field(*key, value)?;
                }
                state.end()
            }
            Value::Some(value) => serializer.serialize_some(value),
            Value::Named { name, value } => serializer.serialize_newtype_struct(name, value),
            Value::Unsupported(reason) => Err(serde::ser::Error::custom(format!(
                "unsupported type: {}",
                reason
            ))),
            Value::Failed(msg) => Err(serde::ser::Error::custom(msg)),
            Value::DepthExceeded => Err(serde::ser::Error::custom("maximum nesting depth exceeded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_strings() {
        assert_eq!(Value::from(true).leaf_string().as_deref(), Some("true"));
        assert_eq!(Value::from(-7).leaf_string().as_deref(), Some("-7"));
        assert_eq!(Value::from(0.25).leaf_string().as_deref(), Some("0.25"));
        assert_eq!(Value::from(1e21).leaf_string().as_deref(), Some("1000000000000000000000"));
        assert_eq!(Value::from("hi").leaf_string().as_deref(), Some("hi"));
        assert_eq!(Value::Seq(vec![]).leaf_string(), None);
    }

    #[test]
    fn test_named_leaf_unwraps() {
        let email = Value::Named {
            name: "Email",
            value: Box::new(Value::from("a@b.c")),
        };
        assert!(email.is_leaf());
        assert_eq!(email.as_str(), Some("a@b.c"));
        assert_eq!(email.type_key(), Some(TypeKey::named("Email")));
    }

    #[test]
    fn test_present_option_is_never_empty() {
        assert!(Value::from(None::<u32>).is_empty());
        assert!(!Value::from(Some(0)).is_empty());
        assert!(!Value::from(Some("")).is_empty());
        assert!(!Value::from(Some(false)).is_empty());
        assert_eq!(Value::from(Some(7)).as_number(), Some(Number::Integer(7)));
        assert!(Value::from(Some("x")).is_leaf());
    }

    #[test]
    fn test_struct_emptiness() {
        let empty = StructValue::new("Empty")
            .with_field("a", 0)
            .with_field("b", "");
        assert!(Value::from(empty).is_empty());

        let filled = StructValue::new("Filled").with_field("a", 1);
        assert!(!Value::from(filled).is_empty());
    }

    #[test]
    fn test_value_serializes_to_json() {
        let value = Value::from(
            StructValue::new("User")
                .with_field("name", "Al")
                .with_field("tags", vec!["x", "y"]),
        );
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"name":"Al","tags":["x","y"]}"#);
    }
}
