//! Custom type functions.
//!
//! A custom type function overrides how values of one type become a form
//! string. Functions are registered against [`TypeKey`]s on the
//! [`EncoderBuilder`](crate::EncoderBuilder) and are consulted before any
//! default handling, so they also apply to structs, newtypes and enums.
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::{Encoder, TypeKey};
//!
//! #[derive(Serialize)]
//! struct Cents(u64);
//!
//! #[derive(Serialize)]
//! struct Order { total: Cents }
//!
//! let encoder = Encoder::builder()
//!     .register_fn(
//!         |v| {
//!             let cents = v.as_number().and_then(|n| n.as_i64()).unwrap_or(0);
//!             Ok(format!("{}.{:02}", cents / 100, cents % 100))
//!         },
//!         [TypeKey::named("Cents")],
//!     )
//!     .build();
//!
//! let encoded = encoder.encode(&Order { total: Cents(1999) }).unwrap();
//! assert_eq!(encoded.values().get("total"), Some("19.99"));
//! ```

use crate::error::BoxError;
use crate::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A user-supplied value-to-string conversion.
///
/// The function receives the value of the registered type. For
/// [`Value::Named`] values (newtypes, unit enum variants) it receives the
/// wrapped value; for structs it receives the whole [`Value::Struct`].
pub type EncodeFn = Arc<dyn Fn(&Value) -> Result<String, BoxError> + Send + Sync>;

/// Identity of a type as seen by the encoder.
///
/// Named types are identified by their serde name: the Rust identifier unless
/// overridden with `#[serde(rename = "...")]`. Primitive keys match every
/// value of that serde kind regardless of width (`Integer` covers `i8` to
/// `i64`).
///
/// # Examples
///
/// ```rust
/// use serde_form::TypeKey;
///
/// assert_eq!(TypeKey::from("Email"), TypeKey::named("Email"));
/// assert_ne!(TypeKey::Integer, TypeKey::Unsigned);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// A struct, newtype struct, tuple struct, unit struct or enum.
    Named(Cow<'static, str>),
    Bool,
    Integer,
    Unsigned,
    Float,
    String,
}

impl TypeKey {
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        TypeKey::Named(name.into())
    }
}

impl From<&'static str> for TypeKey {
    fn from(name: &'static str) -> Self {
        TypeKey::named(name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Named(name) => f.write_str(name),
            TypeKey::Bool => f.write_str("bool"),
            TypeKey::Integer => f.write_str("integer"),
            TypeKey::Unsigned => f.write_str("unsigned"),
            TypeKey::Float => f.write_str("float"),
            TypeKey::String => f.write_str("string"),
        }
    }
}

/// Mapping from [`TypeKey`] to [`EncodeFn`].
///
/// Only mutable while an [`EncoderBuilder`](crate::EncoderBuilder) owns it;
/// a built encoder holds it behind an `Arc` and never changes it.
#[derive(Clone, Default)]
pub struct TypeFuncs {
    funcs: HashMap<TypeKey, EncodeFn>,
}

impl TypeFuncs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` for every key in `types`, replacing earlier registrations.
    pub fn register<I, K>(&mut self, f: EncodeFn, types: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<TypeKey>,
    {
        for key in types {
            self.funcs.insert(key.into(), Arc::clone(&f));
        }
    }

    #[must_use]
    pub fn lookup(&self, key: &TypeKey) -> Option<&EncodeFn> {
        self.funcs.get(key)
    }

    /// Finds the function for `value`, unwrapping [`Value::Some`] and
    /// [`Value::Named`] layers that have no registration of their own.
    ///
    /// Returns the function together with the value it should receive.
    pub(crate) fn resolve<'v>(&self, value: &'v Value) -> Option<(&EncodeFn, &'v Value)> {
        if self.funcs.is_empty() {
            return None;
        }
        let mut current = value;
        loop {
            if let Some(f) = current.type_key().and_then(|key| self.funcs.get(&key)) {
                let arg = match current {
                    Value::Named { value, .. } => value.as_ref(),
                    other => other,
                };
                return Some((f, arg));
            }
            match current {
                Value::Some(value) | Value::Named { value, .. } => current = value,
                _ => return None,
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

impl fmt::Debug for TypeFuncs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.funcs.keys()).finish()
    }
}
