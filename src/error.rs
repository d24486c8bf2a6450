//! Error types for form encoding.
//!
//! Encoding distinguishes between two failure scopes:
//!
//! - **Invalid argument**: the root value cannot be encoded at all (an absent
//!   `Option`, the unit value). Reported as [`Error::InvalidEncode`] and no
//!   output is produced.
//! - **Per-field errors**: a single leaf failed (a custom type function
//!   returned an error, an enum variant carrying data, a nesting limit was
//!   hit). Each failure is a [`FieldError`] recorded against the namespace
//!   path that produced it; traversal continues for every other path.
//!
//! Per-field errors are gathered into [`EncodeErrors`], which renders one line
//! per failing path.
//!
//! ## Examples
//!
//! ```rust
//! use serde_form::{Encoder, Error};
//!
//! let encoder = Encoder::new();
//! let err = encoder.encode(&Option::<u32>::None).unwrap_err();
//! assert!(matches!(err, Error::InvalidEncode { .. }));
//! assert_eq!(err.to_string(), "form: Encode(nil u32)");
//! ```

use indexmap::IndexMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by custom type functions.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all errors an encode call can return.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The root value is absent or not introspectable.
    ///
    /// `type_name` names the rejected type (the pointee for `Option<T>`), or
    /// is `None` when no meaningful type is known.
    #[error("{}", invalid_encode_message(.type_name.as_deref()))]
    InvalidEncode { type_name: Option<String> },

    /// One or more fields failed to encode.
    #[error(transparent)]
    Fields(EncodeErrors),

    /// Generic message raised through `serde::ser::Error::custom`.
    #[error("{0}")]
    Message(String),
}

fn invalid_encode_message(type_name: Option<&str>) -> String {
    match type_name {
        Some(name) => format!("form: Encode(nil {})", name),
        None => "form: Encode(nil)".to_string(),
    }
}

impl Error {
    /// Creates an invalid-argument error for the given rejected type.
    pub fn invalid_encode(type_name: Option<&str>) -> Self {
        Error::InvalidEncode {
            type_name: type_name.map(str::to_string),
        }
    }

    /// Returns the aggregated field errors if this is [`Error::Fields`].
    #[must_use]
    pub fn fields(&self) -> Option<&EncodeErrors> {
        match self {
            Error::Fields(errors) => Some(errors),
            _ => None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A failure attributed to a single namespace path.
#[derive(Debug, Clone, Error)]
pub enum FieldError {
    /// A registered custom type function returned an error.
    #[error("{0}")]
    Custom(Arc<dyn StdError + Send + Sync + 'static>),

    /// The value at this path has no form representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A map key could not be turned into a path segment.
    #[error("unsupported map key type: {0}")]
    UnsupportedMapKey(String),

    /// The value is nested deeper than the configured limit.
    #[error("maximum nesting depth of {0} exceeded")]
    DepthExceeded(usize),

    /// The value's `Serialize` implementation reported an error.
    #[error("{0}")]
    Serialize(String),
}

impl FieldError {
    pub(crate) fn custom(err: BoxError) -> Self {
        FieldError::Custom(Arc::from(err))
    }
}

const FIELD_NAMESPACE: &str = "Field Namespace:";
const ERROR_TEXT: &str = " ERROR:";

/// Aggregate of per-field errors keyed by namespace path.
///
/// Paths keep the order in which they first failed. Recording a second error
/// for the same path replaces the first.
///
/// # Examples
///
/// ```rust
/// use serde_form::{EncodeErrors, FieldError};
///
/// let mut errors = EncodeErrors::new();
/// errors.insert("user.age".to_string(), FieldError::DepthExceeded(4));
///
/// assert_eq!(errors.len(), 1);
/// assert!(errors.to_string().contains("Field Namespace:user.age ERROR:"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EncodeErrors(IndexMap<String, FieldError>);

impl EncodeErrors {
    #[must_use]
    pub fn new() -> Self {
        EncodeErrors(IndexMap::new())
    }

    /// Records `err` against `path`, returning the error it replaced.
    pub fn insert(&mut self, path: String, err: FieldError) -> Option<FieldError> {
        self.0.insert(path, err)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.0.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Failing paths in the order they first failed.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FieldError> {
        self.0.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for EncodeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, err)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}{}{}{}", FIELD_NAMESPACE, path, ERROR_TEXT, err)?;
        }
        Ok(())
    }
}

impl StdError for EncodeErrors {}

impl IntoIterator for EncodeErrors {
    type Item = (String, FieldError);
    type IntoIter = indexmap::map::IntoIter<String, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EncodeErrors {
    type Item = (&'a String, &'a FieldError);
    type IntoIter = indexmap::map::Iter<'a, String, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
