//! # serde_form
//!
//! A Serde-driven encoder for `application/x-www-form-urlencoded` data.
//!
//! ## What does it do?
//!
//! `serde_form` flattens any `T: Serialize` into key/value pairs whose keys
//! describe the path to each leaf: `.` separates struct fields, `[i]` indexes
//! sequences and `[key]` selects map entries.
//!
//! ```text
//! User { name: "Al", addresses: [Address { city: "Oslo" }], tags: {"a": 1} }
//!
//! name=Al
//! addresses[0].city=Oslo
//! tags[a]=1
//! ```
//!
//! ## Key Features
//!
//! - **Serde Compatible**: works with any `#[derive(Serialize)]` type
//! - **Field Tags**: rename, skip or `omitempty` fields through registered tag
//!   tables, with implicit and explicit modes
//! - **Custom Types**: register conversion functions per type
//! - **Error Locality**: a failing field is reported against its path while
//!   every other field still encodes
//! - **Thread Safe**: one [`Encoder`] serves any number of threads; field
//!   metadata is cached per struct and scratch state is pooled
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::to_string;
//!
//! #[derive(Serialize)]
//! struct Search {
//!     query: String,
//!     page: u32,
//!     filters: Vec<String>,
//! }
//!
//! let search = Search {
//!     query: "rust serde".to_string(),
//!     page: 2,
//!     filters: vec!["new".to_string()],
//! };
//!
//! assert_eq!(
//!     to_string(&search).unwrap(),
//!     "filters%5B0%5D=new&page=2&query=rust+serde"
//! );
//! ```
//!
//! ### Configuring an Encoder
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::{struct_tags, Encoder, Mode, TypeKey};
//!
//! #[derive(Serialize)]
//! struct Email(String);
//!
//! #[derive(Serialize)]
//! struct Signup {
//!     email: Email,
//!     password: String,
//!     referrer: Option<String>,
//! }
//!
//! let encoder = Encoder::builder()
//!     .mode(Mode::Explicit)
//!     .struct_tags(struct_tags!(Signup {
//!         email: { form: "e" },
//!         referrer: { form: "ref,omitempty" },
//!     }))
//!     .register_fn(
//!         |v| Ok(v.as_str().unwrap_or_default().to_lowercase()),
//!         [TypeKey::named("Email")],
//!     )
//!     .build();
//!
//! let signup = Signup {
//!     email: Email("Al@Example.COM".to_string()),
//!     password: "hunter2".to_string(),
//!     referrer: None,
//! };
//! let values = encoder.encode(&signup).unwrap().into_result().unwrap();
//!
//! assert_eq!(values.get("e"), Some("al@example.com"));
//! assert_eq!(values.len(), 1);
//! ```
//!
//! ## Errors
//!
//! Only an absent root value (`None`, `()`) makes an encode call fail. Any
//! other failure is attributed to the path that produced it and collected in
//! [`Encoded::errors`]; see [`error`] for details.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Nesting is bounded by [`EncoderOptions::max_depth`], so self-referential
//!   structures through `Rc`/`Arc` cannot recurse without limit
//! - No panics in the public API

pub mod cache;
pub mod encoder;
pub mod error;
pub mod macros;
pub mod map;
pub mod namespace;
pub mod options;
mod pool;
pub mod registry;
pub mod ser;
pub mod tags;
pub mod value;
mod worker;

pub use cache::{CachedField, CachedStruct, StructCache};
pub use encoder::{Encoded, Encoder, EncoderBuilder};
pub use error::{BoxError, EncodeErrors, Error, FieldError, Result};
pub use map::{FormValues, NativeValues};
pub use namespace::Namespace;
pub use options::{AnonymousMode, EncoderOptions, Mode, SeqStyle};
pub use registry::{EncodeFn, TypeFuncs, TypeKey};
pub use ser::ValueSerializer;
pub use tags::{FieldInfo, FieldTags, StructTags, TagNameFn};
pub use value::{Number, StructValue, Value};

use serde::Serialize;
use std::sync::OnceLock;

fn default_encoder() -> &'static Encoder {
    static ENCODER: OnceLock<Encoder> = OnceLock::new();
    ENCODER.get_or_init(Encoder::new)
}

/// Encode any `T: Serialize` into form values with the default encoder.
///
/// # Examples
///
/// ```rust
/// use serde_form::to_values;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let values = to_values(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(values.get("x"), Some("1"));
/// assert_eq!(values.get("y"), Some("2"));
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidEncode`] for an absent root, or [`Error::Fields`]
/// if any field failed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_values<T>(value: &T) -> Result<FormValues>
where
    T: ?Sized + Serialize,
{
    default_encoder().encode(value)?.into_result()
}

/// Like [`to_values`], also returning the distinct keys in the order they
/// were first written.
///
/// # Errors
///
/// See [`to_values`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_values_with_columns<T>(value: &T) -> Result<(FormValues, Vec<String>)>
where
    T: ?Sized + Serialize,
{
    let (values, columns, errors) = default_encoder().encode_with_columns(value)?.into_parts();
    if !errors.is_empty() {
        return Err(Error::Fields(errors));
    }
    Ok((values, columns.unwrap_or_default()))
}

/// Encode any `T: Serialize` into a query string with sorted keys.
///
/// # Examples
///
/// ```rust
/// use serde_form::to_string;
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert("b", vec!["x y"]);
/// map.insert("a", vec!["&"]);
///
/// assert_eq!(to_string(&map).unwrap(), "%5Ba%5D%5B0%5D=%26&%5Bb%5D%5B0%5D=x+y");
/// ```
///
/// # Errors
///
/// See [`to_values`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    Ok(to_values(value)?.to_query_string())
}

/// Convert any `T: Serialize` to a [`Value`] tree.
///
/// This is the representation the encoder walks; useful for inspecting what
/// a type looks like to the encoder or for testing custom type functions.
///
/// # Examples
///
/// ```rust
/// use serde_form::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// let point = value.as_struct().unwrap();
/// assert_eq!(point.name(), "Point");
/// assert_eq!(point.get("x"), Some(&Value::from(1)));
/// ```
///
/// # Errors
///
/// Returns an error if the value's `Serialize` implementation fails at the
/// root. Failures of nested elements are kept in the tree as
/// [`Value::Failed`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer::new())
}
