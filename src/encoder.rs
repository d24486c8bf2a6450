//! The encoder facade.
//!
//! An [`Encoder`] is built once through [`EncoderBuilder`] and then shared
//! freely: it is an `Arc` around an immutable configuration snapshot, the
//! struct metadata cache and a pool of reusable workers.
//!
//! ## Examples
//!
//! ```rust
//! use serde::Serialize;
//! use serde_form::{struct_tags, Encoder};
//!
//! #[derive(Serialize)]
//! struct Address {
//!     city: String,
//! }
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//!     addresses: Vec<Address>,
//! }
//!
//! let encoder = Encoder::builder()
//!     .struct_tags(struct_tags!(User { name: { form: "n" } }))
//!     .build();
//!
//! let user = User {
//!     name: "Al".to_string(),
//!     addresses: vec![Address { city: "Oslo".to_string() }],
//! };
//! let encoded = encoder.encode_with_columns(&user).unwrap();
//!
//! assert_eq!(encoded.values().get("n"), Some("Al"));
//! assert_eq!(encoded.values().get("addresses[0].city"), Some("Oslo"));
//! assert_eq!(encoded.columns(), Some(&["n".to_string(), "addresses[0].city".to_string()][..]));
//! ```

use crate::cache::StructCache;
use crate::error::{BoxError, EncodeErrors, Error, Result};
use crate::map::{FormValues, NativeValues};
use crate::options::{AnonymousMode, EncoderOptions, Mode, SeqStyle};
use crate::pool::WorkerPool;
use crate::registry::{TypeFuncs, TypeKey};
use crate::ser::{capture, ValueSerializer};
use crate::tags::{FieldInfo, StructTags, TagNameFn, TagTables};
use crate::Value;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Frozen configuration plus the per-encoder caches.
pub(crate) struct Shared {
    pub(crate) options: EncoderOptions,
    pub(crate) tags: TagTables,
    pub(crate) tag_fn: Option<TagNameFn>,
    pub(crate) funcs: TypeFuncs,
    pub(crate) cache: StructCache,
    pub(crate) pool: WorkerPool,
}

/// Result of a successful encode call.
///
/// Field-level failures do not abort encoding; they are collected in
/// [`errors`](Encoded::errors) next to the values of every path that did
/// encode.
#[derive(Debug, Clone)]
#[must_use]
pub struct Encoded {
    values: FormValues,
    columns: Option<Vec<String>>,
    errors: EncodeErrors,
}

impl Encoded {
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Distinct output keys in first-written order, when tracked.
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn errors(&self) -> &EncodeErrors {
        &self.errors
    }

    /// Returns `true` if no field failed.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_parts(self) -> (FormValues, Option<Vec<String>>, EncodeErrors) {
        (self.values, self.columns, self.errors)
    }

    /// Returns the values, or [`Error::Fields`] if any field failed.
    pub fn into_result(self) -> Result<FormValues> {
        if self.errors.is_empty() {
            Ok(self.values)
        } else {
            Err(Error::Fields(self.errors))
        }
    }

    /// Returns the values, discarding any field errors.
    pub fn into_values(self) -> FormValues {
        self.values
    }
}

/// Encodes Rust values into form values.
///
/// Cloning is cheap and clones share the struct cache and worker pool.
/// `Encoder` is `Send + Sync`; one instance can serve any number of threads.
#[derive(Clone)]
pub struct Encoder {
    shared: Arc<Shared>,
}

impl Encoder {
    /// Creates an encoder with default options and no registrations.
    #[must_use]
    pub fn new() -> Self {
        EncoderBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> EncoderBuilder {
        EncoderBuilder::new()
    }

    #[must_use]
    pub fn options(&self) -> &EncoderOptions {
        &self.shared.options
    }

    /// The struct metadata cache backing this encoder.
    #[must_use]
    pub fn cache(&self) -> &StructCache {
        &self.shared.cache
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// Encodes `value` into form values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEncode`] when `value` is absent (`None`, `()`).
    /// Failures of individual fields are reported through
    /// [`Encoded::errors`] instead.
    pub fn encode<T>(&self, value: &T) -> Result<Encoded>
    where
        T: ?Sized + Serialize,
    {
        self.encode_inner(value, false, None)
    }

    /// Like [`encode`](Self::encode), also recording the distinct output keys
    /// in the order they were first written.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode).
    pub fn encode_with_columns<T>(&self, value: &T) -> Result<Encoded>
    where
        T: ?Sized + Serialize,
    {
        self.encode_inner(value, true, None)
    }

    /// Like [`encode`](Self::encode), also inserting the value behind each
    /// output key, before stringification, into `native`.
    ///
    /// When a key receives several values the last one is kept. Existing
    /// entries of `native` are preserved unless overwritten, and `native` is
    /// only written to once encoding completes: if a custom type function
    /// panics, the map is left untouched.
    ///
    /// # Errors
    ///
    /// See [`encode`](Self::encode). `native` is left untouched on error.
    pub fn encode_with_native<T>(&self, value: &T, native: &mut NativeValues) -> Result<Encoded>
    where
        T: ?Sized + Serialize,
    {
        self.encode_inner(value, false, Some(native))
    }

    fn encode_inner<T>(
        &self,
        value: &T,
        track_columns: bool,
        native: Option<&mut NativeValues>,
    ) -> Result<Encoded>
    where
        T: ?Sized + Serialize,
    {
        let shared = &*self.shared;
        let root = capture(value.serialize(ValueSerializer::with_max_depth(
            shared.options.max_depth,
        )));
        if root.is_none() {
            return Err(Error::InvalidEncode {
                type_name: absent_type_name(std::any::type_name::<T>()),
            });
        }

        tracing::trace!(type_name = std::any::type_name::<T>(), "encoding value");

        // Native values are collected apart from the caller's map and merged
        // only once traversal finishes, so a panicking custom function leaves
        // the map as it was.
        let mut worker = shared.pool.acquire();
        worker.begin(track_columns, native.is_some().then(NativeValues::new));
        worker.traverse(shared, &root);
        let drained = worker.drain();
        drop(worker);

        if let (Some(map), Some(collected)) = (native, drained.native) {
            map.extend(collected);
        }

        tracing::trace!(
            keys = drained.values.len(),
            errors = drained.errors.len(),
            "encoded value"
        );

        Ok(Encoded {
            values: drained.values,
            columns: drained.columns,
            errors: drained.errors,
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("options", &self.shared.options)
            .field("funcs", &self.shared.funcs)
            .field("cached_structs", &self.shared.cache.len())
            .finish()
    }
}

/// Names the type behind an absent root: the pointee of `Option<T>` with
/// module paths removed, or `None` for the unit type.
fn absent_type_name(full: &str) -> Option<String> {
    let mut name = short_type_name(full);
    loop {
        let trimmed = name.trim_start_matches('&').trim_start_matches("mut ");
        match trimmed
            .strip_prefix("Option<")
            .and_then(|s| s.strip_suffix('>'))
        {
            Some(inner) => name = inner.to_string(),
            None => {
                name = trimmed.to_string();
                break;
            }
        }
    }
    if name == "()" {
        None
    } else {
        Some(name)
    }
}

/// Removes module paths from every path in a type name:
/// `core::option::Option<app::User>` becomes `Option<User>`.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }
    out
}

/// Collects configuration for an [`Encoder`].
///
/// Registries are only mutable here; [`build`](Self::build) freezes them.
#[derive(Default)]
pub struct EncoderBuilder {
    options: EncoderOptions,
    tags: TagTables,
    tag_fn: Option<TagNameFn>,
    funcs: TypeFuncs,
}

impl EncoderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once.
    #[must_use]
    pub fn options(mut self, options: EncoderOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the tag key consulted for field names. Defaults to `form`.
    #[must_use]
    pub fn tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.options.tag_name = tag_name.into();
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.options.mode = mode;
        self
    }

    #[must_use]
    pub fn anonymous_mode(mut self, mode: AnonymousMode) -> Self {
        self.options.anonymous_mode = mode;
        self
    }

    #[must_use]
    pub fn seq_style(mut self, style: SeqStyle) -> Self {
        self.options.seq_style = style;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Derives field names from `f` instead of the tag tables.
    ///
    /// The returned string is interpreted like a tag value: `-` skips the
    /// field, an empty string falls back to the field name (or skips it in
    /// [`Mode::Explicit`]).
    #[must_use]
    pub fn tag_name_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldInfo<'_>) -> String + Send + Sync + 'static,
    {
        self.tag_fn = Some(Arc::new(f));
        self
    }

    /// Registers `f` as the encoder for every type in `types`.
    #[must_use]
    pub fn register_fn<F, I, K>(mut self, f: F, types: I) -> Self
    where
        F: Fn(&Value) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
        I: IntoIterator<Item = K>,
        K: Into<TypeKey>,
    {
        self.funcs.register(Arc::new(f), types);
        self
    }

    /// Adds a tag table. Tables for the same struct are merged.
    #[must_use]
    pub fn struct_tags(mut self, tags: StructTags) -> Self {
        self.tags.insert(tags);
        self
    }

    #[must_use]
    pub fn build(self) -> Encoder {
        Encoder {
            shared: Arc::new(Shared {
                options: self.options,
                tags: self.tags,
                tag_fn: self.tag_fn,
                funcs: self.funcs,
                cache: StructCache::new(),
                pool: WorkerPool::new(),
            }),
        }
    }
}

impl fmt::Debug for EncoderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderBuilder")
            .field("options", &self.options)
            .field("tags", &self.tags)
            .field("tag_fn", &self.tag_fn.is_some())
            .field("funcs", &self.funcs)
            .finish()
    }
}
