//! Configuration options for form encoding.
//!
//! This module provides types to customize how values are flattened:
//!
//! - [`EncoderOptions`]: main configuration struct
//! - [`Mode`]: whether untagged struct fields are included
//! - [`AnonymousMode`]: whether anonymous (embedded) fields are expanded in place
//! - [`SeqStyle`]: how sequences of leaf values are keyed
//!
//! ## Examples
//!
//! ```rust
//! use serde_form::{AnonymousMode, Encoder, EncoderOptions, Mode};
//!
//! let options = EncoderOptions::new()
//!     .with_tag_name("query")
//!     .with_mode(Mode::Explicit)
//!     .with_anonymous_mode(AnonymousMode::Separate);
//!
//! let encoder = Encoder::builder().options(options).build();
//! assert_eq!(encoder.options().tag_name, "query");
//! ```

/// Default tag name consulted in struct tag tables.
pub const DEFAULT_TAG_NAME: &str = "form";

/// Default limit on container nesting below the root value.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Governs whether untagged struct fields are encoded.
///
/// # Examples
///
/// ```rust
/// use serde_form::Mode;
///
/// assert_eq!(Mode::default(), Mode::Implicit);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    /// Untagged fields are encoded under their field name.
    #[default]
    Implicit,
    /// Only fields carrying a tag are encoded.
    Explicit,
}

/// Governs how fields marked anonymous are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AnonymousMode {
    /// The field's own fields appear at the parent's namespace level.
    #[default]
    Embed,
    /// The field is a normal nested field consuming one namespace segment.
    Separate,
}

/// Governs how elements of a sequence are keyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SeqStyle {
    /// Every element gets its own `[i]` segment: `tags[0]=x&tags[1]=y`.
    #[default]
    Indexed,
    /// Leaf elements repeat the sequence's key: `tags=x&tags=y`.
    /// Nested structures inside the sequence are still indexed.
    Repeated,
}

/// Configuration options for form encoding.
///
/// # Examples
///
/// ```rust
/// use serde_form::{EncoderOptions, Mode, SeqStyle};
///
/// let options = EncoderOptions::default();
/// assert_eq!(options.tag_name, "form");
/// assert_eq!(options.mode, Mode::Implicit);
///
/// let options = EncoderOptions::new()
///     .with_seq_style(SeqStyle::Repeated)
///     .with_max_depth(8);
/// assert_eq!(options.max_depth, 8);
/// ```
#[derive(Clone, Debug)]
pub struct EncoderOptions {
    pub tag_name: String,
    pub mode: Mode,
    pub anonymous_mode: AnonymousMode,
    pub seq_style: SeqStyle,
    pub max_depth: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            tag_name: DEFAULT_TAG_NAME.to_string(),
            mode: Mode::default(),
            anonymous_mode: AnonymousMode::default(),
            seq_style: SeqStyle::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EncoderOptions {
    /// Creates default options (`form` tag, implicit mode, embedded anonymous fields).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tag name looked up in registered struct tag tables.
    ///
    /// Ignored once a tag-name function is registered.
    #[must_use]
    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_anonymous_mode(mut self, mode: AnonymousMode) -> Self {
        self.anonymous_mode = mode;
        self
    }

    #[must_use]
    pub fn with_seq_style(mut self, style: SeqStyle) -> Self {
        self.seq_style = style;
        self
    }

    /// Sets the maximum container nesting below the root.
    ///
    /// Anything deeper is reported as
    /// [`FieldError::DepthExceeded`](crate::FieldError::DepthExceeded) at the
    /// path where the limit was crossed.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) const fn embed_anonymous(&self) -> bool {
        matches!(self.anonymous_mode, AnonymousMode::Embed)
    }
}
