//! Struct field tags.
//!
//! Rust has no runtime struct tags, so tags are declared as a table per struct
//! and registered on the [`EncoderBuilder`](crate::EncoderBuilder). A table
//! maps each field (by its serde key) to a set of `tag name -> tag value`
//! pairs, and can mark fields as anonymous.
//!
//! Tag values follow the usual conventions:
//!
//! - `"-"` skips the field,
//! - `"name"` renames it,
//! - a `,omitempty` suffix skips the field when its value is empty
//!   (`"name,omitempty"`, or `",omitempty"` to keep the field name).
//!
//! ```rust
//! use serde_form::StructTags;
//!
//! let tags = StructTags::new("User")
//!     .tag("name", "form", "n")
//!     .tag("password", "form", "-")
//!     .anonymous("audit");
//!
//! assert_eq!(tags.get("name", "form"), Some("n"));
//! assert!(tags.is_anonymous("audit"));
//! ```

use indexmap::IndexMap;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Tag values attached to a single field, keyed by tag name.
pub type FieldTags = IndexMap<String, String>;

/// The tag table of one struct type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructTags {
    name: Cow<'static, str>,
    fields: IndexMap<String, FieldTags>,
    anonymous: Vec<String>,
}

impl StructTags {
    /// Creates an empty table for the struct with the given serde name.
    #[must_use]
    pub fn new(struct_name: impl Into<Cow<'static, str>>) -> Self {
        StructTags {
            name: struct_name.into(),
            fields: IndexMap::new(),
            anonymous: Vec::new(),
        }
    }

    /// Sets `field`'s tag under `tag_name` to `value`.
    #[must_use]
    pub fn tag(mut self, field: &str, tag_name: &str, value: &str) -> Self {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(tag_name.to_string(), value.to_string());
        self
    }

    /// Marks `field` as anonymous (embedded).
    #[must_use]
    pub fn anonymous(mut self, field: &str) -> Self {
        if !self.is_anonymous(field) {
            self.anonymous.push(field.to_string());
        }
        self
    }

    #[must_use]
    pub fn struct_name(&self) -> &str {
        &self.name
    }

    /// Returns the tag value of `field` under `tag_name`.
    #[must_use]
    pub fn get(&self, field: &str, tag_name: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|tags| tags.get(tag_name))
            .map(String::as_str)
    }

    /// All tags of `field`.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldTags> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn is_anonymous(&self, field: &str) -> bool {
        self.anonymous.iter().any(|f| f == field)
    }
}

/// A struct field as presented to a tag-name function.
#[derive(Clone, Copy, Debug)]
pub struct FieldInfo<'a> {
    /// Serde name of the struct declaring the field.
    pub struct_name: &'a str,
    /// Serde key of the field.
    pub name: &'a str,
    /// Position of the field among the fields the value serialized.
    ///
    /// Fields dropped by `skip_serializing_if` do not count, so the same field
    /// can report different positions for different values. Descriptors are
    /// resolved from the first value of a struct type seen; fields that value
    /// did not serialize are resolved when they first appear, with their
    /// position in that later value.
    pub index: usize,
    /// Tags registered for the field, if any.
    pub tags: Option<&'a FieldTags>,
}

impl FieldInfo<'_> {
    /// Returns the field's tag value under `tag_name`.
    #[must_use]
    pub fn tag(&self, tag_name: &str) -> Option<&str> {
        self.tags
            .and_then(|tags| tags.get(tag_name))
            .map(String::as_str)
    }
}

/// Function resolving a field's tag value, replacing the configured tag name.
///
/// Results are cached per struct, so the function must return the same value
/// for the same field on every call.
pub type TagNameFn = Arc<dyn Fn(&FieldInfo<'_>) -> String + Send + Sync>;

/// Registered tag tables, keyed by struct name.
#[derive(Clone, Debug, Default)]
pub struct TagTables {
    tables: HashMap<String, StructTags>,
}

impl TagTables {
    /// Adds `tags`, merging with any table already registered for the struct.
    pub fn insert(&mut self, tags: StructTags) {
        match self.tables.get_mut(tags.struct_name()) {
            Some(existing) => {
                for (field, values) in tags.fields {
                    existing.fields.entry(field).or_default().extend(values);
                }
                for field in tags.anonymous {
                    if !existing.is_anonymous(&field) {
                        existing.anonymous.push(field);
                    }
                }
            }
            None => {
                self.tables.insert(tags.struct_name().to_string(), tags);
            }
        }
    }

    #[must_use]
    pub fn get(&self, struct_name: &str) -> Option<&StructTags> {
        self.tables.get(struct_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_merge_per_struct() {
        let mut tables = TagTables::default();
        tables.insert(StructTags::new("User").tag("name", "form", "n"));
        tables.insert(
            StructTags::new("User")
                .tag("name", "json", "user")
                .anonymous("base"),
        );

        let user = tables.get("User").unwrap();
        assert_eq!(user.get("name", "form"), Some("n"));
        assert_eq!(user.get("name", "json"), Some("user"));
        assert!(user.is_anonymous("base"));
        assert!(tables.get("Other").is_none());
    }

    #[test]
    fn test_field_info_tag_lookup() {
        let tags = StructTags::new("User").tag("name", "form", "n");
        let info = FieldInfo {
            struct_name: "User",
            name: "name",
            index: 0,
            tags: tags.field("name"),
        };
        assert_eq!(info.tag("form"), Some("n"));
        assert_eq!(info.tag("json"), None);
    }
}
