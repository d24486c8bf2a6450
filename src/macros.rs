//! Declarative helpers for building tag tables.

/// Builds a [`StructTags`](crate::StructTags) table.
///
/// Fields list their tags as `tag_name: "value"` pairs; `..field` marks an
/// anonymous field.
///
/// ```rust
/// use serde_form::{struct_tags, StructTags};
///
/// let tags = struct_tags!(User {
///     name: { form: "n", json: "user_name" },
///     password: { form: "-" },
///     ..audit,
/// });
///
/// assert_eq!(
///     tags,
///     StructTags::new("User")
///         .tag("name", "form", "n")
///         .tag("name", "json", "user_name")
///         .tag("password", "form", "-")
///         .anonymous("audit")
/// );
/// ```
#[macro_export]
macro_rules! struct_tags {
    ($name:ident { $($body:tt)* }) => {
        $crate::struct_tags!(@fields $crate::StructTags::new(stringify!($name)); $($body)*)
    };

    (@fields $tags:expr; ) => {
        $tags
    };

    (@fields $tags:expr; .. $field:ident $(, $($rest:tt)*)?) => {
        $crate::struct_tags!(@fields $tags.anonymous(stringify!($field)); $($($rest)*)?)
    };

    (@fields $tags:expr; $field:ident : { $($tag:ident : $value:literal),* $(,)? } $(, $($rest:tt)*)?) => {
        $crate::struct_tags!(
            @fields $tags$(.tag(stringify!($field), stringify!($tag), $value))*;
            $($($rest)*)?
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::StructTags;

    #[test]
    fn test_struct_tags_empty() {
        assert_eq!(struct_tags!(Empty {}), StructTags::new("Empty"));
    }

    #[test]
    fn test_struct_tags_single_field() {
        let tags = struct_tags!(Single { id: { form: "i" } });
        assert_eq!(tags.get("id", "form"), Some("i"));
        assert_eq!(tags.get("id", "json"), None);
    }

    #[test]
    fn test_struct_tags_anonymous_only() {
        let tags = struct_tags!(Wrapper { ..inner });
        assert!(tags.is_anonymous("inner"));
        assert!(tags.field("inner").is_none());
    }

    #[test]
    fn test_struct_tags_anonymous_with_tags() {
        let tags = struct_tags!(Account {
            ..audit,
            audit: { form: "meta" },
            id: { form: "account_id,omitempty" },
        });
        assert!(tags.is_anonymous("audit"));
        assert_eq!(tags.get("audit", "form"), Some("meta"));
        assert_eq!(tags.get("id", "form"), Some("account_id,omitempty"));
    }
}
