//! Struct metadata cache.
//!
//! Field descriptors are resolved once per struct type, on first encounter,
//! and kept for the lifetime of the encoder. Struct identity is the serde
//! struct name.
//!
//! Lookups take a shared read lock. On a miss the upgradable lock is taken,
//! the map checked again, and the descriptors built and inserted, so each
//! struct is resolved once no matter how many threads meet it first.

use crate::options::{EncoderOptions, Mode};
use crate::tags::{FieldInfo, TagNameFn, TagTables};
use crate::StructValue;
use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::HashMap;
use std::sync::Arc;

const IGNORE: &str = "-";
const OMIT_EMPTY: &str = "omitempty";

/// Resolved metadata for one struct field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedField {
    /// Output name used as the namespace segment.
    pub name: String,
    /// Position of the field among the serialized fields of the value the
    /// descriptor was resolved from.
    pub index: usize,
    /// Field is never encoded.
    pub skip: bool,
    /// Field is anonymous (embedded).
    pub anonymous: bool,
    /// Field is skipped when its value is empty.
    pub omit_empty: bool,
}

/// Field descriptors of one struct, keyed by serde field key in declaration
/// order.
#[derive(Clone, Debug, Default)]
pub struct CachedStruct {
    fields: IndexMap<&'static str, CachedField>,
}

impl CachedStruct {
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&CachedField> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = &CachedField> {
        self.fields.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Resolves field names from tag tables or a tag-name function.
pub(crate) struct FieldResolver<'a> {
    pub(crate) options: &'a EncoderOptions,
    pub(crate) tags: &'a TagTables,
    pub(crate) tag_fn: Option<&'a TagNameFn>,
}

impl FieldResolver<'_> {
    pub(crate) fn resolve(&self, struct_name: &str, key: &str, index: usize) -> CachedField {
        let table = self.tags.get(struct_name);
        let field_tags = table.and_then(|t| t.field(key));
        let anonymous = table.is_some_and(|t| t.is_anonymous(key));

        let raw = match self.tag_fn {
            Some(tag_fn) => tag_fn(&FieldInfo {
                struct_name,
                name: key,
                index,
                tags: field_tags,
            }),
            None => field_tags
                .and_then(|t| t.get(&self.options.tag_name))
                .cloned()
                .unwrap_or_default(),
        };

        let skipped = |name: String| CachedField {
            name,
            index,
            skip: true,
            anonymous,
            omit_empty: false,
        };

        if raw == IGNORE {
            return skipped(key.to_string());
        }
        if raw.is_empty() && self.options.mode == Mode::Explicit {
            return skipped(key.to_string());
        }

        let (name, omit_empty) = match raw.rfind(',') {
            Some(idx) => (&raw[..idx], &raw[idx + 1..] == OMIT_EMPTY),
            None => (raw.as_str(), false),
        };

        CachedField {
            name: if name.is_empty() {
                key.to_string()
            } else {
                name.to_string()
            },
            index,
            skip: false,
            anonymous,
            omit_empty,
        }
    }
}

/// Shared, read-mostly map from struct name to its field descriptors.
#[derive(Debug, Default)]
pub struct StructCache {
    map: RwLock<HashMap<&'static str, Arc<CachedStruct>>>,
}

impl StructCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, struct_name: &str) -> Option<Arc<CachedStruct>> {
        self.map.read().get(struct_name).cloned()
    }

    /// Returns the descriptors for `value`'s struct type, building them from
    /// `value`'s fields on first encounter.
    ///
    /// Builds hold the upgradable lock, so each struct is resolved exactly
    /// once even when several threads meet it at the same time. Plain reads
    /// are not blocked while a build runs.
    pub(crate) fn get_or_build(
        &self,
        value: &StructValue,
        resolver: &FieldResolver<'_>,
    ) -> Arc<CachedStruct> {
        if let Some(cached) = self.get(value.name()) {
            return cached;
        }

        let map = self.map.upgradable_read();
        if let Some(cached) = map.get(value.name()) {
            return Arc::clone(cached);
        }

        let fields = value
            .fields()
            .iter()
            .enumerate()
            .map(|(index, (key, _))| (*key, resolver.resolve(value.name(), key, index)))
            .collect();
        let built = Arc::new(CachedStruct { fields });
        tracing::debug!(
            struct_name = value.name(),
            fields = built.len(),
            "built struct field descriptors"
        );

        let mut map = RwLockUpgradableReadGuard::upgrade(map);
        map.insert(value.name(), Arc::clone(&built));
        built
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::StructTags;
    use tracing_test::traced_test;

    fn user() -> StructValue {
        StructValue::new("User")
            .with_field("name", "Al")
            .with_field("age", 30)
            .with_field("password", "hunter2")
            .with_field("nick", "")
    }

    fn tables() -> TagTables {
        let mut tables = TagTables::default();
        tables.insert(
            StructTags::new("User")
                .tag("name", "form", "n")
                .tag("password", "form", "-")
                .tag("nick", "form", ",omitempty")
                .tag("age", "query", "years"),
        );
        tables
    }

    #[test]
    fn test_implicit_resolution() {
        let options = EncoderOptions::default();
        let tags = tables();
        let resolver = FieldResolver {
            options: &options,
            tags: &tags,
            tag_fn: None,
        };
        let cache = StructCache::new();
        let cached = cache.get_or_build(&user(), &resolver);

        assert_eq!(cached.field("name").unwrap().name, "n");
        assert_eq!(cached.field("age").unwrap().name, "age");
        assert!(cached.field("password").unwrap().skip);

        let nick = cached.field("nick").unwrap();
        assert_eq!(nick.name, "nick");
        assert!(nick.omit_empty);
        assert!(!nick.skip);
    }

    #[test]
    fn test_explicit_mode_skips_untagged() {
        let options = EncoderOptions::new().with_mode(Mode::Explicit);
        let tags = tables();
        let resolver = FieldResolver {
            options: &options,
            tags: &tags,
            tag_fn: None,
        };
        let cached = StructCache::new().get_or_build(&user(), &resolver);

        assert!(!cached.field("name").unwrap().skip);
        assert!(cached.field("age").unwrap().skip);
        assert!(!cached.field("nick").unwrap().skip);
    }

    #[test]
    fn test_configured_tag_name() {
        let options = EncoderOptions::new().with_tag_name("query");
        let tags = tables();
        let resolver = FieldResolver {
            options: &options,
            tags: &tags,
            tag_fn: None,
        };
        let cached = StructCache::new().get_or_build(&user(), &resolver);

        assert_eq!(cached.field("age").unwrap().name, "years");
        assert_eq!(cached.field("name").unwrap().name, "name");
    }

    #[test]
    fn test_tag_fn_replaces_tag_lookup() {
        let options = EncoderOptions::default();
        let tags = tables();
        let tag_fn: TagNameFn = Arc::new(|field: &FieldInfo<'_>| field.name.to_uppercase());
        let resolver = FieldResolver {
            options: &options,
            tags: &tags,
            tag_fn: Some(&tag_fn),
        };
        let cached = StructCache::new().get_or_build(&user(), &resolver);

        assert_eq!(cached.field("name").unwrap().name, "NAME");
        assert!(!cached.field("password").unwrap().skip);
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        let options = EncoderOptions::default();
        let tags = tables();
        let cache = StructCache::new();
        let value = user();

        let results: Vec<Arc<CachedStruct>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let resolver = FieldResolver {
                            options: &options,
                            tags: &tags,
                            tag_fn: None,
                        };
                        cache.get_or_build(&value, &resolver)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), 1);
        for cached in &results {
            assert!(Arc::ptr_eq(cached, &results[0]));
        }
    }

    #[test]
    fn test_concurrent_first_use_resolves_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;

        let options = EncoderOptions::default();
        let tags = TagTables::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let tag_fn: TagNameFn = Arc::new(move |field: &FieldInfo<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            field.name.to_string()
        });
        let cache = StructCache::new();
        let value = user();
        let barrier = Barrier::new(8);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let resolver = FieldResolver {
                        options: &options,
                        tags: &tags,
                        tag_fn: Some(&tag_fn),
                    };
                    barrier.wait();
                    cache.get_or_build(&value, &resolver);
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), value.fields().len());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_index_counts_serialized_fields() {
        let options = EncoderOptions::default();
        let tags = TagTables::default();
        let tag_fn: TagNameFn =
            Arc::new(|field: &FieldInfo<'_>| format!("{}{}", field.name, field.index));
        let resolver = FieldResolver {
            options: &options,
            tags: &tags,
            tag_fn: Some(&tag_fn),
        };
        let cache = StructCache::new();

        // `a` was skipped while serializing, so `b` comes first.
        let first = StructValue::new("Sparse").with_field("b", 1);
        let cached = cache.get_or_build(&first, &resolver);
        assert_eq!(cached.field("b").unwrap().index, 0);
        assert_eq!(cached.field("b").unwrap().name, "b0");

        // Later values reuse the first descriptors.
        let full = StructValue::new("Sparse").with_field("a", 1).with_field("b", 2);
        let cached = cache.get_or_build(&full, &resolver);
        assert_eq!(cached.field("b").unwrap().index, 0);
        assert!(cached.field("a").is_none());
    }

    #[traced_test]
    #[test]
    fn test_build_is_logged_once() {
        let options = EncoderOptions::default();
        let tags = TagTables::default();
        let resolver = FieldResolver {
            options: &options,
            tags: &tags,
            tag_fn: None,
        };
        let cache = StructCache::new();
        cache.get_or_build(&user(), &resolver);
        cache.get_or_build(&user(), &resolver);

        assert!(logs_contain("built struct field descriptors"));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("built struct field descriptors"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one build event, found {}", n)),
            }
        });
    }
}
