//! Traversal engine and per-call scratch state.
//!
//! A [`Worker`] walks a captured [`Value`] tree, building key paths in its
//! [`Namespace`] and writing leaves into its output. Failures are recorded
//! against the current path and never stop the walk.

use crate::cache::FieldResolver;
use crate::encoder::Shared;
use crate::error::{EncodeErrors, FieldError};
use crate::map::{FormValues, NativeValues};
use crate::options::SeqStyle;
use crate::{Namespace, StructValue, Value};

/// Scratch state for one encode call.
///
/// Workers are recycled through the [`WorkerPool`](crate::pool::WorkerPool);
/// nothing in them survives a call.
#[derive(Debug, Default)]
pub(crate) struct Worker {
    namespace: Namespace,
    values: FormValues,
    columns: Option<Vec<String>>,
    native: Option<NativeValues>,
    errors: EncodeErrors,
}

/// Everything a call produced, drained out of the worker.
pub(crate) struct Drained {
    pub(crate) values: FormValues,
    pub(crate) columns: Option<Vec<String>>,
    pub(crate) native: Option<NativeValues>,
    pub(crate) errors: EncodeErrors,
}

impl Worker {
    pub(crate) fn new() -> Self {
        Worker {
            namespace: Namespace::new(),
            ..Worker::default()
        }
    }

    /// Prepares for a call. `native` is the caller's side-channel map, if any.
    pub(crate) fn begin(&mut self, track_columns: bool, native: Option<NativeValues>) {
        self.namespace.clear();
        self.columns = track_columns.then(Vec::new);
        self.native = native;
    }

    /// Moves the results out, leaving empty replacements behind.
    pub(crate) fn drain(&mut self) -> Drained {
        Drained {
            values: std::mem::take(&mut self.values),
            columns: self.columns.take(),
            native: self.native.take(),
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Clears all state; the namespace keeps its allocation.
    pub(crate) fn reset(&mut self) {
        self.namespace.clear();
        self.values = FormValues::new();
        self.columns = None;
        self.native = None;
        self.errors.clear();
    }

    #[cfg(test)]
    pub(crate) fn namespace_capacity(&self) -> usize {
        self.namespace.capacity()
    }

    #[cfg(test)]
    pub(crate) fn is_clean(&self) -> bool {
        self.namespace.is_root()
            && self.values.is_empty()
            && self.columns.is_none()
            && self.native.is_none()
            && self.errors.is_empty()
    }

    /// Walks `value` at the current namespace.
    pub(crate) fn traverse(&mut self, shared: &Shared, value: &Value) {
        if let Value::Some(inner) = value {
            return self.traverse(shared, inner);
        }
        if let Some((f, arg)) = shared.funcs.resolve(value) {
            match f(arg) {
                Ok(s) => self.set_leaf(s, value),
                Err(err) => self.record_error(FieldError::custom(err)),
            }
            return;
        }

        match value {
            Value::None => {}
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                if let Some(s) = value.leaf_string() {
                    self.set_leaf(s, value);
                }
            }
            Value::Some(inner) | Value::Named { value: inner, .. } => {
                self.traverse(shared, inner);
            }
            Value::Seq(items) => self.traverse_seq(shared, items),
            Value::Map(entries) => self.traverse_map(shared, entries),
            Value::Struct(s) => self.traverse_struct(shared, s),
            Value::Unsupported(reason) => {
                self.record_error(FieldError::UnsupportedType(reason.clone()));
            }
            Value::Failed(msg) => self.record_error(FieldError::Serialize(msg.clone())),
            Value::DepthExceeded => {
                self.record_error(FieldError::DepthExceeded(shared.options.max_depth));
            }
        }
    }

    fn traverse_struct(&mut self, shared: &Shared, s: &StructValue) {
        let resolver = FieldResolver {
            options: &shared.options,
            tags: &shared.tags,
            tag_fn: shared.tag_fn.as_ref(),
        };
        let cached = shared.cache.get_or_build(s, &resolver);
        let embed = shared.options.embed_anonymous();
        let mark = self.namespace.mark();

        for (index, (key, value)) in s.fields().iter().enumerate() {
            let resolved;
            let field = match cached.field(key) {
                Some(field) => field,
                None => {
                    resolved = resolver.resolve(s.name(), key, index);
                    &resolved
                }
            };

            if field.skip || (field.omit_empty && value.is_empty()) {
                continue;
            }

            if field.anonymous && embed {
                self.traverse(shared, value);
                continue;
            }

            self.namespace.push_field(&field.name);
            self.traverse(shared, value);
            self.namespace.truncate(mark);
        }
    }

    fn traverse_seq(&mut self, shared: &Shared, items: &[Value]) {
        let repeated = shared.options.seq_style == SeqStyle::Repeated;
        let mark = self.namespace.mark();

        for (i, item) in items.iter().enumerate() {
            if repeated && (item.is_leaf() || shared.funcs.resolve(item).is_some()) {
                self.traverse(shared, item);
                continue;
            }
            self.namespace.push_index(i);
            self.traverse(shared, item);
            self.namespace.truncate(mark);
        }
    }

    fn traverse_map(&mut self, shared: &Shared, entries: &[(Value, Value)]) {
        let mark = self.namespace.mark();

        for (key, value) in entries {
            match map_key(shared, key) {
                Ok(key) => {
                    self.namespace.push_key(&key);
                    self.traverse(shared, value);
                    self.namespace.truncate(mark);
                }
                Err(err) => self.record_error(err),
            }
        }
    }

    /// Writes a leaf at the current path.
    fn set_leaf(&mut self, s: String, native: &Value) {
        let path = self.namespace.as_str();
        if self.errors.contains(path) {
            return;
        }

        if self.values.add(path, s) {
            if let Some(columns) = &mut self.columns {
                columns.push(path.to_string());
            }
        }
        if let Some(natives) = &mut self.native {
            natives.insert(path.to_string(), native.clone());
        }
    }

    /// Records `err` at the current path, withdrawing anything already
    /// written there.
    fn record_error(&mut self, err: FieldError) {
        let path = self.namespace.as_str().to_string();
        tracing::debug!(path = %path, error = %err, "field failed to encode");

        if self.values.remove(&path).is_some() {
            if let Some(columns) = &mut self.columns {
                columns.retain(|c| c != &path);
            }
        }
        if let Some(natives) = &mut self.native {
            natives.shift_remove(&path);
        }
        self.errors.insert(path, err);
    }
}

/// Renders a map key as a path segment.
fn map_key(shared: &Shared, key: &Value) -> Result<String, FieldError> {
    if let Some((f, arg)) = shared.funcs.resolve(key) {
        return f(arg).map_err(FieldError::custom);
    }
    key.leaf_string()
        .ok_or_else(|| FieldError::UnsupportedMapKey(key.kind_name()))
}
