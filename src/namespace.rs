//! Incremental key path construction.
//!
//! A [`Namespace`] is a single reusable buffer. Descending into a child
//! appends a segment; returning truncates back to a previously taken
//! [`mark`](Namespace::mark), so siblings always start from the parent path
//! and the buffer's allocation is reused across the whole traversal and
//! across calls.
//!
//! ```rust
//! use serde_form::Namespace;
//!
//! let mut ns = Namespace::new();
//! ns.push_field("user");
//! let parent = ns.mark();
//! ns.push_field("addresses");
//! ns.push_index(2);
//! ns.push_field("city");
//! assert_eq!(ns.as_str(), "user.addresses[2].city");
//!
//! ns.truncate(parent);
//! ns.push_key("nick");
//! assert_eq!(ns.as_str(), "user[nick]");
//! ```

use std::fmt::{self, Write};

const NAMESPACE_SEPARATOR: char = '.';
const LEFT_BRACKET: char = '[';
const RIGHT_BRACKET: char = ']';

/// Default capacity reserved for a fresh buffer.
const INITIAL_CAPACITY: usize = 64;

/// Reusable key path buffer.
///
/// `Namespace::default()` does not allocate; [`Namespace::new`] reserves room
/// for a typical path up front.
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    buf: String,
}

/// A saved buffer length to truncate back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark(usize);

impl Namespace {
    #[must_use]
    pub fn new() -> Self {
        Namespace {
            buf: String::with_capacity(INITIAL_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn mark(&self) -> Mark {
        Mark(self.buf.len())
    }

    /// Restores the path that was current when `mark` was taken.
    #[inline]
    pub fn truncate(&mut self, mark: Mark) {
        self.buf.truncate(mark.0);
    }

    /// Empties the path, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Appends a named segment: `parent.name`, or `name` at the root.
    pub fn push_field(&mut self, name: &str) {
        if !self.buf.is_empty() {
            self.buf.push(NAMESPACE_SEPARATOR);
        }
        self.buf.push_str(name);
    }

    /// Appends a sequence index: `parent[i]`.
    pub fn push_index(&mut self, index: usize) {
        self.buf.push(LEFT_BRACKET);
        // Writing into a String cannot fail.
        let _ = write!(self.buf, "{}", index);
        self.buf.push(RIGHT_BRACKET);
    }

    /// Appends a map key: `parent[key]`.
    pub fn push_key(&mut self, key: &str) {
        self.buf.push(LEFT_BRACKET);
        self.buf.push_str(key);
        self.buf.push(RIGHT_BRACKET);
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_no_separator() {
        let mut ns = Namespace::new();
        ns.push_field("name");
        assert_eq!(ns.as_str(), "name");

        let mut ns = Namespace::new();
        ns.push_index(0);
        ns.push_field("id");
        assert_eq!(ns.as_str(), "[0].id");
    }

    #[test]
    fn test_siblings_do_not_see_previous_suffix() {
        let mut ns = Namespace::new();
        ns.push_field("t");
        let mark = ns.mark();
        let mut seen = Vec::new();
        for i in 0..3 {
            ns.push_index(i);
            seen.push(ns.as_str().to_string());
            ns.truncate(mark);
        }
        assert_eq!(seen, vec!["t[0]", "t[1]", "t[2]"]);
        assert_eq!(ns.as_str(), "t");
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut ns = Namespace::new();
        ns.push_field(&"x".repeat(200));
        let capacity = ns.capacity();
        ns.clear();
        assert!(ns.is_root());
        assert_eq!(ns.capacity(), capacity);
    }
}
