//! Tag sets and canonical namespace derivation.
//!
//! A tag set is the ordered list of tag names a caller binds a cache session
//! to. It is never persisted directly; only its canonical namespace string
//! is, as the key of the tag index. Canonicalization is a pure join:
//!
//! ```text
//! ["posts", "user:1"]  →  "posts|user:1"
//! ```
//!
//! Order sensitivity is part of the contract: the same names in a different
//! order produce a different namespace. Call sites that want the same
//! grouping must bind tags in the same order.

/// Separator joining tag names into a namespace string.
///
/// Reserved: tag names must never contain this character. A tag name with an
/// embedded separator corrupts namespace matching during eviction. This is a
/// caller constraint and is deliberately not validated here.
pub const SEPARATOR: char = '|';

/// An ordered set of tag names bound for one cache-access session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    names: Vec<String>,
}

impl TagSet {
    /// Build a tag set from the given names, preserving order.
    pub fn new<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The tag names, in bind order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True if no tags are bound (writes go un-indexed).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonical namespace string: the names joined with [`SEPARATOR`].
    ///
    /// Deterministic in input order and contents. Empty for an empty set.
    pub fn namespace(&self) -> String {
        self.names.join(&SEPARATOR.to_string())
    }
}

/// Split a namespace string back into its constituent tag names.
///
/// Inverse of [`TagSet::namespace`]. An empty namespace yields no tags.
pub fn split_namespace(namespace: &str) -> Vec<&str> {
    if namespace.is_empty() {
        return Vec::new();
    }
    namespace.split(SEPARATOR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_joins_in_order() {
        let tags = TagSet::new(["posts", "user:1"]);
        assert_eq!(tags.namespace(), "posts|user:1");

        let reversed = TagSet::new(["user:1", "posts"]);
        assert_eq!(reversed.namespace(), "user:1|posts");
        assert_ne!(tags.namespace(), reversed.namespace());
    }

    #[test]
    fn test_single_tag_namespace() {
        assert_eq!(TagSet::new(["posts"]).namespace(), "posts");
    }

    #[test]
    fn test_empty_tag_set() {
        let tags = TagSet::new(Vec::<String>::new());
        assert!(tags.is_empty());
        assert_eq!(tags.namespace(), "");
    }

    #[test]
    fn test_split_is_inverse_of_join() {
        let tags = TagSet::new(["a", "b", "c"]);
        assert_eq!(split_namespace(&tags.namespace()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_empty_namespace() {
        assert!(split_namespace("").is_empty());
    }
}
