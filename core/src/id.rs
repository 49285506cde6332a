//! Identity primitives shared by the state tree and its consumers.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

/// Names the constructor family of a node.
///
/// A `Kind` tells a consumer *which* strategy builds and updates the live
/// counterpart of a node. It carries no behavior itself; it is a cheap,
/// clonable name that handler registries key on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kind(Rc<str>);

impl Kind {
    /// Creates a kind from its name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Rc::from(name.as_ref()))
    }

    /// Returns the name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stable identity key matching a state node to its live counterpart.
///
/// Keys are expected to be unique among siblings. A key is never empty:
/// emptiness means "no identity" and is represented as `Option<Key>` at the
/// places where identity is optional.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Rc<str>);

impl Key {
    /// Creates an identity key.
    ///
    /// # Panics
    ///
    /// Panics if `key` is empty, which is a programming error in the
    /// producer of the state tree.
    #[must_use]
    pub fn new(key: impl AsRef<str>) -> Self {
        let key = key.as_ref();
        assert!(!key.is_empty(), "identity keys must not be empty");
        Self(Rc::from(key))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn kind_display_matches_name() {
        let kind = Kind::new("label");
        assert_eq!(format!("{kind}"), "label");
        assert_eq!(kind.as_str(), "label");
    }

    #[test]
    fn kinds_compare_by_name() {
        assert_eq!(Kind::new("label"), Kind::from("label"));
        assert_ne!(Kind::new("label"), Kind::new("panel"));
    }

    #[test]
    #[should_panic(expected = "identity keys must not be empty")]
    fn empty_key_is_rejected() {
        let _ = Key::new("");
    }
}
