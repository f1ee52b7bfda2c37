//! Opaque per-op attribute maps (§3, §4.1).
//!
//! Attributes are carried alongside `Retain`/`Insert` components without the
//! core ever interpreting their meaning. A value of `None` is the "unset"
//! sentinel: it's distinct from the key being absent, and is used by
//! [`TextOperation::transform`](crate::text_operation::TextOperation::transform)
//! to explicitly clear an attribute that a concurrent edit introduced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single attribute value, or the explicit "unset" sentinel.
pub type AttrValue = Option<String>;

/// An order-insensitive map from attribute key to value.
///
/// `BTreeMap` gives us value-based `PartialEq` (order never factors in) and a
/// stable iteration order for JSON serialization, without requiring a `Hash`
/// bound on values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attrs(pub BTreeMap<String, AttrValue>);

impl Attrs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AttrValue) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// Merge `other` on top of `self`: keys in `other` overwrite keys in
    /// `self`, keys only in `self` are kept. Used when composing two
    /// `Retain`s that both carry attribute changes.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        let mut merged = self.0.clone();
        for (key, value) in &other.0 {
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }

    /// Order-insensitive equality check, spelled out for readability at call
    /// sites that compare attributes specifically (vs. whole ops).
    #[must_use]
    pub fn attributes_equal(&self, other: &Self) -> bool {
        self == other
    }
}

impl From<BTreeMap<String, AttrValue>> for Attrs {
    fn from(map: BTreeMap<String, AttrValue>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, AttrValue)> for Attrs {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
