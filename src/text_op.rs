//! A single component of a [`TextOperation`](crate::text_operation::TextOperation) (§3, §4.1).

use crate::attrs::Attrs;
use crate::error::Error;

/// One `retain`, `insert` or `delete` component.
///
/// In normalized form (see [`TextOperation`](crate::text_operation::TextOperation)) a `Retain`
/// or `Delete` of zero length, and an `Insert` of the empty string, never appear: builders treat
/// those as no-ops instead of constructing them.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOp {
    /// Advance `n` positions of the base document, optionally applying attribute changes.
    Retain(u64, Attrs),
    /// Insert `text` at the current position, optionally carrying attributes.
    Insert(String, Attrs),
    /// Remove the next `n` characters of the base document.
    Delete(u64),
}

impl TextOp {
    /// Validated constructor for a `Retain`. Fails on a zero length so callers that build ops
    /// directly (rather than through [`TextOperation`](crate::text_operation::TextOperation)'s
    /// builder) can't construct a non-normalized component by mistake.
    pub fn retain(n: u64, attrs: Attrs) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::Validation(
                "Retain length must be positive".to_string(),
            ));
        }
        Ok(Self::Retain(n, attrs))
    }

    pub fn insert(text: impl Into<String>, attrs: Attrs) -> Result<Self, Error> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::Validation(
                "Insert text must not be empty".to_string(),
            ));
        }
        Ok(Self::Insert(text, attrs))
    }

    pub fn delete(n: u64) -> Result<Self, Error> {
        if n == 0 {
            return Err(Error::Validation(
                "Delete length must be positive".to_string(),
            ));
        }
        Ok(Self::Delete(n))
    }

    #[must_use]
    pub fn is_retain(&self) -> bool {
        matches!(self, Self::Retain(..))
    }

    #[must_use]
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert(..))
    }

    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete(..))
    }

    #[must_use]
    pub fn attrs(&self) -> Option<&Attrs> {
        match self {
            Self::Retain(_, attrs) | Self::Insert(_, attrs) => Some(attrs),
            Self::Delete(_) => None,
        }
    }

    #[must_use]
    pub fn attributes_equal(&self, other: &Self) -> bool {
        match (self.attrs(), other.attrs()) {
            (Some(a), Some(b)) => a.attributes_equal(b),
            (None, None) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn has_empty_attributes(&self) -> bool {
        self.attrs().is_none_or(Attrs::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_retain_is_rejected() {
        assert!(TextOp::retain(0, Attrs::new()).is_err());
    }

    #[test]
    fn empty_insert_is_rejected() {
        assert!(TextOp::insert(String::new(), Attrs::new()).is_err());
    }

    #[test]
    fn zero_length_delete_is_rejected() {
        assert!(TextOp::delete(0).is_err());
    }

    #[test]
    fn query_methods_discriminate_kind() {
        let retain = TextOp::retain(3, Attrs::new()).unwrap();
        assert!(retain.is_retain());
        assert!(!retain.is_insert());
        assert!(!retain.is_delete());

        let insert = TextOp::insert("hi", Attrs::new()).unwrap();
        assert!(insert.is_insert());

        let delete = TextOp::delete(2).unwrap();
        assert!(delete.is_delete());
        assert_eq!(delete.attrs(), None);
    }

    #[test]
    fn attributes_equal_treats_delete_as_attribute_free() {
        let a = TextOp::delete(1).unwrap();
        let b = TextOp::delete(5).unwrap();
        assert!(a.attributes_equal(&b));
    }
}
