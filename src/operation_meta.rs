//! Cursor metadata attached to an operation (§4.4): where the cursor sat before and after the
//! edit that produced it, so a later `undo`/`redo` can restore the caret along with the text.

use crate::cursor::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationMetadata {
    pub cursor_before: Option<Cursor>,
    pub cursor_after: Option<Cursor>,
}

impl OperationMetadata {
    #[must_use]
    pub fn new(cursor_before: Option<Cursor>, cursor_after: Option<Cursor>) -> Self {
        Self {
            cursor_before,
            cursor_after,
        }
    }

    /// Swaps before/after, the way inverting an operation swaps which cursor position comes
    /// first in time.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            cursor_before: self.cursor_after,
            cursor_after: self.cursor_before,
        }
    }

    /// The metadata for `self` followed by `other`: the combined edit starts where `self`
    /// started and ends where `other` ended.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            cursor_before: self.cursor_before,
            cursor_after: other.cursor_after,
        }
    }

    /// Transforms both cursors through a concurrent operation, the way the edit they annotate
    /// would also need to be transformed.
    #[must_use]
    pub fn transform(&self, op: &crate::text_operation::TextOperation) -> Self {
        Self {
            cursor_before: self.cursor_before.map(|c| c.transform(op)),
            cursor_after: self.cursor_after.map(|c| c.transform(op)),
        }
    }
}
