//! Cursor and selection-range tracking through operations (§4.3).

use crate::text_op::TextOp;
use crate::text_operation::TextOperation;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A caret or selection, expressed as two positions into the document. `position` is where the
/// caret sits (the "active" end); `selection_end` is the other end of the selection, equal to
/// `position` for a collapsed caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub position: u64,
    #[serde(rename = "selectionEnd")]
    pub selection_end: u64,
}

impl Cursor {
    #[must_use]
    pub fn new(position: u64, selection_end: u64) -> Self {
        Self {
            position,
            selection_end,
        }
    }

    #[must_use]
    pub fn collapsed(position: u64) -> Self {
        Self::new(position, position)
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.position == self.selection_end
    }

    /// Remaps both ends of the cursor through `op`, the way a `Retain` passes a position through
    /// unchanged, an `Insert` pushes positions at or after it forward, and a `Delete` collapses
    /// positions that fall inside the deleted range onto its start.
    #[must_use]
    pub fn transform(&self, op: &TextOperation) -> Self {
        Self::new(
            transform_position(self.position, op),
            transform_position(self.selection_end, op),
        )
    }

    /// Picks whichever of `self`/`other` reflects the more recent edit — used when two cursor
    /// updates arrive for the same transformed operation and only one can be kept.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        *other
    }

    #[must_use]
    pub fn to_json(&self) -> Json {
        serde_json::json!({"position": self.position, "selectionEnd": self.selection_end})
    }

    #[must_use]
    pub fn from_json(value: &Json) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

fn transform_position(position: u64, op: &TextOperation) -> u64 {
    let mut index: u64 = 0;
    let mut new_index: u64 = position;
    for text_op in op.ops() {
        if index > position {
            break;
        }
        match text_op {
            TextOp::Retain(n, _) => {
                index += n;
            }
            TextOp::Insert(s, _) => {
                let len = s.chars().count() as u64;
                if index <= position {
                    new_index += len;
                }
            }
            TextOp::Delete(n) => {
                new_index -= (position - index).min(*n);
                index += n;
            }
        }
    }
    new_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attrs;

    #[test]
    fn retain_leaves_position_unchanged() {
        let mut op = TextOperation::new();
        op.retain(5, Attrs::new());
        let cursor = Cursor::collapsed(3);
        assert_eq!(cursor.transform(&op).position, 3);
    }

    #[test]
    fn insert_before_cursor_pushes_it_forward() {
        let mut op = TextOperation::new();
        op.retain(2, Attrs::new());
        op.insert("xyz", Attrs::new());
        let cursor = Cursor::collapsed(2);
        assert_eq!(cursor.transform(&op).position, 5);
    }

    #[test]
    fn insert_after_cursor_leaves_it_unchanged() {
        let mut op = TextOperation::new();
        op.retain(5, Attrs::new());
        op.insert("xyz", Attrs::new());
        let cursor = Cursor::collapsed(2);
        assert_eq!(cursor.transform(&op).position, 2);
    }

    #[test]
    fn delete_spanning_cursor_collapses_to_delete_start() {
        let mut op = TextOperation::new();
        op.retain(1, Attrs::new());
        op.delete(3);
        let cursor = Cursor::collapsed(2);
        assert_eq!(cursor.transform(&op).position, 1);
    }

    #[test]
    fn delete_before_cursor_shifts_it_back() {
        let mut op = TextOperation::new();
        op.delete(2);
        let cursor = Cursor::collapsed(5);
        assert_eq!(cursor.transform(&op).position, 3);
    }

    #[test]
    fn selection_range_transforms_both_ends_independently() {
        let mut op = TextOperation::new();
        op.retain(1, Attrs::new());
        op.insert("XX", Attrs::new());
        let cursor = Cursor::new(0, 3);
        let transformed = cursor.transform(&op);
        assert_eq!(transformed.position, 0);
        assert_eq!(transformed.selection_end, 5);
    }

    #[test]
    fn json_round_trip() {
        let cursor = Cursor::new(2, 7);
        let json = cursor.to_json();
        assert_eq!(Cursor::from_json(&json), Some(cursor));
    }
}
