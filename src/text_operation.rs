//! The text-operation algebra (§3, §4.2): an ordered, normalized sequence of
//! [`TextOp`]s together with the total functions `apply`, `compose`,
//! `invert` and `transform` that make operational transformation work.

use crate::attrs::Attrs;
use crate::error::Error;
use crate::text_op::TextOp;
use serde_json::Value as Json;
use std::cmp::Ordering;

/// An ordered sequence of [`TextOp`]s, maintained in normalized form.
///
/// Adjacent ops of the same kind (with equal attributes, for `Retain`/`Insert`) are merged as
/// they're built up, and an `Insert` that follows a `Delete` is canonicalized to sit *before*
/// that `Delete` — so two operations that have the same effect on any document of the right
/// length compare equal regardless of the order their components were appended in.
#[derive(Debug, Clone)]
pub struct TextOperation {
    ops: Vec<TextOp>,
    base_length: u64,
    target_length: u64,
}

impl Default for TextOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl TextOperation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            base_length: 0,
            target_length: 0,
        }
    }

    #[must_use]
    pub fn ops(&self) -> &[TextOp] {
        &self.ops
    }

    #[must_use]
    pub fn base_length(&self) -> u64 {
        self.base_length
    }

    #[must_use]
    pub fn target_length(&self) -> u64 {
        self.target_length
    }

    /// True for an operation that leaves every document it applies to unchanged (an empty op
    /// list, or a single attribute-free `Retain`).
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match self.ops.as_slice() {
            [] => true,
            [TextOp::Retain(_, attrs)] => attrs.is_empty(),
            _ => false,
        }
    }

    // -- builders --------------------------------------------------------

    /// Appends a `Retain`, merging with a trailing `Retain` of equal attributes.
    pub fn retain(&mut self, n: u64, attrs: Attrs) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.base_length += n;
        self.target_length += n;
        match self.ops.last_mut() {
            Some(TextOp::Retain(last_n, last_attrs)) if last_attrs.attributes_equal(&attrs) => {
                *last_n += n;
            }
            _ => self.ops.push(TextOp::Retain(n, attrs)),
        }
        self
    }

    /// Appends an `Insert`. If the op list currently ends in a `Delete`, the insert is placed
    /// immediately before it instead of after, so that `delete().insert()` and `insert().delete()`
    /// produce the same normalized sequence.
    pub fn insert(&mut self, s: impl Into<String>, attrs: Attrs) -> &mut Self {
        let s = s.into();
        if s.is_empty() {
            return self;
        }
        self.target_length += s.chars().count() as u64;

        let len = self.ops.len();
        match self.ops.last() {
            Some(TextOp::Insert(_, last_attrs)) if last_attrs.attributes_equal(&attrs) => {
                if let Some(TextOp::Insert(last_s, _)) = self.ops.last_mut() {
                    last_s.push_str(&s);
                }
            }
            Some(TextOp::Insert(..)) => {
                self.ops.push(TextOp::Insert(s, attrs));
            }
            Some(TextOp::Delete(_)) => {
                let merges_with_previous_insert = len >= 2
                    && matches!(&self.ops[len - 2], TextOp::Insert(_, prev_attrs) if prev_attrs.attributes_equal(&attrs));
                if merges_with_previous_insert {
                    if let TextOp::Insert(prev_s, _) = &mut self.ops[len - 2] {
                        prev_s.push_str(&s);
                    }
                } else {
                    self.ops.insert(len - 1, TextOp::Insert(s, attrs));
                }
            }
            _ => self.ops.push(TextOp::Insert(s, attrs)),
        }
        self
    }

    /// Appends a `Delete`, merging with a trailing `Delete`.
    pub fn delete(&mut self, n: u64) -> &mut Self {
        if n == 0 {
            return self;
        }
        self.base_length += n;
        match self.ops.last_mut() {
            Some(TextOp::Delete(last_n)) => *last_n += n,
            _ => self.ops.push(TextOp::Delete(n)),
        }
        self
    }

    // -- apply -------------------------------------------------------------

    /// Applies the operation to `doc`, returning the resulting document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if `doc`'s length doesn't equal [`base_length`](Self::base_length),
    /// or [`Error::DocumentTooShort`] if a `Retain`/`Delete` would read past the end of `doc`
    /// (this shouldn't happen when `base_length` matches, but is checked defensively).
    pub fn apply(&self, doc: &str) -> Result<String, Error> {
        let doc_chars: Vec<char> = doc.chars().collect();
        let doc_len = doc_chars.len() as u64;
        if doc_len != self.base_length {
            return Err(Error::LengthMismatch {
                expected: self.base_length,
                actual: doc_len,
            });
        }

        let mut result = String::new();
        let mut idx: usize = 0;
        for op in &self.ops {
            match op {
                TextOp::Retain(n, _attrs) => {
                    let n = *n as usize;
                    if idx + n > doc_chars.len() {
                        return Err(Error::DocumentTooShort {
                            needed: (idx + n) as u64,
                            available: doc_chars.len() as u64,
                        });
                    }
                    result.extend(&doc_chars[idx..idx + n]);
                    idx += n;
                }
                TextOp::Insert(s, _attrs) => {
                    result.push_str(s);
                }
                TextOp::Delete(n) => {
                    let n = *n as usize;
                    if idx + n > doc_chars.len() {
                        return Err(Error::DocumentTooShort {
                            needed: (idx + n) as u64,
                            available: doc_chars.len() as u64,
                        });
                    }
                    idx += n;
                }
            }
        }
        Ok(result)
    }

    // -- invert --------------------------------------------------------------

    /// Produces the operation that undoes `self`'s effect on `doc`.
    ///
    /// Attribute changes on `Retain` components invert to the same attributes: without a
    /// document-wide attribute store (out of scope for this crate, see `DESIGN.md`) there is no
    /// way to recover what the attributes *were* before `self` ran, so the inverse is a
    /// conservative identity on attributes. Plain-text retains (the common case) round-trip
    /// exactly, which is what the algebraic laws in §8 exercise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`]/[`Error::DocumentTooShort`] under the same conditions as
    /// [`apply`](Self::apply).
    pub fn invert(&self, doc: &str) -> Result<Self, Error> {
        let doc_chars: Vec<char> = doc.chars().collect();
        let doc_len = doc_chars.len() as u64;
        if doc_len != self.base_length {
            return Err(Error::LengthMismatch {
                expected: self.base_length,
                actual: doc_len,
            });
        }

        let mut inverse = Self::new();
        let mut idx: usize = 0;
        for op in &self.ops {
            match op {
                TextOp::Retain(n, attrs) => {
                    inverse.retain(*n, attrs.clone());
                    idx += *n as usize;
                }
                TextOp::Insert(s, _attrs) => {
                    inverse.delete(s.chars().count() as u64);
                }
                TextOp::Delete(n) => {
                    let n = *n as usize;
                    if idx + n > doc_chars.len() {
                        return Err(Error::DocumentTooShort {
                            needed: (idx + n) as u64,
                            available: doc_chars.len() as u64,
                        });
                    }
                    let captured: String = doc_chars[idx..idx + n].iter().collect();
                    inverse.insert(captured, Attrs::new());
                    idx += n;
                }
            }
        }
        Ok(inverse)
    }

    // -- compose -------------------------------------------------------------

    /// Folds `self` then `other` into a single equivalent operation: for all compatible `doc`,
    /// `self.compose(other)?.apply(doc) == other.apply(self.apply(doc)?)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotCompose`] if `self.target_length() != other.base_length()`.
    pub fn compose(&self, other: &Self) -> Result<Self, Error> {
        if self.target_length != other.base_length {
            return Err(Error::CannotCompose {
                target_length: self.target_length,
                base_length: other.base_length,
            });
        }

        let mut result = Self::new();
        let mut iter1 = self.ops.iter().cloned();
        let mut iter2 = other.ops.iter().cloned();
        let mut op1 = iter1.next();
        let mut op2 = iter2.next();

        loop {
            if op1.is_none() && op2.is_none() {
                break;
            }
            if matches!(op1, Some(TextOp::Delete(_))) {
                if let Some(TextOp::Delete(n)) = op1.take() {
                    result.delete(n);
                }
                op1 = iter1.next();
                continue;
            }
            if matches!(op2, Some(TextOp::Insert(..))) {
                if let Some(TextOp::Insert(s, attrs)) = op2.take() {
                    result.insert(s, attrs);
                }
                op2 = iter2.next();
                continue;
            }

            let o1 = op1
                .take()
                .ok_or_else(|| Error::Validation("compose: first operation is too short".into()))?;
            let o2 = op2
                .take()
                .ok_or_else(|| Error::Validation("compose: first operation is too long".into()))?;

            match (o1, o2) {
                (TextOp::Retain(n1, a1), TextOp::Retain(n2, a2)) => {
                    let attrs = a1.compose(&a2);
                    match n1.cmp(&n2) {
                        Ordering::Greater => {
                            result.retain(n2, attrs);
                            op1 = Some(TextOp::Retain(n1 - n2, a1));
                            op2 = iter2.next();
                        }
                        Ordering::Equal => {
                            result.retain(n1, attrs);
                            op1 = iter1.next();
                            op2 = iter2.next();
                        }
                        Ordering::Less => {
                            result.retain(n1, attrs);
                            op2 = Some(TextOp::Retain(n2 - n1, a2));
                            op1 = iter1.next();
                        }
                    }
                }
                (TextOp::Insert(s, a1), TextOp::Delete(n2)) => {
                    let s_len = s.chars().count() as u64;
                    match s_len.cmp(&n2) {
                        Ordering::Greater => {
                            let (_, tail) = split_at_chars(&s, n2 as usize);
                            op1 = Some(TextOp::Insert(tail, a1));
                            op2 = iter2.next();
                        }
                        Ordering::Equal => {
                            op1 = iter1.next();
                            op2 = iter2.next();
                        }
                        Ordering::Less => {
                            op2 = Some(TextOp::Delete(n2 - s_len));
                            op1 = iter1.next();
                        }
                    }
                }
                (TextOp::Insert(s, a1), TextOp::Retain(n2, a2)) => {
                    let attrs = a1.compose(&a2);
                    let s_len = s.chars().count() as u64;
                    match s_len.cmp(&n2) {
                        Ordering::Greater => {
                            let (head, tail) = split_at_chars(&s, n2 as usize);
                            result.insert(head, attrs);
                            op1 = Some(TextOp::Insert(tail, a1));
                            op2 = iter2.next();
                        }
                        Ordering::Equal => {
                            result.insert(s, attrs);
                            op1 = iter1.next();
                            op2 = iter2.next();
                        }
                        Ordering::Less => {
                            result.insert(s, attrs);
                            op2 = Some(TextOp::Retain(n2 - s_len, a2));
                            op1 = iter1.next();
                        }
                    }
                }
                (TextOp::Retain(n1, a1), TextOp::Delete(n2)) => match n1.cmp(&n2) {
                    Ordering::Greater => {
                        result.delete(n2);
                        op1 = Some(TextOp::Retain(n1 - n2, a1));
                        op2 = iter2.next();
                    }
                    Ordering::Equal => {
                        result.delete(n2);
                        op1 = iter1.next();
                        op2 = iter2.next();
                    }
                    Ordering::Less => {
                        result.delete(n1);
                        op2 = Some(TextOp::Delete(n2 - n1));
                        op1 = iter1.next();
                    }
                },
                (o1, o2) => unreachable!(
                    "Delete-as-op1 and Insert-as-op2 are handled above; got {o1:?}, {o2:?}"
                ),
            }
        }

        Ok(result)
    }

    // -- transform -------------------------------------------------------------

    /// The OT diamond: given two operations with the same base document, produces
    /// `(self', other')` such that `self'.apply(other.apply(d)?)? == other'.apply(self.apply(d)?)?`.
    ///
    /// When both operations insert at the same position, `self`'s insert is placed first (ties
    /// are broken by which side this method is called on — callers must apply that rule
    /// consistently, e.g. by designating "the op that reached the coordinator first" as `self`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CannotTransform`] if `self.base_length() != other.base_length()`.
    pub fn transform(&self, other: &Self) -> Result<(Self, Self), Error> {
        if self.base_length != other.base_length {
            return Err(Error::CannotTransform {
                lhs: self.base_length,
                rhs: other.base_length,
            });
        }

        let mut self_prime = Self::new();
        let mut other_prime = Self::new();
        let mut iter1 = self.ops.iter().cloned();
        let mut iter2 = other.ops.iter().cloned();
        let mut op1 = iter1.next();
        let mut op2 = iter2.next();

        loop {
            if op1.is_none() && op2.is_none() {
                break;
            }
            if let Some(TextOp::Insert(s, attrs)) = op1.clone() {
                let len = s.chars().count() as u64;
                self_prime.insert(s, attrs);
                other_prime.retain(len, Attrs::new());
                op1 = iter1.next();
                continue;
            }
            if let Some(TextOp::Insert(s, attrs)) = op2.clone() {
                let len = s.chars().count() as u64;
                self_prime.retain(len, Attrs::new());
                other_prime.insert(s, attrs);
                op2 = iter2.next();
                continue;
            }

            let o1 = op1
                .take()
                .ok_or_else(|| Error::Validation("transform: first operation is too short".into()))?;
            let o2 = op2.take().ok_or_else(|| {
                Error::Validation("transform: second operation is too short".into())
            })?;

            match (o1, o2) {
                (TextOp::Retain(n1, a1), TextOp::Retain(n2, a2)) => {
                    let attrs = a1.compose(&a2);
                    let min = n1.min(n2);
                    match n1.cmp(&n2) {
                        Ordering::Greater => {
                            op1 = Some(TextOp::Retain(n1 - n2, a1));
                            op2 = iter2.next();
                        }
                        Ordering::Equal => {
                            op1 = iter1.next();
                            op2 = iter2.next();
                        }
                        Ordering::Less => {
                            op2 = Some(TextOp::Retain(n2 - n1, a2));
                            op1 = iter1.next();
                        }
                    }
                    self_prime.retain(min, attrs.clone());
                    other_prime.retain(min, attrs);
                }
                (TextOp::Delete(n1), TextOp::Delete(n2)) => match n1.cmp(&n2) {
                    Ordering::Greater => {
                        op1 = Some(TextOp::Delete(n1 - n2));
                        op2 = iter2.next();
                    }
                    Ordering::Equal => {
                        op1 = iter1.next();
                        op2 = iter2.next();
                    }
                    Ordering::Less => {
                        op2 = Some(TextOp::Delete(n2 - n1));
                        op1 = iter1.next();
                    }
                },
                (TextOp::Delete(n1), TextOp::Retain(n2, a2)) => {
                    let min = n1.min(n2);
                    match n1.cmp(&n2) {
                        Ordering::Greater => {
                            op1 = Some(TextOp::Delete(n1 - n2));
                            op2 = iter2.next();
                        }
                        Ordering::Equal => {
                            op1 = iter1.next();
                            op2 = iter2.next();
                        }
                        Ordering::Less => {
                            op2 = Some(TextOp::Retain(n2 - n1, a2));
                            op1 = iter1.next();
                        }
                    }
                    self_prime.delete(min);
                }
                (TextOp::Retain(n1, a1), TextOp::Delete(n2)) => {
                    let min = n1.min(n2);
                    match n1.cmp(&n2) {
                        Ordering::Greater => {
                            op1 = Some(TextOp::Retain(n1 - n2, a1));
                            op2 = iter2.next();
                        }
                        Ordering::Equal => {
                            op1 = iter1.next();
                            op2 = iter2.next();
                        }
                        Ordering::Less => {
                            op2 = Some(TextOp::Delete(n2 - n1));
                            op1 = iter1.next();
                        }
                    }
                    other_prime.delete(min);
                }
                (o1, o2) => unreachable!("Insert is handled above; got {o1:?}, {o2:?}"),
            }
        }

        Ok((self_prime, other_prime))
    }

    // -- undo-coalescing heuristics (§4.2, used by the undo manager §4.7) --------

    /// If this operation is a single edit (at most a leading `Retain` plus one `Insert` or
    /// `Delete`), returns the position of that edit and its kind.
    fn simple_edit(&self) -> Option<(u64, SimpleEdit)> {
        match self.ops.as_slice() {
            [TextOp::Insert(s, _)] => Some((0, SimpleEdit::Insert(s.chars().count() as u64))),
            [TextOp::Delete(n)] => Some((0, SimpleEdit::Delete(*n))),
            [TextOp::Retain(r, _), TextOp::Insert(s, _)] => {
                Some((*r, SimpleEdit::Insert(s.chars().count() as u64)))
            }
            [TextOp::Retain(r, _), TextOp::Delete(n)] => Some((*r, SimpleEdit::Delete(*n))),
            _ => None,
        }
    }

    /// True when `other` is a natural continuation of `self` — used by the undo manager to
    /// coalesce consecutive edits (e.g. single-character inserts typed in sequence) into one
    /// history entry.
    #[must_use]
    pub fn should_be_composed_with(&self, other: &Self) -> bool {
        if self.is_noop() || other.is_noop() {
            return true;
        }
        let (Some((start_a, simple_a)), Some((start_b, simple_b))) =
            (self.simple_edit(), other.simple_edit())
        else {
            return false;
        };
        match (simple_a, simple_b) {
            (SimpleEdit::Insert(len_a), SimpleEdit::Insert(_)) => start_a + len_a == start_b,
            (SimpleEdit::Delete(_), SimpleEdit::Delete(len_b)) => {
                start_b + len_b == start_a || start_a == start_b
            }
            _ => false,
        }
    }

    /// Same idea as [`should_be_composed_with`](Self::should_be_composed_with), but accounting
    /// for the fact that inverses of deletions move the edit position backwards. Used when
    /// deciding whether to coalesce two entries being pushed onto the undo stack (which holds
    /// inverses).
    #[must_use]
    pub fn should_be_composed_with_inverted(&self, other: &Self) -> bool {
        if self.is_noop() || other.is_noop() {
            return true;
        }
        let (Some((start_a, simple_a)), Some((start_b, simple_b))) =
            (self.simple_edit(), other.simple_edit())
        else {
            return false;
        };
        match (simple_a, simple_b) {
            (SimpleEdit::Insert(len_a), SimpleEdit::Insert(_)) => {
                start_a + len_a == start_b || start_a == start_b
            }
            (SimpleEdit::Delete(_), SimpleEdit::Delete(len_b)) => start_b + len_b == start_a,
            _ => false,
        }
    }

    /// A looser criterion than [`should_be_composed_with`](Self::should_be_composed_with): true
    /// when both operations are simple edits of the same kind (both inserts, or both deletes),
    /// without requiring positional adjacency.
    #[must_use]
    pub fn can_merge_with(&self, other: &Self) -> bool {
        matches!(
            (self.simple_edit(), other.simple_edit()),
            (Some((_, SimpleEdit::Insert(_))), Some((_, SimpleEdit::Insert(_))))
                | (Some((_, SimpleEdit::Delete(_))), Some((_, SimpleEdit::Delete(_))))
        )
    }

    // -- JSON wire format (§6) --------------------------------------------------

    #[must_use]
    pub fn to_json(&self) -> Json {
        let components = self
            .ops
            .iter()
            .map(|op| match op {
                TextOp::Retain(n, attrs) if attrs.is_empty() => Json::from(*n),
                TextOp::Retain(n, attrs) => serde_json::json!({"r": n, "attrs": attrs_to_json(attrs)}),
                TextOp::Insert(s, attrs) if attrs.is_empty() => Json::from(s.clone()),
                TextOp::Insert(s, attrs) => {
                    serde_json::json!({"i": s, "attrs": attrs_to_json(attrs)})
                }
                TextOp::Delete(n) => Json::from(-(*n as i64)),
            })
            .collect();
        Json::Array(components)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidOperationReceive`] if `value` isn't a JSON array of the shapes
    /// described in §6 (integers, strings, or `{"r"|"i", "attrs"}` objects).
    pub fn from_json(value: &Json) -> Result<Self, Error> {
        let components = value.as_array().ok_or_else(|| {
            Error::InvalidOperationReceive("operation JSON must be an array".into())
        })?;
        let mut op = Self::new();
        for component in components {
            match component {
                Json::Number(n) if n.as_i64().map(|v| v > 0).unwrap_or(false) => {
                    op.retain(n.as_i64().unwrap() as u64, Attrs::new());
                }
                Json::Number(n) if n.as_i64().map(|v| v < 0).unwrap_or(false) => {
                    op.delete((-n.as_i64().unwrap()) as u64);
                }
                Json::Number(n) => {
                    return Err(Error::InvalidOperationReceive(format!(
                        "zero-length op component: {n}"
                    )))
                }
                Json::String(s) => {
                    op.insert(s.clone(), Attrs::new());
                }
                Json::Object(map) => {
                    let attrs = map
                        .get("attrs")
                        .map(attrs_from_json)
                        .transpose()?
                        .unwrap_or_default();
                    if let Some(n) = map.get("r").and_then(Json::as_u64) {
                        op.retain(n, attrs);
                    } else if let Some(s) = map.get("i").and_then(Json::as_str) {
                        op.insert(s, attrs);
                    } else {
                        return Err(Error::InvalidOperationReceive(
                            "attributed op component must have an 'r' or 'i' key".into(),
                        ));
                    }
                }
                other => {
                    return Err(Error::InvalidOperationReceive(format!(
                        "unsupported op component: {other}"
                    )))
                }
            }
        }
        Ok(op)
    }
}

impl PartialEq for TextOperation {
    fn eq(&self, other: &Self) -> bool {
        trimmed_trailing_retain(&self.ops) == trimmed_trailing_retain(&other.ops)
    }
}
impl Eq for TextOperation {}

fn trimmed_trailing_retain(ops: &[TextOp]) -> &[TextOp] {
    if let Some(TextOp::Retain(_, attrs)) = ops.last() {
        if attrs.is_empty() {
            return &ops[..ops.len() - 1];
        }
    }
    ops
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleEdit {
    Insert(u64),
    Delete(u64),
}

fn split_at_chars(s: &str, n: usize) -> (String, String) {
    let byte_idx = s
        .char_indices()
        .nth(n)
        .map_or(s.len(), |(idx, _)| idx);
    (s[..byte_idx].to_string(), s[byte_idx..].to_string())
}

fn attrs_to_json(attrs: &Attrs) -> Json {
    serde_json::to_value(attrs).unwrap_or(Json::Null)
}

fn attrs_from_json(value: &Json) -> Result<Attrs, Error> {
    serde_json::from_value(value.clone())
        .map_err(|e| Error::InvalidOperationReceive(format!("invalid attrs: {e}")))
}

pub mod factories {
    //! Small helpers for building common operations in tests.
    use super::{Attrs, TextOperation};

    #[must_use]
    pub fn insert(at: u64, s: &str) -> TextOperation {
        let mut op = TextOperation::new();
        op.retain(at, Attrs::new());
        op.insert(s, Attrs::new());
        op
    }

    #[must_use]
    pub fn delete(at: u64, n: u64) -> TextOperation {
        let mut op = TextOperation::new();
        op.retain(at, Attrs::new());
        op.delete(n);
        op
    }

    #[must_use]
    pub fn replace(at: u64, n: u64, s: &str) -> TextOperation {
        let mut op = TextOperation::new();
        op.retain(at, Attrs::new());
        op.delete(n);
        op.insert(s, Attrs::new());
        op
    }
}

#[cfg(test)]
mod tests {
    use super::factories::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_merges_adjacent_retains() {
        let mut op = TextOperation::new();
        op.retain(2, Attrs::new());
        op.retain(3, Attrs::new());
        assert_eq!(op.ops(), &[TextOp::Retain(5, Attrs::new())]);
    }

    #[test]
    fn builder_merges_adjacent_inserts() {
        let mut op = TextOperation::new();
        op.insert("foo", Attrs::new());
        op.insert("bar", Attrs::new());
        assert_eq!(op.ops(), &[TextOp::Insert("foobar".to_string(), Attrs::new())]);
    }

    #[test]
    fn builder_canonicalizes_insert_before_delete() {
        let mut op = TextOperation::new();
        op.delete(2);
        op.insert("x", Attrs::new());
        assert_eq!(
            op.ops(),
            &[
                TextOp::Insert("x".to_string(), Attrs::new()),
                TextOp::Delete(2)
            ]
        );
    }

    #[test]
    fn apply_basic_insert_delete_retain() {
        let mut op = TextOperation::new();
        op.retain(1, Attrs::new());
        op.delete(1);
        op.insert("u", Attrs::new());
        op.retain(3, Attrs::new());
        assert_eq!(op.apply("hello").unwrap(), "hullo");
    }

    #[test]
    fn apply_rejects_wrong_length_document() {
        let op = insert(0, "x");
        assert_eq!(
            op.apply("ab"),
            Err(Error::LengthMismatch {
                expected: 0,
                actual: 2
            })
        );
    }

    #[test]
    fn invert_undoes_insert() {
        let op = insert(1, "x");
        let doc = "ab";
        let applied = op.apply(doc).unwrap();
        let inverse = op.invert(doc).unwrap();
        assert_eq!(inverse.apply(&applied).unwrap(), doc);
    }

    #[test]
    fn invert_undoes_delete() {
        let op = delete(1, 1);
        let doc = "abc";
        let applied = op.apply(doc).unwrap();
        let inverse = op.invert(doc).unwrap();
        assert_eq!(inverse.apply(&applied).unwrap(), doc);
    }

    #[test]
    fn double_invert_is_identity() {
        let op = replace(1, 1, "XY");
        let doc = "abc";
        let applied = op.apply(doc).unwrap();
        let inverse = op.invert(doc).unwrap();
        let double_inverse = inverse.invert(&applied).unwrap();
        assert_eq!(double_inverse, op);
    }

    #[test]
    fn compose_sequential_edits() {
        let doc = "abc";
        let op1 = insert(3, "d");
        let op2 = delete(0, 1);
        let composed = op1.compose(&op2).unwrap();
        let direct = op2.apply(&op1.apply(doc).unwrap()).unwrap();
        assert_eq!(composed.apply(doc).unwrap(), direct);
    }

    #[test]
    fn compose_rejects_mismatched_lengths() {
        let op1 = insert(0, "x");
        let op2 = delete(0, 5);
        assert!(op1.compose(&op2).is_err());
    }

    #[test]
    fn compose_associativity() {
        let a = insert(0, "a");
        let b = insert(1, "b");
        let c = insert(2, "c");
        let left = a.compose(&b).unwrap().compose(&c).unwrap();
        let right = a.compose(&b.compose(&c).unwrap()).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn transform_concurrent_inserts_converge() {
        // Scenario S2: base "AB", A inserts "X" at 1, B inserts "Y" at 1.
        let doc = "AB";
        let a = insert(1, "X");
        let b = insert(1, "Y");
        let (a_prime, b_prime) = a.transform(&b).unwrap();

        let via_a_then_bprime = b_prime.apply(&a.apply(doc).unwrap()).unwrap();
        let via_b_then_aprime = a_prime.apply(&b.apply(doc).unwrap()).unwrap();
        assert_eq!(via_a_then_bprime, via_b_then_aprime);
        assert_eq!(via_a_then_bprime, "AXYB");
    }

    #[test]
    fn transform_tie_break_puts_self_insert_first() {
        let a = insert(1, "x");
        let b = insert(1, "y");
        let (a_prime, _b_prime) = a.transform(&b).unwrap();
        // a' must insert "x" before retaining over b's "y".
        assert!(matches!(a_prime.ops()[1], TextOp::Insert(ref s, _) if s == "x"));
    }

    #[test]
    fn transform_rejects_mismatched_base_lengths() {
        let a = insert(0, "x");
        let mut b = TextOperation::new();
        b.retain(5, Attrs::new());
        assert!(a.transform(&b).is_err());
    }

    #[test]
    fn transform_diamond_with_deletes() {
        let doc = "hello world";
        let a = delete(0, 5); // delete "hello"
        let b = replace(6, 5, "earth"); // "world" -> "earth"
        let (a_prime, b_prime) = a.transform(&b).unwrap();
        let via_a_then_bprime = b_prime.apply(&a.apply(doc).unwrap()).unwrap();
        let via_b_then_aprime = a_prime.apply(&b.apply(doc).unwrap()).unwrap();
        assert_eq!(via_a_then_bprime, via_b_then_aprime);
    }

    #[test]
    fn no_op_identity_for_compose() {
        let op = insert(0, "hi");
        let mut noop = TextOperation::new();
        noop.retain(op.target_length(), Attrs::new());
        assert_eq!(op.compose(&noop).unwrap(), op);

        let mut noop_before = TextOperation::new();
        noop_before.retain(op.base_length(), Attrs::new());
        assert_eq!(noop_before.compose(&op).unwrap(), op);
    }

    #[test]
    fn no_op_identity_for_transform() {
        let op = insert(0, "hi");
        let mut noop = TextOperation::new();
        noop.retain(op.base_length(), Attrs::new());
        let (op_prime, noop_prime) = op.transform(&noop).unwrap();
        assert_eq!(op_prime, op);
        assert!(noop_prime.is_noop());
    }

    #[test]
    fn json_round_trip() {
        let mut op = TextOperation::new();
        op.retain(2, Attrs::new());
        op.delete(1);
        op.insert("hi", Attrs::new());
        let json = op.to_json();
        let parsed = TextOperation::from_json(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn json_round_trip_with_attributes() {
        let mut attrs = Attrs::new();
        attrs.insert("bold", Some("true".to_string()));
        let mut op = TextOperation::new();
        op.retain(2, attrs.clone());
        op.insert("hi", attrs);
        let json = op.to_json();
        let parsed = TextOperation::from_json(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn from_json_rejects_non_array() {
        assert!(TextOperation::from_json(&serde_json::json!({"not": "an array"})).is_err());
    }

    #[test]
    fn should_be_composed_with_contiguous_inserts() {
        let a = insert(0, "a");
        let b = insert(1, "b");
        assert!(a.should_be_composed_with(&b));
    }

    #[test]
    fn should_be_composed_with_rejects_noncontiguous_inserts() {
        let a = insert(0, "a");
        let b = insert(5, "b");
        assert!(!a.should_be_composed_with(&b));
    }

    #[test]
    fn should_be_composed_with_inverted_contiguous_deletes() {
        // Backspacing repeatedly: each subsequent delete is the deletion of the character now at
        // the start of the previous deletion.
        let a = delete(4, 1);
        let b = delete(3, 1);
        assert!(a.should_be_composed_with_inverted(&b));
    }

    #[test]
    fn can_merge_with_is_looser_than_should_be_composed_with() {
        let a = insert(0, "a");
        let b = insert(5, "b");
        assert!(!a.should_be_composed_with(&b));
        assert!(a.can_merge_with(&b));
    }

    #[test]
    fn normalization_no_adjacent_ops_further_mergeable() {
        let op = replace(1, 1, "xy");
        for pair in op.ops().windows(2) {
            match (&pair[0], &pair[1]) {
                (TextOp::Retain(_, a1), TextOp::Retain(_, a2)) => {
                    assert!(!a1.attributes_equal(a2));
                }
                (TextOp::Insert(_, a1), TextOp::Insert(_, a2)) => {
                    assert!(!a1.attributes_equal(a2));
                }
                (TextOp::Delete(_), TextOp::Delete(_)) => panic!("adjacent deletes not merged"),
                _ => {}
            }
        }
    }
}
