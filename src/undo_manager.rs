//! Undo/redo stack management (§4.7).
//!
//! Both stacks hold [`WrappedOperation`]s that, when applied to the *current* document, perform
//! the undo/redo. Remote edits are transformed into every entry on both stacks as they arrive, so
//! an entry pushed five minutes ago still applies correctly to today's document.

use crate::error::Error;
use crate::wrapped_operation::WrappedOperation;
use tracing::{debug, trace};

/// What the manager is doing right now, so that a `compose`/push triggered by a resulting
/// operation mid-`perform_undo`/`perform_redo` can be routed onto the right stack instead of
/// clearing the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Undoing,
    Redoing,
}

#[derive(Debug, Clone, Default)]
pub struct UndoManager {
    undo_stack: Vec<WrappedOperation>,
    redo_stack: Vec<WrappedOperation>,
    mode: ModeState,
    disposed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ModeState(Option<Mode>);

impl UndoManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a just-performed local operation to the history. While undoing/redoing, the
    /// operation lands on the *other* stack instead (an undo produces a redo entry, and vice
    /// versa); in normal operation it's pushed to the undo stack and the redo stack is cleared.
    ///
    /// `compose` mirrors §4.7's `add(op, compose=false)`: the caller (typically after checking
    /// [`WrappedOperation::should_be_composed_with_inverted`] against [`Self::last`] itself) opts
    /// in to merging `op` into the top of the target stack instead of always pushing a new entry.
    /// Passing `false` always pushes, even if the two operations would otherwise coalesce — which
    /// matters for a push made while [`Self::perform_undo`]/[`Self::perform_redo`]'s callback is
    /// running, where auto-coalescing isn't wanted by default.
    ///
    /// # Errors
    ///
    /// Propagates [`Error`] from composing with the top of the target stack.
    pub fn add(&mut self, op: WrappedOperation, compose: bool) -> Result<(), Error> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        match self.mode.0 {
            None => {
                self.push(Stack::Undo, op, compose)?;
                self.redo_stack.clear();
            }
            Some(Mode::Undoing) => self.push(Stack::Redo, op, compose)?,
            Some(Mode::Redoing) => self.push(Stack::Undo, op, compose)?,
        }
        Ok(())
    }

    fn push(&mut self, stack: Stack, op: WrappedOperation, compose: bool) -> Result<(), Error> {
        if compose {
            self.push_coalescing(stack, op)
        } else {
            match stack {
                Stack::Undo => self.undo_stack.push(op),
                Stack::Redo => self.redo_stack.push(op),
            }
            Ok(())
        }
    }

    fn push_coalescing(&mut self, stack: Stack, op: WrappedOperation) -> Result<(), Error> {
        let target = match stack {
            Stack::Undo => &mut self.undo_stack,
            Stack::Redo => &mut self.redo_stack,
        };
        if let Some(top) = target.last() {
            if top.should_be_composed_with_inverted(&op) {
                let composed = top.compose(&op)?;
                *target.last_mut().expect("checked non-empty above") = composed;
                return Ok(());
            }
        }
        target.push(op);
        Ok(())
    }

    /// Transforms every stacked entry through a remote operation, keeping history usable against
    /// the now-current document. Call this whenever a remote operation is applied locally.
    ///
    /// # Errors
    ///
    /// Propagates [`Error`] from the underlying `transform` calls.
    pub fn transform(&mut self, remote_op: &WrappedOperation) -> Result<(), Error> {
        for stack in [&mut self.undo_stack, &mut self.redo_stack] {
            let mut transformed = Vec::with_capacity(stack.len());
            let mut pending = remote_op.clone();
            for entry in stack.drain(..) {
                let (entry_prime, pending_prime) = entry.transform(&pending)?;
                transformed.push(entry_prime);
                pending = pending_prime;
            }
            *stack = transformed;
        }
        Ok(())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Total number of entries across both stacks, used to size a `warn!` when [`Self::transform`]
    /// rebases a large fraction of history against one remote catch-up operation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.undo_stack.len() + self.redo_stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pops the top of the undo stack, invoking `apply_locally` with it, and records the result
    /// on the redo stack. `apply_locally` is expected to call back into [`Self::add`] is *not*
    /// required of it — this method manages the stack transition itself via [`Self::mode`]
    /// bookkeeping, so any operation `apply_locally` itself feeds through [`Self::add`] (e.g. via
    /// an editor adapter round-trip) is correctly routed to the redo stack instead of clearing
    /// history.
    ///
    /// # Errors
    ///
    /// Returns whatever error `apply_locally` returns, or a compose/transform error.
    pub fn perform_undo<F>(&mut self, apply_locally: F) -> Result<Option<WrappedOperation>, Error>
    where
        F: FnOnce(&WrappedOperation) -> Result<(), Error>,
    {
        if self.disposed {
            return Err(Error::Disposed);
        }
        let Some(op) = self.undo_stack.pop() else {
            return Ok(None);
        };
        debug!("undo: applying and entering Undoing mode");
        self.mode = ModeState(Some(Mode::Undoing));
        let result = apply_locally(&op);
        self.mode = ModeState(None);
        result?;
        Ok(Some(op))
    }

    /// The redo-stack mirror of [`Self::perform_undo`].
    ///
    /// # Errors
    ///
    /// Returns whatever error `apply_locally` returns, or a compose/transform error.
    pub fn perform_redo<F>(&mut self, apply_locally: F) -> Result<Option<WrappedOperation>, Error>
    where
        F: FnOnce(&WrappedOperation) -> Result<(), Error>,
    {
        if self.disposed {
            return Err(Error::Disposed);
        }
        let Some(op) = self.redo_stack.pop() else {
            return Ok(None);
        };
        debug!("redo: applying and entering Redoing mode");
        self.mode = ModeState(Some(Mode::Redoing));
        let result = apply_locally(&op);
        self.mode = ModeState(None);
        result?;
        Ok(Some(op))
    }

    #[must_use]
    pub fn last(&self) -> Option<&WrappedOperation> {
        self.undo_stack.last()
    }

    pub fn clear(&mut self) {
        trace!("undo manager cleared");
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn dispose(&mut self) {
        self.clear();
        self.disposed = true;
    }
}

enum Stack {
    Undo,
    Redo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_operation::factories;

    fn op(at: u64, s: &str) -> WrappedOperation {
        WrappedOperation::without_meta(factories::insert(at, s))
    }

    #[test]
    fn undo_pops_and_moves_to_redo() {
        let mut mgr = UndoManager::new();
        mgr.add(op(0, "a"), false).unwrap();
        assert!(mgr.can_undo());
        let popped = mgr.perform_undo(|_| Ok(())).unwrap();
        assert!(popped.is_some());
        assert!(!mgr.can_undo());
        assert!(mgr.can_redo());
    }

    #[test]
    fn redo_pops_and_moves_back_to_undo() {
        let mut mgr = UndoManager::new();
        mgr.add(op(0, "a"), false).unwrap();
        mgr.perform_undo(|_| Ok(())).unwrap();
        assert!(mgr.can_redo());
        mgr.perform_redo(|_| Ok(())).unwrap();
        assert!(mgr.can_undo());
        assert!(!mgr.can_redo());
    }

    #[test]
    fn new_edit_clears_redo_stack() {
        let mut mgr = UndoManager::new();
        mgr.add(op(0, "a"), false).unwrap();
        mgr.perform_undo(|_| Ok(())).unwrap();
        assert!(mgr.can_redo());
        mgr.add(op(0, "b"), false).unwrap();
        assert!(!mgr.can_redo());
    }

    #[test]
    fn contiguous_inserts_coalesce_on_undo_stack() {
        let mut mgr = UndoManager::new();
        mgr.add(op(0, "a"), false).unwrap();
        mgr.add(op(1, "b"), true).unwrap();
        // The caller passed compose=true because the second insert's inverse (delete) satisfies
        // should_be_composed_with_inverted against the first, so the two merge into one entry.
        assert_eq!(mgr.undo_stack.len(), 1);
    }

    #[test]
    fn add_without_compose_never_merges_even_when_coalescable() {
        let mut mgr = UndoManager::new();
        mgr.add(op(0, "a"), false).unwrap();
        mgr.add(op(1, "b"), false).unwrap();
        assert_eq!(mgr.undo_stack.len(), 2);
    }

    #[test]
    fn undo_on_empty_stack_is_noop() {
        let mut mgr = UndoManager::new();
        assert_eq!(mgr.perform_undo(|_| Ok(())).unwrap(), None);
    }

    #[test]
    fn transform_rebases_stacked_entries() {
        let mut mgr = UndoManager::new();
        mgr.add(op(5, "local"), false).unwrap();
        let remote = op(0, "R");
        mgr.transform(&remote).unwrap();
        // The stacked entry's retain-before-insert should have shifted by len("R") == 1.
        let entry = mgr.undo_stack.last().unwrap();
        assert_eq!(entry.operation.base_length(), remote.operation.target_length());
    }

    #[test]
    fn dispose_clears_and_rejects_further_use() {
        let mut mgr = UndoManager::new();
        mgr.add(op(0, "a"), false).unwrap();
        mgr.dispose();
        assert!(!mgr.can_undo());
        assert_eq!(mgr.add(op(0, "b"), false), Err(Error::Disposed));
    }
}
