//! The Editor Client (§4.8, C8): wires the [`ClientState`] machine and [`UndoManager`] to two
//! adapter traits supplied by the embedding application, mirroring how a connection object wires
//! a file watcher and a network peer to the same two concerns without either adapter knowing
//! about the other.

use crate::client::ClientState;
use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::event_emitter::{Event, EventEmitter};
use crate::operation_meta::OperationMetadata;
use crate::text_operation::TextOperation;
use crate::undo_manager::UndoManager;
use crate::wrapped_operation::WrappedOperation;
use std::collections::HashMap;
use tracing::warn;

/// A collaborator identity, as used to key [`EditorClient`]'s remote-client map and reported to
/// the coordinator adapter. A thin newtype rather than a bare `String`, the way path-like
/// identifiers get wrapped elsewhere in this codebase.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, derive_more::Deref, derive_more::Display
)]
pub struct ClientId(String);

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A handle returned by [`EditorAdapter::set_other_cursor`]; dropping or calling
/// [`dispose`](Disposable::dispose) removes the rendered cursor.
pub trait Disposable {
    fn dispose(&mut self);
}

/// What the embedding application's text editor must provide (§6, "Editor adapter").
pub trait EditorAdapter {
    fn get_text(&self) -> String;
    fn set_text(&mut self, text: &str);
    fn get_cursor(&self) -> Option<Cursor>;
    fn set_cursor(&mut self, cursor: Cursor);
    fn set_other_cursor(
        &mut self,
        client_id: &ClientId,
        cursor: Cursor,
        color: &str,
        name: Option<&str>,
    ) -> Box<dyn Disposable>;
    /// Applies a remote (already-transformed) operation to the editor's buffer.
    ///
    /// # Errors
    ///
    /// Implementations return an error if the operation can't be applied to the current buffer
    /// content (e.g. it's gone out of sync).
    fn apply_operation(&mut self, op: &TextOperation) -> Result<(), Error>;
    /// Computes the inverse of `op` against the editor's current buffer. §6 lists this alongside
    /// `applyOperation` in the adapter contract, but this crate never calls it itself: the editor
    /// is expected to compute the inverse the same way when it emits `change(op, inverse)`, and
    /// `on_local_change` takes that inverse directly rather than asking the adapter to redo the
    /// work.
    ///
    /// # Errors
    ///
    /// Implementations return an error under the same conditions as `apply_operation`.
    fn invert_operation(&self, op: &TextOperation) -> Result<TextOperation, Error>;
}

/// What the embedding application's sync coordinator must provide (§6, "Database/coordinator
/// adapter").
pub trait DatabaseAdapter {
    /// # Errors
    ///
    /// Returns [`Error::DatabaseTransaction`] if the operation couldn't be persisted/forwarded.
    fn send_operation(&mut self, op: &WrappedOperation) -> Result<(), Error>;
    fn send_cursor(&mut self, cursor: Option<Cursor>);
    fn is_current_user(&self, id: &ClientId) -> bool;
    fn is_history_empty(&self) -> bool;
    fn set_user_id(&mut self, id: ClientId);
    fn set_user_color(&mut self, color: String);
    fn set_user_name(&mut self, name: Option<String>);
}

/// Tracked state for a collaborator other than the local user.
pub struct RemoteClient {
    pub color: Option<String>,
    pub name: Option<String>,
    cursor_handle: Option<Box<dyn Disposable>>,
}

impl RemoteClient {
    fn new() -> Self {
        Self {
            color: None,
            name: None,
            cursor_handle: None,
        }
    }
}

impl Drop for RemoteClient {
    fn drop(&mut self) {
        if let Some(mut handle) = self.cursor_handle.take() {
            handle.dispose();
        }
    }
}

/// Wires an [`EditorAdapter`] and a [`DatabaseAdapter`] to the [`ClientState`] machine and
/// [`UndoManager`] (§4.8). This is the crate's outermost public type.
pub struct EditorClient<E: EditorAdapter, D: DatabaseAdapter> {
    editor: E,
    db: D,
    config: Config,
    state: ClientState,
    undo_manager: UndoManager,
    events: EventEmitter,
    clients: HashMap<ClientId, RemoteClient>,
    cursor: Option<Cursor>,
    focused: bool,
    pending_cursor: bool,
    user_id: ClientId,
    user_color: String,
    user_name: Option<String>,
    disposed: bool,
}

impl<E: EditorAdapter, D: DatabaseAdapter> EditorClient<E, D> {
    /// Constructs a new client. If `default_text` is given and the coordinator reports an empty
    /// history, it's written to the editor immediately (so a brand-new document starts non-empty
    /// without needing a round trip to the server).
    pub fn new(
        mut editor: E,
        mut db: D,
        config: Config,
        user_id: impl Into<ClientId>,
        user_color: impl Into<String>,
        user_name: Option<String>,
        default_text: Option<String>,
    ) -> Self {
        let user_id = user_id.into();
        let user_color = user_color.into();
        db.set_user_id(user_id.clone());
        db.set_user_color(user_color.clone());
        db.set_user_name(user_name.clone());

        if let Some(text) = default_text {
            if db.is_history_empty() {
                editor.set_text(&text);
            }
        }

        Self {
            editor,
            db,
            config,
            state: ClientState::synchronized(),
            undo_manager: UndoManager::new(),
            events: EventEmitter::new(),
            clients: HashMap::new(),
            cursor: None,
            focused: false,
            pending_cursor: false,
            user_id,
            user_color,
            user_name,
            disposed: false,
        }
    }

    // -- public facade (§6) --------------------------------------------------

    /// # Errors
    ///
    /// Returns [`Error::UnknownEvent`] if `name` isn't one of `"undo"`, `"redo"`, `"synced"`, or
    /// `"error"`.
    pub fn on(
        &mut self,
        name: &'static str,
        listener: impl FnMut(&Event) + Send + 'static,
    ) -> Result<(), Error> {
        self.events.on(name, listener)
    }

    pub fn off(&mut self, name: &str) {
        self.events.off(name);
    }

    #[must_use]
    pub fn get_text(&self) -> String {
        self.editor.get_text()
    }

    pub fn set_text(&mut self, text: &str) {
        self.editor.set_text(text);
    }

    #[must_use]
    pub fn is_history_empty(&self) -> bool {
        self.db.is_history_empty()
    }

    pub fn set_user_id(&mut self, id: impl Into<ClientId>) {
        self.user_id = id.into();
        self.db.set_user_id(self.user_id.clone());
    }

    pub fn set_user_color(&mut self, color: impl Into<String>) {
        self.user_color = color.into();
        self.db.set_user_color(self.user_color.clone());
    }

    pub fn set_user_name(&mut self, name: Option<String>) {
        self.user_name = name.clone();
        self.db.set_user_name(name);
    }

    pub fn clear_undo_redo_stack(&mut self) {
        self.undo_manager.clear();
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.undo_manager.dispose();
        self.clients.clear();
        self.disposed = true;
    }

    // -- editor-adapter callbacks (§4.8) --------------------------------------

    /// `change(op, inverse)`: a local edit happened.
    ///
    /// # Errors
    ///
    /// Propagates composition/transform errors, or [`Error::Disposed`].
    pub fn on_local_change(&mut self, op: TextOperation, inverse: TextOperation) -> Result<(), Error> {
        self.ensure_not_disposed()?;

        let cursor_before = self.cursor;
        let cursor_after = self.editor.get_cursor();
        self.cursor = cursor_after;
        let meta = OperationMetadata::new(cursor_before, cursor_after);

        let wrapped_inverse = WrappedOperation::new(inverse, meta.invert());
        let compose = self
            .undo_manager
            .last()
            .is_some_and(|top| top.should_be_composed_with_inverted(&wrapped_inverse));
        self.undo_manager.add(wrapped_inverse, compose)?;

        let wrapped_op = WrappedOperation::new(op, meta);
        let (new_state, to_send) =
            std::mem::replace(&mut self.state, ClientState::Synchronized).apply_client(wrapped_op)?;
        self.state = new_state;
        if let Some(op_to_send) = to_send {
            self.db.send_operation(&op_to_send)?;
        }
        Ok(())
    }

    /// `cursorActivity`: the local cursor moved without a text edit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disposed`] if called after [`dispose`](Self::dispose).
    pub fn on_cursor_activity(&mut self) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        self.cursor = self.editor.get_cursor();
        self.send_cursor();
        Ok(())
    }

    /// `blur`: the editor lost focus; stop broadcasting our cursor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disposed`] if called after [`dispose`](Self::dispose).
    pub fn on_blur(&mut self) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        self.focused = false;
        self.cursor = None;
        self.db.send_cursor(None);
        Ok(())
    }

    /// `focus`: treated as cursor activity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disposed`] if called after [`dispose`](Self::dispose).
    pub fn on_focus(&mut self) -> Result<(), Error> {
        self.focused = true;
        self.on_cursor_activity()
    }

    pub fn on_editor_error(&mut self, message: impl Into<String>) {
        self.events.emit(Event::Error {
            message: message.into(),
            op: None,
            state: self.state_name(),
        });
    }

    // -- db-adapter callbacks (§4.8) ------------------------------------------

    /// `ack`: the server confirmed the outstanding operation.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::NoPendingOp`] or a compose error.
    pub fn on_server_ack(&mut self) -> Result<(), Error> {
        let (new_state, to_send) =
            std::mem::replace(&mut self.state, ClientState::Synchronized).server_ack()?;
        self.state = new_state;
        if let Some(op_to_send) = to_send {
            self.db.send_operation(&op_to_send)?;
        }
        self.cursor = self.editor.get_cursor();
        self.db.send_cursor(self.cursor);
        self.events.emit(Event::Synced(self.state.is_synchronized()));
        Ok(())
    }

    /// `retry`: the server rejected the outstanding operation.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::NoPendingOp`] or a compose error.
    pub fn on_server_retry(&mut self) -> Result<(), Error> {
        let (new_state, op) =
            std::mem::replace(&mut self.state, ClientState::Synchronized).server_retry()?;
        self.state = new_state;
        self.db.send_operation(&op)
    }

    /// `operation(op)`: a remote operation arrived from the coordinator.
    ///
    /// # Errors
    ///
    /// Propagates transform errors or [`Error::Disposed`].
    pub fn on_remote_operation(&mut self, op: WrappedOperation) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        let (new_state, op_prime) =
            std::mem::replace(&mut self.state, ClientState::Synchronized).apply_server(op)?;
        self.state = new_state;
        self.apply_operation(&op_prime)
    }

    /// `cursor(clientId, cursor, color?, name?)`: a remote collaborator's cursor moved.
    pub fn on_remote_cursor(
        &mut self,
        client_id: impl Into<ClientId>,
        cursor: Option<Cursor>,
        color: Option<String>,
        name: Option<String>,
    ) {
        let client_id: ClientId = client_id.into();
        if self.db.is_current_user(&client_id) || !self.state.is_synchronized() {
            return;
        }
        let remote = self
            .clients
            .entry(client_id.clone())
            .or_insert_with(RemoteClient::new);
        if let Some(color) = color {
            remote.color = Some(color);
        }
        if let Some(name) = name {
            remote.name = Some(name);
        }
        let color = remote.color.clone().unwrap_or_default();
        let name = remote.name.clone();
        match cursor {
            Some(cursor) => {
                let handle = self.editor.set_other_cursor(
                    &client_id,
                    cursor,
                    &color,
                    name.as_deref(),
                );
                if let Some(remote) = self.clients.get_mut(&client_id) {
                    if let Some(mut old) = remote.cursor_handle.replace(handle) {
                        old.dispose();
                    }
                }
            }
            None => {
                if let Some(remote) = self.clients.get_mut(&client_id) {
                    if let Some(mut old) = remote.cursor_handle.take() {
                        old.dispose();
                    }
                }
            }
        }
    }

    // -- applying a remotely-transformed operation to the editor (§4.8) -------

    fn apply_operation(&mut self, op_prime: &WrappedOperation) -> Result<(), Error> {
        self.editor.apply_operation(&op_prime.operation)?;
        if let Some(cursor) = self.cursor {
            self.cursor = Some(cursor.transform(&op_prime.operation));
        }
        let entries_rebased = self.undo_manager.len();
        self.undo_manager.transform(op_prime)?;
        warn_if_stack_far_behind(entries_rebased, self.config.editor_queue_warn_threshold);
        self.events.emit(Event::Synced(self.state.is_synchronized()));
        Ok(())
    }

    // -- undo/redo (§4.7, driven through this client so the result round-trips
    //    through `on_local_change`'s usual bookkeeping) -----------------------

    /// Pops the undo stack and applies it to the editor. Mirrors `performUndo(cb)`: the undo
    /// manager itself handles the mode bookkeeping, `cb` just has to apply the popped operation.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Disposed`] or an apply/compose error.
    pub fn perform_undo(&mut self) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        let editor = &mut self.editor;
        let applied = self.undo_manager.perform_undo(|wrapped| {
            editor.apply_operation(&wrapped.operation)?;
            if let Some(cursor) = wrapped.meta.cursor_after {
                editor.set_cursor(cursor);
            }
            Ok(())
        })?;
        if let Some(wrapped) = applied {
            self.events
                .emit(Event::Undo(wrapped.operation.to_json().to_string()));
        }
        Ok(())
    }

    /// Symmetric with [`perform_undo`](Self::perform_undo).
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Disposed`] or an apply/compose error.
    pub fn perform_redo(&mut self) -> Result<(), Error> {
        self.ensure_not_disposed()?;
        let editor = &mut self.editor;
        let applied = self.undo_manager.perform_redo(|wrapped| {
            editor.apply_operation(&wrapped.operation)?;
            if let Some(cursor) = wrapped.meta.cursor_after {
                editor.set_cursor(cursor);
            }
            Ok(())
        })?;
        if let Some(wrapped) = applied {
            self.events
                .emit(Event::Redo(wrapped.operation.to_json().to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_manager.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo_manager.can_redo()
    }

    // -- cursor broadcast debounce (§4.8, §14) --------------------------------

    fn send_cursor(&mut self) {
        if matches!(self.state, ClientState::AwaitingWithBuffer { .. }) {
            self.pending_cursor = true;
            return;
        }
        self.pending_cursor = false;
        self.db.send_cursor(self.cursor);
    }

    /// Re-attempts a cursor broadcast that was deferred because the client was
    /// `AwaitingWithBuffer`. The embedding application calls this from its own timer after
    /// [`Config::cursor_retry_delay`] — this crate has no event loop of its own (§5).
    pub fn retry_pending_cursor(&mut self) {
        if self.pending_cursor {
            self.send_cursor();
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn ensure_not_disposed(&self) -> Result<(), Error> {
        if self.disposed {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            ClientState::Synchronized => "Synchronized",
            ClientState::AwaitingConfirm { .. } => "AwaitingConfirm",
            ClientState::AwaitingWithBuffer { .. } => "AwaitingWithBuffer",
        }
    }
}

/// Logged by [`UndoManager::transform`] callers when a remote op rebases a large fraction of the
/// history at once, mirroring the daemon's "editor is N operations behind" warning.
pub(crate) fn warn_if_stack_far_behind(entries_rebased: usize, threshold: usize) {
    if entries_rebased > threshold {
        warn!(entries_rebased, threshold, "undo/redo stack rebased against a large remote catch-up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_operation::factories;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct NoopDisposable;
    impl Disposable for NoopDisposable {
        fn dispose(&mut self) {}
    }

    #[derive(Default)]
    struct FakeEditor {
        text: Rc<RefCell<String>>,
        cursor: Option<Cursor>,
    }

    impl EditorAdapter for FakeEditor {
        fn get_text(&self) -> String {
            self.text.borrow().clone()
        }
        fn set_text(&mut self, text: &str) {
            *self.text.borrow_mut() = text.to_string();
        }
        fn get_cursor(&self) -> Option<Cursor> {
            self.cursor
        }
        fn set_cursor(&mut self, cursor: Cursor) {
            self.cursor = Some(cursor);
        }
        fn set_other_cursor(
            &mut self,
            _client_id: &ClientId,
            _cursor: Cursor,
            _color: &str,
            _name: Option<&str>,
        ) -> Box<dyn Disposable> {
            Box::new(NoopDisposable)
        }
        fn apply_operation(&mut self, op: &TextOperation) -> Result<(), Error> {
            let applied = op.apply(&self.text.borrow())?;
            *self.text.borrow_mut() = applied;
            Ok(())
        }
        fn invert_operation(&self, op: &TextOperation) -> Result<TextOperation, Error> {
            op.invert(&self.text.borrow())
        }
    }

    #[derive(Default)]
    struct FakeDb {
        sent_ops: Vec<WrappedOperation>,
        history_empty: bool,
        user_id: ClientId,
    }

    impl DatabaseAdapter for FakeDb {
        fn send_operation(&mut self, op: &WrappedOperation) -> Result<(), Error> {
            self.sent_ops.push(op.clone());
            Ok(())
        }
        fn send_cursor(&mut self, _cursor: Option<Cursor>) {}
        fn is_current_user(&self, id: &ClientId) -> bool {
            &self.user_id == id
        }
        fn is_history_empty(&self) -> bool {
            self.history_empty
        }
        fn set_user_id(&mut self, id: ClientId) {
            self.user_id = id;
        }
        fn set_user_color(&mut self, _color: String) {}
        fn set_user_name(&mut self, _name: Option<String>) {}
    }

    fn client() -> EditorClient<FakeEditor, FakeDb> {
        EditorClient::new(
            FakeEditor::default(),
            FakeDb::default(),
            Config::default(),
            "me",
            "#fff",
            None,
            None,
        )
    }

    #[test]
    fn default_text_seeds_empty_document() {
        let client = EditorClient::new(
            FakeEditor::default(),
            FakeDb {
                history_empty: true,
                ..Default::default()
            },
            Config::default(),
            "me",
            "#fff",
            None,
            Some("hello".to_string()),
        );
        assert_eq!(client.get_text(), "hello");
    }

    #[test]
    fn default_text_is_skipped_when_history_nonempty() {
        let client = EditorClient::new(
            FakeEditor::default(),
            FakeDb {
                history_empty: false,
                ..Default::default()
            },
            Config::default(),
            "me",
            "#fff",
            None,
            Some("hello".to_string()),
        );
        assert_eq!(client.get_text(), "");
    }

    #[test]
    fn local_change_sends_operation_when_synchronized() {
        let mut client = client();
        client.set_text("ab");
        let op = factories::insert(2, "c");
        let inverse = factories::delete(2, 1);
        client.on_local_change(op, inverse).unwrap();
        assert_eq!(client.db.sent_ops.len(), 1);
        assert!(matches!(client.state, ClientState::AwaitingConfirm { .. }));
    }

    #[test]
    fn local_change_pushes_inverse_to_undo_stack() {
        let mut client = client();
        client.set_text("ab");
        client
            .on_local_change(factories::insert(2, "c"), factories::delete(2, 1))
            .unwrap();
        assert!(client.can_undo());
    }

    #[test]
    fn server_ack_sends_buffered_operation() {
        let mut client = client();
        client.set_text("a");
        client
            .on_local_change(factories::insert(1, "b"), factories::delete(1, 1))
            .unwrap();
        client
            .on_local_change(factories::insert(2, "c"), factories::delete(2, 1))
            .unwrap();
        client.on_server_ack().unwrap();
        assert_eq!(client.db.sent_ops.len(), 2);
        assert!(matches!(client.state, ClientState::AwaitingConfirm { .. }));
    }

    #[test]
    fn remote_operation_applies_to_editor_and_emits_synced() {
        let mut client = client();
        client.set_text("ab");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        client
            .on("synced", move |event| {
                seen_clone.borrow_mut().push(event.clone());
            })
            .unwrap();
        client
            .on_remote_operation(WrappedOperation::without_meta(factories::insert(2, "c")))
            .unwrap();
        assert_eq!(client.get_text(), "abc");
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn on_rejects_unknown_event_name() {
        let mut client = client();
        assert_eq!(
            client.on("tpyo", |_| {}),
            Err(Error::UnknownEvent("tpyo".to_string()))
        );
    }

    #[test]
    fn dispose_is_idempotent_and_blocks_further_local_changes() {
        let mut client = client();
        client.dispose();
        client.dispose();
        let result = client.on_local_change(factories::insert(0, "x"), factories::delete(0, 1));
        assert!(matches!(result, Err(Error::Disposed)));
    }

    #[test]
    fn perform_undo_restores_previous_text() {
        let mut client = client();
        client.set_text("ab");
        client
            .on_local_change(factories::insert(2, "c"), factories::delete(2, 1))
            .unwrap();
        assert_eq!(client.get_text(), "abc");
        client.perform_undo().unwrap();
        assert_eq!(client.get_text(), "ab");
        assert!(client.can_redo());
    }

    #[test]
    fn own_cursor_updates_are_ignored() {
        let mut client = client();
        client.db.user_id = "me".into();
        client.on_remote_cursor(
            "me".to_string(),
            Some(Cursor::collapsed(1)),
            None,
            None,
        );
        assert!(client.clients.is_empty());
    }

    #[test]
    fn remote_cursor_tracked_when_synchronized() {
        let mut client = client();
        client.on_remote_cursor(
            "them".to_string(),
            Some(Cursor::collapsed(1)),
            Some("#abc".to_string()),
            Some("Alice".to_string()),
        );
        assert!(client.clients.contains_key(&ClientId::from("them")));
    }

    // Named integration scenarios from §8 (S5, S6; S1-S4 live in `client.rs` against
    // `ClientState`, the level they're actually about).

    #[test]
    fn s5_undo_after_remote_edit() {
        let mut client = client();
        client
            .on_local_change(factories::insert(0, "hello"), factories::delete(0, 5))
            .unwrap();
        assert_eq!(client.get_text(), "hello");

        client
            .on_remote_operation(WrappedOperation::without_meta(factories::insert(0, "Z")))
            .unwrap();
        assert_eq!(client.get_text(), "Zhello");

        client.perform_undo().unwrap();
        assert_eq!(client.get_text(), "Z");
    }

    #[test]
    fn s6_coalescing() {
        let mut client = client();
        client
            .on_local_change(factories::insert(0, "a"), factories::delete(0, 1))
            .unwrap();
        client
            .on_local_change(factories::insert(1, "b"), factories::delete(1, 1))
            .unwrap();
        client
            .on_local_change(factories::insert(2, "c"), factories::delete(2, 1))
            .unwrap();
        assert_eq!(client.get_text(), "abc");
        assert_eq!(client.undo_manager.len(), 1);

        client.perform_undo().unwrap();
        assert_eq!(client.get_text(), "");
    }
}
