//! A minimal named-event dispatcher (§9 design note: "no need for a framework here").
//!
//! [`EditorClient`](crate::editor_client::EditorClient) uses this to notify callers of `Undo`,
//! `Redo`, `Error` and `Synced` without requiring them to implement a large adapter trait just to
//! observe state changes.

use crate::error::Error;
use std::collections::HashMap;

/// The event names this emitter ever dispatches under (§4.8).
const KNOWN_NAMES: [&str; 4] = ["undo", "redo", "synced", "error"];

/// An event payload (§4.8: "Events emitted: `Undo(opString)`, `Redo(opString)`,
/// `Error(err, op, state)`, `Synced(bool)`").
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An undo was performed; carries the JSON-encoded operation that was applied.
    Undo(String),
    /// A redo was performed; carries the JSON-encoded operation that was applied.
    Redo(String),
    /// The client's synchronization state changed; `true` once fully `Synchronized`.
    Synced(bool),
    /// Something failed. `op` is the JSON-encoded operation involved, if any; `state` names the
    /// client state at the time of failure.
    Error {
        message: String,
        op: Option<String>,
        state: &'static str,
    },
}

impl Event {
    #[must_use]
    fn name(&self) -> &'static str {
        match self {
            Self::Undo(_) => "undo",
            Self::Redo(_) => "redo",
            Self::Synced(_) => "synced",
            Self::Error { .. } => "error",
        }
    }
}

type Listener = Box<dyn FnMut(&Event) + Send>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: HashMap<&'static str, Vec<Listener>>,
}

impl EventEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns [`Error::UnknownEvent`] if `name` isn't one of the names [`Event::name`] ever
    /// returns — the listener would otherwise sit registered and never fire.
    pub fn on(
        &mut self,
        name: &'static str,
        listener: impl FnMut(&Event) + Send + 'static,
    ) -> Result<(), Error> {
        if !KNOWN_NAMES.contains(&name) {
            return Err(Error::UnknownEvent(name.to_string()));
        }
        self.listeners.entry(name).or_default().push(Box::new(listener));
        Ok(())
    }

    pub fn off(&mut self, name: &str) {
        self.listeners.remove(name);
    }

    pub fn emit(&mut self, event: Event) {
        if let Some(listeners) = self.listeners.get_mut(event.name()) {
            for listener in listeners {
                listener(&event);
            }
        }
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("registered", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
