//! Error taxonomy (§7).
//!
//! All fallible operations in this crate return `Result<T, Error>`. The
//! variants mirror the kinds `spec.md` enumerates rather than the exact
//! text of any one message; adapters (editor/coordinator) are expected to
//! match on the variant, not parse the `Display` string.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    /// A builder call received a malformed argument (negative/zero length where one is required,
    /// a non-UTF-8 payload, etc). Raised synchronously from [`TextOp`](crate::text_op::TextOp)
    /// and [`TextOperation`](crate::text_operation::TextOperation) constructors.
    #[error("validation failed: {0}")]
    Validation(String),

    /// `apply`/`invert` was called with a document whose length doesn't match `base_length`.
    #[error("operation expects a document of length {expected}, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// `apply`/`invert` tried to retain or delete past the end of the document.
    #[error("operation reads past the end of the document (needed {needed}, had {available})")]
    DocumentTooShort { needed: u64, available: u64 },

    /// Two operations passed to `compose` don't chain: `self.target_length != other.base_length`.
    #[error("cannot compose operations: target length {target_length} != base length {base_length}")]
    CannotCompose { target_length: u64, base_length: u64 },

    /// Two operations passed to `transform` don't share a base document:
    /// `self.base_length != other.base_length`.
    #[error("cannot transform operations: base lengths differ ({lhs} != {rhs})")]
    CannotTransform { lhs: u64, rhs: u64 },

    /// `serverAck`/`serverRetry` was called while the client was `Synchronized`.
    #[error("no pending operation to acknowledge or retry")]
    NoPendingOp,

    /// A listener was registered for an event name the emitter doesn't support.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// The coordinator adapter signalled it failed to persist an operation.
    #[error("database transaction failed: {0}")]
    DatabaseTransaction(String),

    /// A malformed operation was received from the coordinator.
    #[error("invalid operation received: {0}")]
    InvalidOperationReceive(String),

    /// A method was called after `dispose`.
    #[error("method called on a disposed object")]
    Disposed,
}
