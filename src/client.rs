//! The client-side synchronization state machine (§4.6): tracks exactly what has been sent to
//! the server and not yet acknowledged, and what has been typed locally since.

use crate::error::Error;
use crate::wrapped_operation::WrappedOperation;
use tracing::debug;

/// Where a client stands relative to the server's revision.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum ClientState {
    /// Nothing outstanding; the client's document matches the server's.
    Synchronized,
    /// `outstanding` was sent to the server and hasn't been acknowledged yet.
    AwaitingConfirm { outstanding: WrappedOperation },
    /// `outstanding` is unacknowledged, and `buffer` has been typed locally since then (composed
    /// together, not yet sent).
    AwaitingWithBuffer {
        outstanding: WrappedOperation,
        buffer: WrappedOperation,
    },
}

impl ClientState {
    #[must_use]
    pub fn synchronized() -> Self {
        Self::Synchronized
    }

    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized)
    }

    /// A local edit arrived. Returns the new state and, when the state machine wants an
    /// operation sent to the server right now (transitioning out of `Synchronized`), that
    /// operation.
    ///
    /// # Errors
    ///
    /// Propagates [`Error`] from the underlying `compose`.
    pub fn apply_client(
        self,
        op: WrappedOperation,
    ) -> Result<(Self, Option<WrappedOperation>), Error> {
        match self {
            Self::Synchronized => {
                debug!("client: Synchronized -> AwaitingConfirm");
                Ok((
                    Self::AwaitingConfirm {
                        outstanding: op.clone(),
                    },
                    Some(op),
                ))
            }
            Self::AwaitingConfirm { outstanding } => {
                debug!("client: AwaitingConfirm -> AwaitingWithBuffer");
                Ok((
                    Self::AwaitingWithBuffer {
                        outstanding,
                        buffer: op,
                    },
                    None,
                ))
            }
            Self::AwaitingWithBuffer {
                outstanding,
                buffer,
            } => {
                debug!("client: AwaitingWithBuffer -> AwaitingWithBuffer (buffer composed)");
                let buffer = buffer.compose(&op)?;
                Ok((
                    Self::AwaitingWithBuffer {
                        outstanding,
                        buffer,
                    },
                    None,
                ))
            }
        }
    }

    /// An operation from the server (by another client) arrived. Returns the new state and the
    /// operation transformed so it can be applied locally.
    ///
    /// # Errors
    ///
    /// Propagates [`Error`] from the underlying `transform`.
    pub fn apply_server(
        self,
        op: WrappedOperation,
    ) -> Result<(Self, WrappedOperation), Error> {
        match self {
            Self::Synchronized => {
                debug!("client: Synchronized applying server op directly");
                Ok((Self::Synchronized, op))
            }
            Self::AwaitingConfirm { outstanding } => {
                let (outstanding_prime, op_prime) = outstanding.transform(&op)?;
                debug!("client: AwaitingConfirm transforming against server op");
                Ok((
                    Self::AwaitingConfirm {
                        outstanding: outstanding_prime,
                    },
                    op_prime,
                ))
            }
            Self::AwaitingWithBuffer {
                outstanding,
                buffer,
            } => {
                let (outstanding_prime, op_prime) = outstanding.transform(&op)?;
                let (buffer_prime, op_double_prime) = buffer.transform(&op_prime)?;
                debug!("client: AwaitingWithBuffer transforming against server op");
                Ok((
                    Self::AwaitingWithBuffer {
                        outstanding: outstanding_prime,
                        buffer: buffer_prime,
                    },
                    op_double_prime,
                ))
            }
        }
    }

    /// The server acknowledged the outstanding operation. Returns the new state and, if a
    /// buffered operation should now be sent, that operation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPendingOp`] if called while `Synchronized`.
    pub fn server_ack(self) -> Result<(Self, Option<WrappedOperation>), Error> {
        match self {
            Self::Synchronized => Err(Error::NoPendingOp),
            Self::AwaitingConfirm { .. } => {
                debug!("client: server acked, AwaitingConfirm -> Synchronized");
                Ok((Self::Synchronized, None))
            }
            Self::AwaitingWithBuffer { buffer, .. } => {
                debug!("client: server acked, AwaitingWithBuffer -> AwaitingConfirm (buffer sent)");
                Ok((
                    Self::AwaitingConfirm {
                        outstanding: buffer.clone(),
                    },
                    Some(buffer),
                ))
            }
        }
    }

    /// The server rejected the outstanding operation (revision conflict). Per §4.6's transition
    /// table, a buffered operation is folded in so the resend reflects *all* local work, not just
    /// what was originally sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPendingOp`] if called while `Synchronized`.
    pub fn server_retry(self) -> Result<(Self, WrappedOperation), Error> {
        match self {
            Self::Synchronized => Err(Error::NoPendingOp),
            Self::AwaitingConfirm { outstanding } => {
                debug!("client: retrying outstanding operation");
                Ok((
                    Self::AwaitingConfirm {
                        outstanding: outstanding.clone(),
                    },
                    outstanding,
                ))
            }
            Self::AwaitingWithBuffer {
                outstanding,
                buffer,
            } => {
                debug!("client: retrying with buffer folded into outstanding");
                let merged = outstanding.compose(&buffer)?;
                Ok((
                    Self::AwaitingConfirm {
                        outstanding: merged.clone(),
                    },
                    merged,
                ))
            }
        }
    }

    #[must_use]
    pub fn outstanding(&self) -> Option<&WrappedOperation> {
        match self {
            Self::Synchronized => None,
            Self::AwaitingConfirm { outstanding } | Self::AwaitingWithBuffer { outstanding, .. } => {
                Some(outstanding)
            }
        }
    }
}
