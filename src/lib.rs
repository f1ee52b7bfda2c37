// SPDX-FileCopyrightText: 2025 blinry <mail@blinry.org>
// SPDX-FileCopyrightText: 2025 zormit <nt4u@kpvn.de>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Operational-transform core for real-time collaborative plain-text editing: the algebra
//! (`TextOp`/`TextOperation`), cursor tracking, the client synchronization state machine, an
//! undo manager, and the `EditorClient` that wires them to an embedding application's editor and
//! sync coordinator.

pub mod attrs;
pub mod client;
pub mod config;
pub mod cursor;
pub mod editor_client;
pub mod error;
pub mod event_emitter;
pub mod logging;
pub mod operation_meta;
pub mod text_op;
pub mod text_operation;
pub mod undo_manager;
pub mod wrapped_operation;

pub use attrs::Attrs;
pub use client::ClientState;
pub use config::Config;
pub use cursor::Cursor;
pub use editor_client::{ClientId, DatabaseAdapter, Disposable, EditorAdapter, EditorClient};
pub use error::Error;
pub use event_emitter::Event;
pub use operation_meta::OperationMetadata;
pub use text_op::TextOp;
pub use text_operation::TextOperation;
pub use undo_manager::UndoManager;
pub use wrapped_operation::WrappedOperation;
