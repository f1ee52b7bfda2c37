// SPDX-FileCopyrightText: 2024 blinry
// SPDX-FileCopyrightText: 2024 zormit
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Optional global-subscriber setup for applications embedding this crate (§10).
//!
//! The crate itself only ever calls `tracing::{debug,warn,trace}!` — it never installs a
//! subscriber on its own, since a library doing that would fight with whatever the embedding
//! application already set up. This module is a convenience `install` helper for binaries that
//! have nothing more specific in mind, built on the same `FmtSubscriber` setup used elsewhere (dropping
//! its `time`-crate timer formatting, which has no equivalent need here).

use tracing_subscriber::FmtSubscriber;

/// Installs a process-wide `tracing` subscriber printing to stderr.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn install(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default log subscriber failed");
}
