// SPDX-FileCopyrightText: 2025 blinry <mail@blinry.org>
// SPDX-FileCopyrightText: 2025 zormit <nt4u@kpvn.de>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The few tunables §5 and §4.8 name explicitly (§12).
//!
//! Unlike a peer/join-code config loaded from an INI file on disk, this crate is a library with
//! no working directory of its own to read a config file from, so `Config` is plain in-memory
//! data an embedding application constructs and passes into
//! [`EditorClient::new`](crate::editor_client::EditorClient::new).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// The `sendCursor` backoff while the client is `AwaitingWithBuffer` (§4.8): a cursor update
    /// racing ahead of the operation it belongs to would confuse collaborators, so it's held and
    /// retried after this delay instead of being sent immediately.
    pub cursor_retry_delay: Duration,

    /// How long an editor adapter should keep showing a remote collaborator's cursor after it
    /// stops moving before hiding the tooltip. Owned here so one place documents the default;
    /// the actual timer lives in the editor adapter, which is the only side that can draw it.
    pub remote_cursor_ttl: Duration,

    /// Mirrors the daemon's "editor is N operations behind" warning threshold from `ot.rs`: the
    /// undo manager and client log a `warn!` when a single transform pass rebases more entries
    /// than this.
    pub editor_queue_warn_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cursor_retry_delay: Duration::from_millis(3),
            remote_cursor_ttl: Duration::from_secs(1),
            editor_queue_warn_threshold: 50,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cursor_retry_delay(mut self, delay: Duration) -> Self {
        self.cursor_retry_delay = delay;
        self
    }

    #[must_use]
    pub fn with_remote_cursor_ttl(mut self, ttl: Duration) -> Self {
        self.remote_cursor_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_editor_queue_warn_threshold(mut self, threshold: usize) -> Self {
        self.editor_queue_warn_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let config = Config::default();
        assert_eq!(config.cursor_retry_delay, Duration::from_millis(3));
        assert_eq!(config.remote_cursor_ttl, Duration::from_secs(1));
        assert_eq!(config.editor_queue_warn_threshold, 50);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = Config::new().with_editor_queue_warn_threshold(10);
        assert_eq!(config.editor_queue_warn_threshold, 10);
        assert_eq!(config.cursor_retry_delay, Duration::from_millis(3));
    }
}
