//! Listener configuration schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Session listener configuration.
///
/// Consumed opaquely by the listener; the embedding host resolves the
/// connection and queue names (including any `%name%` indirection, see
/// [`resolve_indirect`]) before constructing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Named broker connection this listener consumes from.
    pub connection: String,
    /// Queue to accept sessions from.
    pub queue: String,
    /// Maximum number of sessions processed concurrently. Positive; the
    /// listener treats zero as one.
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,
    /// Seconds to wait for in-flight sessions to finish on shutdown.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
}

impl ListenerConfig {
    /// Create a configuration with default concurrency and drain settings.
    pub fn new(connection: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            queue: queue.into(),
            max_concurrent_sessions: default_max_concurrent_sessions(),
            drain_timeout_seconds: default_drain_timeout(),
        }
    }

    /// Set the maximum number of concurrently processed sessions.
    pub fn with_max_concurrent_sessions(mut self, max: usize) -> Self {
        self.max_concurrent_sessions = max;
        self
    }

    /// Set the shutdown drain timeout in seconds.
    pub fn with_drain_timeout_seconds(mut self, seconds: u64) -> Self {
        self.drain_timeout_seconds = seconds;
        self
    }
}

fn default_max_concurrent_sessions() -> usize {
    5
}

fn default_drain_timeout() -> u64 {
    30
}

/// Resolve an indirect `%name%` setting reference against host settings.
///
/// A value wrapped in percent signs names a host setting; anything else is
/// taken literally. Returns `None` only when a placeholder references a
/// setting the host does not define.
pub fn resolve_indirect<'a>(
    raw: &'a str,
    settings: &'a HashMap<String, String>,
) -> Option<&'a str> {
    match raw.strip_prefix('%').and_then(|rest| rest.strip_suffix('%')) {
        Some(name) if !name.is_empty() => settings.get(name).map(String::as_str),
        _ => Some(raw),
    }
}
