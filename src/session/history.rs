//! Structured history of completed shell commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// One fully observed shell interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Command line as the user entered it, trimmed
    pub command: String,

    /// Output of the command with escape sequences removed
    pub output: String,

    /// Exit status reported by the shell
    pub exit_code: i32,

    /// When the command finished
    pub timestamp: DateTime<Utc>,
}

impl CommandEvent {
    pub fn new(command: impl Into<String>, output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            exit_code,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct HistoryState {
    events: Vec<CommandEvent>,
    current_input: Vec<u8>,
    current_output: Vec<u8>,
}

/// Ordered, append-only list of [`CommandEvent`]s plus the buffers for the
/// command currently in flight.
///
/// The parser on the output relay thread is the only writer; the input
/// interceptor reads from another thread, so everything sits behind one lock.
#[derive(Debug, Default)]
pub struct SessionHistory {
    state: Mutex<HistoryState>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a completed command.
    pub fn add_event(&self, event: CommandEvent) {
        self.lock().events.push(event);
    }

    /// The `n` most recent events, oldest first.
    pub fn last_events(&self, n: usize) -> Vec<CommandEvent> {
        let state = self.lock();
        let start = state.events.len().saturating_sub(n);
        state.events[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    pub(crate) fn append_input(&self, bytes: &[u8]) {
        self.lock().current_input.extend_from_slice(bytes);
    }

    pub(crate) fn append_output(&self, bytes: &[u8]) {
        self.lock().current_output.extend_from_slice(bytes);
    }

    pub(crate) fn clear_input(&self) {
        self.lock().current_input.clear();
    }

    pub(crate) fn clear_output(&self) {
        self.lock().current_output.clear();
    }

    /// Take both in-flight buffers, leaving them empty.
    pub(crate) fn take_current(&self) -> (Vec<u8>, Vec<u8>) {
        let mut state = self.lock();
        (
            std::mem::take(&mut state.current_input),
            std::mem::take(&mut state.current_output),
        )
    }

    #[cfg(test)]
    pub(crate) fn current_input(&self) -> Vec<u8> {
        self.lock().current_input.clone()
    }

    #[cfg(test)]
    pub(crate) fn current_output(&self) -> Vec<u8> {
        self.lock().current_output.clone()
    }
}
