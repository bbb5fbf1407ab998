//! Session settings

use serde::{Deserialize, Serialize};

use crate::session::DEFAULT_RING_CAPACITY;

/// Settings for the interactive `session` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Prefix that turns a typed line into a question for the model
    #[serde(default = "default_trigger")]
    pub trigger: String,

    /// How many recent commands to include as context
    #[serde(default = "default_context_events")]
    pub context_events: usize,

    /// Size of the raw output fallback buffer, in KiB
    #[serde(default = "default_ring_buffer_kb")]
    pub ring_buffer_kb: usize,
}

fn default_trigger() -> String {
    "??".to_string()
}

fn default_context_events() -> usize {
    5
}

fn default_ring_buffer_kb() -> usize {
    DEFAULT_RING_CAPACITY / 1024
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            trigger: default_trigger(),
            context_events: default_context_events(),
            ring_buffer_kb: default_ring_buffer_kb(),
        }
    }
}

impl SessionSettings {
    pub fn ring_capacity(&self) -> usize {
        self.ring_buffer_kb.saturating_mul(1024)
    }
}
