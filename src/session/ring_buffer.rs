//! Fixed-capacity circular byte store.
//!
//! Holds the raw tail of the shell's output so there is always some context
//! to hand to the model, even when the shell emits no OSC 133 markers.

use std::fmt;
use std::sync::RwLock;

/// Default capacity used by sessions (64 KiB).
pub const DEFAULT_RING_CAPACITY: usize = 64 * 1024;

#[derive(Debug)]
struct RingState {
    data: Vec<u8>,
    pos: usize,
    full: bool,
}

/// Circular buffer that keeps the last `capacity` bytes written to it.
///
/// Writes and reads are serialized internally, so a single buffer can be
/// shared between the output relay and the input interceptor through an `Arc`.
#[derive(Debug)]
pub struct RingBuffer {
    capacity: usize,
    state: RwLock<RingState>,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(RingState {
                data: vec![0; capacity],
                pos: 0,
                full: false,
            }),
        }
    }

    /// Append bytes, overwriting the oldest content once the buffer is full.
    ///
    /// Always reports the whole input as written.
    pub fn write(&self, bytes: &[u8]) -> usize {
        let n = bytes.len();
        if n == 0 {
            return 0;
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let size = self.capacity;

        if n > size {
            // Only the trailing `size` bytes of an oversized write survive
            let tail = &bytes[n - size..];
            state.data.copy_from_slice(tail);
            state.pos = 0;
            state.full = true;
            return n;
        }

        let pos = state.pos;
        let first = (size - pos).min(n);
        state.data[pos..pos + first].copy_from_slice(&bytes[..first]);
        let rest = n - first;
        if rest > 0 {
            state.data[..rest].copy_from_slice(&bytes[first..]);
        }

        if pos + n >= size {
            state.full = true;
        }
        state.pos = (pos + n) % size;
        n
    }

    /// Raw bytes currently held, oldest first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        if !state.full {
            return state.data[..state.pos].to_vec();
        }

        let mut out = Vec::with_capacity(self.capacity);
        out.extend_from_slice(&state.data[state.pos..]);
        out.extend_from_slice(&state.data[..state.pos]);
        out
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        if state.full { self.capacity } else { state.pos }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl fmt::Display for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}
