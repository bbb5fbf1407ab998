//! Output relay: shell output -> terminal + ring buffer + parser.

use std::io::{self, Read, Write};
use std::sync::Arc;

use super::parser::SessionParser;
use super::ring_buffer::RingBuffer;

const READ_CHUNK: usize = 4096;

/// Copies PTY output to the user's terminal while feeding the raw history
/// and the OSC 133 parser.
///
/// Each chunk reaches all three sinks before the next read, so they observe
/// bytes in the same order.
pub struct OutputRelay<W: Write> {
    terminal: W,
    raw_history: Arc<RingBuffer>,
    parser: SessionParser,
}

impl<W: Write> OutputRelay<W> {
    pub fn new(terminal: W, raw_history: Arc<RingBuffer>, parser: SessionParser) -> Self {
        Self {
            terminal,
            raw_history,
            parser,
        }
    }

    /// Relay until `reader` hits EOF or fails. Returns the bytes relayed.
    ///
    /// A read error is how the PTY master reports that the shell has gone away
    /// on Linux (EIO), so it ends the relay like EOF does.
    pub fn pump<R: Read>(mut self, mut reader: R) -> u64 {
        let mut buf = [0u8; READ_CHUNK];
        let mut total = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("PTY read ended: {}", e);
                    break;
                }
            };

            let chunk = &buf[..n];
            if let Err(e) = self.write_terminal(chunk) {
                tracing::debug!("Terminal write failed, stopping relay: {}", e);
                break;
            }
            self.raw_history.write(chunk);
            self.parser.parse_chunk(chunk);
            total += n as u64;
        }

        tracing::debug!("Output relay finished after {} bytes", total);
        total
    }

    fn write_terminal(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.terminal.write_all(chunk)?;
        self.terminal.flush()
    }
}
