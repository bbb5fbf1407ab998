//! Keystroke interception for the trigger phrase.
//!
//! Every byte typed by the user is forwarded to the shell unchanged, while a
//! shadow copy of the current line is kept. When a line starting with the
//! trigger is submitted, the shell's line is cancelled and the question is
//! answered by the [`InlineAssistant`] instead.

#[cfg(test)]
mod tests;

use std::io::{self, Read, Write};
use std::sync::Arc;

use super::assistant::InlineAssistant;
use super::history::SessionHistory;
use super::parser::clean_terminal_output;
use super::ring_buffer::RingBuffer;

/// Maximum bytes tracked for the current line
pub const LINE_CAPACITY: usize = 1024;

const KILL_LINE: u8 = 0x15;
const INTERRUPT: u8 = 0x03;
const END_OF_FILE: u8 = 0x04;
const DELETE: u8 = 0x7f;
const BACKSPACE: u8 = 0x08;

/// Forwards keystrokes to the PTY and diverts trigger lines to the assistant.
pub struct InputInterceptor<P: Write, O: Write> {
    pty: P,
    terminal: O,
    line: Vec<u8>,
    history: Arc<SessionHistory>,
    raw_history: Arc<RingBuffer>,
    assistant: InlineAssistant,
    trigger: String,
    context_events: usize,
}

impl<P: Write, O: Write> InputInterceptor<P, O> {
    pub fn new(
        pty: P,
        terminal: O,
        history: Arc<SessionHistory>,
        raw_history: Arc<RingBuffer>,
        assistant: InlineAssistant,
    ) -> Self {
        Self {
            pty,
            terminal,
            line: Vec::with_capacity(LINE_CAPACITY),
            history,
            raw_history,
            assistant,
            trigger: "??".to_string(),
            context_events: 5,
        }
    }

    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = trigger.into();
        self
    }

    pub fn with_context_events(mut self, n: usize) -> Self {
        self.context_events = n;
        self
    }

    /// Bytes of the line typed so far.
    pub fn current_line(&self) -> &[u8] {
        &self.line
    }

    /// Process `input` one byte at a time until EOF or a read error.
    pub fn run<R: Read>(mut self, mut input: R) {
        let mut byte = [0u8; 1];
        loop {
            match input.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => self.handle_byte(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!("Input read ended: {}", e);
                    break;
                }
            }
        }
        tracing::debug!("Input interceptor finished");
    }

    pub fn handle_byte(&mut self, byte: u8) {
        match byte {
            b'\r' | b'\n' => self.finish_line(byte),
            DELETE | BACKSPACE => {
                self.line.pop();
                self.forward(&[byte]);
            }
            INTERRUPT | END_OF_FILE | KILL_LINE => {
                self.line.clear();
                self.forward(&[byte]);
            }
            _ => {
                if self.line.len() < LINE_CAPACITY {
                    self.line.push(byte);
                }
                self.forward(&[byte]);
            }
        }
    }

    fn finish_line(&mut self, terminator: u8) {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();

        let query = match line.trim_start().strip_prefix(self.trigger.as_str()) {
            Some(rest) if !self.trigger.is_empty() => rest.trim().to_string(),
            _ => {
                self.forward(&[terminator]);
                return;
            }
        };

        self.forward(&[KILL_LINE]);
        if let Err(e) = self.intercept(&query) {
            tracing::debug!("Terminal write failed during interception: {}", e);
        }
        self.forward(b"\r");
    }

    fn intercept(&mut self, query: &str) -> io::Result<()> {
        self.terminal.write_all(b"\r\n")?;

        if query.is_empty() {
            write!(self.terminal, "Usage: {} <question>\r\n", self.trigger)?;
            return self.terminal.flush();
        }

        tracing::info!("Intercepted query ({} chars)", query.len());
        let context = build_context(&self.history, &self.raw_history, self.context_events);
        self.assistant.answer(query, &context, &mut self.terminal)
    }

    fn forward(&mut self, bytes: &[u8]) {
        if let Err(e) = self.pty.write_all(bytes).and_then(|_| self.pty.flush()) {
            tracing::debug!("PTY write failed: {}", e);
        }
    }
}

/// Context for the model: the last `n` structured records, or the cleaned
/// raw output when no command has completed yet.
pub fn build_context(history: &SessionHistory, raw_history: &RingBuffer, n: usize) -> String {
    let events = history.last_events(n);
    if events.is_empty() {
        return clean_terminal_output(&raw_history.to_string());
    }

    let mut context = String::from("Session History (Structured):\n");
    for event in events {
        context.push_str(&format!(
            "Command: {}\nExit Code: {}\nOutput:\n{}\n---\n",
            event.command, event.exit_code, event.output
        ));
    }
    context
}
