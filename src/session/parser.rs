//! OSC 133 parser.
//!
//! Shell integration scripts wrap the prompt, the typed command and the
//! command's output in `ESC ] 133 ; <code> BEL` markers:
//!
//! - `A`: prompt start
//! - `B`: prompt end, user input starts
//! - `C`: command submitted, output starts
//! - `D;<exit>`: command finished
//!
//! [`SessionParser`] watches the raw PTY output for these markers and turns
//! each completed `B..C..D` lifecycle into a [`CommandEvent`] in the shared
//! [`SessionHistory`].
//!
//! Markers are assumed not to be split across reads. An introducer without a
//! terminator in the same chunk is passed through as literal text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use super::history::{CommandEvent, SessionHistory};

/// Marker introducer (`ESC ] 133 ;`)
pub const OSC_START: &[u8] = b"\x1b]133;";

/// Marker terminator (BEL)
pub const OSC_END: u8 = 0x07;

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("static ANSI pattern is valid")
});

/// Where the shell currently is in its prompt/command lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    None,
    Prompt,
    Input,
    Output,
}

/// Drives [`SessionHistory`] from raw shell output.
#[derive(Debug)]
pub struct SessionParser {
    history: Arc<SessionHistory>,
    state: ParserState,
}

impl SessionParser {
    pub fn new(history: Arc<SessionHistory>) -> Self {
        Self {
            history,
            state: ParserState::None,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Process one chunk of PTY output.
    ///
    /// Bytes before the first marker belong to the state that was active when
    /// the chunk arrived; bytes after each marker belong to the state that
    /// marker switched to.
    pub fn parse_chunk(&mut self, chunk: &[u8]) {
        let mut parts = split_on(chunk, OSC_START).into_iter();

        if let Some(head) = parts.next() {
            self.route(head);
        }

        for part in parts {
            match part.iter().position(|&b| b == OSC_END) {
                Some(end) => {
                    self.handle_marker(&part[..end]);
                    self.route(&part[end + 1..]);
                }
                None => {
                    // Unterminated marker: keep it as text rather than drop bytes
                    let mut literal = Vec::with_capacity(OSC_START.len() + part.len());
                    literal.extend_from_slice(OSC_START);
                    literal.extend_from_slice(part);
                    self.route(&literal);
                }
            }
        }
    }

    fn route(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        match self.state {
            ParserState::Output => self.history.append_output(bytes),
            ParserState::Input => self.history.append_input(bytes),
            // Prompt rendering is noise for the history
            ParserState::Prompt | ParserState::None => {}
        }
    }

    fn handle_marker(&mut self, raw: &[u8]) {
        let marker = String::from_utf8_lossy(raw);
        let mut fields = marker.split(';');
        let code = fields.next().unwrap_or_default();

        match code {
            "A" => self.state = ParserState::Prompt,
            "B" => {
                self.state = ParserState::Input;
                self.history.clear_input();
            }
            "C" => {
                self.state = ParserState::Output;
                self.history.clear_output();
            }
            "D" => {
                let exit_code = parse_exit_code(fields.next());
                self.finish_command(exit_code);
                self.state = ParserState::None;
            }
            other => {
                tracing::trace!("Ignoring unknown OSC 133 marker: {:?}", other);
            }
        }
    }

    fn finish_command(&self, exit_code: i32) {
        let (input, output) = self.history.take_current();
        let command = String::from_utf8_lossy(&input).trim().to_string();
        let output = clean_terminal_output(&String::from_utf8_lossy(&output));

        // Bare prompts (enter on an empty line) are not worth a record
        if command.is_empty() && output.is_empty() {
            return;
        }

        tracing::debug!("Captured command {:?} (exit {})", command, exit_code);
        self.history
            .add_event(CommandEvent::new(command, output, exit_code));
    }
}

/// Remove ANSI/VT escape sequences so the text reads cleanly for a model.
pub fn clean_terminal_output(input: &str) -> String {
    ANSI_ESCAPE.replace_all(input, "").into_owned()
}

/// Leading integer of the `D` marker argument, 0 when missing or unparsable.
fn parse_exit_code(arg: Option<&str>) -> i32 {
    let Some(arg) = arg else {
        return 0;
    };
    let arg = arg.trim();
    let end = arg
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(arg.len());
    arg[..end].parse().unwrap_or(0)
}

fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if &haystack[i..i + needle.len()] == needle {
            parts.push(&haystack[start..i]);
            i += needle.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&haystack[start..]);
    parts
}
