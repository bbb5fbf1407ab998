//! Interactive shell session with inline LLM answers.
//!
//! The user's shell runs on a PTY. Its output is relayed to the terminal and
//! parsed for OSC 133 markers into structured command history, while typed
//! lines starting with the trigger are answered by the model.

mod assistant;
#[cfg(unix)]
mod controller;
mod history;
mod interceptor;
mod parser;
mod raw_mode;
mod relay;
mod ring_buffer;

pub use assistant::InlineAssistant;
#[cfg(unix)]
pub use controller::{SESSION_ENV, Session, SessionError, SessionExit, SessionOptions, window_size};
pub use history::{CommandEvent, SessionHistory};
pub use interceptor::{InputInterceptor, LINE_CAPACITY, build_context};
pub use parser::{OSC_END, OSC_START, ParserState, SessionParser, clean_terminal_output};
pub use raw_mode::{CrosstermTerminal, RawModeGuard, TerminalControl};
pub use relay::OutputRelay;
pub use ring_buffer::{DEFAULT_RING_CAPACITY, RingBuffer};
