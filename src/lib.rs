//! llmterm - an LLM client for the terminal
//!
//! The centerpiece is the interactive session: your shell runs inside a
//! pseudo-terminal, command history is reconstructed from OSC 133 markers
//! emitted by a small shell integration snippet, and typing a trigger such
//! as `?? why did that fail` asks the model about what just happened.
//!
//! ## Modules
//!
//! - [`session`]: PTY wrapper, OSC 133 parser, history and input interception
//! - [`llm`]: streaming chat-completion client
//! - [`config`]: `~/.llmterm/config.yaml` loading and model resolution
//! - [`shell`]: shell detection and integration snippets
//! - [`history`]: append-only log of intercepted queries

pub mod config;
pub mod history;
pub mod llm;
pub mod session;
pub mod shell;
