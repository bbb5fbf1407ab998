//! Shell detection and OSC 133 integration snippets

mod detect;
mod integration;

pub use detect::{ShellInfo, ShellKind, detect_shell};
pub use integration::{SUPPORTED_SHELLS, integration_script};
