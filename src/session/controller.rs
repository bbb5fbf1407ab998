//! PTY session lifecycle: spawn, raw mode, resize, relay threads and wait.

use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use std::io;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;

use super::assistant::InlineAssistant;
use super::history::SessionHistory;
use super::interceptor::InputInterceptor;
use super::parser::SessionParser;
use super::raw_mode::{CrosstermTerminal, RawModeGuard, TerminalControl};
use super::relay::OutputRelay;
use super::ring_buffer::{DEFAULT_RING_CAPACITY, RingBuffer};
use crate::config::SessionSettings;

type SharedMaster = Arc<Mutex<Box<dyn MasterPty + Send>>>;

/// Environment variable set inside the wrapped shell
pub const SESSION_ENV: &str = "LLMTERM_SESSION";

/// Errors that abort a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to open pseudo-terminal: {0}")]
    PtyOpen(String),

    #[error("Failed to spawn shell {shell}: {message}")]
    Spawn { shell: String, message: String },

    #[error("Failed to enter raw mode: {0}")]
    RawMode(#[source] io::Error),

    #[error("Failed to wait for shell: {0}")]
    Wait(#[source] io::Error),

    #[error("PTY I/O error: {0}")]
    Io(String),
}

/// Knobs for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub trigger: String,
    pub context_events: usize,
    pub ring_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            trigger: "??".to_string(),
            context_events: 5,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

impl From<&SessionSettings> for SessionOptions {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            trigger: settings.trigger.clone(),
            context_events: settings.context_events,
            ring_capacity: settings.ring_capacity(),
        }
    }
}

/// How the wrapped shell ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit {
    pub exit_code: u32,
    pub success: bool,
}

/// A shell running on a fresh PTY, not yet attached to the terminal.
pub struct Session {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    options: SessionOptions,
}

impl Session {
    /// Spawn `shell_path` on a new PTY sized like the current terminal.
    pub fn start(shell_path: &str, options: SessionOptions) -> Result<Self, SessionError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(window_size().unwrap_or_else(default_size))
            .map_err(|e| SessionError::PtyOpen(e.to_string()))?;

        let mut cmd = CommandBuilder::new(shell_path);
        cmd.env(SESSION_ENV, "1");
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| SessionError::Spawn {
                shell: shell_path.to_string(),
                message: e.to_string(),
            })?;
        // The child holds its own handle to the slave side
        drop(pair.slave);

        tracing::info!("Spawned {} (pid {:?})", shell_path, child.process_id());

        Ok(Self {
            master: pair.master,
            child,
            options,
        })
    }

    pub fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }

    /// Attach the session to the real terminal and block until the shell exits.
    pub async fn run(self, assistant: InlineAssistant) -> Result<SessionExit, SessionError> {
        self.run_with(assistant, CrosstermTerminal).await
    }

    /// Like [`Session::run`], switching raw mode through `terminal`.
    ///
    /// Raw mode is restored on every return path. If it cannot be acquired,
    /// the shell is killed and reaped before the error is returned.
    pub async fn run_with<T: TerminalControl>(
        self,
        assistant: InlineAssistant,
        terminal: T,
    ) -> Result<SessionExit, SessionError> {
        let Session {
            master,
            mut child,
            options,
        } = self;

        let io_streams = master
            .try_clone_reader()
            .and_then(|reader| Ok((reader, master.take_writer()?)));
        let (reader, writer) = match io_streams {
            Ok(streams) => streams,
            Err(e) => {
                kill_child(child.as_mut());
                return Err(SessionError::Io(e.to_string()));
            }
        };

        let guard = match RawModeGuard::acquire(terminal) {
            Ok(guard) => guard,
            Err(e) => {
                kill_child(child.as_mut());
                return Err(SessionError::RawMode(e));
            }
        };

        let master: SharedMaster = Arc::new(Mutex::new(master));
        apply_window_size(&master);
        let resize_task = spawn_resize_listener(Arc::downgrade(&master));

        let history = Arc::new(SessionHistory::new());
        let raw_history = Arc::new(RingBuffer::new(options.ring_capacity));

        let relay = OutputRelay::new(
            io::stdout(),
            raw_history.clone(),
            SessionParser::new(history.clone()),
        );
        thread::spawn(move || relay.pump(reader));

        let interceptor = InputInterceptor::new(writer, io::stdout(), history, raw_history, assistant)
            .with_trigger(options.trigger)
            .with_context_events(options.context_events);
        // Detached: a blocking stdin read cannot be cancelled
        thread::spawn(move || interceptor.run(io::stdin()));

        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| SessionError::Wait(io::Error::other(e)))?
            .map_err(SessionError::Wait)?;

        if let Some(task) = resize_task {
            task.abort();
        }
        drop(master);

        if let Err(e) = guard.restore() {
            tracing::error!("Failed to restore terminal mode: {}", e);
        }

        tracing::info!("Shell exited with {}", status.exit_code());
        Ok(SessionExit {
            exit_code: status.exit_code(),
            success: status.success(),
        })
    }
}

fn kill_child(child: &mut (dyn Child + Send + Sync)) {
    if let Err(e) = child.kill() {
        tracing::warn!("Failed to kill shell: {}", e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!("Failed to reap shell: {}", e);
    }
}

fn default_size() -> PtySize {
    PtySize {
        rows: 24,
        cols: 80,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Current size of the controlling terminal, if there is one.
pub fn window_size() -> Option<PtySize> {
    let (cols, rows) = crossterm::terminal::size().ok()?;
    if rows == 0 || cols == 0 {
        return None;
    }
    Some(PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    })
}

fn apply_window_size(master: &SharedMaster) {
    let Some(size) = window_size() else {
        return;
    };
    let master = master.lock().unwrap_or_else(|e| e.into_inner());
    if let Err(e) = master.resize(size) {
        tracing::warn!("Failed to resize PTY: {}", e);
    }
}

/// Re-apply the terminal size on every SIGWINCH until the PTY is gone.
fn spawn_resize_listener(master: Weak<Mutex<Box<dyn MasterPty + Send>>>) -> Option<JoinHandle<()>> {
    let mut signals = match signal(SignalKind::window_change()) {
        Ok(signals) => signals,
        Err(e) => {
            tracing::warn!("Resize notifications unavailable: {}", e);
            return None;
        }
    };

    Some(tokio::spawn(async move {
        while signals.recv().await.is_some() {
            let Some(master) = master.upgrade() else {
                break;
            };
            apply_window_size(&master);
        }
    }))
}
