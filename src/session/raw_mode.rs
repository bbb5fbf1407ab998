//! Raw terminal mode as a scoped resource.
//!
//! [`RawModeGuard`] puts the controlling terminal into raw mode and restores
//! the saved mode exactly once: on drop, on an explicit [`RawModeGuard::restore`],
//! or while unwinding from a panic.

use std::io;

/// Low-level terminal mode switching.
pub trait TerminalControl {
    /// Terminal mode captured before switching to raw.
    type Saved;

    /// Switch to raw mode and return the previous mode.
    fn enter_raw(&self) -> io::Result<Self::Saved>;

    /// Put the terminal back into `saved`.
    fn restore(&self, saved: &Self::Saved) -> io::Result<()>;
}

/// Holds the terminal in raw mode until dropped.
pub struct RawModeGuard<T: TerminalControl> {
    control: T,
    saved: Option<T::Saved>,
}

impl<T: TerminalControl> RawModeGuard<T> {
    /// Enter raw mode. Nothing needs restoring if this fails.
    pub fn acquire(control: T) -> io::Result<Self> {
        let saved = control.enter_raw()?;
        tracing::debug!("Entered raw mode");
        Ok(Self {
            control,
            saved: Some(saved),
        })
    }

    /// Restore the saved mode now and report any error.
    pub fn restore(mut self) -> io::Result<()> {
        self.restore_once()
    }

    fn restore_once(&mut self) -> io::Result<()> {
        match self.saved.take() {
            Some(saved) => {
                let result = self.control.restore(&saved);
                tracing::debug!("Restored terminal mode");
                result
            }
            None => Ok(()),
        }
    }
}

impl<T: TerminalControl> Drop for RawModeGuard<T> {
    fn drop(&mut self) {
        if let Err(e) = self.restore_once() {
            tracing::error!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// The process's controlling terminal, switched with crossterm.
///
/// crossterm keeps the cooked mode it saved when entering raw mode, so there
/// is nothing to carry in [`TerminalControl::Saved`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosstermTerminal;

impl TerminalControl for CrosstermTerminal {
    type Saved = ();

    fn enter_raw(&self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn restore(&self, _saved: &()) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }
}
