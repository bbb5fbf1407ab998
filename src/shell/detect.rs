//! Detect the user's interactive shell.

use std::path::{Path, PathBuf};

/// Shell families we know how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Zsh,
    Bash,
    Fish,
    Nushell,
    PowerShell,
    Sh,
}

impl ShellKind {
    /// Classify an executable name such as `zsh`, `-bash` or `pwsh.exe`.
    pub fn classify(name: &str) -> Self {
        let name = name.trim_start_matches('-').trim_end_matches(".exe");
        if name.contains("zsh") {
            Self::Zsh
        } else if name.contains("bash") {
            Self::Bash
        } else if name.contains("fish") {
            Self::Fish
        } else if name.contains("pwsh") || name.contains("powershell") {
            Self::PowerShell
        } else if name.contains("nu") {
            Self::Nushell
        } else {
            Self::Sh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zsh => "zsh",
            Self::Bash => "bash",
            Self::Fish => "fish",
            Self::Nushell => "nushell",
            Self::PowerShell => "powershell",
            Self::Sh => "sh",
        }
    }
}

impl std::fmt::Display for ShellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shell to wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInfo {
    /// Normalized shell name (`zsh`, `bash`, `fish`, ...)
    pub name: String,
    /// Executable to spawn
    pub path: String,
    pub kind: ShellKind,
}

impl ShellInfo {
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let base = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        let kind = ShellKind::classify(&base);
        Self {
            name: kind.as_str().to_string(),
            path,
            kind,
        }
    }
}

/// `$SHELL`, then the parent process, then the platform default.
pub fn detect_shell() -> ShellInfo {
    let path = std::env::var("SHELL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(parent_shell)
        .unwrap_or_else(|| platform_default().to_string());
    tracing::debug!("Detected shell: {}", path);
    ShellInfo::from_path(path)
}

fn platform_default() -> &'static str {
    if cfg!(windows) { "powershell" } else { "/bin/sh" }
}

#[cfg(unix)]
fn parent_shell() -> Option<String> {
    let ppid = std::os::unix::process::parent_id();
    let output = std::process::Command::new("ps")
        .args(["-p", &ppid.to_string(), "-o", "comm="])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let name = String::from_utf8_lossy(&output.stdout)
        .trim()
        .trim_start_matches('-')
        .to_string();
    if name.is_empty() {
        return None;
    }

    Some(
        find_in_path(&name, std::env::var_os("PATH").as_deref())
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or(name),
    )
}

#[cfg(not(unix))]
fn parent_shell() -> Option<String> {
    None
}

/// Resolve a bare executable name against a `PATH` value.
fn find_in_path(name: &str, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }
    std::env::split_paths(path_var?)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
