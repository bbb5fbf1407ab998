//! Session command implementation
//!
//! Wraps the user's shell and answers trigger lines inline.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use llmterm::config::{ConfigFile, RunConfig, RunOverrides};
use llmterm::history::JsonlHistory;
use llmterm::llm::OpenAiClient;
use llmterm::session::InlineAssistant;
use llmterm::shell::{ShellInfo, SUPPORTED_SHELLS, detect_shell};

/// Run an interactive session. Returns the shell's exit code.
pub async fn session_command(
    config_path: Option<&Path>,
    overrides: RunOverrides,
    debug: bool,
) -> Result<i32> {
    let config = ConfigFile::load(config_path).context("Failed to load configuration")?;
    let run = RunConfig::resolve(&config, &overrides).context("Failed to resolve model")?;
    let shell = detect_shell();

    print_banner(&shell, &run.model_name, &config.session.trigger);
    tokio::time::sleep(Duration::from_secs(1)).await;

    let assistant = InlineAssistant::new(Arc::new(OpenAiClient::new()), run)
        .with_sink(Arc::new(JsonlHistory::new(ConfigFile::history_path())))
        .with_debug(debug);

    let exit = run_shell(&shell, &config, assistant).await?;
    println!("\r\nllmterm session ended.");
    Ok(exit)
}

fn print_banner(shell: &ShellInfo, model: &str, trigger: &str) {
    println!("Starting llmterm session ({}, model {})", shell.name, model);
    println!("Type '{} <question>' at the prompt to ask about this session.", trigger);

    if SUPPORTED_SHELLS.contains(&shell.name.as_str()) {
        let tip = if shell.name == "fish" {
            "llm integration fish | source".to_string()
        } else {
            format!("source <(llm integration {})", shell.name)
        };
        println!("Tip: for structured command history, run: {}", tip);
    }
}

#[cfg(unix)]
async fn run_shell(shell: &ShellInfo, config: &ConfigFile, assistant: InlineAssistant) -> Result<i32> {
    use llmterm::session::{Session, SessionOptions};

    let session = Session::start(&shell.path, SessionOptions::from(&config.session))?;
    let exit = session.run(assistant).await?;
    tracing::info!("Session ended: {:?}", exit);
    Ok(i32::try_from(exit.exit_code).unwrap_or(1))
}

#[cfg(not(unix))]
async fn run_shell(_shell: &ShellInfo, _config: &ConfigFile, _assistant: InlineAssistant) -> Result<i32> {
    anyhow::bail!("Interactive sessions are only supported on Unix-like systems")
}
