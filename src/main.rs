use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use llmterm::config::{ConfigFile, RunOverrides};

mod cli;

#[derive(Parser)]
#[command(name = "llm")]
#[command(about = "Terminal LLM client with an AI-aware shell session")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.llmterm/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap your shell; type '?? <question>' to ask about recent commands
    Session {
        /// Model key from the config, or a raw model name
        #[arg(short, long)]
        model: Option<String>,

        /// API key (overrides OPENAI_API_KEY and the config)
        #[arg(long)]
        api_key: Option<String>,

        /// API base URL (overrides OPENAI_API_BASE and the config)
        #[arg(long)]
        api_base: Option<String>,

        /// Sampling temperature
        #[arg(short, long)]
        temperature: Option<f64>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the model, system prompt and context before each answer
        #[arg(short = 'D', long)]
        debug: bool,
    },

    /// Print the OSC 133 integration script for a shell
    Integration {
        /// zsh, bash or fish
        shell: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Session {
            model,
            api_key,
            api_base,
            temperature,
            timeout,
            debug,
        } => {
            // The shell owns stdout/stderr for the whole session
            init_file_logging(log_level, &ConfigFile::log_path());

            let overrides = RunOverrides {
                model,
                api_key,
                api_base,
                temperature,
                timeout_secs: timeout,
            };
            let code = cli::session::session_command(config_path, overrides, debug).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Integration { shell } => {
            init_logging(log_level);
            cli::integration::integration_command(&shell)?;
        }
    }

    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn init_logging(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .with_writer(std::io::stderr)
        .init();
}

fn init_file_logging(log_level: &str, path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(log_level))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(e) => {
            eprintln!("Warning: logging disabled, cannot open {}: {}", path.display(), e);
        }
    }
}
