use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "chatrelay - terminal chat client for Claude models")]
#[command(version)]
struct Cli {
    /// Run a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Model id from the catalogue
    #[arg(short, long)]
    model: Option<String>,

    /// Attach a file (repeatable)
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the system prompt
    #[arg(long)]
    system: Option<String>,

    /// Username for the shared credential
    #[arg(long, env = "CHATRELAY_USERNAME")]
    username: Option<String>,

    /// Password for the shared credential
    #[arg(long, env = "CHATRELAY_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = match cli.config {
        Some(ref path) => {
            let mut settings = chatrelay_core::Settings::load_from(path)?;
            settings.apply_env();
            settings
        }
        None => chatrelay_core::Settings::load(),
    };

    if let Some(ref system) = cli.system {
        settings.generation.system_prompt = system.clone();
    }

    let username = cli.username.as_deref().unwrap_or_default();
    let password = cli.password.as_deref().unwrap_or_default();
    if !settings.check_login(username, password) {
        bail!("Invalid username or password");
    }
    tracing::debug!("Using base URL {}", settings.api.base_url);

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, cli.model.as_deref(), &prompt, &cli.files).await?;
    } else {
        app::run_repl(settings, cli.model.as_deref(), &cli.files).await?;
    }

    Ok(())
}
