//! Genna Bot CLI - Insurance Assistant
//!
//! A command-line interface for running the Genna insurance bot.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use clap::{Args, Parser, Subcommand};
use genna_bot::error::{BotError, Result};
use genna_bot::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Genna Bot - insurance claims assistant
#[derive(Parser)]
#[command(name = "genna")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "GENNA_BOT_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and setup
    Init(InitArgs),

    /// Start an interactive chat session
    Chat(ChatArgs),

    /// Show bot status and configuration
    Status,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the chat command
#[derive(Args)]
struct ChatArgs {
    /// Custom prompt prefix
    #[arg(short, long, default_value = "You: ")]
    prompt: String,

    /// Chat ID for conversation persistence
    #[arg(short, long, default_value = "direct")]
    session: String,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Edit configuration in default editor
    Edit,
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose);

    // Run the async main
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "genna_bot={level},genna={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init(args) => cmd_init(args).await,
        Commands::Chat(args) => cmd_chat(args, cli.config).await,
        Commands::Status => cmd_status(cli.config).await,
        Commands::Config(args) => cmd_config(args, cli.config).await,
    }
}

/// Load the configuration, preferring an explicit path.
async fn resolve_config(config_path: Option<PathBuf>) -> Result<BotConfig> {
    match config_path {
        Some(path) => load_config_from(&path)
            .await
            .map_err(|e| BotError::config(format!("failed to load {}: {e}", path.display()))),
        None => Ok(load_config().await.unwrap_or_default()),
    }
}

/// Initialize configuration.
async fn cmd_init(args: InitArgs) -> Result<()> {
    let config_file = config_path();

    if config_file.exists() && !args.force {
        println!("Configuration already exists at: {}", config_file.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    init_config()
        .await
        .map_err(|e| BotError::config(format!("failed to initialize config: {e}")))?;

    println!("Configuration created: {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. genna config edit");
    println!("  2. genna chat");

    Ok(())
}

/// Build the gateway for an interactive chat session.
///
/// `run_interactive` owns stdout for this session, so the managed CLI
/// channel stays disabled; registering it too would print every reply a
/// second time.
fn build_chat_gateway(config: BotConfig) -> Result<Gateway> {
    GatewayBuilder::new()
        .bot_config(config)
        .enable_cli(false)
        .build()
}

/// Start interactive chat.
async fn cmd_chat(args: ChatArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(config_path).await?;

    for issue in config.validate() {
        tracing::warn!(field = %issue.field, "{}", issue.message);
    }

    let cli_config = CliChannelConfig {
        prompt: args.prompt,
        chat_id: args.session,
    };

    let gateway = Arc::new(build_chat_gateway(config)?);

    println!("Genna Bot Chat | type 'exit' to quit\n");

    let runner = Arc::clone(&gateway);
    let service = tokio::spawn(async move { runner.run().await });

    let result = tokio::select! {
        result = genna_bot::channels::cli::run_interactive(gateway.bus(), cli_config) => {
            result.map_err(BotError::from)
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            Ok(())
        }
    };

    gateway.stop().await;
    service.await??;
    result
}

/// Show status.
async fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.unwrap_or_else(genna_bot::config::config_path);

    println!("Genna Bot Status\n");

    println!("Configuration:");
    println!("  Path:   {}", config_file.display());
    println!(
        "  Exists: {}",
        if config_file.exists() { "yes" } else { "no" }
    );

    if config_file.exists() {
        match load_config_from(&config_file).await {
            Ok(config) => {
                println!("  Valid:  yes");
                println!();
                println!("Backend:");
                println!("  URL:     {}", config.backend.base_url);
                println!("  Retries: {}", config.backend.max_retries);
                println!();
                println!("Collaborators:");
                println!(
                    "  Knowledge base: {}",
                    if config.qna.enabled && !config.qna.endpoint.is_empty() {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
                println!(
                    "  Recognizer:     {}",
                    if config.recognizer.enabled && !config.recognizer.endpoint.is_empty() {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
                println!(
                    "  Audit:          {}",
                    if config.audit.enabled { "enabled" } else { "disabled" }
                );
                println!();
                println!("Dialog:");
                println!("  Root:         {}", config.dialog.root_dialog);
                println!("  Turn timeout: {}s", config.dialog.turn_timeout_secs);
            }
            Err(e) => {
                println!("  Valid:  no ({e})");
            }
        }
    }

    println!();
    println!("Environment:");
    print_env_status("GENNA_BOT_CONFIG");

    Ok(())
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = config_path.unwrap_or_else(genna_bot::config::config_path);

    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            if config_file.exists() {
                let content = tokio::fs::read_to_string(&config_file)
                    .await
                    .map_err(|e| BotError::config(format!("failed to read config: {e}")))?;
                println!("{content}");
            } else {
                println!("Configuration file does not exist.");
                println!("Run 'genna init' to create one.");
            }
        }
        ConfigCommands::Edit => {
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            std::process::Command::new(&editor)
                .arg(&config_file)
                .status()
                .map_err(|e| BotError::config(format!("failed to open editor: {e}")))?;
        }
        ConfigCommands::Validate => {
            if !config_file.exists() {
                println!("error: configuration file does not exist");
                return Ok(());
            }

            match load_config_from(&config_file).await {
                Ok(config) => {
                    let issues = config.validate();
                    if issues.is_empty() {
                        println!("Configuration is valid");
                    }
                    for issue in issues {
                        let level = match issue.level {
                            IssueLevel::Error => "error",
                            IssueLevel::Warning => "warning",
                        };
                        println!("{level}: {}: {}", issue.field, issue.message);
                    }
                }
                Err(e) => println!("error: {e}"),
            }
        }
    }

    Ok(())
}

/// Print environment variable status.
fn print_env_status(name: &str) {
    let status = if std::env::var(name).is_ok() {
        "set"
    } else {
        "-"
    };
    println!("  {name}: {status}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_chat_gateway_registers_no_printer_channel() {
        let gateway = Arc::new(build_chat_gateway(BotConfig::default()).unwrap());

        let service = tokio::spawn({
            let gateway = Arc::clone(&gateway);
            async move { gateway.run().await }
        });
        while !gateway.is_running().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The interactive session is the only subscriber to the reply
        // stream; a registered CLI channel would print each reply twice.
        assert!(gateway.status().await.channels.is_empty());

        gateway.stop().await;
        service.await.unwrap().unwrap();
    }
}
