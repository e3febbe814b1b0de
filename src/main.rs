//! Pomofocus - a Pomodoro timer daemon and CLI
//!
//! The timer follows the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break
//!
//! A daemon owns the session; the CLI talks to it over a Unix socket and can
//! mirror it into a compact bubble view.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use pomofocus::cli::{
    resolve_socket_path, BubbleView, Cli, Commands, Display, IpcClient, SoundAction, TaskAction,
};
use pomofocus::daemon;
use pomofocus::sound;
use pomofocus::types::SoundSpec;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse();

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    // Set verbose logging if requested
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let socket = cli.socket;

    match cli.command {
        Some(Commands::Daemon) => {
            let socket_path = resolve_socket_path(socket)?;
            daemon::run(&socket_path).await?;
        }
        Some(Commands::Toggle) => {
            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            let response = client.toggle().await?;
            Display::show_toggle(&response);
        }
        Some(Commands::Reset) => {
            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            let response = client.reset().await?;
            Display::show_reset(&response);
        }
        Some(Commands::Switch { mode }) => {
            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            let response = client.switch_mode(mode).await?;
            Display::show_success(&response);
        }
        Some(Commands::Settings(args)) => {
            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            let response = client.update_settings(args.to_config()).await?;
            Display::show_success(&response);
        }
        Some(Commands::Status) => {
            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Task { action }) => {
            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            match action {
                TaskAction::Add { text } => {
                    let response = client.add_task(text).await?;
                    Display::show_success(&response);
                }
                TaskAction::Start { id } => {
                    let response = client.start_task(id).await?;
                    Display::show_success(&response);
                }
                TaskAction::Toggle { id } => {
                    let response = client.toggle_task(id).await?;
                    Display::show_success(&response);
                }
                TaskAction::Delete { id } => {
                    let response = client.delete_task(id).await?;
                    Display::show_success(&response);
                }
                TaskAction::List => {
                    let response = client.status().await?;
                    Display::show_task_list(&response);
                }
            }
        }
        Some(Commands::Sound { action }) => {
            let sound = match action {
                SoundAction::Preset { preset } => Some(SoundSpec::preset(preset)),
                SoundAction::File { path } => {
                    sound::validate_sound_file(&path)?;
                    // The daemon runs with its own working directory, so the
                    // path must be absolute before it goes over the wire.
                    let absolute = std::fs::canonicalize(&path)
                        .with_context(|| format!("パスを解決できません: {:?}", path))?;
                    Some(SoundSpec::file(absolute))
                }
                SoundAction::Default => None,
            };

            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            let response = client.set_sound(sound).await?;
            Display::show_success(&response);
        }
        Some(Commands::Bubble) => {
            let view = BubbleView::new(resolve_socket_path(socket)?);
            view.run()?;
        }
        Some(Commands::Shutdown) => {
            let client = IpcClient::with_socket_path(resolve_socket_path(socket)?);
            let response = client.shutdown().await?;
            Display::show_success(&response);
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["pomofocus"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["pomofocus", "status"]);
        assert!(matches!(cli.command, Some(Commands::Status)));
    }

    #[test]
    fn test_cli_parse_toggle() {
        let cli = Cli::parse_from(["pomofocus", "toggle"]);
        assert!(matches!(cli.command, Some(Commands::Toggle)));
    }

    #[test]
    fn test_cli_parse_settings_with_options() {
        let cli = Cli::parse_from(["pomofocus", "settings", "--pomodoro", "30"]);
        match cli.command {
            Some(Commands::Settings(args)) => {
                assert_eq!(args.pomodoro, 30);
            }
            _ => panic!("Expected Settings command"),
        }
    }

    #[test]
    fn test_cli_parse_task_add() {
        let cli = Cli::parse_from(["pomofocus", "task", "add", "Test"]);
        match cli.command {
            Some(Commands::Task {
                action: TaskAction::Add { text },
            }) => {
                assert_eq!(text, "Test");
            }
            _ => panic!("Expected Task add command"),
        }
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["pomofocus", "--verbose", "status"]);
        assert!(cli.verbose);
    }
}
