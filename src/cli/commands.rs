//! Command definitions for the Pomofocus CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{Mode, SoundPreset, TimerConfig};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomofocus CLI - a Pomodoro timer with task tracking
#[derive(Parser, Debug)]
#[command(
    name = "pomofocus",
    version,
    about = "ポモドーロタイマーCLI",
    long_about = "ターミナルで動作するポモドーロタイマー。\n\
                  タスク管理、通知音、コンパクトなバブル表示に対応しています。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the daemon socket
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer daemon in the foreground
    Daemon,

    /// Start or pause the countdown
    Toggle,

    /// Reset the countdown to the full duration
    Reset,

    /// Switch the timer mode
    Switch {
        /// Target mode: pomodoro, short-break or long-break
        #[arg(value_parser = parse_mode)]
        mode: Mode,
    },

    /// Update the timer durations
    Settings(SettingsArgs),

    /// Show current session status
    Status,

    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Select the notification sound
    Sound {
        #[command(subcommand)]
        action: SoundAction,
    },

    /// Show the compact bubble view in this terminal
    Bubble,

    /// Stop the daemon
    Shutdown,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum TaskAction {
    /// Add a new task
    Add {
        /// Task text
        #[arg(value_parser = validate_task_text)]
        text: String,
    },

    /// Start focusing on a task
    Start {
        /// Task identifier
        id: u64,
    },

    /// Toggle a task between completed and pending
    Toggle {
        /// Task identifier
        id: u64,
    },

    /// Delete a task
    Delete {
        /// Task identifier
        id: u64,
    },

    /// List all tasks
    List,
}

/// Notification sound subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SoundAction {
    /// Use a built-in tone
    Preset {
        /// Tone name: bell, chime or beep
        #[arg(value_parser = parse_preset)]
        preset: SoundPreset,
    },

    /// Use an audio file
    File {
        /// Path to the audio file
        path: PathBuf,
    },

    /// Restore the default tone
    Default,
}

// ============================================================================
// Settings Command Arguments
// ============================================================================

/// Arguments for the settings command
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Pomodoro duration in minutes (1-60)
    #[arg(
        short,
        long,
        default_value = "25",
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub pomodoro: u32,

    /// Short break duration in minutes (1-30)
    #[arg(
        short,
        long,
        default_value = "5",
        value_parser = clap::value_parser!(u32).range(1..=30)
    )]
    pub short_break: u32,

    /// Long break duration in minutes (1-60)
    #[arg(
        short,
        long,
        default_value = "15",
        value_parser = clap::value_parser!(u32).range(1..=60)
    )]
    pub long_break: u32,
}

impl SettingsArgs {
    /// Converts the minute arguments into a duration configuration.
    pub fn to_config(&self) -> TimerConfig {
        TimerConfig {
            pomodoro_seconds: self.pomodoro * 60,
            short_break_seconds: self.short_break * 60,
            long_break_seconds: self.long_break * 60,
        }
    }
}

impl Default for SettingsArgs {
    fn default() -> Self {
        Self {
            pomodoro: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the task text.
///
/// - Must not be empty
/// - Must not exceed 100 characters
fn validate_task_text(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("タスク名は空にできません".to_string());
    }
    if s.chars().count() > 100 {
        return Err("タスク名は100文字以内にしてください".to_string());
    }
    Ok(s.to_string())
}

/// Parses a mode name.
fn parse_mode(s: &str) -> Result<Mode, String> {
    match s {
        "pomodoro" => Ok(Mode::Pomodoro),
        "short-break" => Ok(Mode::ShortBreak),
        "long-break" => Ok(Mode::LongBreak),
        _ => Err("モードは pomodoro / short-break / long-break のいずれかを指定してください".to_string()),
    }
}

/// Parses a built-in tone name.
fn parse_preset(s: &str) -> Result<SoundPreset, String> {
    match s {
        "bell" => Ok(SoundPreset::Bell),
        "chime" => Ok(SoundPreset::Chime),
        "beep" => Ok(SoundPreset::Beep),
        _ => Err("通知音は bell / chime / beep のいずれかを指定してください".to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================
