//! CLI module for Pomofocus.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for daemon communication
//! - `display`: Output formatting and display logic
//! - `bubble`: Compact terminal mirror of the session

pub mod bubble;
pub mod client;
pub mod commands;
pub mod display;

pub use bubble::BubbleView;
pub use client::{resolve_socket_path, IpcClient};
pub use commands::{Cli, Commands, SettingsArgs, SoundAction, TaskAction};
pub use display::Display;
