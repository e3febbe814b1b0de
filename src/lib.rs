//! Pomofocus Library
//!
//! This library provides the core functionality for the Pomofocus timer.
//! It includes:
//! - Session controller driving the countdown, mode switching and tasks
//! - Task ledger with per-second focus time accrual
//! - IPC server/client for daemon-CLI communication
//! - Mirror channel publishing session snapshots to a bubble view
//! - CLI command parsing and display utilities
//! - Sound playback for timer notifications
//! - Completion and reminder message pools

pub mod cli;
pub mod daemon;
pub mod messages;
pub mod mirror;
pub mod notify;
pub mod session;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Alert, IpcRequest, IpcResponse, Mode, SessionSnapshot, SoundPreset, SoundSpec, Task,
    TaskStatus, TaskView, TimerConfig,
};

// Re-export session types
pub use session::{Clock, LedgerError, SessionController, SessionEvent, TaskLedger};

// Re-export mirror types
pub use mirror::{
    attach_channel, MirrorChannel, MirrorCommand, MirrorEvent, MirrorSurface, StreamSurface,
    SurfaceError, SurfaceFactory,
};

// Re-export sound types
pub use sound::{try_create_player, MockSoundPlayer, RodioSoundPlayer, SoundError, SoundPlayer};

// Re-export message and notification types
pub use messages::{MessageSource, RandomMessages};
pub use notify::{MockNotifier, Notifier, TracingNotifier};
