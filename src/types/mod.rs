//! Core data types for the Pomofocus timer.
//!
//! This module defines the data structures used for:
//! - Timer modes and duration configuration with validation
//! - Task tracking (status, accrued focus time)
//! - Session snapshots shared by the CLI, the daemon and the bubble view
//! - IPC request/response serialization

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ============================================================================
// Mode
// ============================================================================

/// Represents which duration governs the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Focus session
    Pomodoro,
    /// Short break between focus sessions
    ShortBreak,
    /// Long break
    LongBreak,
}

impl Mode {
    /// Returns the wire representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pomodoro => "pomodoro",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }

    /// Returns the human-readable label shown by the views.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Pomodoro => "Pomodoro",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    /// Returns true for the break modes.
    pub fn is_break(&self) -> bool {
        matches!(self, Mode::ShortBreak | Mode::LongBreak)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Pomodoro
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Countdown durations for each mode, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Focus session duration in seconds
    #[serde(rename = "pomodoroSeconds")]
    pub pomodoro_seconds: u32,
    /// Short break duration in seconds
    #[serde(rename = "shortBreakSeconds")]
    pub short_break_seconds: u32,
    /// Long break duration in seconds
    #[serde(rename = "longBreakSeconds")]
    pub long_break_seconds: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pomodoro_seconds: 25 * 60,
            short_break_seconds: 5 * 60,
            long_break_seconds: 15 * 60,
        }
    }
}

impl TimerConfig {
    /// Creates a new configuration with the specified focus duration.
    pub fn with_pomodoro_seconds(mut self, seconds: u32) -> Self {
        self.pomodoro_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified short break duration.
    pub fn with_short_break_seconds(mut self, seconds: u32) -> Self {
        self.short_break_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified long break duration.
    pub fn with_long_break_seconds(mut self, seconds: u32) -> Self {
        self.long_break_seconds = seconds;
        self
    }

    /// Returns the configured duration for the given mode.
    pub fn duration_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Pomodoro => self.pomodoro_seconds,
            Mode::ShortBreak => self.short_break_seconds,
            Mode::LongBreak => self.long_break_seconds,
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.pomodoro_seconds < 1 {
            return Err("ポモドーロ時間は1秒以上で指定してください".to_string());
        }
        if self.short_break_seconds < 1 {
            return Err("短い休憩時間は1秒以上で指定してください".to_string());
        }
        if self.long_break_seconds < 1 {
            return Err("長い休憩時間は1秒以上で指定してください".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Task
// ============================================================================

/// Lifecycle status of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Waiting to be worked on
    Pending,
    /// Currently associated with the running focus session
    InProgress,
    /// Finished, either by a completed pomodoro or a manual toggle
    Completed,
}

impl TaskStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// A tracked task.
///
/// The completed flag the views show is derived from `status`; it is never
/// stored separately, so the two cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Creation-ordered identifier, unique within the ledger
    pub id: u64,
    /// Display text, non-empty and trimmed
    pub text: String,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Accrued focus time in seconds
    pub time_spent: u32,
    /// Unix timestamp of the last transition to in-progress
    pub started_at: Option<u64>,
}

impl Task {
    /// Creates a new pending task.
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            status: TaskStatus::Pending,
            time_spent: 0,
            started_at: None,
        }
    }

    /// Returns true if the task is currently in progress.
    pub fn is_in_progress(&self) -> bool {
        self.status == TaskStatus::InProgress
    }

    /// Returns true if the task has been completed.
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Serializable task projection for snapshots and the CLI task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    /// Task identifier
    pub id: u64,
    /// Display text
    pub text: String,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Derived from `status == completed`
    pub completed: bool,
    /// Accrued focus time in seconds
    #[serde(rename = "timeSpent")]
    pub time_spent: u32,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            text: task.text.clone(),
            status: task.status,
            completed: task.is_completed(),
            time_spent: task.time_spent,
        }
    }
}

// ============================================================================
// Alert
// ============================================================================

/// A completion or reminder message to present to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Dialog title
    pub title: String,
    /// Dialog body
    pub body: String,
}

impl Alert {
    /// Creates a new alert.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

// ============================================================================
// Notification sound selection
// ============================================================================

/// Built-in notification tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundPreset {
    /// Soft bell tone
    Bell,
    /// Bright chime tone
    Chime,
    /// Plain beep
    Beep,
}

impl SoundPreset {
    /// Returns the preset name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundPreset::Bell => "bell",
            SoundPreset::Chime => "chime",
            SoundPreset::Beep => "beep",
        }
    }
}

/// The configured notification sound.
///
/// `None` at the session level means the synthesized default tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SoundSpec {
    /// One of the built-in tones
    Preset {
        /// Preset name
        preset: SoundPreset,
    },
    /// An audio file on disk
    File {
        /// Path to the audio file
        path: PathBuf,
    },
}

impl SoundSpec {
    /// Creates a preset sound selection.
    pub fn preset(preset: SoundPreset) -> Self {
        Self::Preset { preset }
    }

    /// Creates a file sound selection.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Returns a short description for display purposes.
    pub fn describe(&self) -> String {
        match self {
            Self::Preset { preset } => preset.as_str().to_string(),
            Self::File { path } => path.display().to_string(),
        }
    }
}

// ============================================================================
// SessionSnapshot
// ============================================================================

/// Read-only projection of the session state.
///
/// One snapshot is taken after every command or tick has fully settled and
/// is shared verbatim by the status display and the bubble view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current mode
    pub mode: Mode,
    /// Human-readable mode label
    #[serde(rename = "modeLabel")]
    pub mode_label: String,
    /// Remaining seconds in the current countdown
    #[serde(rename = "timeLeft")]
    pub time_left: u32,
    /// Whether the countdown is running
    #[serde(rename = "isRunning")]
    pub is_running: bool,
    /// Number of completed focus sessions
    #[serde(rename = "completedPomodoros")]
    pub completed_pomodoros: u32,
    /// Id of the active task, if any
    #[serde(rename = "activeTaskId", skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub active_task_id: Option<u64>,
    /// Text of the active task, if any
    #[serde(rename = "activeTaskText", skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub active_task_text: Option<String>,
    /// Most recently dispatched alert, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub alert: Option<Alert>,
    /// All tracked tasks in creation order
    pub tasks: Vec<TaskView>,
}

impl SessionSnapshot {
    /// Formats the remaining time as `MM:SS`.
    pub fn formatted_time(&self) -> String {
        let minutes = self.time_left / 60;
        let seconds = self.time_left % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum IpcRequest {
    /// Start or pause the countdown
    ToggleTimer,
    /// Stop and restore the current mode's full duration
    ResetTimer,
    /// Switch to another mode
    SwitchMode {
        /// Target mode
        mode: Mode,
    },
    /// Replace the duration configuration
    UpdateSettings {
        /// New durations in seconds
        #[serde(flatten)]
        config: TimerConfig,
    },
    /// Add a task to the ledger
    AddTask {
        /// Task text
        text: String,
    },
    /// Mark a task as the active focus target
    StartTask {
        /// Task identifier
        id: u64,
    },
    /// Flip a task between completed and pending
    ToggleTask {
        /// Task identifier
        id: u64,
    },
    /// Remove a task from the ledger
    DeleteTask {
        /// Task identifier
        id: u64,
    },
    /// Select the notification sound; `None` restores the default tone
    SetNotificationSound {
        /// Sound selection
        sound: Option<SoundSpec>,
    },
    /// Query the current snapshot
    Status,
    /// Upgrade this connection into a bubble snapshot stream
    Attach,
    /// Stop the daemon
    Shutdown,
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Snapshot taken after the command settled
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub data: Option<SessionSnapshot>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<SessionSnapshot>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if the response reports success.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
