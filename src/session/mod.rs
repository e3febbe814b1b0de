//! Session controller for the Pomofocus timer.
//!
//! This module owns the timer/task state machine:
//! - `clock`: the countdown itself
//! - `tasks`: the task ledger with focus-time accrual
//! - `SessionController`: mode policy, the command surface and completion
//!   side effects, reported through `SessionEvent`s

pub mod clock;
pub mod tasks;

use tokio::sync::mpsc;
use tracing::warn;

use crate::messages::{self, MessageSource};
use crate::types::{Alert, Mode, SessionSnapshot, SoundSpec, TimerConfig};

pub use clock::Clock;
pub use tasks::{LedgerError, TaskLedger};

// ============================================================================
// SessionEvent
// ============================================================================

/// Session events for sounds, alerts and snapshot publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Countdown started or resumed
    TimerStarted {
        /// Current mode
        mode: Mode,
        /// Remaining seconds
        time_left: u32,
    },
    /// Countdown paused
    TimerPaused {
        /// Current mode
        mode: Mode,
        /// Remaining seconds
        time_left: u32,
    },
    /// Countdown reset to the mode's full duration
    TimerReset {
        /// Current mode
        mode: Mode,
        /// Restored duration in seconds
        time_left: u32,
    },
    /// Mode switched
    ModeChanged {
        /// Previous mode
        from: Mode,
        /// New mode
        to: Mode,
    },
    /// Duration configuration replaced
    SettingsUpdated {
        /// New configuration
        config: TimerConfig,
    },
    /// Notification sound selection changed
    SoundChanged {
        /// New selection; `None` is the default tone
        sound: Option<SoundSpec>,
    },
    /// Task added to the ledger
    TaskAdded {
        /// Task id
        id: u64,
        /// Task text
        text: String,
    },
    /// Task became the active focus target
    TaskStarted {
        /// Task id
        id: u64,
        /// Task text
        text: String,
    },
    /// Task flipped between completed and pending
    TaskToggled {
        /// Task id
        id: u64,
        /// Whether the task is now completed
        completed: bool,
    },
    /// Task removed
    TaskDeleted {
        /// Task id
        id: u64,
    },
    /// One second elapsed
    Tick {
        /// Remaining seconds
        time_left: u32,
    },
    /// A countdown reached zero
    Completed {
        /// Mode that completed
        mode: Mode,
        /// Total completed focus sessions
        completed_pomodoros: u32,
        /// Text of the task completed by this crossing, if any
        completed_task: Option<String>,
        /// Alert to present
        alert: Alert,
        /// Configured notification sound at completion time
        sound: Option<SoundSpec>,
    },
    /// A running countdown was abandoned while a task was in progress
    IncompleteTask {
        /// Text of the still-active task
        task: String,
        /// Reminder alert to present
        alert: Alert,
    },
}

// ============================================================================
// SessionController
// ============================================================================

/// The authoritative owner of all timer and task state.
///
/// Every mutation happens through the command methods below; views only
/// ever observe the state through `snapshot()`, taken after a command has
/// fully settled.
pub struct SessionController {
    /// Current mode
    mode: Mode,
    /// The countdown
    clock: Clock,
    /// Durations per mode
    config: TimerConfig,
    /// Completed focus sessions
    completed_pomodoros: u32,
    /// Tracked tasks
    ledger: TaskLedger,
    /// Configured notification sound; `None` is the default tone
    sound: Option<SoundSpec>,
    /// Most recently dispatched alert
    alert: Option<Alert>,
    /// Message pool selection
    messages: Box<dyn MessageSource>,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionController {
    /// Creates a new controller: pomodoro mode, paused, full duration.
    pub fn new(
        config: TimerConfig,
        messages: Box<dyn MessageSource>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            mode: Mode::Pomodoro,
            clock: Clock::new(config.pomodoro_seconds),
            config,
            completed_pomodoros: 0,
            ledger: TaskLedger::new(),
            sound: None,
            alert: None,
            messages,
            event_tx,
        }
    }

    /// Starts or pauses the countdown without changing the remaining time.
    pub fn toggle_timer(&mut self) {
        if self.clock.toggle() {
            self.emit(SessionEvent::TimerStarted {
                mode: self.mode,
                time_left: self.clock.time_left(),
            });
        } else {
            self.emit(SessionEvent::TimerPaused {
                mode: self.mode,
                time_left: self.clock.time_left(),
            });
        }
    }

    /// Stops the countdown and restores the current mode's full duration.
    ///
    /// Abandoning a running countdown with an active task dispatches the
    /// incomplete-task reminder first; task state itself never changes.
    pub fn reset_timer(&mut self) {
        if self.clock.is_running() {
            self.notify_incomplete_task();
        }

        self.clock.reset(self.config.duration_for(self.mode));
        self.emit(SessionEvent::TimerReset {
            mode: self.mode,
            time_left: self.clock.time_left(),
        });
    }

    /// Switches to the given mode, pausing at its full duration.
    ///
    /// Leaving a running countdown for a different mode dispatches the
    /// incomplete-task reminder. Task status is never mutated by a mode
    /// switch.
    pub fn switch_mode(&mut self, new_mode: Mode) {
        if self.clock.is_running() && new_mode != self.mode {
            self.notify_incomplete_task();
        }

        let from = self.mode;
        self.mode = new_mode;
        self.clock.reset(self.config.duration_for(new_mode));
        self.emit(SessionEvent::ModeChanged { from, to: new_mode });
    }

    /// Adds a task to the ledger and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::EmptyText` for empty or whitespace-only text.
    pub fn add_task(&mut self, text: &str) -> Result<u64, LedgerError> {
        let id = self.ledger.add(text)?;
        let text = self
            .ledger
            .get(id)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.emit(SessionEvent::TaskAdded { id, text });
        Ok(id)
    }

    /// Makes a task the active focus target.
    ///
    /// Outside pomodoro mode this first performs the full mode switch back
    /// to pomodoro, including its incomplete-task rule under the previous
    /// mode's running state.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TaskNotFound` for an unknown id; in that case
    /// neither the mode nor the ledger changes.
    pub fn start_task(&mut self, id: u64) -> Result<(), LedgerError> {
        if !self.ledger.contains(id) {
            return Err(LedgerError::TaskNotFound(id));
        }

        if self.mode != Mode::Pomodoro {
            self.switch_mode(Mode::Pomodoro);
        }

        self.ledger.start(id)?;
        let text = self.ledger.active_text().unwrap_or_default().to_string();
        self.emit(SessionEvent::TaskStarted { id, text });
        Ok(())
    }

    /// Flips a task between completed and pending.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TaskNotFound` for an unknown id.
    pub fn toggle_task(&mut self, id: u64) -> Result<(), LedgerError> {
        let completed = self.ledger.toggle(id)?;
        self.emit(SessionEvent::TaskToggled { id, completed });
        Ok(())
    }

    /// Removes a task; deleting the active task stops accrual.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TaskNotFound` for an unknown id.
    pub fn delete_task(&mut self, id: u64) -> Result<(), LedgerError> {
        self.ledger.delete(id)?;
        self.emit(SessionEvent::TaskDeleted { id });
        Ok(())
    }

    /// Replaces the duration configuration.
    ///
    /// While paused the remaining time is immediately re-derived for the
    /// current mode; a running countdown keeps its remaining time until
    /// the next reset, switch or completion.
    pub fn update_settings(&mut self, config: TimerConfig) {
        self.config = config;
        if !self.clock.is_running() {
            self.clock.reset(self.config.duration_for(self.mode));
        }
        self.emit(SessionEvent::SettingsUpdated { config });
    }

    /// Selects the notification sound; `None` restores the default tone.
    pub fn set_notification_sound(&mut self, sound: Option<SoundSpec>) {
        self.sound = sound.clone();
        self.emit(SessionEvent::SoundChanged { sound });
    }

    /// Advances the countdown by one second.
    ///
    /// No-op while paused or at zero. While running in pomodoro mode the
    /// elapsed second also accrues to the active task. The zero-crossing
    /// dispatches completion side effects exactly once.
    pub fn tick(&mut self) {
        if !self.clock.is_running() || self.clock.time_left() == 0 {
            return;
        }

        let completed = self.clock.tick();

        if self.mode == Mode::Pomodoro {
            if let Some(id) = self.ledger.active_id() {
                self.ledger.accrue_second(id);
            }
        }

        self.emit(SessionEvent::Tick {
            time_left: self.clock.time_left(),
        });

        if completed {
            self.handle_complete();
        }
    }

    /// Takes a read-only snapshot of the fully-settled state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            mode_label: self.mode.label().to_string(),
            time_left: self.clock.time_left(),
            is_running: self.clock.is_running(),
            completed_pomodoros: self.completed_pomodoros,
            active_task_id: self.ledger.active_id(),
            active_task_text: self.ledger.active_text().map(String::from),
            alert: self.alert.clone(),
            tasks: self.ledger.views(),
        }
    }

    /// Returns the current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the remaining seconds.
    pub fn time_left(&self) -> u32 {
        self.clock.time_left()
    }

    /// Returns true while the countdown is running.
    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Returns the number of completed focus sessions.
    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    /// Returns the current duration configuration.
    pub fn config(&self) -> TimerConfig {
        self.config
    }

    /// Returns the configured notification sound.
    pub fn sound(&self) -> Option<&SoundSpec> {
        self.sound.as_ref()
    }

    /// Returns the task ledger.
    pub fn ledger(&self) -> &TaskLedger {
        &self.ledger
    }

    /// Handles a countdown reaching zero.
    fn handle_complete(&mut self) {
        let (completed_task, alert) = match self.mode {
            Mode::Pomodoro => {
                self.completed_pomodoros += 1;
                let completed_task = self.ledger.complete_active();
                let success = self.messages.success();
                let alert = messages::pomodoro_complete_alert(completed_task.as_deref(), success);
                (completed_task, alert)
            }
            Mode::ShortBreak | Mode::LongBreak => (None, messages::break_complete_alert()),
        };

        self.alert = Some(alert.clone());
        self.emit(SessionEvent::Completed {
            mode: self.mode,
            completed_pomodoros: self.completed_pomodoros,
            completed_task,
            alert,
            sound: self.sound.clone(),
        });
    }

    /// Dispatches the incomplete-task reminder if a task is active.
    fn notify_incomplete_task(&mut self) {
        let Some(task) = self.ledger.active_text().map(String::from) else {
            return;
        };

        let alert = messages::incomplete_task_alert(self.messages.motivational());
        self.alert = Some(alert.clone());
        self.emit(SessionEvent::IncompleteTask { task, alert });
    }

    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("セッションイベントの送信に失敗しました（受信側が閉じています）");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
