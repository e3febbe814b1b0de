//! Motivational message pools and alert copy.
//!
//! The session controller selects message text at dispatch time; all of
//! the copy the user sees for completions and reminders is defined here.

use rand::seq::SliceRandom;

use crate::types::Alert;

/// Messages celebrating a completed focus session.
pub const SUCCESS_MESSAGES: &[&str] = &[
    "🎉 Fantastic work! You've crushed another Pomodoro!",
    "🌟 Excellent focus! Your productivity is on fire!",
    "🚀 Amazing! You're building great momentum!",
    "💪 Well done! Your discipline is paying off!",
    "🎯 Perfect! Another task conquered with focus!",
    "✨ Outstanding! You're unstoppable today!",
    "🏆 Brilliant work! Your dedication is inspiring!",
    "🌈 Superb focus! You're making real progress!",
    "⭐ Incredible! Your consistency is remarkable!",
    "🔥 Phenomenal! You're in the zone today!",
];

/// Messages encouraging the user to keep going on an unfinished task.
pub const MOTIVATIONAL_MESSAGES: &[&str] = &[
    "💪 Don't give up! Every expert was once a beginner!",
    "🌟 Progress, not perfection! Keep pushing forward!",
    "🚀 You're closer to your goal than you think!",
    "🎯 Focus is a superpower. You've got this!",
    "✨ Small steps lead to big achievements!",
    "🌈 Challenges make you stronger. Keep going!",
    "⭐ Your future self will thank you for not giving up!",
    "🔥 Turn obstacles into opportunities!",
    "💎 Pressure makes diamonds. Stay strong!",
    "🌱 Growth happens outside your comfort zone!",
    "🏔️ Every mountain is climbed one step at a time!",
    "⚡ Your potential is limitless. Believe in yourself!",
    "🎪 Make today count. You're capable of amazing things!",
    "🌊 Ride the waves of challenge with confidence!",
    "🦋 Transform your struggles into strength!",
];

// ============================================================================
// MessageSource
// ============================================================================

/// Trait for message pool selection.
///
/// Abstracts the random draw so tests can run against deterministic text.
pub trait MessageSource: Send {
    /// Picks a success message.
    fn success(&mut self) -> &'static str;

    /// Picks a motivational message.
    fn motivational(&mut self) -> &'static str;
}

/// Production message source drawing uniformly from the pools.
#[derive(Debug, Default)]
pub struct RandomMessages;

impl RandomMessages {
    /// Creates a new random message source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MessageSource for RandomMessages {
    fn success(&mut self) -> &'static str {
        SUCCESS_MESSAGES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(SUCCESS_MESSAGES[0])
    }

    fn motivational(&mut self) -> &'static str {
        MOTIVATIONAL_MESSAGES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(MOTIVATIONAL_MESSAGES[0])
    }
}

/// Deterministic message source for tests: always the first pool entry.
#[derive(Debug, Default)]
pub struct FixedMessages;

impl FixedMessages {
    /// Creates a new fixed message source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MessageSource for FixedMessages {
    fn success(&mut self) -> &'static str {
        SUCCESS_MESSAGES[0]
    }

    fn motivational(&mut self) -> &'static str {
        MOTIVATIONAL_MESSAGES[0]
    }
}

// ============================================================================
// Alert copy
// ============================================================================

/// Builds the alert for a completed focus session.
///
/// When a task was active its completion is named together with a success
/// message; otherwise the generic copy is used.
pub fn pomodoro_complete_alert(task: Option<&str>, success_message: &str) -> Alert {
    match task {
        Some(text) => Alert::new(
            "Task Time Complete!",
            format!("\"{}\" completed. {}", text, success_message),
        ),
        None => Alert::new(
            "Task Time Complete!",
            "Great work! Time for a well-deserved break. Take a moment to relax and recharge.",
        ),
    }
}

/// Builds the alert for a completed break.
pub fn break_complete_alert() -> Alert {
    Alert::new(
        "Break Time Complete!",
        "Break time is over! Ready to get back to work and be productive?",
    )
}

/// Builds the reminder alert shown when a countdown is abandoned while a
/// task is still in progress.
pub fn incomplete_task_alert(motivational_message: &str) -> Alert {
    Alert::new("Task Incomplete!", motivational_message)
}

// ============================================================================
// Tests
// ============================================================================
