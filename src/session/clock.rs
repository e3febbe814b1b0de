//! Countdown clock for a single timer session.
//!
//! The clock owns nothing but the remaining seconds and the running flag.
//! Mode policy, task accrual and notifications live in the session
//! controller; the clock only counts down and reports the zero-crossing.

// ============================================================================
// Clock
// ============================================================================

/// A countdown with start/pause/reset semantics.
///
/// Completion is reported exactly once, on the tick that moves the
/// remaining time from 1 to 0. Ticking while paused or while already at
/// zero changes nothing and never reports completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    /// Remaining seconds
    time_left: u32,
    /// Whether the countdown advances on tick
    is_running: bool,
}

impl Clock {
    /// Creates a paused clock holding the full duration.
    pub fn new(duration: u32) -> Self {
        Self {
            time_left: duration,
            is_running: false,
        }
    }

    /// Starts the countdown without touching the remaining time.
    pub fn start(&mut self) {
        self.is_running = true;
    }

    /// Pauses the countdown without touching the remaining time.
    pub fn pause(&mut self) {
        self.is_running = false;
    }

    /// Flips between running and paused; returns the new running state.
    pub fn toggle(&mut self) -> bool {
        self.is_running = !self.is_running;
        self.is_running
    }

    /// Stops the countdown and restores the given duration.
    pub fn reset(&mut self, duration: u32) {
        self.is_running = false;
        self.time_left = duration;
    }

    /// Advances the countdown by one second.
    ///
    /// Returns true exactly once per countdown: on the transition from
    /// 1 to 0, after which the clock is paused.
    pub fn tick(&mut self) -> bool {
        if !self.is_running || self.time_left == 0 {
            return false;
        }

        self.time_left -= 1;

        if self.time_left == 0 {
            self.is_running = false;
            return true;
        }

        false
    }

    /// Returns the remaining seconds.
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Returns true while the countdown advances on tick.
    pub fn is_running(&self) -> bool {
        self.is_running
    }
}

// ============================================================================
// Tests
// ============================================================================
