//! Countdown timer engine.
//!
//! The engine is anchored to an absolute expiry timestamp rather than a
//! tick counter, so late or throttled ticks never cause drift. It does not
//! use internal threads - the caller is responsible for calling `tick()`
//! periodically (the CLI does so every 100ms).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Expired
//!            \-> Stopped
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start(60, clock.now_ms());
//! // In a loop:
//! if let Some(expiry) = engine.tick(clock.now_ms()) { /* exactly once */ }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    /// Reached zero and reported its expiry. No further ticks.
    Expired,
    /// Cancelled before expiring.
    Stopped,
}

/// Returned by [`TimerEngine::tick`] the one time a countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub at_ms: u64,
}

/// Wall-clock anchored countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    /// Absolute expiry (ms since epoch) while running.
    #[serde(default)]
    expiry_epoch_ms: Option<u64>,
    /// Last observed whole seconds remaining.
    remaining_secs: u64,
    initial_secs: u64,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            expiry_epoch_ms: None,
            remaining_secs: 0,
            initial_secs: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Whole seconds remaining as of the last tick or adjustment.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn initial_secs(&self) -> u64 {
        self.initial_secs
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or restart) a countdown expiring at `now + initial_secs`.
    pub fn start(&mut self, initial_secs: u64, now_ms: u64) {
        self.initial_secs = initial_secs;
        self.remaining_secs = initial_secs;
        self.expiry_epoch_ms = Some(now_ms.saturating_add(initial_secs.saturating_mul(1000)));
        self.state = TimerState::Running;
    }

    /// Shift the expiry by `delta_secs` and recompute remaining at once.
    ///
    /// Remaining is clamped at zero; a countdown brought to zero expires on
    /// the next `tick()` through the normal path. Returns the new remaining
    /// seconds, or `None` when the timer is not running.
    pub fn adjust_time(&mut self, delta_secs: i64, now_ms: u64) -> Option<u64> {
        if self.state != TimerState::Running {
            return None;
        }
        let current = self.compute_remaining(now_ms) as i64;
        let adjusted = current.saturating_add(delta_secs).max(0) as u64;
        self.remaining_secs = adjusted;
        self.expiry_epoch_ms = Some(now_ms.saturating_add(adjusted.saturating_mul(1000)));
        Some(adjusted)
    }

    /// Bring remaining to zero. Expiry is still reported by `tick()`.
    pub fn skip(&mut self, now_ms: u64) -> bool {
        let remaining = self.compute_remaining(now_ms) as i64;
        self.adjust_time(-remaining, now_ms).is_some()
    }

    /// Cancel without expiring. Idempotent.
    pub fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Stopped;
        }
        self.expiry_epoch_ms = None;
    }

    /// Recompute remaining time. Returns `Some(Expiry)` exactly once, on
    /// the tick that observes zero; the engine stops itself afterwards.
    pub fn tick(&mut self, now_ms: u64) -> Option<Expiry> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.compute_remaining(now_ms);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            self.expiry_epoch_ms = None;
            return Some(Expiry { at_ms: now_ms });
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn compute_remaining(&self, now_ms: u64) -> u64 {
        match self.expiry_epoch_ms {
            Some(expiry) => expiry.saturating_sub(now_ms).div_ceil(1000),
            None => self.remaining_secs,
        }
    }
}

/// Non-expiring up-counter for the workout duration.
///
/// Observed seconds never decrease, even if the wall clock steps backwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stopwatch {
    #[serde(default)]
    started_epoch_ms: Option<u64>,
    elapsed_secs: u64,
}

impl Stopwatch {
    pub fn started_at(now_ms: u64) -> Self {
        Self {
            started_epoch_ms: Some(now_ms),
            elapsed_secs: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_epoch_ms.is_some()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn tick(&mut self, now_ms: u64) -> u64 {
        if let Some(start) = self.started_epoch_ms {
            let observed = now_ms.saturating_sub(start) / 1000;
            self.elapsed_secs = self.elapsed_secs.max(observed);
        }
        self.elapsed_secs
    }

    /// Freeze at the current reading.
    pub fn stop(&mut self, now_ms: u64) -> u64 {
        let final_secs = self.tick(now_ms);
        self.started_epoch_ms = None;
        final_secs
    }
}
