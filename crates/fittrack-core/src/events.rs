use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{OccurrenceId, SessionState};

/// Every state change of an active workout produces an Event.
/// Views render from them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        template_name: String,
        occurrences: usize,
        at: DateTime<Utc>,
    },
    ExerciseCompleted {
        occurrence: OccurrenceId,
        index: usize,
        /// True when a countdown completed it.
        auto: bool,
        completion_pct: f64,
        at: DateTime<Utc>,
    },
    ExerciseReopened {
        occurrence: OccurrenceId,
        index: usize,
        completion_pct: f64,
        at: DateTime<Utc>,
    },
    ExerciseTimerStarted {
        occurrence: OccurrenceId,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    CurrentExerciseChanged {
        index: usize,
        occurrence: OccurrenceId,
        at: DateTime<Utc>,
    },
    RestStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    RestAdjusted {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Rest expired or was skipped.
    RestEnded {
        advanced_to: Option<usize>,
        at: DateTime<Utc>,
    },
    QuitPromptOpened {
        completion_pct: f64,
        at: DateTime<Utc>,
    },
    QuitPromptCancelled {
        resumed: SessionState,
        at: DateTime<Utc>,
    },
    /// A navigation-away attempt hit an already open quit prompt.
    NavigationSuppressed {
        at: DateTime<Utc>,
    },
    SessionCompleted {
        record_id: String,
        completion_pct: f64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionQuit {
        record_id: String,
        completion_pct: f64,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        template_name: String,
        current_index: usize,
        exercises: Vec<OccurrenceView>,
        elapsed_secs: u64,
        rest_remaining_secs: Option<u64>,
        rest_warning: bool,
        completion_pct: f64,
        at: DateTime<Utc>,
    },
}

/// Read-only projection of one occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceView {
    pub occurrence: OccurrenceId,
    pub name: String,
    pub completed: bool,
    pub current: bool,
    pub remaining_secs: Option<u64>,
    pub timer_running: bool,
}
