//! Active workout session: the state machine that ties progression, the
//! rest timer, the elapsed-time counter and the wake lock together.
//!
//! ## State Transitions
//!
//! ```text
//! InProgress <-> Resting
//!     |  \        |  \
//!     |   QuitConfirmPending -> Quit
//!     v           v
//!   Completed  Completed
//! ```
//!
//! Like the timers, the session has no thread of its own: the caller
//! delivers user actions and calls `tick()` periodically. Every call
//! returns the events it produced; an empty vector means the call was a
//! no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::model::{OccurrenceId, SessionExercise, WorkoutTemplate};
use super::progression::{CompletionSource, ExerciseProgression, ProgressionChange};
use crate::error::ValidationError;
use crate::events::{Event, OccurrenceView};
use crate::record::{WorkoutRecord, WorkoutRecordBuilder};
use crate::storage::SessionConfig;
use crate::timer::{Clock, Stopwatch, SystemClock, TimerEngine};
use crate::wake_lock::{LifecycleSignal, WakeLockCoordinator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    InProgress,
    Resting,
    /// The user tried to leave. Timers keep running; navigation is blocked
    /// until the prompt is confirmed or cancelled.
    QuitConfirmPending,
    Completed,
    Quit,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Quit)
    }
}

/// Answer to a navigation-away attempt (back button, window close, Ctrl-C).
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// No active session; leave freely.
    Allowed,
    /// Routed to the quit prompt instead.
    Blocked { events: Vec<Event> },
}

/// Terminal result: the record to hand to the workout store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub record: WorkoutRecord,
    pub event: Event,
}

/// Collaborators injected into a session.
pub struct SessionOptions {
    pub config: SessionConfig,
    pub clock: Box<dyn Clock>,
    pub wake_lock: WakeLockCoordinator,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            config: SessionConfig::default(),
            clock: Box::new(SystemClock),
            wake_lock: WakeLockCoordinator::disabled(),
        }
    }
}

pub struct WorkoutSession {
    template_name: String,
    progression: ExerciseProgression,
    elapsed: Stopwatch,
    rest: TimerEngine,
    state: SessionState,
    /// State to return to when the quit prompt is cancelled.
    resume_state: Option<SessionState>,
    started_at: DateTime<Utc>,
    clock: Box<dyn Clock>,
    wake_lock: WakeLockCoordinator,
    config: SessionConfig,
    late_ticks: u32,
}

impl WorkoutSession {
    /// Expand the template and start the elapsed counter and wake lock.
    ///
    /// # Errors
    /// Returns a validation error for templates without exercises or with
    /// fewer than one set.
    pub fn start(template: &WorkoutTemplate, options: SessionOptions) -> Result<Self, ValidationError> {
        let progression = ExerciseProgression::new(template.expand()?)?;
        let SessionOptions {
            config,
            clock,
            mut wake_lock,
        } = options;
        let now = clock.now_ms();
        wake_lock.engage(now);
        debug!(template = %template.name, occurrences = progression.len(), "session started");
        Ok(Self {
            template_name: template.name.clone(),
            progression,
            elapsed: Stopwatch::started_at(now),
            rest: TimerEngine::new(),
            state: SessionState::InProgress,
            resume_state: None,
            started_at: clock.now_utc(),
            clock,
            wake_lock,
            config,
            late_ticks: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The state underneath an open quit prompt.
    pub fn effective_state(&self) -> SessionState {
        match self.state {
            SessionState::QuitConfirmPending => self.resume_state.unwrap_or(SessionState::InProgress),
            other => other,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn exercises(&self) -> &[SessionExercise] {
        self.progression.exercises()
    }

    pub fn occurrence_at(&self, index: usize) -> Option<&OccurrenceId> {
        self.progression.exercises().get(index).map(|e| &e.occurrence)
    }

    pub fn current_index(&self) -> usize {
        self.progression.current_index()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.elapsed_secs()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completion_percentage(&self) -> f64 {
        self.progression.completion_percentage()
    }

    /// Rest countdown, present only while a rest period is running.
    pub fn rest_remaining_secs(&self) -> Option<u64> {
        (self.effective_state() == SessionState::Resting && self.rest.is_running())
            .then(|| self.rest.remaining_secs())
    }

    pub fn rest_warning(&self) -> bool {
        self.rest_remaining_secs()
            .is_some_and(|secs| secs <= self.config.rest_warning_secs)
    }

    pub fn wake_lock(&self) -> &WakeLockCoordinator {
        &self.wake_lock
    }

    /// Timers still scheduled against this session (exercise countdowns
    /// plus the rest timer).
    pub fn running_timer_count(&self) -> usize {
        self.progression.running_timer_count() + usize::from(self.rest.is_running())
    }

    /// Ticks delivered after teardown. Non-zero means a leaked timer.
    pub fn late_tick_count(&self) -> u32 {
        self.late_ticks
    }

    pub fn started_event(&self) -> Event {
        Event::SessionStarted {
            template_name: self.template_name.clone(),
            occurrences: self.progression.len(),
            at: self.started_at,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let current = self.progression.current_index();
        let exercises = self
            .progression
            .exercises()
            .iter()
            .enumerate()
            .map(|(i, e)| OccurrenceView {
                occurrence: e.occurrence.clone(),
                name: e.spec.name.clone(),
                completed: e.completed,
                current: i == current,
                remaining_secs: e.remaining_seconds,
                timer_running: self.progression.timer_running(&e.occurrence),
            })
            .collect();
        Event::StateSnapshot {
            state: self.state,
            template_name: self.template_name.clone(),
            current_index: current,
            exercises,
            elapsed_secs: self.elapsed.elapsed_secs(),
            rest_remaining_secs: self.rest_remaining_secs(),
            rest_warning: self.rest_warning(),
            completion_pct: self.completion_percentage(),
            at: self.clock.now_utc(),
        }
    }

    // ── User actions ─────────────────────────────────────────────────

    pub fn toggle_complete(&mut self, occurrence: &OccurrenceId) -> Vec<Event> {
        if !self.accepts_actions("toggle_complete") {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        match self.progression.toggle_complete(occurrence) {
            Some(change) => self.apply_change(change, now),
            None => Vec::new(),
        }
    }

    /// Move the current exercise. Out-of-range indexes are ignored.
    pub fn advance_to(&mut self, index: usize) -> Vec<Event> {
        if !self.accepts_actions("advance_to") {
            return Vec::new();
        }
        let before = self.progression.current_index();
        if !self.progression.advance_to(index) || before == index {
            return Vec::new();
        }
        vec![self.current_changed_event()]
    }

    pub fn next_exercise(&mut self) -> Vec<Event> {
        self.advance_to(self.progression.current_index() + 1)
    }

    pub fn start_exercise_timer(&mut self, occurrence: &OccurrenceId) -> Vec<Event> {
        if !self.accepts_actions("start_exercise_timer") {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        match self.progression.start_exercise_timer(occurrence, now) {
            Some(remaining_secs) => vec![Event::ExerciseTimerStarted {
                occurrence: occurrence.clone(),
                remaining_secs,
                at: self.clock.now_utc(),
            }],
            None => Vec::new(),
        }
    }

    pub fn adjust_rest_time(&mut self, delta_secs: i64) -> Vec<Event> {
        if self.state != SessionState::Resting {
            debug!(state = ?self.state, "adjust_rest_time outside rest ignored");
            return Vec::new();
        }
        let now = self.clock.now_ms();
        match self.rest.adjust_time(delta_secs, now) {
            Some(remaining_secs) => vec![Event::RestAdjusted {
                remaining_secs,
                at: self.clock.now_utc(),
            }],
            None => Vec::new(),
        }
    }

    /// End the rest period now. The rest still finishes through the normal
    /// expiry path on the tick run here.
    pub fn skip_rest(&mut self) -> Vec<Event> {
        if self.state != SessionState::Resting {
            debug!(state = ?self.state, "skip_rest outside rest ignored");
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.rest.skip(now);
        self.tick()
    }

    /// Finish the workout. Valid from `InProgress` or `Resting`.
    pub fn complete(&mut self) -> Option<SessionOutcome> {
        if !matches!(self.state, SessionState::InProgress | SessionState::Resting) {
            debug!(state = ?self.state, "complete ignored");
            return None;
        }
        let record = self.teardown(SessionState::Completed);
        let event = Event::SessionCompleted {
            record_id: record.id.clone(),
            completion_pct: record.completion_percentage,
            duration_secs: record.duration,
            at: record.date,
        };
        Some(SessionOutcome { record, event })
    }

    /// Open the quit prompt. Repeated attempts while it is open are
    /// suppressed so the prompt cannot be dismissed by repetition.
    pub fn request_quit(&mut self) -> Vec<Event> {
        match self.state {
            SessionState::InProgress | SessionState::Resting => {
                self.resume_state = Some(self.state);
                self.state = SessionState::QuitConfirmPending;
                vec![Event::QuitPromptOpened {
                    completion_pct: self.completion_percentage(),
                    at: self.clock.now_utc(),
                }]
            }
            SessionState::QuitConfirmPending => {
                vec![Event::NavigationSuppressed {
                    at: self.clock.now_utc(),
                }]
            }
            SessionState::Completed | SessionState::Quit => Vec::new(),
        }
    }

    /// Every attempt to leave an active session goes through the prompt.
    pub fn intercept_navigation(&mut self) -> Navigation {
        if !self.is_active() {
            return Navigation::Allowed;
        }
        Navigation::Blocked {
            events: self.request_quit(),
        }
    }

    pub fn cancel_quit_prompt(&mut self) -> Vec<Event> {
        if self.state != SessionState::QuitConfirmPending {
            return Vec::new();
        }
        let resumed = self.resume_state.take().unwrap_or(SessionState::InProgress);
        self.state = resumed;
        vec![Event::QuitPromptCancelled {
            resumed,
            at: self.clock.now_utc(),
        }]
    }

    /// Leave the workout. Partial progress is recorded like a completion.
    pub fn confirm_quit(&mut self) -> Option<SessionOutcome> {
        if self.state != SessionState::QuitConfirmPending {
            debug!(state = ?self.state, "confirm_quit without open prompt ignored");
            return None;
        }
        let record = self.teardown(SessionState::Quit);
        let event = Event::SessionQuit {
            record_id: record.id.clone(),
            completion_pct: record.completion_percentage,
            duration_secs: record.duration,
            at: record.date,
        };
        Some(SessionOutcome { record, event })
    }

    // ── Platform callbacks ───────────────────────────────────────────

    pub fn handle_lifecycle(&mut self, signal: LifecycleSignal) {
        if !self.is_active() {
            return;
        }
        let now = self.clock.now_ms();
        self.wake_lock.handle_signal(signal, now);
    }

    pub fn notify_wake_lock_released(&mut self) {
        self.wake_lock.notify_released();
    }

    /// Advance every timer. Call periodically (sub-second).
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.is_active() {
            self.late_ticks += 1;
            error!(
                state = ?self.state,
                late_ticks = self.late_ticks,
                "tick delivered to a finished session; a timer outlived teardown"
            );
            return Vec::new();
        }
        let now = self.clock.now_ms();
        self.elapsed.tick(now);

        let mut events = Vec::new();
        if self.rest.tick(now).is_some() {
            events.extend(self.end_rest());
        }
        for change in self.progression.tick(now) {
            events.extend(self.apply_change(change, now));
        }
        self.wake_lock.tick(now);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn accepts_actions(&self, action: &str) -> bool {
        let accepted = matches!(self.state, SessionState::InProgress | SessionState::Resting);
        if !accepted {
            debug!(action, state = ?self.state, "action ignored in current state");
        }
        accepted
    }

    fn apply_change(&mut self, change: ProgressionChange, now_ms: u64) -> Vec<Event> {
        let at = self.clock.now_utc();
        let completion_pct = self.completion_percentage();
        match change {
            ProgressionChange::Completed {
                occurrence,
                index,
                source,
            } => {
                let mut events = vec![Event::ExerciseCompleted {
                    occurrence,
                    index,
                    auto: source == CompletionSource::Timer,
                    completion_pct,
                    at,
                }];
                events.push(self.enter_rest(now_ms));
                events
            }
            ProgressionChange::Reopened { occurrence, index } => vec![Event::ExerciseReopened {
                occurrence,
                index,
                completion_pct,
                at,
            }],
        }
    }

    fn enter_rest(&mut self, now_ms: u64) -> Event {
        let duration_secs = self.config.rest_seconds;
        self.rest.start(duration_secs, now_ms);
        self.set_effective_state(SessionState::Resting);
        debug!(duration_secs, "rest started");
        Event::RestStarted {
            duration_secs,
            at: self.clock.now_utc(),
        }
    }

    fn end_rest(&mut self) -> Vec<Event> {
        let advanced_to = if self.progression.is_last() {
            None
        } else {
            self.progression.advance_next();
            Some(self.progression.current_index())
        };
        self.set_effective_state(SessionState::InProgress);
        debug!(?advanced_to, "rest ended");
        let mut events = vec![Event::RestEnded {
            advanced_to,
            at: self.clock.now_utc(),
        }];
        if advanced_to.is_some() {
            events.push(self.current_changed_event());
        }
        events
    }

    /// Rest transitions land underneath an open quit prompt.
    fn set_effective_state(&mut self, state: SessionState) {
        if self.state == SessionState::QuitConfirmPending {
            self.resume_state = Some(state);
        } else {
            self.state = state;
        }
    }

    fn current_changed_event(&self) -> Event {
        let current = self.progression.current();
        Event::CurrentExerciseChanged {
            index: self.progression.current_index(),
            occurrence: current.occurrence.clone(),
            at: self.clock.now_utc(),
        }
    }

    /// Cancel every timer and listener, then snapshot the record.
    fn teardown(&mut self, terminal: SessionState) -> WorkoutRecord {
        let now = self.clock.now_ms();
        self.progression.stop_timers();
        self.rest.stop();
        let final_elapsed = self.elapsed.stop(now);
        self.wake_lock.disengage();
        self.state = terminal;
        self.resume_state = None;
        debug!(?terminal, final_elapsed, "session torn down");
        WorkoutRecordBuilder::build(self, final_elapsed)
    }
}

impl std::fmt::Debug for WorkoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutSession")
            .field("template_name", &self.template_name)
            .field("state", &self.state)
            .field("current_index", &self.progression.current_index())
            .field("elapsed_secs", &self.elapsed.elapsed_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::ExerciseSpec;
    use crate::timer::ManualClock;

    const T0: u64 = 1_700_000_000_000;

    fn session_with_clock() -> (WorkoutSession, ManualClock) {
        let clock = ManualClock::new(T0);
        let template = WorkoutTemplate::new(
            "Upper",
            vec![
                ExerciseSpec::reps("pu", "Pull-up", 8),
                ExerciseSpec::reps("dip", "Dip", 10),
                ExerciseSpec::timed("hang", "Dead hang", 20),
            ],
            1,
        );
        let options = SessionOptions {
            clock: Box::new(clock.clone()),
            ..SessionOptions::default()
        };
        (WorkoutSession::start(&template, options).unwrap(), clock)
    }

    fn id(spec: &str) -> OccurrenceId {
        OccurrenceId::new(spec, 1)
    }

    #[test]
    fn starts_in_progress_at_first_exercise() {
        let (session, _clock) = session_with_clock();
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.rest_remaining_secs(), None);
        assert!(matches!(session.started_event(), Event::SessionStarted { occurrences: 3, .. }));
    }

    #[test]
    fn rejects_empty_template() {
        let template = WorkoutTemplate::new("Empty", vec![], 1);
        assert!(WorkoutSession::start(&template, SessionOptions::default()).is_err());
    }

    #[test]
    fn completion_enters_rest() {
        let (mut session, _clock) = session_with_clock();
        let events = session.toggle_complete(&id("pu"));
        assert!(matches!(events[0], Event::ExerciseCompleted { auto: false, .. }));
        assert!(matches!(events[1], Event::RestStarted { duration_secs: 60, .. }));
        assert_eq!(session.state(), SessionState::Resting);
        assert_eq!(session.rest_remaining_secs(), Some(60));
    }

    #[test]
    fn reopening_does_not_restart_rest() {
        let (mut session, clock) = session_with_clock();
        session.toggle_complete(&id("pu"));
        clock.advance_secs(10);
        session.tick();
        let events = session.toggle_complete(&id("pu"));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::ExerciseReopened { .. }));
        assert_eq!(session.rest_remaining_secs(), Some(50));
    }

    #[test]
    fn natural_rest_expiry_advances() {
        let (mut session, clock) = session_with_clock();
        session.toggle_complete(&id("pu"));
        clock.advance_secs(60);
        let events = session.tick();
        assert!(matches!(events[0], Event::RestEnded { advanced_to: Some(1), .. }));
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn rest_adjustment_and_warning() {
        let (mut session, clock) = session_with_clock();
        session.toggle_complete(&id("pu"));
        assert!(!session.rest_warning());
        let events = session.adjust_rest_time(-56);
        assert!(matches!(events[0], Event::RestAdjusted { remaining_secs: 4, .. }));
        assert!(session.rest_warning());
        session.adjust_rest_time(10);
        assert_eq!(session.rest_remaining_secs(), Some(14));
        clock.advance_secs(14);
        assert!(!session.tick().is_empty());
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[test]
    fn rest_adjust_outside_rest_is_noop() {
        let (mut session, _clock) = session_with_clock();
        assert!(session.adjust_rest_time(10).is_empty());
        assert!(session.skip_rest().is_empty());
    }

    #[test]
    fn advance_to_emits_only_on_change() {
        let (mut session, _clock) = session_with_clock();
        assert!(session.advance_to(0).is_empty());
        assert!(session.advance_to(7).is_empty());
        assert_eq!(session.advance_to(2).len(), 1);
        assert_eq!(session.current_index(), 2);
        assert!(session.next_exercise().is_empty());
    }

    #[test]
    fn quit_prompt_blocks_actions_and_repeated_navigation() {
        let (mut session, _clock) = session_with_clock();
        let Navigation::Blocked { events } = session.intercept_navigation() else {
            panic!("expected navigation to be blocked");
        };
        assert!(matches!(events[0], Event::QuitPromptOpened { .. }));
        assert_eq!(session.state(), SessionState::QuitConfirmPending);

        let Navigation::Blocked { events } = session.intercept_navigation() else {
            panic!("expected navigation to be blocked");
        };
        assert!(matches!(events[0], Event::NavigationSuppressed { .. }));
        assert_eq!(session.state(), SessionState::QuitConfirmPending);

        assert!(session.toggle_complete(&id("pu")).is_empty());
        assert!(session.complete().is_none());
    }

    #[test]
    fn cancel_returns_to_resting_with_timer_intact() {
        let (mut session, clock) = session_with_clock();
        session.toggle_complete(&id("pu"));
        clock.advance_secs(5);
        session.request_quit();
        clock.advance_secs(5);
        session.tick();
        let events = session.cancel_quit_prompt();
        assert!(matches!(
            events[0],
            Event::QuitPromptCancelled { resumed: SessionState::Resting, .. }
        ));
        assert_eq!(session.rest_remaining_secs(), Some(50));
        assert_eq!(session.elapsed_secs(), 10);
    }

    #[test]
    fn rest_ending_under_prompt_resumes_in_progress() {
        let (mut session, clock) = session_with_clock();
        session.toggle_complete(&id("pu"));
        session.request_quit();
        clock.advance_secs(60);
        session.tick();
        assert_eq!(session.state(), SessionState::QuitConfirmPending);
        assert_eq!(session.current_index(), 1);
        session.cancel_quit_prompt();
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[test]
    fn complete_tears_down_everything() {
        let (mut session, clock) = session_with_clock();
        session.start_exercise_timer(&id("hang"));
        session.toggle_complete(&id("pu"));
        assert_eq!(session.running_timer_count(), 2);
        clock.advance_secs(42);
        let outcome = session.complete().unwrap();
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.running_timer_count(), 0);
        assert!(!session.wake_lock().is_engaged());
        assert_eq!(outcome.record.duration, 42);
        assert!((outcome.record.completion_percentage - 100.0 / 3.0).abs() < 1e-9);
        assert!(matches!(outcome.event, Event::SessionCompleted { .. }));
        assert!(session.complete().is_none());
    }

    #[test]
    fn tick_after_teardown_is_counted() {
        let (mut session, _clock) = session_with_clock();
        session.complete();
        assert!(session.tick().is_empty());
        assert_eq!(session.late_tick_count(), 1);
        assert_eq!(session.intercept_navigation(), Navigation::Allowed);
    }

    #[test]
    fn confirm_quit_requires_prompt() {
        let (mut session, _clock) = session_with_clock();
        assert!(session.confirm_quit().is_none());
        session.request_quit();
        let outcome = session.confirm_quit().unwrap();
        assert_eq!(session.state(), SessionState::Quit);
        assert!(matches!(outcome.event, Event::SessionQuit { .. }));
    }

    #[test]
    fn snapshot_projects_current_state() {
        let (mut session, _clock) = session_with_clock();
        session.toggle_complete(&id("pu"));
        match session.snapshot() {
            Event::StateSnapshot {
                state,
                exercises,
                rest_remaining_secs,
                completion_pct,
                ..
            } => {
                assert_eq!(state, SessionState::Resting);
                assert_eq!(exercises.len(), 3);
                assert!(exercises[0].completed && exercises[0].current);
                assert_eq!(exercises[2].remaining_secs, Some(20));
                assert_eq!(rest_remaining_secs, Some(60));
                assert!(completion_pct > 33.0 && completion_pct < 34.0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
