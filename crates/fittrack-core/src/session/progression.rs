//! Exercise progression: completion flags, the current exercise and the
//! per-occurrence countdowns of time-kind exercises.
//!
//! This component never starts rest periods itself. Completion changes are
//! returned as [`ProgressionChange`] values and the lifecycle controller
//! decides what they mean.

use std::collections::HashMap;

use tracing::debug;

use super::model::{OccurrenceId, SessionExercise};
use crate::error::ValidationError;
use crate::timer::TimerEngine;

/// How an occurrence became complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    /// User toggled it.
    Manual,
    /// Its countdown expired.
    Timer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionChange {
    /// false -> true transition. The only change that starts a rest period.
    Completed {
        occurrence: OccurrenceId,
        index: usize,
        source: CompletionSource,
    },
    /// true -> false transition.
    Reopened {
        occurrence: OccurrenceId,
        index: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ExerciseProgression {
    exercises: Vec<SessionExercise>,
    current_index: usize,
    timers: HashMap<OccurrenceId, TimerEngine>,
}

impl ExerciseProgression {
    /// Zero occurrences is a precondition violation: completion percentage
    /// would be undefined.
    pub fn new(exercises: Vec<SessionExercise>) -> Result<Self, ValidationError> {
        if exercises.is_empty() {
            return Err(ValidationError::EmptyCollection(
                "a session needs at least one exercise".into(),
            ));
        }
        Ok(Self {
            exercises,
            current_index: 0,
            timers: HashMap::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn exercises(&self) -> &[SessionExercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &SessionExercise {
        &self.exercises[self.current_index]
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.exercises.len()
    }

    pub fn completed_count(&self) -> usize {
        self.exercises.iter().filter(|e| e.completed).count()
    }

    /// Always derived from the flags, never cached.
    pub fn completion_percentage(&self) -> f64 {
        completion_percentage(&self.exercises)
    }

    pub fn index_of(&self, occurrence: &OccurrenceId) -> Option<usize> {
        self.exercises.iter().position(|e| &e.occurrence == occurrence)
    }

    pub fn timer_running(&self, occurrence: &OccurrenceId) -> bool {
        self.timers.get(occurrence).is_some_and(TimerEngine::is_running)
    }

    pub fn running_timer_count(&self) -> usize {
        self.timers.values().filter(|t| t.is_running()).count()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Flip an occurrence's completed flag. Unknown ids are a no-op.
    pub fn toggle_complete(&mut self, occurrence: &OccurrenceId) -> Option<ProgressionChange> {
        let Some(index) = self.index_of(occurrence) else {
            debug!(%occurrence, "toggle for unknown occurrence ignored");
            return None;
        };
        if self.exercises[index].completed {
            self.exercises[index].completed = false;
            Some(ProgressionChange::Reopened {
                occurrence: occurrence.clone(),
                index,
            })
        } else {
            self.set_completed(index, CompletionSource::Manual)
        }
    }

    /// Jump to `index`. Out-of-range indexes leave the state untouched.
    pub fn advance_to(&mut self, index: usize) -> bool {
        if index >= self.exercises.len() {
            debug!(index, len = self.exercises.len(), "advance_to out of bounds ignored");
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn advance_next(&mut self) -> bool {
        self.advance_to(self.current_index + 1)
    }

    /// Start the countdown of a time-kind occurrence.
    ///
    /// Ignored for reps exercises, completed occurrences, exhausted
    /// countdowns and timers already running. A restarted countdown resumes
    /// from the remaining seconds.
    pub fn start_exercise_timer(&mut self, occurrence: &OccurrenceId, now_ms: u64) -> Option<u64> {
        let index = self.index_of(occurrence)?;
        let exercise = &self.exercises[index];
        if !exercise.is_timed() || exercise.completed || self.timer_running(occurrence) {
            debug!(%occurrence, "exercise timer start ignored");
            return None;
        }
        let remaining = exercise.remaining_seconds.filter(|s| *s > 0)?;
        self.timers
            .entry(occurrence.clone())
            .or_default()
            .start(remaining, now_ms);
        Some(remaining)
    }

    /// Advance every running exercise countdown. Expired countdowns complete
    /// their occurrence through the same path as a manual toggle; an
    /// occurrence that is already complete is left alone.
    pub fn tick(&mut self, now_ms: u64) -> Vec<ProgressionChange> {
        let mut expired = Vec::new();
        for (occurrence, timer) in self.timers.iter_mut() {
            let fired = timer.tick(now_ms);
            if let Some(exercise) = self
                .exercises
                .iter_mut()
                .find(|e| &e.occurrence == occurrence)
            {
                exercise.remaining_seconds = Some(timer.remaining_secs());
            }
            if fired.is_some() {
                expired.push(occurrence.clone());
            }
        }
        expired.sort();

        let mut changes = Vec::new();
        for occurrence in expired {
            self.timers.remove(&occurrence);
            if let Some(index) = self.index_of(&occurrence) {
                if let Some(change) = self.set_completed(index, CompletionSource::Timer) {
                    changes.push(change);
                }
            }
        }
        changes
    }

    /// Cancel every exercise countdown. Required on teardown.
    pub fn stop_timers(&mut self) {
        for timer in self.timers.values_mut() {
            timer.stop();
        }
        self.timers.clear();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_completed(&mut self, index: usize, source: CompletionSource) -> Option<ProgressionChange> {
        let exercise = &mut self.exercises[index];
        if exercise.completed {
            return None;
        }
        exercise.completed = true;
        let occurrence = exercise.occurrence.clone();
        // A manual completion makes a running countdown meaningless.
        if let Some(mut timer) = self.timers.remove(&occurrence) {
            timer.stop();
        }
        Some(ProgressionChange::Completed {
            occurrence,
            index,
            source,
        })
    }
}

/// `completed / total * 100`, or 0 for an empty slice.
pub fn completion_percentage(exercises: &[SessionExercise]) -> f64 {
    if exercises.is_empty() {
        return 0.0;
    }
    let completed = exercises.iter().filter(|e| e.completed).count();
    completed as f64 / exercises.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::{ExerciseSpec, WorkoutTemplate};

    const T0: u64 = 1_700_000_000_000;

    fn progression() -> ExerciseProgression {
        let template = WorkoutTemplate::new(
            "Mixed",
            vec![
                ExerciseSpec::reps("sq", "Squat", 10),
                ExerciseSpec::timed("pl", "Plank", 30),
            ],
            2,
        );
        ExerciseProgression::new(template.expand().unwrap()).unwrap()
    }

    #[test]
    fn rejects_empty_exercise_list() {
        assert!(ExerciseProgression::new(Vec::new()).is_err());
    }

    #[test]
    fn toggle_emits_completed_then_reopened() {
        let mut p = progression();
        let id = OccurrenceId::new("sq", 1);
        assert!(matches!(
            p.toggle_complete(&id),
            Some(ProgressionChange::Completed { index: 0, source: CompletionSource::Manual, .. })
        ));
        assert_eq!(p.completion_percentage(), 25.0);
        assert!(matches!(
            p.toggle_complete(&id),
            Some(ProgressionChange::Reopened { index: 0, .. })
        ));
        assert_eq!(p.completed_count(), 0);
    }

    #[test]
    fn sets_complete_independently() {
        let mut p = progression();
        p.toggle_complete(&OccurrenceId::new("sq", 2));
        assert!(!p.exercises()[0].completed);
        assert!(p.exercises()[2].completed);
    }

    #[test]
    fn unknown_occurrence_is_noop() {
        let mut p = progression();
        assert!(p.toggle_complete(&OccurrenceId::new("sq", 9)).is_none());
        assert_eq!(p.completed_count(), 0);
    }

    #[test]
    fn advance_to_out_of_bounds_is_noop() {
        let mut p = progression();
        assert!(p.advance_to(3));
        assert!(!p.advance_to(4));
        assert_eq!(p.current_index(), 3);
        assert!(!p.advance_next());
        assert!(p.is_last());
    }

    #[test]
    fn timer_only_starts_for_time_kind() {
        let mut p = progression();
        assert!(p.start_exercise_timer(&OccurrenceId::new("sq", 1), T0).is_none());
        assert_eq!(p.start_exercise_timer(&OccurrenceId::new("pl", 1), T0), Some(30));
        // Second start while running is ignored.
        assert!(p.start_exercise_timer(&OccurrenceId::new("pl", 1), T0).is_none());
    }

    #[test]
    fn expired_timer_auto_completes() {
        let mut p = progression();
        let id = OccurrenceId::new("pl", 1);
        p.start_exercise_timer(&id, T0);
        assert!(p.tick(T0 + 10_000).is_empty());
        assert_eq!(p.exercises()[1].remaining_seconds, Some(20));
        let changes = p.tick(T0 + 30_000);
        assert_eq!(
            changes,
            vec![ProgressionChange::Completed {
                occurrence: id.clone(),
                index: 1,
                source: CompletionSource::Timer,
            }]
        );
        assert_eq!(p.exercises()[1].remaining_seconds, Some(0));
        assert_eq!(p.running_timer_count(), 0);
    }

    #[test]
    fn manual_completion_cancels_countdown() {
        let mut p = progression();
        let id = OccurrenceId::new("pl", 1);
        p.start_exercise_timer(&id, T0);
        assert!(p.toggle_complete(&id).is_some());
        assert!(!p.timer_running(&id));
        assert!(p.tick(T0 + 60_000).is_empty());
        assert!(p.exercises()[1].completed);
    }

    #[test]
    fn reopened_timed_exercise_resumes_remaining() {
        let mut p = progression();
        let id = OccurrenceId::new("pl", 1);
        p.start_exercise_timer(&id, T0);
        p.tick(T0 + 12_000);
        p.toggle_complete(&id);
        p.toggle_complete(&id);
        assert_eq!(p.start_exercise_timer(&id, T0 + 20_000), Some(18));
    }

    #[test]
    fn stop_timers_cancels_everything() {
        let mut p = progression();
        p.start_exercise_timer(&OccurrenceId::new("pl", 1), T0);
        p.start_exercise_timer(&OccurrenceId::new("pl", 2), T0);
        p.stop_timers();
        assert_eq!(p.running_timer_count(), 0);
        assert!(p.tick(T0 + 100_000).is_empty());
    }
}
