//! Workout records: the immutable value a finished session leaves behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{completion_percentage, SessionExercise, WorkoutSession};

/// A finished (or abandoned) workout as persisted by the workout store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    pub name: String,
    pub exercises: Vec<SessionExercise>,
    pub date: DateTime<Utc>,
    /// Elapsed seconds at the moment the session ended.
    pub duration: u64,
    pub completion_percentage: f64,
    pub completed: bool,
}

impl WorkoutRecord {
    pub fn completed_exercise_count(&self) -> usize {
        self.exercises.iter().filter(|e| e.completed).count()
    }
}

pub struct WorkoutRecordBuilder;

impl WorkoutRecordBuilder {
    /// Snapshot `session` into a record. Completion is recomputed from the
    /// final flags here rather than taken from any earlier reading.
    ///
    /// A quit produces the same shape as a completion: `completed` is true
    /// and the percentage tells how far the user got.
    pub fn build(session: &WorkoutSession, final_elapsed_secs: u64) -> WorkoutRecord {
        let exercises = session.exercises().to_vec();
        WorkoutRecord {
            id: Uuid::new_v4().to_string(),
            name: session.template_name().to_string(),
            completion_percentage: completion_percentage(&exercises),
            exercises,
            date: session.started_at() + chrono::Duration::seconds(final_elapsed_secs as i64),
            duration: final_elapsed_secs,
            completed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ExerciseSpec, OccurrenceId, SessionOptions, WorkoutTemplate};
    use crate::timer::ManualClock;

    #[test]
    fn build_snapshots_without_mutating() {
        let clock = ManualClock::new(1_700_000_000_000);
        let template = WorkoutTemplate::new(
            "Core",
            vec![ExerciseSpec::reps("cr", "Crunch", 20), ExerciseSpec::timed("pl", "Plank", 60)],
            2,
        );
        let mut session = WorkoutSession::start(
            &template,
            SessionOptions {
                clock: Box::new(clock.clone()),
                ..SessionOptions::default()
            },
        )
        .unwrap();
        session.toggle_complete(&OccurrenceId::new("cr", 1));
        let before = session.exercises().to_vec();

        let record = WorkoutRecordBuilder::build(&session, 125);

        assert_eq!(session.exercises(), before.as_slice());
        assert_eq!(record.name, "Core");
        assert_eq!(record.duration, 125);
        assert_eq!(record.exercises.len(), 4);
        assert_eq!(record.completed_exercise_count(), 1);
        assert_eq!(record.completion_percentage, 25.0);
        assert!(record.completed);
        assert_eq!(
            record.date.timestamp_millis(),
            1_700_000_000_000 + 125_000
        );
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn record_json_uses_camel_case() {
        let record = WorkoutRecord {
            id: "r1".into(),
            name: "Legs".into(),
            exercises: vec![],
            date: Utc::now(),
            duration: 30,
            completion_percentage: 50.0,
            completed: true,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["completionPercentage"], 50.0);
        assert!(json.get("completion_percentage").is_none());
    }
}
