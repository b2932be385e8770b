//! Active-workout session engine.

mod lifecycle;
mod model;
mod progression;

pub use lifecycle::{Navigation, SessionOptions, SessionOutcome, SessionState, WorkoutSession};
pub use model::{ExerciseKind, ExerciseSpec, OccurrenceId, SessionExercise, WorkoutTemplate};
pub use progression::{
    completion_percentage, CompletionSource, ExerciseProgression, ProgressionChange,
};
