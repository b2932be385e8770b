//! Exercise and template data model.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    /// Target is a repetition count.
    Reps,
    /// Target is a duration in seconds.
    Time,
}

/// Immutable exercise definition sourced from a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSpec {
    pub id: String,
    pub name: String,
    /// Repetitions for `Reps`, seconds for `Time`.
    pub target_value: u32,
    pub kind: ExerciseKind,
    #[serde(default)]
    pub target_muscles: BTreeSet<String>,
    #[serde(default)]
    pub media_ref: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExerciseSpec {
    pub fn reps(id: &str, name: &str, reps: u32) -> Self {
        Self::with_kind(id, name, reps, ExerciseKind::Reps)
    }

    pub fn timed(id: &str, name: &str, seconds: u32) -> Self {
        Self::with_kind(id, name, seconds, ExerciseKind::Time)
    }

    fn with_kind(id: &str, name: &str, target_value: u32, kind: ExerciseKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target_value,
            kind,
            target_muscles: BTreeSet::new(),
            media_ref: None,
            description: None,
        }
    }
}

/// Identity of one exercise occurrence: the exercise id plus its 1-based set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceId {
    pub spec_id: String,
    pub set: u32,
}

impl OccurrenceId {
    pub fn new(spec_id: &str, set: u32) -> Self {
        Self {
            spec_id: spec_id.to_string(),
            set,
        }
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.spec_id, self.set)
    }
}

/// Mutable per-session wrapper around an [`ExerciseSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExercise {
    pub occurrence: OccurrenceId,
    pub spec: ExerciseSpec,
    pub completed: bool,
    /// Countdown seconds left (time-kind exercises only).
    #[serde(default)]
    pub remaining_seconds: Option<u64>,
}

impl SessionExercise {
    pub fn new(spec: ExerciseSpec, set: u32) -> Self {
        let remaining_seconds = match spec.kind {
            ExerciseKind::Time => Some(u64::from(spec.target_value)),
            ExerciseKind::Reps => None,
        };
        Self {
            occurrence: OccurrenceId::new(&spec.id, set),
            spec,
            completed: false,
            remaining_seconds,
        }
    }

    pub fn is_timed(&self) -> bool {
        self.spec.kind == ExerciseKind::Time
    }
}

fn default_set_count() -> u32 {
    1
}

/// A routine as provided by the template store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTemplate {
    pub name: String,
    pub exercises: Vec<ExerciseSpec>,
    #[serde(default = "default_set_count", alias = "numberOfSets")]
    pub set_count: u32,
}

impl WorkoutTemplate {
    pub fn new(name: &str, exercises: Vec<ExerciseSpec>, set_count: u32) -> Self {
        Self {
            name: name.to_string(),
            exercises,
            set_count,
        }
    }

    /// Reject templates that cannot produce a session.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::invalid("name", "template name is empty"));
        }
        if self.exercises.is_empty() {
            return Err(ValidationError::EmptyCollection(format!(
                "template '{}' has no exercises",
                self.name
            )));
        }
        if self.set_count < 1 {
            return Err(ValidationError::invalid("setCount", "must be at least 1"));
        }
        let mut seen = HashSet::new();
        for exercise in &self.exercises {
            if !seen.insert(exercise.id.as_str()) {
                return Err(ValidationError::DuplicateId {
                    kind: "exercise".into(),
                    id: exercise.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Set multiplication: one full pass over the exercises per set.
    pub fn expand(&self) -> Result<Vec<SessionExercise>, ValidationError> {
        self.validate()?;
        let occurrences = (1..=self.set_count)
            .flat_map(|set| {
                self.exercises
                    .iter()
                    .map(move |spec| SessionExercise::new(spec.clone(), set))
            })
            .collect();
        Ok(occurrences)
    }
}
