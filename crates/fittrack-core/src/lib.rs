//! # FitTrack Core Library
//!
//! This library provides the core logic of the FitTrack workout tracker.
//! The CLI binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: wall-clock anchored countdowns and an elapsed-time
//!   counter; the caller periodically invokes `tick()`
//! - **Session**: the active-workout state machine (progression, rest
//!   periods, quit confirmation, teardown)
//! - **Wake Lock**: best-effort display wake lock behind a provider trait
//! - **Storage**: SQLite workout history and templates, TOML configuration
//!
//! ## Key Components
//!
//! - [`WorkoutSession`]: Active workout state machine
//! - [`TimerEngine`]: Countdown primitive
//! - [`WorkoutRecordBuilder`]: Session to history record
//! - [`Database`]: Template and workout persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod history;
pub mod profile;
pub mod record;
pub mod session;
pub mod storage;
pub mod timer;
pub mod wake_lock;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{Event, OccurrenceView};
pub use history::HistoryStats;
pub use profile::{BmiCategory, NotificationSettings, UserProfile, Weekday};
pub use record::{WorkoutRecord, WorkoutRecordBuilder};
pub use session::{
    ExerciseKind, ExerciseSpec, Navigation, OccurrenceId, SessionExercise, SessionOptions,
    SessionOutcome, SessionState, WorkoutSession, WorkoutTemplate,
};
pub use storage::{Config, Database, SessionConfig, TemplateStore, WakeLockConfig, WorkoutStore};
pub use timer::{Clock, ManualClock, Stopwatch, SystemClock, TimerEngine, TimerState};
pub use wake_lock::{LifecycleSignal, NoopWakeLock, WakeLockCoordinator, WakeLockError, WakeLockProvider};
