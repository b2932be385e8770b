//! SQLite-based workout storage.
//!
//! Provides persistent storage for:
//! - Finished workout records (history)
//! - Workout templates started by the session engine
//! - Key-value store for profile and reminder settings

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::profile::{NotificationSettings, UserProfile};
use crate::record::WorkoutRecord;
use crate::session::WorkoutTemplate;

const PROFILE_KEY: &str = "user_profile";
const NOTIFICATIONS_KEY: &str = "notification_settings";

/// Source of routines a session can be started from.
pub trait TemplateStore {
    fn template(&self, name: &str) -> Result<Option<WorkoutTemplate>>;
    fn templates(&self) -> Result<Vec<WorkoutTemplate>>;
}

/// Durable sink for finished workouts, read back by history views.
pub trait WorkoutStore {
    fn append_workout(&self, record: &WorkoutRecord) -> Result<()>;
    fn workouts(&self) -> Result<Vec<WorkoutRecord>>;
}

/// SQLite database for workout storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/fittrack/fittrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("fittrack.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workouts (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                date            TEXT NOT NULL,
                duration_secs   INTEGER NOT NULL,
                completion_pct  REAL NOT NULL,
                completed       INTEGER NOT NULL,
                exercises_json  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS templates (
                name        TEXT PRIMARY KEY,
                body_json   TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date);",
        )?;
        Ok(())
    }

    // ── Workouts ─────────────────────────────────────────────────────

    /// Newest first.
    pub fn recent_workouts(&self, limit: usize) -> Result<Vec<WorkoutRecord>> {
        self.query_workouts(
            "SELECT id, name, date, duration_secs, completion_pct, completed, exercises_json
             FROM workouts ORDER BY date DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    pub fn delete_workout(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    fn query_workouts(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<WorkoutRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, name, date, duration, completion_percentage, completed, exercises_json) = row?;
            let date = DateTime::parse_from_rfc3339(&date)
                .map_err(|e| corrupt("workouts", format!("{id}: bad date: {e}")))?
                .with_timezone(&Utc);
            let exercises = serde_json::from_str(&exercises_json)
                .map_err(|e| corrupt("workouts", format!("{id}: bad exercises: {e}")))?;
            records.push(WorkoutRecord {
                id,
                name,
                exercises,
                date,
                duration: duration.max(0) as u64,
                completion_percentage,
                completed,
            });
        }
        Ok(records)
    }

    // ── Templates ────────────────────────────────────────────────────

    /// Insert or replace a template by name. Invalid templates are refused.
    pub fn save_template(&self, template: &WorkoutTemplate) -> Result<()> {
        template.validate()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO templates (name, body_json, updated_at) VALUES (?1, ?2, ?3)",
            params![
                template.name,
                serde_json::to_string(template)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        debug!(name = %template.name, "template saved");
        Ok(())
    }

    // ── Profile & reminders ──────────────────────────────────────────

    pub fn load_profile(&self) -> Result<Option<UserProfile>> {
        self.kv_get_json(PROFILE_KEY)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.kv_set_json(PROFILE_KEY, profile)
    }

    /// Stored reminder settings, or the defaults when none were saved.
    pub fn load_notification_settings(&self) -> Result<NotificationSettings> {
        Ok(self.kv_get_json(NOTIFICATIONS_KEY)?.unwrap_or_default())
    }

    pub fn save_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        settings.validate()?;
        self.kv_set_json(NOTIFICATIONS_KEY, settings)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv_get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.kv_set(key, &serde_json::to_string(value)?)
    }
}

impl WorkoutStore for Database {
    fn append_workout(&self, record: &WorkoutRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO workouts (id, name, date, duration_secs, completion_pct, completed, exercises_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.name,
                record.date.to_rfc3339(),
                record.duration as i64,
                record.completion_percentage,
                record.completed,
                serde_json::to_string(&record.exercises)?,
            ],
        )?;
        debug!(id = %record.id, name = %record.name, "workout appended");
        Ok(())
    }

    /// Oldest first.
    fn workouts(&self) -> Result<Vec<WorkoutRecord>> {
        self.query_workouts(
            "SELECT id, name, date, duration_secs, completion_pct, completed, exercises_json
             FROM workouts ORDER BY date ASC",
            [],
        )
    }
}

impl TemplateStore for Database {
    fn template(&self, name: &str) -> Result<Option<WorkoutTemplate>> {
        let body = self
            .conn
            .query_row(
                "SELECT body_json FROM templates WHERE name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match body {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn templates(&self) -> Result<Vec<WorkoutTemplate>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body_json FROM templates ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut templates = Vec::new();
        for row in rows {
            templates.push(serde_json::from_str(&row?)?);
        }
        Ok(templates)
    }
}

fn corrupt(table: &str, message: String) -> DatabaseError {
    DatabaseError::CorruptRow {
        table: table.to_string(),
        message,
    }
}
