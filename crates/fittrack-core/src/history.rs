//! Workout history statistics for the progress view.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::record::WorkoutRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_workouts: usize,
    pub this_month: usize,
    /// Consecutive days with a workout, ending today or yesterday.
    pub current_streak_days: u32,
    pub average_completion_pct: f64,
    pub total_duration_secs: u64,
    pub last_workout_at: Option<DateTime<Utc>>,
}

impl HistoryStats {
    /// Days and months are counted in `tz`, the zone `today` belongs to.
    pub fn from_records<Tz: TimeZone>(records: &[WorkoutRecord], today: NaiveDate, tz: &Tz) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let local_day = |r: &WorkoutRecord| r.date.with_timezone(tz).date_naive();
        let this_month = records
            .iter()
            .map(local_day)
            .filter(|d| d.year() == today.year() && d.month() == today.month())
            .count();
        let average_completion_pct =
            records.iter().map(|r| r.completion_percentage).sum::<f64>() / records.len() as f64;
        let days: BTreeSet<NaiveDate> = records.iter().map(local_day).collect();

        Self {
            total_workouts: records.len(),
            this_month,
            current_streak_days: streak(&days, today),
            average_completion_pct,
            total_duration_secs: records.iter().map(|r| r.duration).sum(),
            last_workout_at: records.iter().map(|r| r.date).max(),
        }
    }
}

fn streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };
    let mut count = 0;
    while days.contains(&cursor) {
        count += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    count
}
