//! User profile (body measurements) and workout reminder settings.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::NormalWeight
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Centimeters.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
    #[serde(default)]
    pub bmi: Option<f64>,
    #[serde(default)]
    pub bmi_category: Option<BmiCategory>,
}

impl UserProfile {
    /// Build a profile and derive its BMI.
    pub fn new(height_cm: f64, weight_kg: f64) -> Result<Self, ValidationError> {
        if !(height_cm.is_finite() && height_cm > 0.0) {
            return Err(ValidationError::invalid("height", "must be a positive number of centimeters"));
        }
        if !(weight_kg.is_finite() && weight_kg > 0.0) {
            return Err(ValidationError::invalid("weight", "must be a positive number of kilograms"));
        }
        let bmi = bmi(height_cm, weight_kg);
        Ok(Self {
            height: height_cm,
            weight: weight_kg,
            bmi: Some(bmi),
            bmi_category: Some(BmiCategory::from_bmi(bmi)),
        })
    }
}

/// kg / m²
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl FromStr for Weekday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            "saturday" | "sat" => Ok(Weekday::Saturday),
            "sunday" | "sun" => Ok(Weekday::Sunday),
            other => Err(ValidationError::invalid("days", format!("unknown weekday '{other}'"))),
        }
    }
}

/// When to remind the user to work out. Delivery lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub days: BTreeSet<Weekday>,
    /// Local time of day, "HH:MM".
    pub time: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            days: [Weekday::Monday, Weekday::Wednesday, Weekday::Friday]
                .into_iter()
                .collect(),
            time: "18:00".into(),
        }
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.reminder_time().map(|_| ())
    }

    pub fn reminder_time(&self) -> Result<NaiveTime, ValidationError> {
        if self.time.len() != 5 {
            return Err(ValidationError::invalid("time", format!("expected HH:MM, got '{}'", self.time)));
        }
        NaiveTime::parse_from_str(&self.time, "%H:%M")
            .map_err(|_| ValidationError::invalid("time", format!("expected HH:MM, got '{}'", self.time)))
    }
}
