//! Workout domain model

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

/// One exercise line inside a workout, in the order it was performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Load in kilograms, absent for bodyweight work
    #[serde(default)]
    pub weight: Option<f64>,
}

/// A logged training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub user_id: Uuid,
    /// When the session happened (naive datetime, local time)
    pub date: NaiveDateTime,
    pub exercises: Vec<Exercise>,
    /// Total duration in minutes
    pub total_duration: u32,
    pub calories_burned: f64,
    /// Free-form tags ("cardio", "strength", ...)
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workout {
    /// Create a new workout with required fields
    pub fn new(user_id: Uuid, date: NaiveDateTime) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            exercises: Vec::new(),
            total_duration: 0,
            calories_burned: 0.0,
            tags: Vec::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Calendar day the workout counts toward
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Check numeric fields and exercise lines before persisting
    pub fn validate(&self) -> Result<()> {
        if !self.calories_burned.is_finite() || self.calories_burned < 0.0 {
            return Err(Error::validation("caloriesBurned must be a non-negative number"));
        }
        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                return Err(Error::validation("exercise name cannot be empty"));
            }
            if let Some(w) = exercise.weight {
                if !w.is_finite() || w < 0.0 {
                    return Err(Error::validation(format!(
                        "weight for '{}' must be non-negative",
                        exercise.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Normalise tags: trimmed, lowercased, de-duplicated, order kept
    pub fn normalize_tags(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        self.tags = seen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_day_drops_time_of_day() {
        let workout = Workout::new(Uuid::new_v4(), at(2025, 3, 9, 23));
        assert_eq!(workout.day(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
    }

    #[test]
    fn test_validate_rejects_negative_calories() {
        let mut workout = Workout::new(Uuid::new_v4(), at(2025, 3, 9, 7));
        workout.calories_burned = -10.0;
        assert!(matches!(workout.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_blank_exercise() {
        let mut workout = Workout::new(Uuid::new_v4(), at(2025, 3, 9, 7));
        workout.exercises.push(Exercise {
            name: "  ".to_string(),
            sets: 3,
            reps: 10,
            weight: None,
        });
        assert!(workout.validate().is_err());
    }

    #[test]
    fn test_normalize_tags() {
        let mut workout = Workout::new(Uuid::new_v4(), at(2025, 3, 9, 7));
        workout.tags = vec![
            "Cardio".to_string(),
            " cardio ".to_string(),
            "".to_string(),
            "HIIT".to_string(),
        ];
        workout.normalize_tags();
        assert_eq!(workout.tags, vec!["cardio".to_string(), "hiit".to_string()]);
    }
}
