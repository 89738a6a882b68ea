//! Achievement domain model
//!
//! The set of badges is closed; display text and icons live in
//! [`crate::presentation`], not here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    #[serde(rename = "workout_streak_7")]
    WorkoutStreak7,
    #[serde(rename = "workout_streak_30")]
    WorkoutStreak30,
    #[serde(rename = "workout_streak_100")]
    WorkoutStreak100,
    #[serde(rename = "workout_count_10")]
    WorkoutCount10,
    #[serde(rename = "workout_count_50")]
    WorkoutCount50,
    #[serde(rename = "workout_count_100")]
    WorkoutCount100,
    #[serde(rename = "calories_10k")]
    Calories10k,
    #[serde(rename = "calories_50k")]
    Calories50k,
    #[serde(rename = "meal_count_30")]
    MealCount30,
    #[serde(rename = "meal_count_100")]
    MealCount100,
    GoalReached,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 11] = [
        AchievementKind::WorkoutStreak7,
        AchievementKind::WorkoutStreak30,
        AchievementKind::WorkoutStreak100,
        AchievementKind::WorkoutCount10,
        AchievementKind::WorkoutCount50,
        AchievementKind::WorkoutCount100,
        AchievementKind::Calories10k,
        AchievementKind::Calories50k,
        AchievementKind::MealCount30,
        AchievementKind::MealCount100,
        AchievementKind::GoalReached,
    ];

    /// Stable identifier stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementKind::WorkoutStreak7 => "workout_streak_7",
            AchievementKind::WorkoutStreak30 => "workout_streak_30",
            AchievementKind::WorkoutStreak100 => "workout_streak_100",
            AchievementKind::WorkoutCount10 => "workout_count_10",
            AchievementKind::WorkoutCount50 => "workout_count_50",
            AchievementKind::WorkoutCount100 => "workout_count_100",
            AchievementKind::Calories10k => "calories_10k",
            AchievementKind::Calories50k => "calories_50k",
            AchievementKind::MealCount30 => "meal_count_30",
            AchievementKind::MealCount100 => "meal_count_100",
            AchievementKind::GoalReached => "goal_reached",
        }
    }

    /// Reward points granted on unlock
    pub fn points(&self) -> u32 {
        match self {
            AchievementKind::WorkoutStreak7 => 10,
            AchievementKind::WorkoutStreak30 => 50,
            AchievementKind::WorkoutStreak100 => 200,
            AchievementKind::WorkoutCount10 => 10,
            AchievementKind::WorkoutCount50 => 50,
            AchievementKind::WorkoutCount100 => 100,
            AchievementKind::Calories10k => 25,
            AchievementKind::Calories50k => 100,
            AchievementKind::MealCount30 => 15,
            AchievementKind::MealCount100 => 50,
            AchievementKind::GoalReached => 100,
        }
    }
}

impl fmt::Display for AchievementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AchievementKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::validation(format!("Unknown achievement type: {}", s)))
    }
}

/// An unlocked badge. Append-only; one per (user, kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub points: u32,
    pub unlocked_at: DateTime<Utc>,
}
