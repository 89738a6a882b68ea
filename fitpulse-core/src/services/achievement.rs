//! Achievement service - unlocks badges when activity thresholds are met
//!
//! Evaluation is best-effort: a failure anywhere aborts the run, stores
//! nothing and reports nothing unlocked. Every logged workout or meal
//! triggers another run, so a failed check is retried naturally.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Achievement, AchievementKind};
use crate::ports::FitnessRepository;
use crate::presentation::badge;
use crate::services::streak::{end_of_day, streak_from_dates, STREAK_LOOKBACK};

/// Weight within this many kg of the goal counts as reached
pub const GOAL_TOLERANCE_KG: f64 = 1.0;

/// Activity totals the unlock rules are evaluated against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementStats {
    pub streak: u32,
    pub workout_count: u64,
    pub calories_burned: f64,
    pub meal_count: u64,
    /// |current - goal| in kg, when both weights are known
    pub goal_gap: Option<f64>,
}

/// Kinds whose unlock condition holds for `stats`, in rule table order
pub fn satisfied_kinds(stats: &AchievementStats) -> Vec<AchievementKind> {
    AchievementKind::ALL
        .iter()
        .copied()
        .filter(|kind| is_satisfied(*kind, stats))
        .collect()
}

fn is_satisfied(kind: AchievementKind, stats: &AchievementStats) -> bool {
    match kind {
        AchievementKind::WorkoutStreak7 => stats.streak >= 7,
        AchievementKind::WorkoutStreak30 => stats.streak >= 30,
        AchievementKind::WorkoutStreak100 => stats.streak >= 100,
        AchievementKind::WorkoutCount10 => stats.workout_count >= 10,
        AchievementKind::WorkoutCount50 => stats.workout_count >= 50,
        AchievementKind::WorkoutCount100 => stats.workout_count >= 100,
        AchievementKind::Calories10k => stats.calories_burned >= 10_000.0,
        AchievementKind::Calories50k => stats.calories_burned >= 50_000.0,
        AchievementKind::MealCount30 => stats.meal_count >= 30,
        AchievementKind::MealCount100 => stats.meal_count >= 100,
        AchievementKind::GoalReached => stats
            .goal_gap
            .map(|gap| gap <= GOAL_TOLERANCE_KG)
            .unwrap_or(false),
    }
}

pub struct AchievementService {
    repository: Arc<dyn FitnessRepository>,
}

impl AchievementService {
    pub fn new(repository: Arc<dyn FitnessRepository>) -> Self {
        Self { repository }
    }

    /// Unlock every newly satisfied achievement and return the new kinds
    pub fn check_achievements(&self, user_id: Uuid) -> Vec<AchievementKind> {
        self.check_achievements_on(user_id, Local::now().date_naive())
    }

    /// Same as [`check_achievements`](Self::check_achievements) with an explicit "today"
    pub fn check_achievements_on(&self, user_id: Uuid, today: NaiveDate) -> Vec<AchievementKind> {
        match self.try_check(user_id, today) {
            Ok(unlocked) => {
                for kind in &unlocked {
                    tracing::info!(%user_id, achievement = %kind, "achievement unlocked");
                }
                unlocked
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "achievement check failed");
                Vec::new()
            }
        }
    }

    fn try_check(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<AchievementKind>> {
        let stats = self.collect_stats(user_id, today)?;
        tracing::debug!(%user_id, ?stats, "evaluating achievements");

        let mut pending = Vec::new();
        for kind in satisfied_kinds(&stats) {
            if self.repository.find_achievement(user_id, kind)?.is_none() {
                pending.push(new_achievement(user_id, kind));
            }
        }
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        // All or nothing; rows a concurrent check already stored are skipped
        self.repository.create_achievements(&pending)
    }

    fn collect_stats(&self, user_id: Uuid, today: NaiveDate) -> Result<AchievementStats> {
        let user = self
            .repository
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", user_id)))?;

        let recent = self
            .repository
            .get_workouts_before(user_id, end_of_day(today), STREAK_LOOKBACK)?;
        let goal_gap = match (user.current_weight, user.goal_weight) {
            (Some(current), Some(goal)) => Some((current - goal).abs()),
            _ => None,
        };

        Ok(AchievementStats {
            streak: streak_from_dates(recent.iter().map(|w| w.day()), today),
            workout_count: self.repository.count_workouts(user_id)?,
            calories_burned: self.repository.sum_calories_burned(user_id)?,
            meal_count: self.repository.count_meals(user_id)?,
            goal_gap,
        })
    }

    /// Unlocked achievements, oldest first
    pub fn list_achievements(&self, user_id: Uuid) -> Result<Vec<Achievement>> {
        self.repository.get_achievements(user_id)
    }

    pub fn total_points(&self, user_id: Uuid) -> Result<u32> {
        Ok(self
            .repository
            .get_achievements(user_id)?
            .iter()
            .map(|a| a.points)
            .sum())
    }
}

fn new_achievement(user_id: Uuid, kind: AchievementKind) -> Achievement {
    let meta = badge(kind);
    Achievement {
        id: Uuid::new_v4(),
        user_id,
        kind,
        title: meta.title.to_string(),
        description: meta.description.to_string(),
        icon: meta.icon.to_string(),
        points: kind.points(),
        unlocked_at: Utc::now(),
    }
}
