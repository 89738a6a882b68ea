//! Status service - dashboard summary for a user

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::ports::FitnessRepository;
use crate::services::streak::StreakService;

pub struct StatusService {
    repository: Arc<dyn FitnessRepository>,
    streak: StreakService,
}

impl StatusService {
    pub fn new(repository: Arc<dyn FitnessRepository>) -> Self {
        Self {
            streak: StreakService::new(Arc::clone(&repository)),
            repository,
        }
    }

    pub fn get_status(&self, user_id: Uuid) -> Result<UserStatus> {
        self.get_status_on(user_id, Local::now().date_naive())
    }

    pub fn get_status_on(&self, user_id: Uuid, today: NaiveDate) -> Result<UserStatus> {
        let user = self
            .repository
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", user_id)))?;

        let achievements = self.repository.get_achievements(user_id)?;
        let last_weigh_in = self
            .repository
            .get_weight_entries(user_id)?
            .last()
            .map(|e| e.recorded_at.date());

        Ok(UserStatus {
            user_id,
            name: user.name,
            total_workouts: self.repository.count_workouts(user_id)?,
            total_meals: self.repository.count_meals(user_id)?,
            calories_burned: self.repository.sum_calories_burned(user_id)?,
            current_streak: self.streak.current_streak_on(user_id, today),
            achievements_unlocked: achievements.len(),
            achievement_points: achievements.iter().map(|a| a.points).sum(),
            current_weight: user.current_weight,
            goal_weight: user.goal_weight,
            last_weigh_in,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStatus {
    pub user_id: Uuid,
    pub name: String,
    pub total_workouts: u64,
    pub total_meals: u64,
    pub calories_burned: f64,
    pub current_streak: u32,
    pub achievements_unlocked: usize,
    pub achievement_points: u32,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub last_weigh_in: Option<NaiveDate>,
}
