//! Activity service - workout and meal logging

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{MacroTotals, Meal, Workout};
use crate::ports::FitnessRepository;
use crate::services::events::{ActivityEvent, ObserverSlot};

pub struct ActivityService {
    repository: Arc<dyn FitnessRepository>,
    observer: ObserverSlot,
}

impl ActivityService {
    pub fn new(repository: Arc<dyn FitnessRepository>, observer: ObserverSlot) -> Self {
        Self {
            repository,
            observer,
        }
    }

    fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        match self.repository.get_user(user_id)? {
            Some(_) => Ok(()),
            None => Err(Error::not_found(format!("User {}", user_id))),
        }
    }

    // === Workouts ===

    pub fn log_workout(&self, mut workout: Workout) -> Result<Workout> {
        workout.normalize_tags();
        workout.validate()?;
        self.ensure_user(workout.user_id)?;

        self.repository.add_workout(&workout)?;
        tracing::debug!(workout_id = %workout.id, "workout logged");

        self.observer.notify(ActivityEvent::WorkoutLogged {
            user_id: workout.user_id,
            workout_id: workout.id,
        });
        Ok(workout)
    }

    /// Replace a stored workout; ownership and creation time are preserved
    pub fn update_workout(&self, mut workout: Workout) -> Result<Workout> {
        let existing = self.get_workout(workout.id)?;
        workout.user_id = existing.user_id;
        workout.created_at = existing.created_at;
        workout.updated_at = Utc::now();
        workout.normalize_tags();
        workout.validate()?;

        self.repository.update_workout(&workout)?;
        Ok(workout)
    }

    pub fn delete_workout(&self, workout_id: Uuid) -> Result<()> {
        if !self.repository.delete_workout(workout_id)? {
            return Err(Error::not_found(format!("Workout {}", workout_id)));
        }
        Ok(())
    }

    pub fn get_workout(&self, workout_id: Uuid) -> Result<Workout> {
        self.repository
            .get_workout(workout_id)?
            .ok_or_else(|| Error::not_found(format!("Workout {}", workout_id)))
    }

    /// Most recent workouts first
    pub fn list_workouts(&self, user_id: Uuid, limit: usize) -> Result<Vec<Workout>> {
        self.ensure_user(user_id)?;
        self.repository.get_recent_workouts(user_id, limit)
    }

    // === Meals ===

    /// Store a meal; totals are always recomputed from the food items
    pub fn log_meal(&self, mut meal: Meal) -> Result<Meal> {
        meal.recompute_totals();
        meal.validate()?;
        self.ensure_user(meal.user_id)?;

        self.repository.add_meal(&meal)?;
        tracing::debug!(meal_id = %meal.id, "meal logged");

        self.observer.notify(ActivityEvent::MealLogged {
            user_id: meal.user_id,
            meal_id: meal.id,
        });
        Ok(meal)
    }

    pub fn update_meal(&self, mut meal: Meal) -> Result<Meal> {
        let existing = self.get_meal(meal.id)?;
        meal.user_id = existing.user_id;
        meal.created_at = existing.created_at;
        meal.updated_at = Utc::now();
        meal.recompute_totals();
        meal.validate()?;

        self.repository.update_meal(&meal)?;
        Ok(meal)
    }

    pub fn delete_meal(&self, meal_id: Uuid) -> Result<()> {
        if !self.repository.delete_meal(meal_id)? {
            return Err(Error::not_found(format!("Meal {}", meal_id)));
        }
        Ok(())
    }

    pub fn get_meal(&self, meal_id: Uuid) -> Result<Meal> {
        self.repository
            .get_meal(meal_id)?
            .ok_or_else(|| Error::not_found(format!("Meal {}", meal_id)))
    }

    pub fn list_meals(&self, user_id: Uuid, limit: usize) -> Result<Vec<Meal>> {
        self.ensure_user(user_id)?;
        self.repository.get_recent_meals(user_id, limit)
    }

    /// Meals eaten on `day` and their combined totals
    pub fn meals_on(&self, user_id: Uuid, day: NaiveDate) -> Result<(Vec<Meal>, MacroTotals)> {
        self.ensure_user(user_id)?;
        let start = day.and_time(NaiveTime::MIN);
        let end = start + chrono::Duration::days(1);
        let meals = self.repository.get_meals_between(user_id, start, end)?;
        let mut totals = MacroTotals::default();
        for meal in &meals {
            totals += meal.totals;
        }
        Ok((meals, totals))
    }
}
