//! Profile service - users, body metrics and weight check-ins

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{ActivityLevel, Gender, User, WeightEntry};
use crate::ports::FitnessRepository;
use crate::services::events::{ActivityEvent, ObserverSlot};

/// Partial profile patch; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub height_cm: Option<f64>,
    pub goal_weight: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub daily_calorie_goal: Option<f64>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.height_cm.is_none()
            && self.goal_weight.is_none()
            && self.activity_level.is_none()
            && self.daily_calorie_goal.is_none()
            && self.date_of_birth.is_none()
            && self.gender.is_none()
    }

    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::validation("Name cannot be empty"));
            }
        }
        for (label, value) in [
            ("height", self.height_cm),
            ("goal weight", self.goal_weight),
            ("daily calorie goal", self.daily_calorie_goal),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(Error::validation(format!("{} must be positive", label)));
                }
            }
        }
        Ok(())
    }

    fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if self.height_cm.is_some() {
            user.height_cm = self.height_cm;
        }
        if self.goal_weight.is_some() {
            user.goal_weight = self.goal_weight;
        }
        if self.activity_level.is_some() {
            user.activity_level = self.activity_level;
        }
        if self.daily_calorie_goal.is_some() {
            user.daily_calorie_goal = self.daily_calorie_goal;
        }
        if self.date_of_birth.is_some() {
            user.date_of_birth = self.date_of_birth;
        }
        if self.gender.is_some() {
            user.gender = self.gender;
        }
    }
}

pub struct ProfileService {
    repository: Arc<dyn FitnessRepository>,
    observer: ObserverSlot,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn FitnessRepository>, observer: ObserverSlot) -> Self {
        Self {
            repository,
            observer,
        }
    }

    /// Create a user with the given profile fields
    pub fn create_user(&self, email: &str, name: &str, profile: ProfileUpdate) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::validation(format!("Invalid email: {}", email)));
        }
        if name.trim().is_empty() {
            return Err(Error::validation("Name cannot be empty"));
        }
        profile.validate()?;

        let mut user = User::new(email, name.trim());
        profile.apply(&mut user);
        self.repository.create_user(&user)?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.repository
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", user_id)))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.repository.list_users()
    }

    pub fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        update.validate()?;
        let mut user = self.get_user(user_id)?;
        update.apply(&mut user);
        user.updated_at = Utc::now();
        self.repository.update_user(&user)?;
        Ok(user)
    }

    /// Record a weight check-in now
    pub fn record_weight(&self, user_id: Uuid, weight: f64, notes: Option<String>) -> Result<User> {
        let mut entry = WeightEntry::new(user_id, weight);
        entry.notes = notes;
        self.record_entry(entry)
    }

    /// Record a weight check-in at a given time
    pub fn record_weight_at(
        &self,
        user_id: Uuid,
        weight: f64,
        recorded_at: NaiveDateTime,
        notes: Option<String>,
    ) -> Result<User> {
        let mut entry = WeightEntry::at(user_id, weight, recorded_at);
        entry.notes = notes;
        self.record_entry(entry)
    }

    fn record_entry(&self, entry: WeightEntry) -> Result<User> {
        entry.validate()?;
        let user = self.repository.record_weight(&entry)?;
        self.observer.notify(ActivityEvent::WeightRecorded {
            user_id: entry.user_id,
        });
        Ok(user)
    }

    /// Weight check-ins, oldest first
    pub fn weight_history(&self, user_id: Uuid) -> Result<Vec<WeightEntry>> {
        self.get_user(user_id)?;
        self.repository.get_weight_entries(user_id)
    }
}
