//! Weight trajectory prediction
//!
//! Projects body weight on a future date from the energy balance between
//! estimated expenditure (Mifflin-St Jeor BMR times an activity multiplier)
//! and logged intake, at 7700 kcal per kg.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{ActivityLevel, Gender, User};
use crate::ports::FitnessRepository;

/// Energy density of body fat (kcal per kg)
pub const KCAL_PER_KG: f64 = 7700.0;

/// Intake assumed when no meals were logged in the window
pub const DEFAULT_DAILY_CALORIES: f64 = 2000.0;

pub const INTAKE_WINDOW_DAYS: i64 = 90;

/// Predicted weight within this many kg of the goal is on track
pub const ON_TRACK_TOLERANCE_KG: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPrediction {
    pub current_weight: f64,
    pub goal_weight: f64,
    pub target_date: NaiveDate,
    pub days_remaining: i64,
    pub bmr: f64,
    pub tdee: f64,
    pub avg_daily_calories: f64,
    /// Positive means eating below expenditure
    pub daily_deficit: f64,
    pub predicted_weight_change: f64,
    pub predicted_weight: f64,
    pub weekly_weight_change: f64,
    pub on_track: bool,
}

/// A profile value the prediction cannot be made without
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    CurrentWeight,
    GoalWeight,
    Height,
    DateOfBirth,
}

impl MissingInput {
    pub fn label(&self) -> &'static str {
        match self {
            MissingInput::CurrentWeight => "current weight",
            MissingInput::GoalWeight => "goal weight",
            MissingInput::Height => "height",
            MissingInput::DateOfBirth => "date of birth",
        }
    }
}

/// Profile values still needed before `user` can get a prediction
///
/// A date of birth after `today` counts as missing.
pub fn missing_inputs(user: &User, today: NaiveDate) -> Vec<MissingInput> {
    let mut missing = Vec::new();
    if user.current_weight.is_none() {
        missing.push(MissingInput::CurrentWeight);
    }
    if user.goal_weight.is_none() {
        missing.push(MissingInput::GoalWeight);
    }
    if user.height_cm.is_none() {
        missing.push(MissingInput::Height);
    }
    if user.age_on(today).is_none() {
        missing.push(MissingInput::DateOfBirth);
    }
    missing
}

/// Mifflin-St Jeor basal metabolic rate in kcal/day
pub fn bmr(weight_kg: f64, height_cm: f64, age_years: u32, gender: Gender) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age_years);
    match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
        Gender::Other => base - 78.0,
    }
}

/// Total daily energy expenditure; sedentary when the level is unknown
pub fn tdee(bmr: f64, activity: Option<ActivityLevel>) -> f64 {
    bmr * activity.unwrap_or(ActivityLevel::Sedentary).multiplier()
}

/// Project the energy balance over `days` days
pub fn project(
    current_weight: f64,
    goal_weight: f64,
    tdee: f64,
    avg_daily_calories: f64,
    days: i64,
) -> (f64, f64, f64, bool) {
    let daily_deficit = tdee - avg_daily_calories;
    let change = daily_deficit * days as f64 / KCAL_PER_KG;
    let predicted = current_weight - change;
    let on_track = (predicted - goal_weight).abs() < ON_TRACK_TOLERANCE_KG;
    (daily_deficit, change, predicted, on_track)
}

pub struct PredictionService {
    repository: Arc<dyn FitnessRepository>,
}

impl PredictionService {
    pub fn new(repository: Arc<dyn FitnessRepository>) -> Self {
        Self { repository }
    }

    /// Predict from a `YYYY-MM-DD` target date
    pub fn predict(&self, user_id: Uuid, target_date: &str) -> Result<TrajectoryPrediction> {
        let target = NaiveDate::parse_from_str(target_date.trim(), "%Y-%m-%d").map_err(|_| {
            Error::validation(format!(
                "Invalid target date '{}', expected YYYY-MM-DD",
                target_date
            ))
        })?;
        self.predict_on(user_id, target)
    }

    pub fn predict_on(&self, user_id: Uuid, target: NaiveDate) -> Result<TrajectoryPrediction> {
        self.predict_from(user_id, Local::now().date_naive(), target)
    }

    /// Predict with an explicit "today"
    pub fn predict_from(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        target: NaiveDate,
    ) -> Result<TrajectoryPrediction> {
        let user = self
            .repository
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", user_id)))?;

        let (Some(current_weight), Some(goal_weight), Some(height), Some(age)) = (
            user.current_weight,
            user.goal_weight,
            user.height_cm,
            user.age_on(today),
        ) else {
            let labels: Vec<&str> = missing_inputs(&user, today)
                .iter()
                .map(MissingInput::label)
                .collect();
            return Err(Error::validation(format!(
                "Missing profile fields for a prediction: {}",
                labels.join(", ")
            )));
        };

        let days_remaining = (target - today).num_days();
        if days_remaining < 0 {
            return Err(Error::validation(format!(
                "Target date {} is in the past",
                target
            )));
        }

        let bmr = bmr(
            current_weight,
            height,
            age,
            user.gender.unwrap_or(Gender::Other),
        );
        let tdee = tdee(bmr, user.activity_level);
        let avg_daily_calories = self.average_daily_intake(user_id, today)?;

        let (daily_deficit, predicted_weight_change, predicted_weight, on_track) =
            project(current_weight, goal_weight, tdee, avg_daily_calories, days_remaining);

        tracing::debug!(%user_id, bmr, tdee, avg_daily_calories, days_remaining, "weight projection");

        Ok(TrajectoryPrediction {
            current_weight,
            goal_weight,
            target_date: target,
            days_remaining,
            bmr,
            tdee,
            avg_daily_calories,
            daily_deficit,
            predicted_weight_change,
            predicted_weight,
            weekly_weight_change: daily_deficit * 7.0 / KCAL_PER_KG,
            on_track,
        })
    }

    /// Mean of per-day calorie sums over days with meals in the last 90 days
    fn average_daily_intake(&self, user_id: Uuid, today: NaiveDate) -> Result<f64> {
        let start = (today - Duration::days(INTAKE_WINDOW_DAYS - 1)).and_time(NaiveTime::MIN);
        let end = (today + Duration::days(1)).and_time(NaiveTime::MIN);
        let meals = self.repository.get_meals_between(user_id, start, end)?;

        let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for meal in &meals {
            *per_day.entry(meal.day()).or_insert(0.0) += meal.totals.calories;
        }
        if per_day.is_empty() {
            return Ok(DEFAULT_DAILY_CALORIES);
        }
        Ok(per_day.values().sum::<f64>() / per_day.len() as f64)
    }
}
