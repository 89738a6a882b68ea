//! Behaviour when persistence is unavailable
//!
//! Streaks, achievements and suggestions are best-effort and must come back
//! empty; health score, prediction and status surface the error.
//!
//! Run with: cargo test --test degraded_paths_test

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;
use uuid::Uuid;

use fitpulse_core::config::{Config, DEMO_MODE_ENV, USER_ENV};
use fitpulse_core::ports::FitnessRepository;
use fitpulse_core::services::SuggestionCategory;
use fitpulse_core::{
    Achievement, AchievementKind, Error, FitpulseContext, Meal, Result, User, WeightEntry, Workout,
};

/// Every call fails the way a dropped database connection would
struct OfflineRepository;

fn offline<T>() -> Result<T> {
    Err(Error::database("connection closed"))
}

impl FitnessRepository for OfflineRepository {
    fn create_user(&self, _user: &User) -> Result<()> {
        offline()
    }
    fn get_user(&self, _id: Uuid) -> Result<Option<User>> {
        offline()
    }
    fn update_user(&self, _user: &User) -> Result<()> {
        offline()
    }
    fn list_users(&self) -> Result<Vec<User>> {
        offline()
    }
    fn add_workout(&self, _workout: &Workout) -> Result<()> {
        offline()
    }
    fn update_workout(&self, _workout: &Workout) -> Result<()> {
        offline()
    }
    fn delete_workout(&self, _id: Uuid) -> Result<bool> {
        offline()
    }
    fn get_workout(&self, _id: Uuid) -> Result<Option<Workout>> {
        offline()
    }
    fn get_recent_workouts(&self, _user_id: Uuid, _limit: usize) -> Result<Vec<Workout>> {
        offline()
    }
    fn get_workouts_before(
        &self,
        _user_id: Uuid,
        _end: NaiveDateTime,
        _limit: usize,
    ) -> Result<Vec<Workout>> {
        offline()
    }
    fn get_workouts_between(
        &self,
        _user_id: Uuid,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<Vec<Workout>> {
        offline()
    }
    fn count_workouts(&self, _user_id: Uuid) -> Result<u64> {
        offline()
    }
    fn sum_calories_burned(&self, _user_id: Uuid) -> Result<f64> {
        offline()
    }
    fn add_meal(&self, _meal: &Meal) -> Result<()> {
        offline()
    }
    fn update_meal(&self, _meal: &Meal) -> Result<()> {
        offline()
    }
    fn delete_meal(&self, _id: Uuid) -> Result<bool> {
        offline()
    }
    fn get_meal(&self, _id: Uuid) -> Result<Option<Meal>> {
        offline()
    }
    fn get_recent_meals(&self, _user_id: Uuid, _limit: usize) -> Result<Vec<Meal>> {
        offline()
    }
    fn get_meals_between(
        &self,
        _user_id: Uuid,
        _start: NaiveDateTime,
        _end: NaiveDateTime,
    ) -> Result<Vec<Meal>> {
        offline()
    }
    fn count_meals(&self, _user_id: Uuid) -> Result<u64> {
        offline()
    }
    fn find_achievement(
        &self,
        _user_id: Uuid,
        _kind: AchievementKind,
    ) -> Result<Option<Achievement>> {
        offline()
    }
    fn create_achievements(&self, _achievements: &[Achievement]) -> Result<Vec<AchievementKind>> {
        offline()
    }
    fn get_achievements(&self, _user_id: Uuid) -> Result<Vec<Achievement>> {
        offline()
    }
    fn record_weight(&self, _entry: &WeightEntry) -> Result<User> {
        offline()
    }
    fn get_weight_entries(&self, _user_id: Uuid) -> Result<Vec<WeightEntry>> {
        offline()
    }
}

fn offline_context(temp_dir: &TempDir) -> FitpulseContext {
    FitpulseContext::with_repository(
        Config::default(),
        temp_dir.path(),
        Arc::new(OfflineRepository),
    )
}

#[test]
fn test_best_effort_services_degrade_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = offline_context(&temp_dir);
    let user_id = Uuid::new_v4();
    let today = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();

    assert_eq!(ctx.streak_service.current_streak_on(user_id, today), 0);
    assert!(ctx
        .achievement_service
        .check_achievements_on(user_id, today)
        .is_empty());
    assert!(ctx
        .suggestion_service
        .all_suggestions_on(user_id, today)
        .is_empty());
    assert!(ctx
        .suggestion_service
        .suggestions(user_id, Some(SuggestionCategory::Nutrition))
        .is_empty());
}

#[test]
fn test_reporting_services_propagate_errors() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = offline_context(&temp_dir);
    let user_id = Uuid::new_v4();

    assert!(matches!(
        ctx.health_service.calculate(user_id),
        Err(Error::Database(_))
    ));
    assert!(matches!(
        ctx.prediction_service.predict(user_id, "2099-01-01"),
        Err(Error::Database(_))
    ));
    assert!(matches!(
        ctx.status_service.get_status(user_id),
        Err(Error::Database(_))
    ));
}

/// The only test in this binary that touches process environment
#[test]
fn test_env_overrides_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let stored_user = Uuid::new_v4();
    Config {
        demo_mode: false,
        active_user: Some(stored_user),
    }
    .save(temp_dir.path())
    .unwrap();

    let loaded = Config::load(temp_dir.path()).unwrap();
    assert_eq!(loaded.active_user, Some(stored_user));

    let env_user = Uuid::new_v4();
    std::env::set_var(DEMO_MODE_ENV, "yes");
    std::env::set_var(USER_ENV, env_user.to_string());
    let overridden = Config::load(temp_dir.path());

    std::env::set_var(USER_ENV, "not-a-uuid");
    let invalid = Config::load(temp_dir.path());

    std::env::remove_var(DEMO_MODE_ENV);
    std::env::remove_var(USER_ENV);

    let overridden = overridden.unwrap();
    assert!(overridden.demo_mode);
    assert_eq!(overridden.active_user, Some(env_user));
    assert!(matches!(invalid, Err(Error::Config(_))));
}
