//! Integration tests for fitpulse-core services
//!
//! These run the services against a real DuckDB file in a temp directory.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use fitpulse_core::adapters::duckdb::DuckDbRepository;
use fitpulse_core::config::Config;
use fitpulse_core::ports::FitnessRepository;
use fitpulse_core::services::prediction::{bmr, tdee};
use fitpulse_core::services::{
    AchievementWorker, Grade, Priority, ProfileUpdate, StreakService, SuggestionKind,
};
use fitpulse_core::{
    Achievement, AchievementKind, ActivityLevel, Error, FitpulseContext, FoodItem, Gender, Meal,
    MealType, User, WeightEntry, Workout,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_test_repo(temp_dir: &TempDir) -> Arc<DuckDbRepository> {
    let db_path = temp_dir.path().join("test.duckdb");
    let repo = DuckDbRepository::new(&db_path).expect("Failed to create repository");
    repo.ensure_schema().expect("Failed to initialize schema");
    Arc::new(repo)
}

fn create_context(temp_dir: &TempDir) -> FitpulseContext {
    FitpulseContext::with_repository(
        Config::default(),
        temp_dir.path(),
        create_test_repo(temp_dir),
    )
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, 0, 0).unwrap()
}

fn create_user(ctx: &FitpulseContext, email: &str) -> User {
    ctx.profile_service
        .create_user(email, "Test User", ProfileUpdate::default())
        .unwrap()
}

fn workout_on(user_id: Uuid, date: NaiveDate, tag: &str) -> Workout {
    let mut workout = Workout::new(user_id, at(date, 7));
    workout.total_duration = 45;
    workout.calories_burned = 350.0;
    workout.tags = vec![tag.to_string()];
    workout
}

fn food(name: &str, calories: f64, protein: f64) -> FoodItem {
    FoodItem {
        name: name.to_string(),
        amount: "1 serving".to_string(),
        calories,
        protein,
        carbs: 20.0,
        fat: 10.0,
    }
}

/// Log a workout on each of the `days` days ending on `last`
fn log_consecutive(ctx: &FitpulseContext, user_id: Uuid, last: NaiveDate, days: i64) {
    for offset in 0..days {
        ctx.activity_service
            .log_workout(workout_on(user_id, last - Duration::days(offset), "cardio"))
            .unwrap();
    }
}

// ============================================================================
// Achievements
// ============================================================================

#[test]
fn test_ten_day_streak_unlocks_streak_and_count_badges() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "ten@example.com");
    let today = day(2025, 3, 20);

    log_consecutive(&ctx, user.id, today, 10);

    assert_eq!(ctx.streak_service.current_streak_on(user.id, today), 10);

    let unlocked = ctx.achievement_service.check_achievements_on(user.id, today);
    assert!(unlocked.contains(&AchievementKind::WorkoutStreak7));
    assert!(unlocked.contains(&AchievementKind::WorkoutCount10));
    assert!(!unlocked.contains(&AchievementKind::WorkoutStreak30));
    assert!(!unlocked.contains(&AchievementKind::Calories10k));
    assert_eq!(unlocked.len(), 2);

    assert_eq!(ctx.achievement_service.total_points(user.id).unwrap(), 20);
}

#[test]
fn test_achievement_check_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "idem@example.com");
    let today = day(2025, 3, 20);
    log_consecutive(&ctx, user.id, today, 7);

    let first = ctx.achievement_service.check_achievements_on(user.id, today);
    assert_eq!(first, vec![AchievementKind::WorkoutStreak7]);

    let second = ctx.achievement_service.check_achievements_on(user.id, today);
    assert!(second.is_empty());

    let stored = ctx.achievement_service.list_achievements(user.id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Week Warrior");
    assert_eq!(stored[0].points, 10);
}

#[test]
fn test_duplicate_achievement_insert_is_rejected_by_storage() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user_id = Uuid::new_v4();

    let make = || Achievement {
        id: Uuid::new_v4(),
        user_id,
        kind: AchievementKind::GoalReached,
        title: "Goal Crusher".to_string(),
        description: "Reached your goal weight".to_string(),
        icon: "🏆".to_string(),
        points: AchievementKind::GoalReached.points(),
        unlocked_at: Utc::now(),
    };

    assert_eq!(
        repo.create_achievements(&[make()]).unwrap(),
        vec![AchievementKind::GoalReached]
    );
    assert!(repo.create_achievements(&[make()]).unwrap().is_empty());
    assert_eq!(repo.get_achievements(user_id).unwrap().len(), 1);
}

#[test]
fn test_failed_achievement_batch_stores_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user_id = Uuid::new_v4();

    let make = |kind: AchievementKind| Achievement {
        id: Uuid::new_v4(),
        user_id,
        kind,
        title: kind.to_string(),
        description: "test".to_string(),
        icon: "🏅".to_string(),
        points: kind.points(),
        unlocked_at: Utc::now(),
    };

    let first = make(AchievementKind::WorkoutStreak7);
    // Reusing the primary key makes the second insert fail mid-batch
    let mut clash = make(AchievementKind::WorkoutCount10);
    clash.id = first.id;

    assert!(repo.create_achievements(&[first, clash]).is_err());
    assert!(repo.get_achievements(user_id).unwrap().is_empty());
}

#[test]
fn test_goal_reached_unlocks_after_weigh_in() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = ctx
        .profile_service
        .create_user(
            "goal@example.com",
            "Goal",
            ProfileUpdate {
                goal_weight: Some(70.0),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
    let today = day(2025, 5, 1);

    ctx.profile_service
        .record_weight_at(user.id, 74.0, at(today - Duration::days(20), 8), None)
        .unwrap();
    assert!(ctx
        .achievement_service
        .check_achievements_on(user.id, today)
        .is_empty());

    ctx.profile_service
        .record_weight_at(user.id, 70.8, at(today, 8), None)
        .unwrap();
    assert_eq!(
        ctx.achievement_service.check_achievements_on(user.id, today),
        vec![AchievementKind::GoalReached]
    );
}

// ============================================================================
// Streaks
// ============================================================================

#[test]
fn test_streak_anchors_on_yesterday_and_breaks_after_gap() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "streak@example.com");
    let today = day(2025, 1, 10);

    log_consecutive(&ctx, user.id, today - Duration::days(1), 3);
    assert_eq!(ctx.streak_service.current_streak_on(user.id, today), 3);

    // Same history seen two days later: yesterday has no workout
    assert_eq!(
        ctx.streak_service
            .current_streak_on(user.id, today + Duration::days(1)),
        0
    );
}

#[test]
fn test_two_workouts_same_day_count_once() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "double@example.com");
    let today = day(2025, 1, 10);

    ctx.activity_service
        .log_workout(workout_on(user.id, today, "strength"))
        .unwrap();
    let mut evening = workout_on(user.id, today, "cardio");
    evening.date = at(today, 19);
    ctx.activity_service.log_workout(evening).unwrap();

    assert_eq!(ctx.streak_service.current_streak_on(user.id, today), 1);
}

#[test]
fn test_future_workouts_do_not_crowd_out_streak_history() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = User::new("planner@example.com", "Planner");
    repo.create_user(&user).unwrap();
    let today = day(2025, 1, 10);

    for offset in 0..3 {
        repo.add_workout(&workout_on(user.id, today - Duration::days(offset), "cardio"))
            .unwrap();
    }
    // Planned sessions fill more than the whole lookback window
    for offset in 1..=120 {
        repo.add_workout(&workout_on(user.id, today + Duration::days(offset), "cardio"))
            .unwrap();
    }

    let streaks = StreakService::new(repo.clone());
    assert_eq!(streaks.current_streak_on(user.id, today), 3);
}

// ============================================================================
// Profile, workouts and meals
// ============================================================================

#[test]
fn test_first_weigh_in_sets_starting_weight_once() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "weigh@example.com");
    assert!(user.starting_weight.is_none());

    let after_first = ctx.profile_service.record_weight(user.id, 82.0, None).unwrap();
    assert_eq!(after_first.current_weight, Some(82.0));
    assert_eq!(after_first.starting_weight, Some(82.0));

    let after_second = ctx
        .profile_service
        .record_weight(user.id, 80.5, Some("after holiday".to_string()))
        .unwrap();
    assert_eq!(after_second.current_weight, Some(80.5));
    assert_eq!(after_second.starting_weight, Some(82.0));

    let history = ctx.profile_service.weight_history(user.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].notes.as_deref(), Some("after holiday"));
}

#[test]
fn test_weigh_in_for_unknown_user_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);

    let result = repo.record_weight(&WeightEntry::new(Uuid::new_v4(), 80.0));
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_duplicate_email_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    create_user(&ctx, "same@example.com");

    let result = ctx
        .profile_service
        .create_user("Same@Example.com", "Other", ProfileUpdate::default());
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[test]
fn test_meal_totals_are_recomputed_from_items() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "meal@example.com");
    let today = day(2025, 2, 2);

    let mut meal = Meal::new(
        user.id,
        at(today, 12),
        MealType::Lunch,
        vec![food("chicken", 300.0, 40.0), food("rice", 250.0, 5.0)],
    );
    // Stale totals must not survive the write
    meal.totals.calories = 1.0;
    let logged = ctx.activity_service.log_meal(meal).unwrap();
    assert_eq!(logged.totals.calories, 550.0);

    let stored = ctx.activity_service.get_meal(logged.id).unwrap();
    assert_eq!(stored.totals.calories, 550.0);
    assert_eq!(stored.totals.protein, 45.0);
    assert_eq!(stored.totals.carbs, 40.0);

    let mut edited = stored.clone();
    edited.food_items.pop();
    let updated = ctx.activity_service.update_meal(edited).unwrap();
    assert_eq!(updated.totals.calories, 300.0);

    let (meals, totals) = ctx.activity_service.meals_on(user.id, today).unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(totals.calories, 300.0);
}

#[test]
fn test_update_workout_keeps_owner_and_delete_reports_missing() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "edit@example.com");

    let logged = ctx
        .activity_service
        .log_workout(workout_on(user.id, day(2025, 4, 4), "Strength"))
        .unwrap();
    assert_eq!(logged.tags, vec!["strength".to_string()]);

    let mut edited = logged.clone();
    edited.user_id = Uuid::new_v4();
    edited.total_duration = 60;
    let updated = ctx.activity_service.update_workout(edited).unwrap();
    assert_eq!(updated.user_id, user.id);
    assert_eq!(
        ctx.activity_service.get_workout(logged.id).unwrap().total_duration,
        60
    );

    ctx.activity_service.delete_workout(logged.id).unwrap();
    assert!(matches!(
        ctx.activity_service.delete_workout(logged.id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_tags_with_commas_and_quotes_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let repo = create_test_repo(&temp_dir);
    let user = User::new("tags@example.com", "Tags");
    repo.create_user(&user).unwrap();

    let mut workout = workout_on(user.id, day(2025, 4, 4), "push, pull");
    workout.tags.push("o'brien's [circuit]".to_string());
    repo.add_workout(&workout).unwrap();

    let stored = repo.get_workout(workout.id).unwrap().unwrap();
    assert_eq!(stored.tags, workout.tags);

    let mut untagged = workout_on(user.id, day(2025, 4, 5), "x");
    untagged.tags.clear();
    repo.add_workout(&untagged).unwrap();
    assert!(repo.get_workout(untagged.id).unwrap().unwrap().tags.is_empty());
}

// ============================================================================
// Health score
// ============================================================================

#[test]
fn test_health_score_without_data_is_zero_and_f() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "empty@example.com");

    let score = ctx
        .health_service
        .calculate_on(user.id, day(2025, 6, 30))
        .unwrap();
    assert_eq!(score.total_score, 0.0);
    assert_eq!(score.grade, Grade::F);
    assert_eq!(score.factors.len(), 5);
    assert_eq!(score.window_start, day(2025, 6, 1));
    assert_eq!(score.window_end, day(2025, 6, 30));
}

#[test]
fn test_health_score_stays_within_bounds() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = ctx
        .profile_service
        .create_user(
            "fit@example.com",
            "Fit",
            ProfileUpdate {
                goal_weight: Some(75.0),
                daily_calorie_goal: Some(2000.0),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
    let today = day(2025, 6, 30);
    ctx.profile_service
        .record_weight_at(user.id, 76.0, at(today, 7), None)
        .unwrap();

    log_consecutive(&ctx, user.id, today, 30);
    for offset in 0..30 {
        let date = today - Duration::days(offset);
        ctx.activity_service
            .log_meal(Meal::new(
                user.id,
                at(date, 13),
                MealType::Lunch,
                vec![food("bowl", 2000.0, 150.0)],
            ))
            .unwrap();
    }

    let score = ctx.health_service.calculate_on(user.id, today).unwrap();
    assert!(score.total_score > 60.0);
    assert!(score.total_score <= 100.0);
    for factor in score.factors.values() {
        assert!(factor.score >= 0.0 && factor.score <= factor.max_score);
    }
    // A workout 30 days ago falls outside the window
    assert_eq!(score.factors["workout_frequency"].value, 30.0);
}

#[test]
fn test_health_score_unknown_user_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    assert!(matches!(
        ctx.health_service.calculate(Uuid::new_v4()),
        Err(Error::NotFound(_))
    ));
}

// ============================================================================
// Weight prediction
// ============================================================================

fn predictable_user(ctx: &FitpulseContext) -> User {
    let user = ctx
        .profile_service
        .create_user(
            "predict@example.com",
            "Predict",
            ProfileUpdate {
                height_cm: Some(175.0),
                goal_weight: Some(79.0),
                activity_level: Some(ActivityLevel::Sedentary),
                date_of_birth: Some(day(1990, 1, 1)),
                gender: Some(Gender::Male),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
    ctx.profile_service.record_weight(user.id, 80.0, None).unwrap()
}

#[test]
fn test_prediction_with_zero_deficit_keeps_weight() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = predictable_user(&ctx);
    let today = day(2025, 6, 1);

    let age = user.age_on(today).unwrap();
    let expected_tdee = tdee(
        bmr(80.0, 175.0, age, Gender::Male),
        Some(ActivityLevel::Sedentary),
    );
    ctx.activity_service
        .log_meal(Meal::new(
            user.id,
            at(today, 12),
            MealType::Dinner,
            vec![food("balanced", expected_tdee, 100.0)],
        ))
        .unwrap();

    let p = ctx
        .prediction_service
        .predict_from(user.id, today, today + Duration::days(30))
        .unwrap();
    assert!(p.daily_deficit.abs() < 1e-6);
    assert!((p.predicted_weight - 80.0).abs() < 1e-6);
    assert_eq!(p.days_remaining, 30);
    assert!(p.on_track);
}

#[test]
fn test_prediction_without_meals_uses_default_intake() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = predictable_user(&ctx);
    let today = day(2025, 6, 1);

    let p = ctx
        .prediction_service
        .predict_from(user.id, today, today + Duration::days(70))
        .unwrap();
    assert_eq!(p.avg_daily_calories, 2000.0);
    assert!(p.daily_deficit > 0.0);
    assert!(p.predicted_weight < 80.0);
}

#[test]
fn test_prediction_rejects_bad_requests() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = predictable_user(&ctx);
    let today = Local::now().date_naive();

    let past = ctx
        .prediction_service
        .predict_from(user.id, today, today - Duration::days(1));
    assert!(matches!(past, Err(Error::Validation(_))));

    let garbage = ctx.prediction_service.predict(user.id, "next friday");
    assert!(matches!(garbage, Err(Error::Validation(_))));

    let unknown = ctx
        .prediction_service
        .predict_on(Uuid::new_v4(), today + Duration::days(5));
    assert!(matches!(unknown, Err(Error::NotFound(_))));

    let no_goal = create_user(&ctx, "nogoal@example.com");
    ctx.profile_service.record_weight(no_goal.id, 70.0, None).unwrap();
    let missing = ctx
        .prediction_service
        .predict_on(no_goal.id, today + Duration::days(5));
    match missing {
        Err(Error::Validation(message)) => {
            assert!(message.contains("goal weight, height, date of birth"));
            assert!(!message.contains("current weight"));
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}

// ============================================================================
// Suggestions
// ============================================================================

#[test]
fn test_suggestions_are_ordered_by_priority() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = ctx
        .profile_service
        .create_user(
            "coach@example.com",
            "Coach",
            ProfileUpdate {
                goal_weight: Some(80.0),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
    ctx.profile_service.record_weight(user.id, 90.0, None).unwrap();
    let today = day(2025, 8, 8);
    log_consecutive(&ctx, user.id, today - Duration::days(1), 3);

    let suggestions = ctx.suggestion_service.all_suggestions_on(user.id, today);
    let kinds: Vec<SuggestionKind> = suggestions.iter().map(|s| s.kind).collect();
    assert!(kinds.contains(&SuggestionKind::WeightLossFocus));
    assert!(kinds.contains(&SuggestionKind::WorkoutVariety));
    assert!(kinds.contains(&SuggestionKind::StartTracking));
    assert!(!kinds.contains(&SuggestionKind::WorkoutFrequency));

    assert_eq!(suggestions[0].priority, Priority::High);
    assert!(suggestions
        .windows(2)
        .all(|pair| pair[0].priority <= pair[1].priority));
}

// ============================================================================
// Post-commit achievement worker
// ============================================================================

#[tokio::test]
async fn test_worker_unlocks_each_badge_once() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = create_context(&temp_dir);
    let user = create_user(&ctx, "worker@example.com");

    let (queue, worker) = AchievementWorker::spawn(Arc::clone(&ctx.achievement_service));
    ctx.set_observer(Arc::new(queue));
    log_consecutive(&ctx, user.id, Local::now().date_naive(), 10);
    ctx.clear_observer();

    let unlocks = worker.finish().await;
    let kinds: Vec<AchievementKind> = unlocks.iter().map(|u| u.kind).collect();
    assert_eq!(
        kinds.iter().filter(|k| **k == AchievementKind::WorkoutStreak7).count(),
        1
    );
    assert_eq!(
        kinds.iter().filter(|k| **k == AchievementKind::WorkoutCount10).count(),
        1
    );
    assert!(unlocks.iter().all(|u| u.user_id == user.id));
    assert_eq!(
        ctx.achievement_service.list_achievements(user.id).unwrap().len(),
        2
    );
}
