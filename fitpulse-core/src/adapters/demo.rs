//! Demo data generator
//!
//! Produces a deterministic history for one demo user:
//! - 45 days of workouts, with an unbroken run over the last 8 days
//! - three meals a day plus occasional snacks
//! - a weigh-in every third day trending towards the goal
//!
//! Dates are relative to `today` so the demo always looks current.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::domain::{
    ActivityLevel, Exercise, FoodItem, Gender, Meal, MealType, User, WeightEntry, Workout,
};

pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);

pub const DEMO_DAYS: i64 = 45;

const SEED: u64 = 0x5EED_F17;

const START_WEIGHT: f64 = 88.0;

/// (tag, exercises, minutes, kcal per minute)
const SESSIONS: &[(&str, &[(&str, u32, u32, Option<f64>)], u32, f64)] = &[
    ("cardio", &[("Treadmill run", 1, 1, None)], 35, 10.5),
    (
        "strength",
        &[
            ("Squat", 5, 5, Some(80.0)),
            ("Bench press", 5, 5, Some(60.0)),
            ("Barbell row", 5, 5, Some(55.0)),
        ],
        55,
        6.5,
    ),
    ("hiit", &[("Burpees", 5, 15, None), ("Kettlebell swing", 5, 20, Some(16.0))], 25, 12.0),
    ("mobility", &[("Yoga flow", 1, 1, None)], 30, 3.5),
    (
        "strength",
        &[("Deadlift", 3, 5, Some(110.0)), ("Pull-up", 4, 8, None)],
        45,
        7.0,
    ),
];

/// (name, amount, kcal, protein, carbs, fat)
type Food = (&'static str, &'static str, f64, f64, f64, f64);

const BREAKFASTS: &[&[Food]] = &[
    &[("Oatmeal", "80 g", 300.0, 10.0, 54.0, 5.0), ("Banana", "1", 105.0, 1.3, 27.0, 0.4)],
    &[("Scrambled eggs", "3 eggs", 270.0, 18.0, 2.0, 20.0), ("Wholegrain toast", "2 slices", 160.0, 8.0, 28.0, 2.0)],
    &[("Greek yogurt", "200 g", 190.0, 20.0, 8.0, 9.0), ("Granola", "40 g", 180.0, 4.0, 26.0, 7.0)],
];

const LUNCHES: &[&[Food]] = &[
    &[("Chicken breast", "150 g", 250.0, 46.0, 0.0, 5.0), ("Brown rice", "150 g", 165.0, 4.0, 34.0, 1.5), ("Broccoli", "100 g", 35.0, 2.8, 7.0, 0.4)],
    &[("Tuna salad", "1 bowl", 380.0, 32.0, 12.0, 22.0), ("Sourdough", "1 slice", 120.0, 4.0, 23.0, 1.0)],
    &[("Lentil soup", "400 ml", 320.0, 18.0, 48.0, 5.0), ("Feta", "30 g", 80.0, 4.0, 1.0, 6.0)],
];

const DINNERS: &[&[Food]] = &[
    &[("Salmon fillet", "180 g", 370.0, 36.0, 0.0, 24.0), ("Sweet potato", "200 g", 180.0, 4.0, 41.0, 0.2)],
    &[("Beef stir fry", "1 plate", 520.0, 38.0, 30.0, 26.0), ("Jasmine rice", "150 g", 195.0, 4.0, 42.0, 0.4)],
    &[("Wholewheat pasta", "120 g", 420.0, 17.0, 80.0, 3.0), ("Tomato sauce", "150 g", 90.0, 3.0, 14.0, 3.0), ("Parmesan", "20 g", 80.0, 7.0, 0.0, 5.5)],
];

const SNACKS: &[&[Food]] = &[
    &[("Apple", "1", 95.0, 0.5, 25.0, 0.3)],
    &[("Almonds", "30 g", 175.0, 6.0, 6.0, 15.0)],
    &[("Protein shake", "1 scoop", 120.0, 24.0, 3.0, 1.5)],
];

fn at(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN))
}

fn foods(items: &[Food]) -> Vec<FoodItem> {
    items
        .iter()
        .map(|(name, amount, calories, protein, carbs, fat)| FoodItem {
            name: name.to_string(),
            amount: amount.to_string(),
            calories: *calories,
            protein: *protein,
            carbs: *carbs,
            fat: *fat,
        })
        .collect()
}

/// The demo profile, as it looks before any weigh-ins are recorded
pub fn generate_demo_user(today: NaiveDate) -> User {
    let mut user = User::new("demo@fitpulse.local", "Demo Athlete");
    user.id = DEMO_USER_ID;
    user.height_cm = Some(178.0);
    user.goal_weight = Some(80.0);
    user.activity_level = Some(ActivityLevel::ModeratelyActive);
    user.daily_calorie_goal = Some(2200.0);
    user.date_of_birth = NaiveDate::from_ymd_opt(today.year() - 32, 4, 12);
    user.gender = Some(Gender::Male);
    user
}

pub fn generate_demo_workouts(user_id: Uuid, today: NaiveDate) -> Vec<Workout> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut workouts = Vec::new();

    for days_ago in (0..DEMO_DAYS).rev() {
        // Always train over the last 8 days so the demo shows a live streak
        if days_ago >= 8 && !rng.gen_bool(0.6) {
            continue;
        }
        let day = today - Duration::days(days_ago);
        let (tag, exercises, minutes, kcal_per_min) = SESSIONS[rng.gen_range(0..SESSIONS.len())];
        let duration = minutes + rng.gen_range(0..10);

        let mut workout = Workout::new(user_id, at(day, 7, rng.gen_range(0..45)));
        workout.exercises = exercises
            .iter()
            .map(|(name, sets, reps, weight)| Exercise {
                name: name.to_string(),
                sets: *sets,
                reps: *reps,
                weight: *weight,
            })
            .collect();
        workout.total_duration = duration;
        workout.calories_burned = (f64::from(duration) * kcal_per_min).round();
        workout.tags = vec![tag.to_string()];
        workouts.push(workout);
    }

    workouts
}

pub fn generate_demo_meals(user_id: Uuid, today: NaiveDate) -> Vec<Meal> {
    let mut rng = StdRng::seed_from_u64(SEED + 1);
    let mut meals = Vec::new();

    for days_ago in (0..DEMO_DAYS).rev() {
        let day = today - Duration::days(days_ago);
        let plan: [(MealType, &[&[Food]], u32); 3] = [
            (MealType::Breakfast, BREAKFASTS, 8),
            (MealType::Lunch, LUNCHES, 13),
            (MealType::Dinner, DINNERS, 19),
        ];
        for (meal_type, options, hour) in plan {
            let items = foods(options[rng.gen_range(0..options.len())]);
            meals.push(Meal::new(user_id, at(day, hour, rng.gen_range(0..50)), meal_type, items));
        }
        if rng.gen_bool(0.5) {
            let items = foods(SNACKS[rng.gen_range(0..SNACKS.len())]);
            meals.push(Meal::new(user_id, at(day, 16, 0), MealType::Snack, items));
        }
    }

    meals
}

/// Weigh-ins every third day, oldest first
pub fn generate_demo_weights(user_id: Uuid, today: NaiveDate) -> Vec<WeightEntry> {
    let mut rng = StdRng::seed_from_u64(SEED + 2);
    let mut entries = Vec::new();
    let mut weight = START_WEIGHT;

    let days: Vec<i64> = (0..DEMO_DAYS).step_by(3).collect();
    for days_ago in days.into_iter().rev() {
        let day = today - Duration::days(days_ago);
        let noise: f64 = rng.gen_range(-0.3..0.3);
        entries.push(WeightEntry::at(
            user_id,
            ((weight + noise) * 10.0).round() / 10.0,
            at(day, 6, 30),
        ));
        weight -= 0.25;
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_demo_workouts(DEMO_USER_ID, today());
        let b = generate_demo_workouts(DEMO_USER_ID, today());
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| x.date == y.date && x.calories_burned == y.calories_burned));
    }

    #[test]
    fn test_last_eight_days_have_workouts() {
        let workouts = generate_demo_workouts(DEMO_USER_ID, today());
        let days: BTreeSet<_> = workouts.iter().map(|w| w.day()).collect();
        for d in 0..8 {
            assert!(days.contains(&(today() - Duration::days(d))));
        }
        assert!(workouts.iter().all(|w| w.validate().is_ok()));
    }

    #[test]
    fn test_meals_have_consistent_totals() {
        let meals = generate_demo_meals(DEMO_USER_ID, today());
        assert!(meals.len() >= (DEMO_DAYS * 3) as usize);
        for meal in &meals {
            assert!(meal.validate().is_ok());
            let expected: f64 = meal.food_items.iter().map(|f| f.calories).sum();
            assert!((meal.totals.calories - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_weights_trend_down() {
        let weights = generate_demo_weights(DEMO_USER_ID, today());
        assert_eq!(weights.len(), 15);
        let first = weights.first().unwrap().weight;
        let last = weights.last().unwrap().weight;
        assert!(last < first);
        assert_eq!(weights.last().unwrap().recorded_at.date(), today());
    }
}
