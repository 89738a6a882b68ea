//! Suggestion service - rule-based coaching hints
//!
//! Suggestions are advisory and never persisted. Each category is evaluated
//! on its own; a failure in one category only empties that category.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{ActivityLevel, Meal, User, Workout};
use crate::ports::FitnessRepository;
use crate::services::streak::end_of_day;

const RECENT_WORKOUTS: usize = 10;
const RECENT_MEALS: usize = 7;
const WEEKLY_WORKOUT_TARGET: usize = 3;
const WEIGHT_FOCUS_KG: f64 = 5.0;
const PROTEIN_G_PER_KG: f64 = 1.0;
const MEALS_PER_DAY_TARGET: f64 = 3.0;

/// Declaration order is display order: high sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    WorkoutFrequency,
    WorkoutVariety,
    WeightLossFocus,
    WeightGainFocus,
    SedentaryStart,
    RestDay,
    StartTracking,
    CalorieExcess,
    CalorieDeficit,
    CalorieOnTrack,
    ProteinLow,
    MealFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Workout,
    Nutrition,
}

impl std::str::FromStr for SuggestionCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "workout" | "workouts" => Ok(SuggestionCategory::Workout),
            "nutrition" | "meals" => Ok(SuggestionCategory::Nutrition),
            other => Err(Error::validation(format!(
                "Unknown suggestion category: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub priority: Priority,
    pub title: String,
    pub message: String,
}

impl Suggestion {
    fn new(
        kind: SuggestionKind,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            priority,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Stable sort: high before medium before low, ties keep their order
pub fn sort_by_priority(suggestions: &mut [Suggestion]) {
    suggestions.sort_by_key(|s| s.priority);
}

/// Workout rules over the recent history
///
/// `recent` is the most recent workouts (newest first, at most 10),
/// `last_week` is every workout in the trailing 7 days.
pub fn workout_rules(
    user: &User,
    recent: &[Workout],
    last_week: usize,
    today: NaiveDate,
) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if last_week < WEEKLY_WORKOUT_TARGET {
        out.push(Suggestion::new(
            SuggestionKind::WorkoutFrequency,
            Priority::High,
            "Move more this week",
            format!(
                "You've logged {} workout(s) in the last 7 days. Aim for at least {}.",
                last_week, WEEKLY_WORKOUT_TARGET
            ),
        ));
    }

    let distinct_tags: BTreeSet<&str> = recent
        .iter()
        .flat_map(|w| w.tags.iter().map(String::as_str))
        .collect();
    if distinct_tags.len() < 2 && recent.len() >= 3 {
        out.push(Suggestion::new(
            SuggestionKind::WorkoutVariety,
            Priority::Medium,
            "Mix up your training",
            "Your recent workouts all look alike. Try adding cardio, strength or mobility sessions.",
        ));
    }

    if let (Some(current), Some(goal)) = (user.current_weight, user.goal_weight) {
        if current - goal > WEIGHT_FOCUS_KG {
            out.push(Suggestion::new(
                SuggestionKind::WeightLossFocus,
                Priority::High,
                "Add more cardio",
                format!(
                    "You're {:.1} kg above your goal. Cardio and interval sessions burn the most energy.",
                    current - goal
                ),
            ));
        } else if goal - current > WEIGHT_FOCUS_KG {
            out.push(Suggestion::new(
                SuggestionKind::WeightGainFocus,
                Priority::High,
                "Focus on strength",
                format!(
                    "You're {:.1} kg below your goal. Progressive strength training helps build mass.",
                    goal - current
                ),
            ));
        }
    }

    if user.activity_level == Some(ActivityLevel::Sedentary) && recent.is_empty() {
        out.push(Suggestion::new(
            SuggestionKind::SedentaryStart,
            Priority::High,
            "Start small",
            "A 15 minute walk is a great first workout. Log it to start your streak.",
        ));
    }

    let trained_today = recent.iter().any(|w| w.day() == today);
    if trained_today && recent.len() >= 5 {
        out.push(Suggestion::new(
            SuggestionKind::RestDay,
            Priority::Low,
            "Plan a rest day",
            "You've been training hard. Recovery days help muscles rebuild.",
        ));
    }

    out
}

/// Nutrition rules over the most recent meals (newest first, at most 7)
pub fn nutrition_rules(user: &User, total_meals: u64, recent: &[Meal]) -> Vec<Suggestion> {
    if total_meals == 0 || recent.is_empty() {
        return vec![Suggestion::new(
            SuggestionKind::StartTracking,
            Priority::High,
            "Start tracking meals",
            "Log what you eat to get calorie and macro feedback.",
        )];
    }

    let mut out = Vec::new();

    let mut per_day: BTreeMap<NaiveDate, (f64, f64, u32)> = BTreeMap::new();
    for meal in recent {
        let day = per_day.entry(meal.day()).or_insert((0.0, 0.0, 0));
        day.0 += meal.totals.calories;
        day.1 += meal.totals.protein;
        day.2 += 1;
    }
    let days = per_day.len() as f64;
    let avg_calories = per_day.values().map(|d| d.0).sum::<f64>() / days;
    let avg_protein = per_day.values().map(|d| d.1).sum::<f64>() / days;
    let meals_per_day = recent.len() as f64 / days;

    if let Some(goal) = user.daily_calorie_goal.filter(|g| *g > 0.0) {
        if avg_calories > goal * 1.1 {
            out.push(Suggestion::new(
                SuggestionKind::CalorieExcess,
                Priority::Medium,
                "Over your calorie goal",
                format!(
                    "You're averaging {:.0} kcal a day against a goal of {:.0}.",
                    avg_calories, goal
                ),
            ));
        } else if avg_calories < goal * 0.9 {
            out.push(Suggestion::new(
                SuggestionKind::CalorieDeficit,
                Priority::Medium,
                "Under your calorie goal",
                format!(
                    "You're averaging {:.0} kcal a day against a goal of {:.0}. Make sure you're fuelling enough.",
                    avg_calories, goal
                ),
            ));
        } else {
            out.push(Suggestion::new(
                SuggestionKind::CalorieOnTrack,
                Priority::Low,
                "Calories on track",
                format!("You're averaging {:.0} kcal a day, right around your goal.", avg_calories),
            ));
        }
    }

    if let Some(weight) = user.current_weight {
        let target = weight * PROTEIN_G_PER_KG;
        if avg_protein < target * 0.8 {
            out.push(Suggestion::new(
                SuggestionKind::ProteinLow,
                Priority::Medium,
                "Eat more protein",
                format!(
                    "You're averaging {:.0} g of protein a day. Aim for about {:.0} g.",
                    avg_protein, target
                ),
            ));
        }
    }

    if meals_per_day < MEALS_PER_DAY_TARGET {
        out.push(Suggestion::new(
            SuggestionKind::MealFrequency,
            Priority::Low,
            "Regular meals",
            format!(
                "You're logging {:.1} meals a day. Three regular meals help keep energy steady.",
                meals_per_day
            ),
        ));
    }

    out
}

pub struct SuggestionService {
    repository: Arc<dyn FitnessRepository>,
}

impl SuggestionService {
    pub fn new(repository: Arc<dyn FitnessRepository>) -> Self {
        Self { repository }
    }

    pub fn workout_suggestions(&self, user_id: Uuid) -> Vec<Suggestion> {
        self.workout_suggestions_on(user_id, Local::now().date_naive())
    }

    pub fn workout_suggestions_on(&self, user_id: Uuid, today: NaiveDate) -> Vec<Suggestion> {
        self.try_workout(user_id, today).unwrap_or_else(|e| {
            tracing::warn!(%user_id, error = %e, "workout suggestions unavailable");
            Vec::new()
        })
    }

    pub fn nutrition_suggestions(&self, user_id: Uuid) -> Vec<Suggestion> {
        self.try_nutrition(user_id).unwrap_or_else(|e| {
            tracing::warn!(%user_id, error = %e, "nutrition suggestions unavailable");
            Vec::new()
        })
    }

    /// Both categories merged and ordered by priority
    pub fn all_suggestions(&self, user_id: Uuid) -> Vec<Suggestion> {
        self.all_suggestions_on(user_id, Local::now().date_naive())
    }

    pub fn all_suggestions_on(&self, user_id: Uuid, today: NaiveDate) -> Vec<Suggestion> {
        let mut all = self.workout_suggestions_on(user_id, today);
        all.extend(self.nutrition_suggestions(user_id));
        sort_by_priority(&mut all);
        all
    }

    /// Suggestions for one category, or all when `category` is None
    pub fn suggestions(&self, user_id: Uuid, category: Option<SuggestionCategory>) -> Vec<Suggestion> {
        match category {
            Some(SuggestionCategory::Workout) => self.workout_suggestions(user_id),
            Some(SuggestionCategory::Nutrition) => self.nutrition_suggestions(user_id),
            None => self.all_suggestions(user_id),
        }
    }

    fn user(&self, user_id: Uuid) -> Result<User> {
        self.repository
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", user_id)))
    }

    fn try_workout(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<Suggestion>> {
        let user = self.user(user_id)?;
        let week_end = end_of_day(today);
        let recent = self
            .repository
            .get_workouts_before(user_id, week_end, RECENT_WORKOUTS)?;
        let week_start = (today - Duration::days(6)).and_time(NaiveTime::MIN);
        let last_week = self
            .repository
            .get_workouts_between(user_id, week_start, week_end)?
            .len();
        Ok(workout_rules(&user, &recent, last_week, today))
    }

    fn try_nutrition(&self, user_id: Uuid) -> Result<Vec<Suggestion>> {
        let user = self.user(user_id)?;
        let total = self.repository.count_meals(user_id)?;
        let recent = if total == 0 {
            Vec::new()
        } else {
            self.repository.get_recent_meals(user_id, RECENT_MEALS)?
        };
        Ok(nutrition_rules(&user, total, &recent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FoodItem, MealType};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn user() -> User {
        User::new("test@example.com", "Test")
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "Nutrition".parse::<SuggestionCategory>().unwrap(),
            SuggestionCategory::Nutrition
        );
        assert_eq!(
            "workout".parse::<SuggestionCategory>().unwrap(),
            SuggestionCategory::Workout
        );
        assert!("sleep".parse::<SuggestionCategory>().is_err());
    }

    fn workout(user_id: Uuid, days_ago: i64, tag: &str) -> Workout {
        let date = (today() - Duration::days(days_ago)).and_hms_opt(7, 0, 0).unwrap();
        let mut w = Workout::new(user_id, date);
        w.tags = vec![tag.to_string()];
        w
    }

    fn meal(user_id: Uuid, days_ago: i64, calories: f64, protein: f64) -> Meal {
        let date = (today() - Duration::days(days_ago)).and_hms_opt(12, 0, 0).unwrap();
        Meal::new(
            user_id,
            date,
            MealType::Lunch,
            vec![FoodItem {
                name: "plate".to_string(),
                amount: "1".to_string(),
                calories,
                protein,
                carbs: 0.0,
                fat: 0.0,
            }],
        )
    }

    fn kinds(suggestions: &[Suggestion]) -> Vec<SuggestionKind> {
        suggestions.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_priority_sort_is_stable() {
        let mut list = vec![
            Suggestion::new(SuggestionKind::RestDay, Priority::Low, "a", ""),
            Suggestion::new(SuggestionKind::ProteinLow, Priority::Medium, "b", ""),
            Suggestion::new(SuggestionKind::WorkoutFrequency, Priority::High, "c", ""),
            Suggestion::new(SuggestionKind::CalorieExcess, Priority::Medium, "d", ""),
        ];
        sort_by_priority(&mut list);
        let titles: Vec<_> = list.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_sedentary_user_without_workouts() {
        let mut u = user();
        u.activity_level = Some(ActivityLevel::Sedentary);
        let out = workout_rules(&u, &[], 0, today());
        assert_eq!(
            kinds(&out),
            vec![SuggestionKind::WorkoutFrequency, SuggestionKind::SedentaryStart]
        );
    }

    #[test]
    fn test_variety_needs_three_workouts() {
        let u = user();
        let two: Vec<_> = (1..=2).map(|d| workout(u.id, d, "run")).collect();
        assert!(!kinds(&workout_rules(&u, &two, 2, today())).contains(&SuggestionKind::WorkoutVariety));

        let three: Vec<_> = (1..=3).map(|d| workout(u.id, d, "run")).collect();
        assert!(kinds(&workout_rules(&u, &three, 3, today())).contains(&SuggestionKind::WorkoutVariety));

        let mixed = vec![workout(u.id, 1, "run"), workout(u.id, 2, "lift"), workout(u.id, 3, "run")];
        assert!(!kinds(&workout_rules(&u, &mixed, 3, today())).contains(&SuggestionKind::WorkoutVariety));
    }

    #[test]
    fn test_weight_focus() {
        let mut u = user();
        u.current_weight = Some(90.0);
        u.goal_weight = Some(80.0);
        assert!(kinds(&workout_rules(&u, &[], 3, today())).contains(&SuggestionKind::WeightLossFocus));

        u.current_weight = Some(70.0);
        assert!(kinds(&workout_rules(&u, &[], 3, today())).contains(&SuggestionKind::WeightGainFocus));

        u.current_weight = Some(84.0);
        assert!(workout_rules(&u, &[], 3, today()).is_empty());
    }

    #[test]
    fn test_rest_day_after_hard_week() {
        let u = user();
        let recent: Vec<_> = (0..5)
            .map(|d| workout(u.id, d, if d % 2 == 0 { "run" } else { "lift" }))
            .collect();
        let out = workout_rules(&u, &recent, 5, today());
        assert_eq!(kinds(&out), vec![SuggestionKind::RestDay]);
        assert_eq!(out[0].priority, Priority::Low);
    }

    #[test]
    fn test_start_tracking_short_circuits() {
        let mut u = user();
        u.daily_calorie_goal = Some(2000.0);
        u.current_weight = Some(80.0);
        assert_eq!(kinds(&nutrition_rules(&u, 0, &[])), vec![SuggestionKind::StartTracking]);
    }

    #[test]
    fn test_calorie_bands() {
        let mut u = user();
        u.daily_calorie_goal = Some(2000.0);
        let three_meals = |cal: f64| -> Vec<Meal> { (0..3).map(|_| meal(u.id, 0, cal / 3.0, 0.0)).collect() };

        assert!(kinds(&nutrition_rules(&u, 3, &three_meals(2300.0))).contains(&SuggestionKind::CalorieExcess));
        assert!(kinds(&nutrition_rules(&u, 3, &three_meals(1700.0))).contains(&SuggestionKind::CalorieDeficit));
        assert!(kinds(&nutrition_rules(&u, 3, &three_meals(2100.0))).contains(&SuggestionKind::CalorieOnTrack));
    }

    #[test]
    fn test_protein_low_and_meal_frequency() {
        let mut u = user();
        u.current_weight = Some(80.0);
        // one meal per day, 50 g protein against a 64 g floor
        let meals = vec![meal(u.id, 0, 2000.0, 50.0), meal(u.id, 1, 2000.0, 50.0)];
        let out = nutrition_rules(&u, 2, &meals);
        assert_eq!(
            kinds(&out),
            vec![SuggestionKind::ProteinLow, SuggestionKind::MealFrequency]
        );
    }
}
