//! Health score service - 0-100 composite over the trailing 30 days
//!
//! Five weighted factors, each reported with its raw value and target so
//! callers can show where points were lost:
//!
//! | factor              | max |
//! |---------------------|-----|
//! | workout_frequency   | 30  |
//! | calorie_adherence   | 25  |
//! | goal_progress       | 20  |
//! | consistency         | 15  |
//! | nutrition_balance   | 10  |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::MacroTotals;
use crate::ports::FitnessRepository;

pub const WINDOW_DAYS: i64 = 30;

const WORKOUT_DAYS_TARGET: f64 = 17.0;
const MIN_GOAL_BASELINE_KG: f64 = 10.0;
/// Target calorie split (protein, carbs, fat) in percent
const MACRO_TARGET: [f64; 3] = [30.0, 40.0, 30.0];

pub const WORKOUT_FREQUENCY: &str = "workout_frequency";
pub const CALORIE_ADHERENCE: &str = "calorie_adherence";
pub const GOAL_PROGRESS: &str = "goal_progress";
pub const CONSISTENCY: &str = "consistency";
pub const NUTRITION_BALANCE: &str = "nutrition_balance";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::APlus,
            s if s >= 80.0 => Grade::A,
            s if s >= 75.0 => Grade::BPlus,
            s if s >= 70.0 => Grade::B,
            s if s >= 65.0 => Grade::CPlus,
            s if s >= 60.0 => Grade::C,
            s if s >= 50.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted component of the score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthFactor {
    pub score: f64,
    pub max_score: f64,
    pub value: f64,
    pub target: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthScore {
    pub total_score: f64,
    pub percentage: f64,
    pub grade: Grade,
    pub factors: BTreeMap<String, HealthFactor>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// Everything the score is computed from, already reduced to the window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthInputs {
    pub workout_days: u32,
    /// Days with at least one workout or meal
    pub active_days: u32,
    /// Mean calories per day, over days that have meals
    pub avg_daily_intake: Option<f64>,
    pub macros: MacroTotals,
    pub daily_calorie_goal: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub starting_weight: Option<f64>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

pub struct HealthScoreService {
    repository: Arc<dyn FitnessRepository>,
}

impl HealthScoreService {
    pub fn new(repository: Arc<dyn FitnessRepository>) -> Self {
        Self { repository }
    }

    pub fn calculate(&self, user_id: Uuid) -> Result<HealthScore> {
        self.calculate_on(user_id, Local::now().date_naive())
    }

    /// Score for the 30 calendar days ending on `today` (inclusive)
    pub fn calculate_on(&self, user_id: Uuid, today: NaiveDate) -> Result<HealthScore> {
        let user = self
            .repository
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", user_id)))?;

        let window_start = today - Duration::days(WINDOW_DAYS - 1);
        let start = window_start.and_time(NaiveTime::MIN);
        let end = (today + Duration::days(1)).and_time(NaiveTime::MIN);

        let workouts = self.repository.get_workouts_between(user_id, start, end)?;
        let meals = self.repository.get_meals_between(user_id, start, end)?;

        let workout_days: BTreeSet<NaiveDate> = workouts.iter().map(|w| w.day()).collect();
        let mut daily_calories: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut macros = MacroTotals::default();
        for meal in &meals {
            *daily_calories.entry(meal.day()).or_insert(0.0) += meal.totals.calories;
            macros += meal.totals;
        }
        let active_days: BTreeSet<NaiveDate> = workout_days
            .iter()
            .copied()
            .chain(daily_calories.keys().copied())
            .collect();

        let avg_daily_intake = if daily_calories.is_empty() {
            None
        } else {
            Some(daily_calories.values().sum::<f64>() / daily_calories.len() as f64)
        };

        let inputs = HealthInputs {
            workout_days: workout_days.len() as u32,
            active_days: active_days.len() as u32,
            avg_daily_intake,
            macros,
            daily_calorie_goal: user.daily_calorie_goal,
            current_weight: user.current_weight,
            goal_weight: user.goal_weight,
            starting_weight: user.starting_weight,
            window_start,
            window_end: today,
        };
        tracing::debug!(%user_id, ?inputs, "computing health score");

        Ok(score_health(&inputs))
    }
}

/// Pure aggregation of the five factors
pub fn score_health(inputs: &HealthInputs) -> HealthScore {
    let mut factors = BTreeMap::new();

    factors.insert(
        WORKOUT_FREQUENCY.to_string(),
        HealthFactor {
            score: (f64::from(inputs.workout_days) / WORKOUT_DAYS_TARGET).min(1.0) * 30.0,
            max_score: 30.0,
            value: f64::from(inputs.workout_days),
            target: WORKOUT_DAYS_TARGET,
            label: "Workout days".to_string(),
        },
    );

    factors.insert(CALORIE_ADHERENCE.to_string(), calorie_adherence(inputs));
    factors.insert(GOAL_PROGRESS.to_string(), goal_progress(inputs));

    factors.insert(
        CONSISTENCY.to_string(),
        HealthFactor {
            score: (f64::from(inputs.active_days) / WINDOW_DAYS as f64).min(1.0) * 15.0,
            max_score: 15.0,
            value: f64::from(inputs.active_days),
            target: WINDOW_DAYS as f64,
            label: "Active days".to_string(),
        },
    );

    factors.insert(NUTRITION_BALANCE.to_string(), nutrition_balance(&inputs.macros));

    let total_score = factors.values().map(|f| f.score).sum::<f64>().clamp(0.0, 100.0);

    HealthScore {
        total_score,
        percentage: total_score / 100.0 * 100.0,
        grade: Grade::from_score(total_score),
        factors,
        window_start: inputs.window_start,
        window_end: inputs.window_end,
    }
}

fn calorie_adherence(inputs: &HealthInputs) -> HealthFactor {
    let goal = inputs.daily_calorie_goal.filter(|g| *g > 0.0);
    let score = match (goal, inputs.avg_daily_intake) {
        (Some(goal), Some(avg)) => (1.0 - 2.0 * (avg - goal).abs() / goal).max(0.0) * 25.0,
        _ => 0.0,
    };
    HealthFactor {
        score,
        max_score: 25.0,
        value: inputs.avg_daily_intake.unwrap_or(0.0),
        target: goal.unwrap_or(0.0),
        label: "Average daily calories".to_string(),
    }
}

/// Distance to goal relative to the distance at the start
///
/// Without a recorded starting weight the baseline is the current weight,
/// and the baseline distance never drops below 10 kg.
fn goal_progress(inputs: &HealthInputs) -> HealthFactor {
    let score = match (inputs.current_weight, inputs.goal_weight) {
        (Some(current), Some(goal)) => {
            let baseline = inputs.starting_weight.unwrap_or(current);
            let prior_diff = (baseline - goal).abs().max(MIN_GOAL_BASELINE_KG);
            (1.0 - (current - goal).abs() / prior_diff).clamp(0.0, 1.0) * 20.0
        }
        _ => 0.0,
    };
    HealthFactor {
        score,
        max_score: 20.0,
        value: inputs.current_weight.unwrap_or(0.0),
        target: inputs.goal_weight.unwrap_or(0.0),
        label: "Weight vs goal (kg)".to_string(),
    }
}

/// Mean absolute deviation of the calorie split from 30/40/30
fn macro_deviation(macros: &MacroTotals) -> Option<f64> {
    let split = [macros.protein * 4.0, macros.carbs * 4.0, macros.fat * 9.0];
    let total: f64 = split.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let deviation = split
        .iter()
        .zip(MACRO_TARGET)
        .map(|(cal, target)| (cal / total * 100.0 - target).abs())
        .sum::<f64>()
        / 3.0;
    Some(deviation)
}

fn nutrition_balance(macros: &MacroTotals) -> HealthFactor {
    let deviation = macro_deviation(macros);
    HealthFactor {
        score: deviation.map(|d| (10.0 - d / 5.0).max(0.0)).unwrap_or(0.0),
        max_score: 10.0,
        value: deviation.unwrap_or(0.0),
        target: 0.0,
        label: "Macro deviation from 30/40/30 (%)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor<'a>(score: &'a HealthScore, name: &str) -> &'a HealthFactor {
        &score.factors[name]
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(100.0), Grade::APlus);
        assert_eq!(Grade::from_score(90.0), Grade::APlus);
        assert_eq!(Grade::from_score(89.9), Grade::A);
        assert_eq!(Grade::from_score(75.0), Grade::BPlus);
        assert_eq!(Grade::from_score(70.0), Grade::B);
        assert_eq!(Grade::from_score(65.0), Grade::CPlus);
        assert_eq!(Grade::from_score(60.0), Grade::C);
        assert_eq!(Grade::from_score(50.0), Grade::D);
        assert_eq!(Grade::from_score(49.99), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let score = score_health(&HealthInputs::default());
        assert_eq!(score.total_score, 0.0);
        assert_eq!(score.grade, Grade::F);
        assert_eq!(score.factors.len(), 5);
    }

    #[test]
    fn test_max_scores_sum_to_100() {
        let score = score_health(&HealthInputs::default());
        let max: f64 = score.factors.values().map(|f| f.max_score).sum();
        assert_eq!(max, 100.0);
    }

    #[test]
    fn test_perfect_inputs() {
        let inputs = HealthInputs {
            workout_days: 20,
            active_days: 30,
            avg_daily_intake: Some(2000.0),
            // 150g protein = 600 kcal, 200g carbs = 800 kcal, 600/9g fat = 600 kcal
            macros: MacroTotals {
                calories: 2000.0,
                protein: 150.0,
                carbs: 200.0,
                fat: 600.0 / 9.0,
            },
            daily_calorie_goal: Some(2000.0),
            current_weight: Some(70.0),
            goal_weight: Some(70.0),
            starting_weight: Some(80.0),
            ..Default::default()
        };
        let score = score_health(&inputs);
        assert!((score.total_score - 100.0).abs() < 1e-9);
        assert_eq!(score.grade, Grade::APlus);
    }

    #[test]
    fn test_workout_frequency_caps_at_17_days() {
        let inputs = HealthInputs {
            workout_days: 25,
            ..Default::default()
        };
        assert_eq!(factor(&score_health(&inputs), WORKOUT_FREQUENCY).score, 30.0);
    }

    #[test]
    fn test_calorie_adherence_half_off_is_zero() {
        let inputs = HealthInputs {
            avg_daily_intake: Some(3000.0),
            daily_calorie_goal: Some(2000.0),
            ..Default::default()
        };
        assert_eq!(factor(&score_health(&inputs), CALORIE_ADHERENCE).score, 0.0);

        let inputs = HealthInputs {
            avg_daily_intake: Some(2200.0),
            daily_calorie_goal: Some(2000.0),
            ..Default::default()
        };
        // 1 - 2 * 200/2000 = 0.8
        assert!((factor(&score_health(&inputs), CALORIE_ADHERENCE).score - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_goal_progress_uses_ten_kg_floor() {
        let inputs = HealthInputs {
            current_weight: Some(82.0),
            goal_weight: Some(80.0),
            ..Default::default()
        };
        // baseline = current, prior diff floored to 10: 1 - 2/10 = 0.8
        assert!((factor(&score_health(&inputs), GOAL_PROGRESS).score - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_goal_progress_with_starting_weight() {
        let inputs = HealthInputs {
            current_weight: Some(90.0),
            goal_weight: Some(80.0),
            starting_weight: Some(100.0),
            ..Default::default()
        };
        // 1 - 10/20 = 0.5
        assert!((factor(&score_health(&inputs), GOAL_PROGRESS).score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_goal_progress_moving_away_clamps_to_zero() {
        let inputs = HealthInputs {
            current_weight: Some(105.0),
            goal_weight: Some(80.0),
            starting_weight: Some(90.0),
            ..Default::default()
        };
        assert_eq!(factor(&score_health(&inputs), GOAL_PROGRESS).score, 0.0);
    }

    #[test]
    fn test_nutrition_balance_all_fat() {
        let inputs = HealthInputs {
            macros: MacroTotals {
                calories: 900.0,
                protein: 0.0,
                carbs: 0.0,
                fat: 100.0,
            },
            ..Default::default()
        };
        // deviations 30, 40, 70 -> mean 46.67 -> 10 - 9.33
        let f = factor(&score_health(&inputs), NUTRITION_BALANCE).clone();
        assert!((f.value - 140.0 / 3.0).abs() < 1e-9);
        assert!((f.score - (10.0 - 140.0 / 15.0)).abs() < 1e-9);
    }

    #[test]
    fn test_score_always_within_bounds() {
        for workout_days in [0, 5, 17, 40] {
            for active_days in [0, 15, 30, 45] {
                for intake in [None, Some(0.0), Some(1500.0), Some(9000.0)] {
                    let inputs = HealthInputs {
                        workout_days,
                        active_days,
                        avg_daily_intake: intake,
                        daily_calorie_goal: Some(2000.0),
                        current_weight: Some(75.0),
                        goal_weight: Some(70.0),
                        ..Default::default()
                    };
                    let s = score_health(&inputs);
                    assert!((0.0..=100.0).contains(&s.total_score));
                    for f in s.factors.values() {
                        assert!(f.score >= 0.0 && f.score <= f.max_score);
                    }
                }
            }
        }
    }
}
