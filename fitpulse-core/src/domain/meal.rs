//! Meal domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(Error::validation(format!("Unknown meal type: {}", other))),
        }
    }
}

/// One food line. Macros are grams, calories are kcal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    /// Free-form serving description ("150 g", "1 cup")
    pub amount: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Denormalised sums over a meal's food items
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    pub fn from_items(items: &[FoodItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            calories: acc.calories + item.calories,
            protein: acc.protein + item.protein,
            carbs: acc.carbs + item.carbs,
            fat: acc.fat + item.fat,
        })
    }
}

impl std::ops::AddAssign for MacroTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.carbs += rhs.carbs;
        self.fat += rhs.fat;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    /// When the meal was eaten (naive datetime, local time)
    pub date: NaiveDateTime,
    pub meal_type: MealType,
    pub food_items: Vec<FoodItem>,
    /// Always equal to the sum over `food_items`; see [`Meal::recompute_totals`]
    pub totals: MacroTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meal {
    /// Create a meal; totals are derived from the items
    pub fn new(
        user_id: Uuid,
        date: NaiveDateTime,
        meal_type: MealType,
        food_items: Vec<FoodItem>,
    ) -> Self {
        let now = Utc::now();
        let totals = MacroTotals::from_items(&food_items);
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            meal_type,
            food_items,
            totals,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn recompute_totals(&mut self) {
        self.totals = MacroTotals::from_items(&self.food_items);
    }

    pub fn validate(&self) -> Result<()> {
        if self.food_items.is_empty() {
            return Err(Error::validation("a meal needs at least one food item"));
        }
        for item in &self.food_items {
            if item.name.trim().is_empty() {
                return Err(Error::validation("food item name cannot be empty"));
            }
            let values = [item.calories, item.protein, item.carbs, item.fat];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(Error::validation(format!(
                    "nutrition values for '{}' must be non-negative",
                    item.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, calories: f64, protein: f64, carbs: f64, fat: f64) -> FoodItem {
        FoodItem {
            name: name.to_string(),
            amount: "1 serving".to_string(),
            calories,
            protein,
            carbs,
            fat,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_totals_are_sum_of_items() {
        let meal = Meal::new(
            Uuid::new_v4(),
            noon(),
            MealType::Lunch,
            vec![
                item("rice", 200.0, 4.0, 45.0, 0.5),
                item("chicken", 165.0, 31.0, 0.0, 3.6),
            ],
        );
        assert_eq!(meal.totals.calories, 365.0);
        assert_eq!(meal.totals.protein, 35.0);
        assert_eq!(meal.totals.carbs, 45.0);
        assert!((meal.totals.fat - 4.1).abs() < 1e-9);
    }

    #[test]
    fn test_recompute_after_edit() {
        let mut meal = Meal::new(
            Uuid::new_v4(),
            noon(),
            MealType::Snack,
            vec![item("apple", 95.0, 0.5, 25.0, 0.3)],
        );
        meal.food_items.push(item("yogurt", 150.0, 12.0, 17.0, 4.0));
        meal.totals = MacroTotals::default();
        meal.recompute_totals();
        assert_eq!(meal.totals.calories, 245.0);
    }

    #[test]
    fn test_validate_requires_items() {
        let meal = Meal::new(Uuid::new_v4(), noon(), MealType::Dinner, vec![]);
        assert!(matches!(meal.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_meal_type_round_trips_through_str() {
        assert_eq!("Breakfast".parse::<MealType>().unwrap(), MealType::Breakfast);
        assert!("brunch".parse::<MealType>().is_err());
    }
}
