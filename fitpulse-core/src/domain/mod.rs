//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod achievement;
mod meal;
mod user;
mod weight;
mod workout;
pub mod result;

pub use achievement::{Achievement, AchievementKind};
pub use meal::{FoodItem, MacroTotals, Meal, MealType};
pub use user::{ActivityLevel, Gender, User};
pub use weight::WeightEntry;
pub use workout::{Exercise, Workout};
