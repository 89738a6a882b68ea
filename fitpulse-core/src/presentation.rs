//! Display metadata for closed domain enums
//!
//! Core computations only deal in enum variants. Titles, descriptions and
//! icons are attached here, at the edge, so renaming a badge never touches
//! scoring or persistence logic.

use crate::domain::{AchievementKind, MealType};
use crate::services::Priority;

/// Display metadata for an achievement badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub fn badge(kind: AchievementKind) -> Badge {
    match kind {
        AchievementKind::WorkoutStreak7 => Badge {
            title: "Week Warrior",
            description: "Worked out 7 days in a row",
            icon: "🔥",
        },
        AchievementKind::WorkoutStreak30 => Badge {
            title: "Monthly Machine",
            description: "Worked out 30 days in a row",
            icon: "💪",
        },
        AchievementKind::WorkoutStreak100 => Badge {
            title: "Century Streak",
            description: "Worked out 100 days in a row",
            icon: "🏆",
        },
        AchievementKind::WorkoutCount10 => Badge {
            title: "Getting Started",
            description: "Logged 10 workouts",
            icon: "🎯",
        },
        AchievementKind::WorkoutCount50 => Badge {
            title: "Dedicated",
            description: "Logged 50 workouts",
            icon: "⭐",
        },
        AchievementKind::WorkoutCount100 => Badge {
            title: "Centurion",
            description: "Logged 100 workouts",
            icon: "👑",
        },
        AchievementKind::Calories10k => Badge {
            title: "Calorie Crusher",
            description: "Burned 10,000 calories",
            icon: "⚡",
        },
        AchievementKind::Calories50k => Badge {
            title: "Inferno",
            description: "Burned 50,000 calories",
            icon: "🌋",
        },
        AchievementKind::MealCount30 => Badge {
            title: "Mindful Eater",
            description: "Logged 30 meals",
            icon: "🥗",
        },
        AchievementKind::MealCount100 => Badge {
            title: "Nutrition Pro",
            description: "Logged 100 meals",
            icon: "🍎",
        },
        AchievementKind::GoalReached => Badge {
            title: "Goal Crusher",
            description: "Reached your goal weight",
            icon: "🎉",
        },
    }
}

pub fn meal_type_label(meal_type: MealType) -> &'static str {
    match meal_type {
        MealType::Breakfast => "🌅 Breakfast",
        MealType::Lunch => "☀️ Lunch",
        MealType::Dinner => "🌙 Dinner",
        MealType::Snack => "🍪 Snack",
    }
}

pub fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "HIGH",
        Priority::Medium => "MEDIUM",
        Priority::Low => "LOW",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_badge_has_text() {
        for kind in AchievementKind::ALL {
            let b = badge(kind);
            assert!(!b.title.is_empty());
            assert!(!b.description.is_empty());
            assert!(!b.icon.is_empty());
        }
    }

    #[test]
    fn test_badge_titles_are_distinct() {
        let mut titles: Vec<_> = AchievementKind::ALL.iter().map(|k| badge(*k).title).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), AchievementKind::ALL.len());
    }
}
