//! Repository port - persistence abstraction

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Achievement, AchievementKind, Meal, User, WeightEntry, Workout};

/// Fitness data repository
///
/// Every service receives an `Arc<dyn FitnessRepository>` from the entry
/// point that owns the storage lifecycle. Implementations must be safe to
/// share across threads.
pub trait FitnessRepository: Send + Sync {
    // === Users ===

    fn create_user(&self, user: &User) -> Result<()>;

    fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Overwrite the stored profile with `user`
    fn update_user(&self, user: &User) -> Result<()>;

    fn list_users(&self) -> Result<Vec<User>>;

    // === Workouts ===

    fn add_workout(&self, workout: &Workout) -> Result<()>;

    fn update_workout(&self, workout: &Workout) -> Result<()>;

    /// Returns false if no workout had that id
    fn delete_workout(&self, id: Uuid) -> Result<bool>;

    fn get_workout(&self, id: Uuid) -> Result<Option<Workout>>;

    /// Most recent workouts first, at most `limit`
    fn get_recent_workouts(&self, user_id: Uuid, limit: usize) -> Result<Vec<Workout>>;

    /// Up to `limit` workouts dated before `end`, most recent first
    fn get_workouts_before(
        &self,
        user_id: Uuid,
        end: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<Workout>>;

    /// Workouts with `start <= date < end`, most recent first
    fn get_workouts_between(
        &self,
        user_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Workout>>;

    fn count_workouts(&self, user_id: Uuid) -> Result<u64>;

    fn sum_calories_burned(&self, user_id: Uuid) -> Result<f64>;

    // === Meals ===

    fn add_meal(&self, meal: &Meal) -> Result<()>;

    fn update_meal(&self, meal: &Meal) -> Result<()>;

    fn delete_meal(&self, id: Uuid) -> Result<bool>;

    fn get_meal(&self, id: Uuid) -> Result<Option<Meal>>;

    fn get_recent_meals(&self, user_id: Uuid, limit: usize) -> Result<Vec<Meal>>;

    /// Meals with `start <= date < end`, most recent first
    fn get_meals_between(
        &self,
        user_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Meal>>;

    fn count_meals(&self, user_id: Uuid) -> Result<u64>;

    // === Achievements ===

    fn find_achievement(&self, user_id: Uuid, kind: AchievementKind)
        -> Result<Option<Achievement>>;

    /// Insert a batch of unlocks in one transaction
    ///
    /// Either every row is written or none is. Returns the kinds actually
    /// inserted: a (user, kind) pair already stored is skipped. The storage
    /// layer enforces that uniqueness, so two racing callers can never both
    /// report the same kind.
    fn create_achievements(&self, achievements: &[Achievement]) -> Result<Vec<AchievementKind>>;

    /// All achievements for a user, oldest unlock first
    fn get_achievements(&self, user_id: Uuid) -> Result<Vec<Achievement>>;

    // === Weight ===

    /// Store a check-in and sync the user's current weight (and starting
    /// weight, when unset) atomically
    fn record_weight(&self, entry: &WeightEntry) -> Result<User>;

    /// Weight history, oldest first
    fn get_weight_entries(&self, user_id: Uuid) -> Result<Vec<WeightEntry>>;
}
