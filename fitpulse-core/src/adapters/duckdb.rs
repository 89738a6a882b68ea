//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::{params, Connection, OptionalExt};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Achievement, AchievementKind, ActivityLevel, Exercise, FoodItem, Gender, MacroTotals, Meal,
    MealType, User, WeightEntry, Workout,
};
use crate::ports::FitnessRepository;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl DuckDbRepository {
    /// Open (or create) a database file
    ///
    /// Retries with exponential backoff when the file is locked by another
    /// process, e.g. a second `fp` invocation still finishing its write.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: Some(db_path.to_path_buf()),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            "database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off: cached extensions in ~/.duckdb
        // can fail code signing checks on macOS
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Path of the backing file, None for in-memory databases
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run database migrations, returning what was applied
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.conn()?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }
}

// === Row decoding ===
//
// Rows are read into plain string-typed structs inside the duckdb closure
// and converted to domain types afterwards, so malformed stored values
// surface as errors instead of being papered over.

const USER_COLUMNS: &str = "user_id, email, name, height_cm, current_weight, goal_weight,
    starting_weight, activity_level, daily_calorie_goal, date_of_birth::VARCHAR, gender,
    created_at, updated_at";

struct UserRow {
    id: String,
    email: String,
    name: String,
    height_cm: Option<f64>,
    current_weight: Option<f64>,
    goal_weight: Option<f64>,
    starting_weight: Option<f64>,
    activity_level: Option<String>,
    daily_calorie_goal: Option<f64>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            height_cm: row.get(3)?,
            current_weight: row.get(4)?,
            goal_weight: row.get(5)?,
            starting_weight: row.get(6)?,
            activity_level: row.get(7)?,
            daily_calorie_goal: row.get(8)?,
            date_of_birth: row.get(9)?,
            gender: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_domain(self) -> Result<User> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            email: self.email,
            name: self.name,
            height_cm: self.height_cm,
            current_weight: self.current_weight,
            goal_weight: self.goal_weight,
            starting_weight: self.starting_weight,
            activity_level: self
                .activity_level
                .as_deref()
                .map(str::parse::<ActivityLevel>)
                .transpose()?,
            daily_calorie_goal: self.daily_calorie_goal,
            date_of_birth: self.date_of_birth.as_deref().map(parse_date).transpose()?,
            gender: self.gender.as_deref().map(str::parse::<Gender>).transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

// duckdb-rs cannot read VARCHAR[] directly, and the plain VARCHAR rendering
// drops quotes, so tags come back as a JSON array
const WORKOUT_COLUMNS: &str = "workout_id, user_id, workout_date::VARCHAR, exercises,
    total_duration, calories_burned, CAST(to_json(tags) AS VARCHAR), notes, created_at, updated_at";

struct WorkoutRow {
    id: String,
    user_id: String,
    date: String,
    exercises: String,
    total_duration: i64,
    calories_burned: f64,
    tags: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl WorkoutRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            exercises: row.get(3)?,
            total_duration: row.get(4)?,
            calories_burned: row.get(5)?,
            tags: row.get(6)?,
            notes: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_domain(self) -> Result<Workout> {
        let exercises: Vec<Exercise> = serde_json::from_str(&self.exercises)?;
        let tags: Vec<String> = match self.tags.as_deref() {
            Some(json) => serde_json::from_str(json)?,
            None => Vec::new(),
        };
        Ok(Workout {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            date: parse_naive_datetime(&self.date)?,
            exercises,
            total_duration: u32::try_from(self.total_duration).unwrap_or(0),
            calories_burned: self.calories_burned,
            tags,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

const MEAL_COLUMNS: &str = "meal_id, user_id, meal_date::VARCHAR, meal_type, food_items,
    total_calories, total_protein, total_carbs, total_fat, created_at, updated_at";

struct MealRow {
    id: String,
    user_id: String,
    date: String,
    meal_type: String,
    food_items: String,
    totals: MacroTotals,
    created_at: String,
    updated_at: String,
}

impl MealRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            meal_type: row.get(3)?,
            food_items: row.get(4)?,
            totals: MacroTotals {
                calories: row.get(5)?,
                protein: row.get(6)?,
                carbs: row.get(7)?,
                fat: row.get(8)?,
            },
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_domain(self) -> Result<Meal> {
        let food_items: Vec<FoodItem> = serde_json::from_str(&self.food_items)?;
        Ok(Meal {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            date: parse_naive_datetime(&self.date)?,
            meal_type: self.meal_type.parse::<MealType>()?,
            food_items,
            totals: self.totals,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

const ACHIEVEMENT_COLUMNS: &str = "achievement_id, user_id, achievement_type, title,
    description, icon, points, unlocked_at";

struct AchievementRow {
    id: String,
    user_id: String,
    kind: String,
    title: String,
    description: String,
    icon: String,
    points: i64,
    unlocked_at: String,
}

impl AchievementRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            icon: row.get(5)?,
            points: row.get(6)?,
            unlocked_at: row.get(7)?,
        })
    }

    fn into_domain(self) -> Result<Achievement> {
        Ok(Achievement {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            kind: self.kind.parse::<AchievementKind>()?,
            title: self.title,
            description: self.description,
            icon: self.icon,
            points: u32::try_from(self.points).unwrap_or(0),
            unlocked_at: parse_timestamp(&self.unlocked_at)?,
        })
    }
}

const WEIGHT_COLUMNS: &str = "entry_id, user_id, weight, recorded_at::VARCHAR, notes";

struct WeightRow {
    id: String,
    user_id: String,
    weight: f64,
    recorded_at: String,
    notes: Option<String>,
}

impl WeightRow {
    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            weight: row.get(2)?,
            recorded_at: row.get(3)?,
            notes: row.get(4)?,
        })
    }

    fn into_domain(self) -> Result<WeightEntry> {
        Ok(WeightEntry {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            weight: self.weight,
            recorded_at: parse_naive_datetime(&self.recorded_at)?,
            notes: self.notes,
        })
    }
}

fn collect<R, T>(rows: Vec<R>, convert: impl Fn(R) -> Result<T>) -> Result<Vec<T>> {
    rows.into_iter().map(convert).collect()
}

fn query_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM sys_users WHERE user_id = ?", USER_COLUMNS);
    let row = conn
        .query_row(&sql, params![id.to_string()], UserRow::read)
        .optional()?;
    row.map(UserRow::into_domain).transpose()
}

fn insert_achievement(conn: &Connection, achievement: &Achievement) -> Result<bool> {
    // The UNIQUE (user_id, achievement_type) constraint turns a lost
    // check-then-insert race into a no-op instead of a duplicate row
    let inserted = conn.execute(
        "INSERT INTO sys_achievements (achievement_id, user_id, achievement_type, title,
                                       description, icon, points, unlocked_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (user_id, achievement_type) DO NOTHING",
        params![
            achievement.id.to_string(),
            achievement.user_id.to_string(),
            achievement.kind.as_str(),
            achievement.title,
            achievement.description,
            achievement.icon,
            i64::from(achievement.points),
            achievement.unlocked_at.to_rfc3339(),
        ],
    )?;
    Ok(inserted > 0)
}

fn query_workouts(conn: &Connection, sql: &str, args: &[&dyn duckdb::ToSql]) -> Result<Vec<Workout>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(args, WorkoutRow::read)?
        .collect::<duckdb::Result<Vec<_>>>()?;
    collect(rows, WorkoutRow::into_domain)
}

fn query_meals(conn: &Connection, sql: &str, args: &[&dyn duckdb::ToSql]) -> Result<Vec<Meal>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(args, MealRow::read)?
        .collect::<duckdb::Result<Vec<_>>>()?;
    collect(rows, MealRow::into_domain)
}

impl FitnessRepository for DuckDbRepository {
    // === Users ===

    fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            &format!(
                "INSERT INTO sys_users ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS DATE), ?, ?, ?)
                 ON CONFLICT DO NOTHING",
                USER_COLUMNS.replace("::VARCHAR", "")
            ),
            params![
                user.id.to_string(),
                user.email,
                user.name,
                user.height_cm,
                user.current_weight,
                user.goal_weight,
                user.starting_weight,
                user.activity_level.map(|a| a.as_str()),
                user.daily_calorie_goal,
                user.date_of_birth.map(|d| d.to_string()),
                user.gender.map(|g| g.as_str()),
                user.created_at.to_rfc3339(),
                user.updated_at.to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            return Err(Error::validation(format!(
                "A user with email {} already exists",
                user.email
            )));
        }
        Ok(())
    }

    fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let conn = self.conn()?;
        query_user(&conn, id)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        // email is the unique login key and is not editable here
        let changed = conn.execute(
            "UPDATE sys_users SET
                name = ?, height_cm = ?, current_weight = ?, goal_weight = ?,
                starting_weight = ?, activity_level = ?, daily_calorie_goal = ?,
                date_of_birth = CAST(? AS DATE), gender = ?, updated_at = ?
             WHERE user_id = ?",
            params![
                user.name,
                user.height_cm,
                user.current_weight,
                user.goal_weight,
                user.starting_weight,
                user.activity_level.map(|a| a.as_str()),
                user.daily_calorie_goal,
                user.date_of_birth.map(|d| d.to_string()),
                user.gender.map(|g| g.as_str()),
                user.updated_at.to_rfc3339(),
                user.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("User {}", user.id)));
        }
        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM sys_users ORDER BY created_at", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], UserRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        collect(rows, UserRow::into_domain)
    }

    // === Workouts ===

    fn add_workout(&self, workout: &Workout) -> Result<()> {
        let conn = self.conn()?;
        let exercises = serde_json::to_string(&workout.exercises)?;
        let sql = format!(
            "INSERT INTO sys_workouts (workout_id, user_id, workout_date, exercises,
                                       total_duration, calories_burned, tags, notes,
                                       created_at, updated_at)
             VALUES (?, ?, CAST(? AS TIMESTAMP), ?, ?, ?, {}, ?, ?, ?)",
            format_tags_array(&workout.tags)
        );
        conn.execute(
            &sql,
            params![
                workout.id.to_string(),
                workout.user_id.to_string(),
                format_naive_datetime(&workout.date),
                exercises,
                i64::from(workout.total_duration),
                workout.calories_burned,
                workout.notes,
                workout.created_at.to_rfc3339(),
                workout.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update_workout(&self, workout: &Workout) -> Result<()> {
        let conn = self.conn()?;
        let exercises = serde_json::to_string(&workout.exercises)?;
        let sql = format!(
            "UPDATE sys_workouts SET workout_date = CAST(? AS TIMESTAMP), exercises = ?,
                    total_duration = ?, calories_burned = ?, tags = {}, notes = ?, updated_at = ?
             WHERE workout_id = ?",
            format_tags_array(&workout.tags)
        );
        let changed = conn.execute(
            &sql,
            params![
                format_naive_datetime(&workout.date),
                exercises,
                i64::from(workout.total_duration),
                workout.calories_burned,
                workout.notes,
                workout.updated_at.to_rfc3339(),
                workout.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("Workout {}", workout.id)));
        }
        Ok(())
    }

    fn delete_workout(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM sys_workouts WHERE workout_id = ?",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    fn get_workout(&self, id: Uuid) -> Result<Option<Workout>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM sys_workouts WHERE workout_id = ?", WORKOUT_COLUMNS);
        let id = id.to_string();
        Ok(query_workouts(&conn, &sql, &[&id])?.into_iter().next())
    }

    fn get_recent_workouts(&self, user_id: Uuid, limit: usize) -> Result<Vec<Workout>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_workouts WHERE user_id = ?
             ORDER BY workout_date DESC, created_at DESC LIMIT ?",
            WORKOUT_COLUMNS
        );
        let user_id = user_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        query_workouts(&conn, &sql, &[&user_id, &limit])
    }

    fn get_workouts_before(
        &self,
        user_id: Uuid,
        end: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<Workout>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_workouts
             WHERE user_id = ? AND workout_date < CAST(? AS TIMESTAMP)
             ORDER BY workout_date DESC, created_at DESC LIMIT ?",
            WORKOUT_COLUMNS
        );
        let user_id = user_id.to_string();
        let end = format_naive_datetime(&end);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        query_workouts(&conn, &sql, &[&user_id, &end, &limit])
    }

    fn get_workouts_between(
        &self,
        user_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Workout>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_workouts
             WHERE user_id = ? AND workout_date >= CAST(? AS TIMESTAMP)
               AND workout_date < CAST(? AS TIMESTAMP)
             ORDER BY workout_date DESC, created_at DESC",
            WORKOUT_COLUMNS
        );
        let user_id = user_id.to_string();
        let start = format_naive_datetime(&start);
        let end = format_naive_datetime(&end);
        query_workouts(&conn, &sql, &[&user_id, &start, &end])
    }

    fn count_workouts(&self, user_id: Uuid) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_workouts WHERE user_id = ?",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn sum_calories_burned(&self, user_id: Uuid) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(calories_burned), 0)::DOUBLE FROM sys_workouts WHERE user_id = ?",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // === Meals ===

    fn add_meal(&self, meal: &Meal) -> Result<()> {
        let conn = self.conn()?;
        let food_items = serde_json::to_string(&meal.food_items)?;
        conn.execute(
            "INSERT INTO sys_meals (meal_id, user_id, meal_date, meal_type, food_items,
                                    total_calories, total_protein, total_carbs, total_fat,
                                    created_at, updated_at)
             VALUES (?, ?, CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                meal.id.to_string(),
                meal.user_id.to_string(),
                format_naive_datetime(&meal.date),
                meal.meal_type.as_str(),
                food_items,
                meal.totals.calories,
                meal.totals.protein,
                meal.totals.carbs,
                meal.totals.fat,
                meal.created_at.to_rfc3339(),
                meal.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn update_meal(&self, meal: &Meal) -> Result<()> {
        let conn = self.conn()?;
        let food_items = serde_json::to_string(&meal.food_items)?;
        let changed = conn.execute(
            "UPDATE sys_meals SET meal_date = CAST(? AS TIMESTAMP), meal_type = ?, food_items = ?,
                    total_calories = ?, total_protein = ?, total_carbs = ?, total_fat = ?,
                    updated_at = ?
             WHERE meal_id = ?",
            params![
                format_naive_datetime(&meal.date),
                meal.meal_type.as_str(),
                food_items,
                meal.totals.calories,
                meal.totals.protein,
                meal.totals.carbs,
                meal.totals.fat,
                meal.updated_at.to_rfc3339(),
                meal.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found(format!("Meal {}", meal.id)));
        }
        Ok(())
    }

    fn delete_meal(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM sys_meals WHERE meal_id = ?",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }

    fn get_meal(&self, id: Uuid) -> Result<Option<Meal>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM sys_meals WHERE meal_id = ?", MEAL_COLUMNS);
        let id = id.to_string();
        Ok(query_meals(&conn, &sql, &[&id])?.into_iter().next())
    }

    fn get_recent_meals(&self, user_id: Uuid, limit: usize) -> Result<Vec<Meal>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_meals WHERE user_id = ?
             ORDER BY meal_date DESC, created_at DESC LIMIT ?",
            MEAL_COLUMNS
        );
        let user_id = user_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        query_meals(&conn, &sql, &[&user_id, &limit])
    }

    fn get_meals_between(
        &self,
        user_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Meal>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_meals
             WHERE user_id = ? AND meal_date >= CAST(? AS TIMESTAMP)
               AND meal_date < CAST(? AS TIMESTAMP)
             ORDER BY meal_date DESC, created_at DESC",
            MEAL_COLUMNS
        );
        let user_id = user_id.to_string();
        let start = format_naive_datetime(&start);
        let end = format_naive_datetime(&end);
        query_meals(&conn, &sql, &[&user_id, &start, &end])
    }

    fn count_meals(&self, user_id: Uuid) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sys_meals WHERE user_id = ?",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // === Achievements ===

    fn find_achievement(
        &self,
        user_id: Uuid,
        kind: AchievementKind,
    ) -> Result<Option<Achievement>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_achievements WHERE user_id = ? AND achievement_type = ?",
            ACHIEVEMENT_COLUMNS
        );
        let row = conn
            .query_row(
                &sql,
                params![user_id.to_string(), kind.as_str()],
                AchievementRow::read,
            )
            .optional()?;
        row.map(AchievementRow::into_domain).transpose()
    }

    fn create_achievements(&self, achievements: &[Achievement]) -> Result<Vec<AchievementKind>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut inserted = Vec::new();
        for achievement in achievements {
            if insert_achievement(&tx, achievement)? {
                inserted.push(achievement.kind);
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn get_achievements(&self, user_id: Uuid) -> Result<Vec<Achievement>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_achievements WHERE user_id = ? ORDER BY unlocked_at, achievement_type",
            ACHIEVEMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id.to_string()], AchievementRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        collect(rows, AchievementRow::into_domain)
    }

    // === Weight ===

    fn record_weight(&self, entry: &WeightEntry) -> Result<User> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if query_user(&tx, entry.user_id)?.is_none() {
            return Err(Error::not_found(format!("User {}", entry.user_id)));
        }

        tx.execute(
            "INSERT INTO sys_weight_entries (entry_id, user_id, weight, recorded_at, notes)
             VALUES (?, ?, ?, CAST(? AS TIMESTAMP), ?)",
            params![
                entry.id.to_string(),
                entry.user_id.to_string(),
                entry.weight,
                format_naive_datetime(&entry.recorded_at),
                entry.notes,
            ],
        )?;
        tx.execute(
            "UPDATE sys_users SET current_weight = ?,
                    starting_weight = COALESCE(starting_weight, ?),
                    updated_at = ?
             WHERE user_id = ?",
            params![
                entry.weight,
                entry.weight,
                Utc::now().to_rfc3339(),
                entry.user_id.to_string(),
            ],
        )?;

        let user = query_user(&tx, entry.user_id)?
            .ok_or_else(|| Error::not_found(format!("User {}", entry.user_id)))?;
        tx.commit()?;
        Ok(user)
    }

    fn get_weight_entries(&self, user_id: Uuid) -> Result<Vec<WeightEntry>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM sys_weight_entries WHERE user_id = ? ORDER BY recorded_at",
            WEIGHT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id.to_string()], WeightRow::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        collect(rows, WeightRow::into_domain)
    }
}

// Helper functions

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::database(format!("Invalid stored id '{}': {}", s, e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::database(format!("Invalid stored timestamp '{}': {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::database(format!("Invalid stored date '{}': {}", s, e)))
}

fn format_naive_datetime(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse the formats DuckDB produces when casting TIMESTAMP to VARCHAR
fn parse_naive_datetime(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| Error::database(format!("Invalid stored datetime '{}': {}", s, e)))
}

/// Format tags as a DuckDB array literal: ['tag1', 'tag2']
fn format_tags_array(tags: &[String]) -> String {
    if tags.is_empty() {
        return "[]".to_string();
    }

    let escaped: Vec<String> = tags
        .iter()
        .map(|t| format!("'{}'", t.replace('\'', "''")))
        .collect();

    format!("[{}]", escaped.join(", "))
}
