//! FitPulse Core - Business logic for fitness and nutrition tracking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (User, Workout, Meal, etc.)
//! - **ports**: Trait definitions for external dependencies (FitnessRepository)
//! - **services**: Business logic orchestration (streaks, achievements,
//!   health score, weight trajectory, suggestions)
//! - **adapters**: Concrete implementations (DuckDB, demo data)
//! - **presentation**: Display metadata for closed domain enums

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod presentation;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use adapters::demo::DEMO_USER_ID;
use adapters::duckdb::DuckDbRepository;
use config::Config;
use ports::FitnessRepository;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    Achievement, AchievementKind, ActivityLevel, Exercise, FoodItem, Gender, MacroTotals, Meal,
    MealType, User, WeightEntry, Workout,
};

/// Main context for FitPulse operations
///
/// Owns the repository and hands a shared reference to every service.
/// Entry points (the CLI, a server) build one context and drop it when done.
pub struct FitpulseContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub repository: Arc<dyn FitnessRepository>,
    observers: ObserverSlot,
    pub profile_service: ProfileService,
    pub activity_service: ActivityService,
    pub streak_service: StreakService,
    pub achievement_service: Arc<AchievementService>,
    pub health_service: HealthScoreService,
    pub prediction_service: PredictionService,
    pub suggestion_service: SuggestionService,
    pub status_service: StatusService,
}

impl FitpulseContext {
    /// Open the database for the configured mode and run migrations
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        std::fs::create_dir_all(data_dir)?;

        let db_path = config.database_path(data_dir);
        let repository = DuckDbRepository::new(&db_path)?;
        repository.ensure_schema()?;
        tracing::debug!(path = %db_path.display(), demo = config.demo_mode, "database ready");

        Ok(Self::with_repository(config, data_dir, Arc::new(repository)))
    }

    /// Build a context around an existing repository
    pub fn with_repository(
        config: Config,
        data_dir: &Path,
        repository: Arc<dyn FitnessRepository>,
    ) -> Self {
        let observers = ObserverSlot::default();
        Self {
            profile_service: ProfileService::new(Arc::clone(&repository), observers.clone()),
            activity_service: ActivityService::new(Arc::clone(&repository), observers.clone()),
            streak_service: StreakService::new(Arc::clone(&repository)),
            achievement_service: Arc::new(AchievementService::new(Arc::clone(&repository))),
            health_service: HealthScoreService::new(Arc::clone(&repository)),
            prediction_service: PredictionService::new(Arc::clone(&repository)),
            suggestion_service: SuggestionService::new(Arc::clone(&repository)),
            status_service: StatusService::new(Arc::clone(&repository)),
            observers,
            repository,
            config,
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Be notified after workouts, meals and weigh-ins commit
    pub fn set_observer(&self, observer: Arc<dyn ActivityObserver>) {
        self.observers.set(observer);
    }

    pub fn clear_observer(&self) {
        self.observers.clear();
    }

    /// The user commands act on when none is given explicitly
    ///
    /// In demo mode this is always the demo user.
    pub fn active_user(&self) -> Option<Uuid> {
        if self.config.demo_mode {
            Some(DEMO_USER_ID)
        } else {
            self.config.active_user
        }
    }
}
