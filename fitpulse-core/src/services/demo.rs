//! Demo service - manage demo mode
//!
//! Demo mode swaps the working database for demo.duckdb, seeded with a
//! sample user and several weeks of history, so every command can be
//! tried without entering data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::adapters::demo::{
    generate_demo_meals, generate_demo_user, generate_demo_weights, generate_demo_workouts,
    DEMO_USER_ID,
};
use crate::adapters::duckdb::DuckDbRepository;
use crate::config::Config;
use crate::domain::result::Result;
use crate::ports::FitnessRepository;
use crate::services::achievement::AchievementService;

pub const DEMO_DB_FILE: &str = "demo.duckdb";

/// What `enable` wrote into the demo database
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DemoSeedSummary {
    pub workouts: usize,
    pub meals: usize,
    pub weight_entries: usize,
    pub achievements: usize,
}

pub struct DemoService {
    data_dir: PathBuf,
}

impl DemoService {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(Config::load(&self.data_dir)?.demo_mode)
    }

    fn remove_demo_files(&self) -> Result<()> {
        for name in [DEMO_DB_FILE.to_string(), format!("{}.wal", DEMO_DB_FILE)] {
            let path = self.data_dir.join(name);
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Turn demo mode on with a freshly seeded database
    pub fn enable(&self) -> Result<DemoSeedSummary> {
        self.remove_demo_files()?;

        let mut config = Config::load(&self.data_dir)?;
        config.enable_demo_mode();
        config.save(&self.data_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&self.data_dir.join(DEMO_DB_FILE))?);
        repository.ensure_schema()?;
        let summary = seed(repository.as_ref())?;

        let achievements = AchievementService::new(repository).check_achievements(DEMO_USER_ID);
        tracing::info!(?summary, unlocked = achievements.len(), "demo database seeded");

        Ok(DemoSeedSummary {
            achievements: achievements.len(),
            ..summary
        })
    }

    /// Turn demo mode off, optionally deleting the demo database
    pub fn disable(&self, clean: bool) -> Result<()> {
        let mut config = Config::load(&self.data_dir)?;
        config.disable_demo_mode();
        config.save(&self.data_dir)?;

        if clean {
            self.remove_demo_files()?;
        }
        Ok(())
    }
}

fn seed(repository: &dyn FitnessRepository) -> Result<DemoSeedSummary> {
    let today = Local::now().date_naive();
    repository.create_user(&generate_demo_user(today))?;

    let workouts = generate_demo_workouts(DEMO_USER_ID, today);
    for workout in &workouts {
        repository.add_workout(workout)?;
    }
    let meals = generate_demo_meals(DEMO_USER_ID, today);
    for meal in &meals {
        repository.add_meal(meal)?;
    }
    let weights = generate_demo_weights(DEMO_USER_ID, today);
    for entry in &weights {
        repository.record_weight(entry)?;
    }

    Ok(DemoSeedSummary {
        workouts: workouts.len(),
        meals: meals.len(),
        weight_entries: weights.len(),
        achievements: 0,
    })
}
