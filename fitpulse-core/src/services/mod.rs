//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case and receives the repository it works
//! against from whoever builds it.

pub mod achievement;
mod activity;
mod demo;
pub mod events;
pub mod health;
pub mod logging;
pub mod migration;
pub mod prediction;
mod profile;
mod status;
pub mod streak;
pub mod suggestion;

pub use achievement::{AchievementService, AchievementStats};
pub use activity::ActivityService;
pub use demo::{DemoSeedSummary, DemoService};
pub use events::{
    AchievementQueue, AchievementWorker, ActivityEvent, ActivityObserver, ObserverSlot, Unlock,
};
pub use health::{Grade, HealthFactor, HealthInputs, HealthScore, HealthScoreService};
pub use logging::{CommandCount, LogEntry, LogEvent, LogFilter, LogSource, LogStats, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use prediction::{missing_inputs, MissingInput, PredictionService, TrajectoryPrediction};
pub use profile::{ProfileService, ProfileUpdate};
pub use status::{StatusService, UserStatus};
pub use streak::StreakService;
pub use suggestion::{Priority, Suggestion, SuggestionCategory, SuggestionKind, SuggestionService};
