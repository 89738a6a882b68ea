//! CLI command implementations

pub mod achievements;
pub mod demo;
pub mod health;
pub mod logs;
pub mod meal;
pub mod predict;
pub mod status;
pub mod streak;
pub mod suggest;
pub mod user;
pub mod weight;
pub mod workout;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use fitpulse_core::config::DATA_DIR_ENV;
use fitpulse_core::services::{AchievementWorker, LogEvent, LoggingService, Unlock};
use fitpulse_core::FitpulseContext;
use uuid::Uuid;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    LoggingService::new(&data_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            tracing::debug!("event log unavailable: {}", e);
        }
    }
}

/// Data directory from FITPULSE_DIR, else ~/.fitpulse
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".fitpulse"))
        .ok_or_else(|| anyhow!("Could not find home directory; set {}", DATA_DIR_ENV))
}

pub fn get_context() -> Result<FitpulseContext> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

    FitpulseContext::new(&data_dir).context("Failed to initialize FitPulse")
}

/// The user a command acts on: `--user`, else the configured active user
pub fn resolve_user(ctx: &FitpulseContext, flag: Option<Uuid>) -> Result<Uuid> {
    flag.or_else(|| ctx.active_user()).ok_or_else(|| {
        anyhow!("No user selected. Pass --user <ID>, or run 'fp user create' / 'fp user use <ID>'")
    })
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`; a bare date means noon
pub fn parse_when(value: Option<&str>) -> Result<NaiveDateTime> {
    let Some(value) = value else {
        return Ok(Local::now().naive_local());
    };
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M") {
        return Ok(dt);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD or 'YYYY-MM-DD HH:MM'", value))?;
    Ok(date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)))
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD", value))
}

/// Run a write with the achievement worker attached
///
/// The write returns as soon as it commits; achievement checks it triggers
/// run on the worker, and their unlocks are collected once the write is done.
pub fn with_achievement_worker<T>(
    ctx: &FitpulseContext,
    write: impl FnOnce(&FitpulseContext) -> fitpulse_core::Result<T>,
) -> Result<(T, Vec<Unlock>)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let (queue, worker) = AchievementWorker::spawn(Arc::clone(&ctx.achievement_service));
        ctx.set_observer(Arc::new(queue));
        let result = write(ctx);
        // Dropping the last queue handle lets the worker drain and stop
        ctx.clear_observer();
        let unlocks = worker.finish().await;
        Ok::<_, anyhow::Error>((result?, unlocks))
    })
    .map(|(value, unlocks)| {
        record_unlocks(&unlocks);
        (value, unlocks)
    })
}

fn record_unlocks(unlocks: &[Unlock]) {
    if unlocks.is_empty() {
        return;
    }
    let logger = get_logger();
    for unlock in unlocks {
        log_event(
            &logger,
            LogEvent::new(fitpulse_core::services::logging::ACHIEVEMENT_UNLOCKED)
                .from_worker()
                .for_user(unlock.user_id)
                .with_achievement(unlock.kind),
        );
    }
}
