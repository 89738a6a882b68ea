//! Persistent event log in logs.duckdb
//!
//! Keeps a history of which commands ran, how long they took, what failed
//! and which badges the achievement worker unlocked. Entries may name a
//! user id but never carry meal, workout or body data.
//!
//! `tracing` output is for live diagnostics on stderr; this log is what
//! `fp logs` reads back later.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use duckdb::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::AchievementKind;
use crate::log_migrations::LOG_MIGRATIONS;
use crate::services::migration::MigrationService;

pub const LOG_DB_FILE: &str = "logs.duckdb";

pub const COMMAND_EXECUTED: &str = "command_executed";
pub const COMMAND_FAILED: &str = "command_failed";
pub const ACHIEVEMENT_UNLOCKED: &str = "achievement_unlocked";

/// Which part of the app produced an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    /// A foreground `fp` command
    #[default]
    Cli,
    /// The background achievement worker
    Worker,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Cli => "cli",
            LogSource::Worker => "worker",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event about to be written
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEvent {
    pub event: String,
    pub source: LogSource,
    pub command: Option<String>,
    pub user_id: Option<Uuid>,
    pub achievement: Option<AchievementKind>,
    pub duration: Option<Duration>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Default::default()
        }
    }

    pub fn from_worker(mut self) -> Self {
        self.source = LogSource::Worker;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn for_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_achievement(mut self, kind: AchievementKind) -> Self {
        self.achievement = Some(kind);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A stored entry, newest first when listed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Unix milliseconds
    pub logged_at: i64,
    pub source: String,
    pub app_version: String,
    pub os: String,
    pub event: String,
    pub command: Option<String>,
    pub user_id: Option<String>,
    pub achievement: Option<String>,
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

const ENTRY_COLUMNS: &str = "log_id, logged_at, source, app_version, os, event, command,
    user_id, achievement, duration_ms, error_message, error_details";

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    fn read(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            logged_at: row.get(1)?,
            source: row.get(2)?,
            app_version: row.get(3)?,
            os: row.get(4)?,
            event: row.get(5)?,
            command: row.get(6)?,
            user_id: row.get(7)?,
            achievement: row.get(8)?,
            duration_ms: row.get(9)?,
            error_message: row.get(10)?,
            error_details: row.get(11)?,
        })
    }
}

/// Which entries `search` returns; all fields narrow the result
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub errors_only: bool,
    pub command: Option<String>,
    pub user_id: Option<Uuid>,
    pub limit: usize,
}

/// Runs and failures of one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandCount {
    pub command: String,
    pub runs: u64,
    pub failures: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogStats {
    pub total: u64,
    pub errors: u64,
    pub unlocks: u64,
    /// Busiest command first
    pub commands: Vec<CommandCount>,
    pub db_path: PathBuf,
    pub size_bytes: u64,
}

pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    app_version: String,
}

impl LoggingService {
    /// Open or create logs.duckdb in `data_dir`
    pub fn new(data_dir: &Path, app_version: impl Into<String>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join(LOG_DB_FILE);
        let conn = Connection::open(&db_path)?;
        MigrationService::with_migrations(&conn, LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            app_version: app_version.into(),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    /// Write one entry, stamped with the time, app version and OS
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let duration_ms = event
            .duration
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO sys_logs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ENTRY_COLUMNS
            ),
            params![
                Uuid::new_v4().to_string(),
                Utc::now().timestamp_millis(),
                event.source.as_str(),
                &self.app_version,
                std::env::consts::OS,
                &event.event,
                &event.command,
                event.user_id.map(|id| id.to_string()),
                event.achievement.map(|kind| kind.as_str()),
                duration_ms,
                &event.error_message,
                &event.error_details,
            ],
        )?;
        Ok(())
    }

    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new(COMMAND_EXECUTED).with_command(command))
    }

    pub fn log_error(&self, event: &str, message: &str, details: Option<&str>) -> Result<()> {
        let mut entry = LogEvent::new(event).with_error(message);
        if let Some(details) = details {
            entry = entry.with_error_details(details);
        }
        self.log(entry)
    }

    /// Record a badge the worker unlocked
    pub fn log_unlock(&self, user_id: Uuid, kind: AchievementKind) -> Result<()> {
        self.log(
            LogEvent::new(ACHIEVEMENT_UNLOCKED)
                .from_worker()
                .for_user(user_id)
                .with_achievement(kind),
        )
    }

    /// Entries matching `filter`, newest first
    pub fn search(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let mut conditions = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if filter.errors_only {
            conditions.push("error_message IS NOT NULL");
        }
        if let Some(command) = &filter.command {
            conditions.push("command = ?");
            args.push(command.clone());
        }
        if let Some(user_id) = filter.user_id {
            conditions.push("user_id = ?");
            args.push(user_id.to_string());
        }

        let mut sql = format!("SELECT {} FROM sys_logs", ENTRY_COLUMNS);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(&format!(
            " ORDER BY logged_at DESC, rowid DESC LIMIT {}",
            filter.limit
        ));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(args.iter()), LogEntry::read)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.search(&LogFilter {
            limit,
            ..Default::default()
        })
    }

    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.search(&LogFilter {
            errors_only: true,
            limit,
            ..Default::default()
        })
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }

    /// Totals plus a per-command breakdown
    pub fn stats(&self) -> Result<LogStats> {
        let conn = self.conn()?;
        let (total, errors, unlocks): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE error_message IS NOT NULL),
                    COUNT(*) FILTER (WHERE event = ?)
             FROM sys_logs",
            params![ACHIEVEMENT_UNLOCKED],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT command,
                    COUNT(*) FILTER (WHERE event IN (?, ?)),
                    COUNT(*) FILTER (WHERE event = ?)
             FROM sys_logs
             WHERE command IS NOT NULL
             GROUP BY command
             ORDER BY 2 DESC, command",
        )?;
        let commands = stmt
            .query_map(params![COMMAND_EXECUTED, COMMAND_FAILED, COMMAND_FAILED], |row| {
                let runs: i64 = row.get(1)?;
                let failures: i64 = row.get(2)?;
                Ok(CommandCount {
                    command: row.get(0)?,
                    runs: runs.max(0) as u64,
                    failures: failures.max(0) as u64,
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;

        Ok(LogStats {
            total: total.max(0) as u64,
            errors: errors.max(0) as u64,
            unlocks: unlocks.max(0) as u64,
            commands,
            db_path: self.db_path.clone(),
            size_bytes: std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0),
        })
    }

    /// Delete entries logged before `cutoff_ms` (unix ms)
    pub fn delete_before(&self, cutoff_ms: i64) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE logged_at < ?", [cutoff_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
