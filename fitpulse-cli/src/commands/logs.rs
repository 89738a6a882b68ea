//! Logs command - inspect the persisted command, failure and unlock history

use anyhow::{Context, Result};
use chrono::{Duration, Local, TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use fitpulse_core::services::{LogEntry, LogFilter, LoggingService};
use uuid::Uuid;

use super::get_data_dir;
use crate::output::{create_table, format_size, info, success};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent entries, newest first
    List {
        #[arg(short, long, default_value = "25")]
        limit: usize,
        /// Only failed commands and other errors
        #[arg(long)]
        errors: bool,
        /// Only entries for this command (e.g. "meal")
        #[arg(long)]
        command: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete old entries
    Clear {
        /// Keep entries from the last N days
        #[arg(long, default_value = "30", conflicts_with = "all")]
        keep_days: i64,
        /// Delete every entry
        #[arg(long)]
        all: bool,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Totals and a per-command breakdown
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LogsCommands, user: Option<Uuid>, shared: Option<&LoggingService>) -> Result<()> {
    // Reuse the connection opened for command logging when there is one
    let opened;
    let log = match shared {
        Some(log) => log,
        None => {
            let data_dir = get_data_dir()?;
            opened = LoggingService::new(&data_dir, env!("CARGO_PKG_VERSION"))
                .context("Failed to open the event log")?;
            &opened
        }
    };

    match command {
        LogsCommands::List {
            limit,
            errors,
            command,
            json,
        } => {
            let filter = LogFilter {
                errors_only: errors,
                command,
                user_id: user,
                limit,
            };
            list(log, filter, json)
        }
        LogsCommands::Clear { keep_days, all, yes } => clear(log, keep_days, all, yes),
        LogsCommands::Stats { json } => stats(log, json),
    }
}

fn local_time(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.with_timezone(&Local).format("%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn outcome(entry: &LogEntry) -> String {
    if let Some(kind) = &entry.achievement {
        return format!("unlocked {}", kind).green().to_string();
    }
    match &entry.error_message {
        Some(message) => message.red().to_string(),
        None => "ok".dimmed().to_string(),
    }
}

fn list(log: &LoggingService, filter: LogFilter, json: bool) -> Result<()> {
    let entries = log.search(&filter)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        info("Nothing logged yet");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["When", "Source", "Command", "User", "Took", "Outcome"]);
    for entry in &entries {
        table.add_row(vec![
            local_time(entry.logged_at),
            entry.source.clone(),
            entry.command.clone().unwrap_or_else(|| entry.event.clone()),
            entry
                .user_id
                .as_deref()
                .map(|id| id.chars().take(8).collect::<String>())
                .unwrap_or_default(),
            entry
                .duration_ms
                .map(|ms| format!("{} ms", ms))
                .unwrap_or_default(),
            outcome(entry),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn clear(log: &LoggingService, keep_days: i64, all: bool, yes: bool) -> Result<()> {
    let (cutoff, prompt) = if all {
        (i64::MAX, "Delete the whole event log?".to_string())
    } else {
        (
            (Utc::now() - Duration::days(keep_days)).timestamp_millis(),
            format!("Delete entries older than {} days?", keep_days),
        )
    };

    if !yes && !Confirm::new().with_prompt(prompt).default(false).interact()? {
        info("Nothing deleted");
        return Ok(());
    }

    let deleted = log.delete_before(cutoff)?;
    success(&format!("Deleted {} entries", deleted));
    Ok(())
}

fn stats(log: &LoggingService, json: bool) -> Result<()> {
    let stats = log.stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Event log".bold());
    println!(
        "  {} entries, {} errors, {} unlocks",
        stats.total,
        stats.errors.to_string().red(),
        stats.unlocks.to_string().green()
    );
    println!(
        "  {} ({})",
        stats.db_path.display(),
        format_size(stats.size_bytes)
    );

    if stats.commands.is_empty() {
        return Ok(());
    }
    println!();
    let mut table = create_table();
    table.set_header(vec!["Command", "Runs", "Failures", "Failure rate"]);
    for c in &stats.commands {
        let rate = if c.runs == 0 {
            0.0
        } else {
            c.failures as f64 / c.runs as f64 * 100.0
        };
        table.add_row(vec![
            c.command.clone(),
            c.runs.to_string(),
            c.failures.to_string(),
            format!("{:.0}%", rate),
        ]);
    }
    println!("{}", table);
    Ok(())
}
