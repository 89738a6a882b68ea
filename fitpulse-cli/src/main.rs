//! FitPulse CLI - fitness and nutrition tracking in your terminal

use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fitpulse_core::services::logging::{COMMAND_EXECUTED, COMMAND_FAILED};
use fitpulse_core::services::{LogEvent, LoggingService, SuggestionCategory};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod commands;
mod output;

use commands::{
    achievements, demo, health, logs, meal, predict, status, streak, suggest, user, weight,
    workout,
};

/// Environment variable holding the tracing filter (e.g. "fitpulse_core=debug")
const LOG_FILTER_ENV: &str = "FITPULSE_LOG";

/// FitPulse - fitness and nutrition tracking in your terminal
#[derive(Parser)]
#[command(name = "fp", version, about, long_about = None)]
struct Cli {
    /// Act on this user instead of the active one
    #[arg(long, global = true)]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary of workouts, meals, streak and weight
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage user profiles
    User {
        #[command(subcommand)]
        command: user::UserCommands,
    },

    /// Log and list workouts
    Workout {
        #[command(subcommand)]
        command: workout::WorkoutCommands,
    },

    /// Log and list meals
    Meal {
        #[command(subcommand)]
        command: meal::MealCommands,
    },

    /// Record and review weigh-ins
    Weight {
        #[command(subcommand)]
        command: weight::WeightCommands,
    },

    /// Current workout streak
    Streak {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Unlocked badges and points
    Achievements {
        /// Re-evaluate achievements before listing
        #[arg(long)]
        check: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Health score for the last 30 days
    Health {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Predict weight on a future date
    Predict {
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Workout and nutrition suggestions
    Suggest {
        /// workout or nutrition; both when omitted
        #[arg(long)]
        category: Option<SuggestionCategory>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// View and manage the command log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Status { .. } => "status",
            Commands::User { .. } => "user",
            Commands::Workout { .. } => "workout",
            Commands::Meal { .. } => "meal",
            Commands::Weight { .. } => "weight",
            Commands::Streak { .. } => "streak",
            Commands::Achievements { .. } => "achievements",
            Commands::Health { .. } => "health",
            Commands::Predict { .. } => "predict",
            Commands::Suggest { .. } => "suggest",
            Commands::Demo { .. } => "demo",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let command_name = cli.command.name();
    let selected = cli.user;
    let logger = commands::get_logger();
    let started = Instant::now();

    let result = run(cli, logger.as_ref());

    let mut event = match &result {
        Ok(()) => LogEvent::new(COMMAND_EXECUTED),
        Err(e) => LogEvent::new(COMMAND_FAILED)
            .with_error(e.to_string())
            .with_error_details(format!("{:#}", e)),
    }
    .with_command(command_name)
    .with_duration(started.elapsed());
    if let Some(user_id) = selected {
        event = event.for_user(user_id);
    }
    commands::log_event(&logger, event);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("Error: {:#}", e));
            exit_code(&e)
        }
    }
}

/// Caller mistakes exit with 2, everything else with 1
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<fitpulse_core::Error>() {
        Some(e) if e.is_client_error() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn run(cli: Cli, logger: Option<&LoggingService>) -> Result<()> {
    let selected = cli.user;
    match cli.command {
        Commands::Status { json } => status::run(selected, json),
        Commands::User { command } => user::run(command, selected),
        Commands::Workout { command } => workout::run(command, selected),
        Commands::Meal { command } => meal::run(command, selected),
        Commands::Weight { command } => weight::run(command, selected),
        Commands::Streak { json } => streak::run(selected, json),
        Commands::Achievements { check, json } => achievements::run(selected, check, json),
        Commands::Health { json } => health::run(selected, json),
        Commands::Predict { date, json } => predict::run(selected, &date, json),
        Commands::Suggest { category, json } => suggest::run(selected, category, json),
        Commands::Demo { command } => demo::run(command),
        Commands::Logs { command } => logs::run(command, selected, logger),
    }
}
