//! Workout command - log, list and delete training sessions

use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use fitpulse_core::{Exercise, Workout};
use uuid::Uuid;

use super::{get_context, parse_when, resolve_user, with_achievement_worker};
use crate::output::{create_table, print_unlocks, success};

#[derive(Subcommand)]
pub enum WorkoutCommands {
    /// Log a workout
    Add {
        /// Duration in minutes
        #[arg(long)]
        duration: u32,
        /// Calories burned
        #[arg(long, default_value = "0")]
        calories: f64,
        /// Tag, repeatable (--tag cardio --tag hiit)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Exercise as NAME:SETSxREPS or NAME:SETSxREPS@KG, repeatable
        #[arg(long = "exercise")]
        exercises: Vec<String>,
        /// When it happened (YYYY-MM-DD or "YYYY-MM-DD HH:MM"), default now
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent workouts
    List {
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a workout
    Delete {
        id: Uuid,
    },
}

/// Parse `bench press:3x8@60` into an exercise
pub fn parse_exercise(input: &str) -> Result<Exercise> {
    let (name, volume) = input
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("Invalid exercise '{}'. Use NAME:SETSxREPS[@KG]", input))?;

    let (counts, weight) = match volume.split_once('@') {
        Some((counts, load)) => {
            let load = load.trim().trim_end_matches("kg").trim();
            let weight: f64 = load
                .parse()
                .map_err(|_| anyhow!("Invalid load '{}' in '{}'", load, input))?;
            (counts, Some(weight))
        }
        None => (volume, None),
    };

    let (sets, reps) = counts
        .to_lowercase()
        .split_once('x')
        .map(|(s, r)| (s.trim().parse::<u32>(), r.trim().parse::<u32>()))
        .ok_or_else(|| anyhow!("Invalid sets/reps '{}' in '{}'", counts, input))?;

    Ok(Exercise {
        name: name.trim().to_string(),
        sets: sets.map_err(|_| anyhow!("Invalid sets in '{}'", input))?,
        reps: reps.map_err(|_| anyhow!("Invalid reps in '{}'", input))?,
        weight,
    })
}

pub fn run(command: WorkoutCommands, user: Option<Uuid>) -> Result<()> {
    let ctx = get_context()?;

    match command {
        WorkoutCommands::Add {
            duration,
            calories,
            tags,
            exercises,
            date,
            notes,
            json,
        } => {
            let user_id = resolve_user(&ctx, user)?;
            let mut workout = Workout::new(user_id, parse_when(date.as_deref())?);
            workout.total_duration = duration;
            workout.calories_burned = calories;
            workout.tags = tags;
            workout.notes = notes;
            workout.exercises = exercises
                .iter()
                .map(|e| parse_exercise(e))
                .collect::<Result<Vec<_>>>()?;

            let (workout, unlocks) =
                with_achievement_worker(&ctx, |ctx| ctx.activity_service.log_workout(workout))?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "workout": workout,
                        "unlocked": unlocks,
                    }))?
                );
                return Ok(());
            }

            success(&format!(
                "Logged {} min workout ({:.0} kcal)",
                workout.total_duration, workout.calories_burned
            ));
            println!("  ID: {}", workout.id);
            let streak = ctx.streak_service.current_streak(user_id);
            if streak > 1 {
                println!("  {} day streak", streak.to_string().bold());
            }
            print_unlocks(&unlocks);
        }
        WorkoutCommands::List { limit, json } => {
            let user_id = resolve_user(&ctx, user)?;
            let workouts = ctx.activity_service.list_workouts(user_id, limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&workouts)?);
                return Ok(());
            }
            if workouts.is_empty() {
                println!("No workouts yet. Log one with 'fp workout add --duration 30'.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["Date", "Duration", "Calories", "Exercises", "Tags", "ID"]);
            for w in workouts {
                let exercises = w
                    .exercises
                    .iter()
                    .map(|e| match e.weight {
                        Some(kg) => format!("{} {}x{}@{}", e.name, e.sets, e.reps, kg),
                        None => format!("{} {}x{}", e.name, e.sets, e.reps),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                table.add_row(vec![
                    w.date.format("%Y-%m-%d %H:%M").to_string(),
                    format!("{} min", w.total_duration),
                    format!("{:.0}", w.calories_burned),
                    exercises,
                    w.tags.join(", "),
                    w.id.to_string(),
                ]);
            }
            println!("{}", table);
        }
        WorkoutCommands::Delete { id } => {
            ctx.activity_service.delete_workout(id)?;
            success("Workout deleted");
        }
    }

    Ok(())
}
