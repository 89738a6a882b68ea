//! Weight command - weigh-ins and history

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use super::{get_context, parse_when, resolve_user, with_achievement_worker};
use crate::output::{create_table, kg, print_unlocks, success};

#[derive(Subcommand)]
pub enum WeightCommands {
    /// Record a weigh-in
    Add {
        /// Weight in kg
        weight: f64,
        /// When it was taken (YYYY-MM-DD or "YYYY-MM-DD HH:MM"), default now
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history, newest first
    List {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: WeightCommands, user: Option<Uuid>) -> Result<()> {
    let ctx = get_context()?;
    let user_id = resolve_user(&ctx, user)?;

    match command {
        WeightCommands::Add {
            weight,
            date,
            notes,
            json,
        } => {
            let recorded_at = parse_when(date.as_deref())?;
            let (user, unlocks) = with_achievement_worker(&ctx, |ctx| {
                ctx.profile_service
                    .record_weight_at(user_id, weight, recorded_at, notes)
            })?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "user": user,
                        "unlocked": unlocks,
                    }))?
                );
                return Ok(());
            }

            success(&format!("Recorded {:.1} kg", weight));
            if let (Some(current), Some(goal)) = (user.current_weight, user.goal_weight) {
                println!("  {:.1} kg to goal", (current - goal).abs());
            }
            print_unlocks(&unlocks);
        }
        WeightCommands::List { limit, json } => {
            let mut history = ctx.profile_service.weight_history(user_id)?;
            history.reverse();
            history.truncate(limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
                return Ok(());
            }
            if history.is_empty() {
                println!("No weigh-ins yet. Add one with 'fp weight add <kg>'.");
                return Ok(());
            }

            let mut table = create_table();
            table.set_header(vec!["Date", "Weight", "Change", "Notes"]);
            // History is newest first; change is against the next older entry
            for (i, entry) in history.iter().enumerate() {
                let change = history
                    .get(i + 1)
                    .map(|older| {
                        let delta = entry.weight - older.weight;
                        let text = format!("{:+.1}", delta);
                        if delta < 0.0 {
                            text.green().to_string()
                        } else if delta > 0.0 {
                            text.red().to_string()
                        } else {
                            text
                        }
                    })
                    .unwrap_or_default();
                table.add_row(vec![
                    entry.recorded_at.format("%Y-%m-%d %H:%M").to_string(),
                    kg(Some(entry.weight)),
                    change,
                    entry.notes.clone().unwrap_or_default(),
                ]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}
